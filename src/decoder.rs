//! # MIDI Decoder
//!
//! The decoder is fed MIDI data one byte at a time and reassembles complete channel messages and system exclusive
//! blocks out of it. Every completed message is handed to a [`MessageHandler`].
//!
//! The decoder is a small finite state machine. Each byte is first classified into a [`ByteEvent`], and the pair of
//! current state and event selects the next state and whether a message completes.
//!
//! Things worth knowing:
//!
//! - Running status is supported, repeated messages of the same type may omit the status byte.
//!
//! - A status byte in the middle of a message drops the partial message and starts a new one in its place.
//!
//! - Anything else unexpected (a stray data byte, a System Common or Real-Time byte) drops the decoder back to idle.
//!   It picks up again on the next valid status byte. Nothing is ever reported as an error.
//!
//! - Inside a system exclusive block every byte except the terminating `0xF7` is buffered, including status bytes.
//!   Bytes beyond [`SYSEX_BUFFER_LEN`] are discarded.
//!
//! The decoder does not own its handler, it borrows one for each call. Several decoders can run side by side over the
//! same input without sharing anything.

use heapless::Vec;
use midi_convert::midi_types::{Channel, Control, Note, Program, Value7};

/// Receives decoded MIDI messages
///
/// Every method defaults to doing nothing, implementors override only the messages they care about.
#[allow(unused_variables)]
pub trait MessageHandler {
    /// Note off, status `0x8n`
    fn note_off(&mut self, channel: Channel, note: Note, velocity: Value7) {}

    /// Note on, status `0x9n`. A velocity of zero is passed through as-is
    fn note_on(&mut self, channel: Channel, note: Note, velocity: Value7) {}

    /// Polyphonic key pressure, status `0xAn`
    fn polyphonic_key_pressure(&mut self, channel: Channel, note: Note, pressure: Value7) {}

    /// Control change, status `0xBn`
    fn control_change(&mut self, channel: Channel, control: Control, value: Value7) {}

    /// Program change, status `0xCn`
    fn program_change(&mut self, channel: Channel, program: Program) {}

    /// Channel pressure, status `0xDn`
    fn channel_pressure(&mut self, channel: Channel, pressure: Value7) {}

    /// Pitch bend change, status `0xEn`, the two 7-bit halves of the 14-bit bend value
    fn pitch_bend_change(&mut self, channel: Channel, lsb: Value7, msb: Value7) {}

    /// A complete system exclusive block, without the leading `0xF0` and the trailing `0xF7`
    fn system_exclusive(&mut self, data: &[u8]) {}
}

/// The states of the decoder are represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Idle,
    AwaitOneParam,
    AwaitTwoParam1,
    AwaitTwoParam2,
    RunningOneParam,
    RunningTwoParam,
    InSysEx,
}

impl DecoderState {
    /// `s.is_pending()` is true iff part of a channel message has been received but not yet dispatched
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            DecoderState::AwaitOneParam | DecoderState::AwaitTwoParam1 | DecoderState::AwaitTwoParam2
        )
    }
}

/// The classification of a single received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteEvent {
    /// High bit clear
    Data,
    /// Program change or channel pressure status
    Status1,
    /// Note off/on, poly pressure, control change or pitch bend status
    Status2,
    /// `0xF0`
    SysExStart,
    /// `0xF7`
    SysExEnd,
    /// Any other status byte, System Common and Real-Time are not supported
    Other,
}

impl ByteEvent {
    /// `ByteEvent::classify(b)` is the event byte `b` represents to the decoder
    pub fn classify(byte: u8) -> Self {
        if byte & 0x80 == 0 {
            return ByteEvent::Data;
        }

        match byte {
            SYSEX_START => ByteEvent::SysExStart,
            SYSEX_END => ByteEvent::SysExEnd,
            _ => match byte & 0xF0 {
                NOTE_OFF | NOTE_ON | POLY_PRESSURE | CONTROL_CHANGE | PITCH_BEND => ByteEvent::Status2,
                PROGRAM_CHANGE | CHANNEL_PRESSURE => ByteEvent::Status1,
                _ => ByteEvent::Other,
            },
        }
    }
}

/// A MIDI byte stream decoder is represented here
pub struct MidiDecoder {
    state: DecoderState,

    // the accumulated channel message
    status: u8,
    data1: u8,

    sysex: Vec<u8, SYSEX_BUFFER_LEN>,
}

impl Default for MidiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiDecoder {
    /// `MidiDecoder::new()` is a new decoder waiting for a status byte
    pub fn new() -> Self {
        Self {
            state: DecoderState::Idle,
            status: 0,
            data1: 0,
            sysex: Vec::new(),
        }
    }

    /// `d.parse(b, h)` feeds byte `b` to the decoder, calling into handler `h` if the byte completes a message
    ///
    /// # Examples
    ///
    /// ```
    /// use nano_midi::decoder::{MessageHandler, MidiDecoder};
    /// use nano_midi::midi_types::{Channel, Note, Value7};
    ///
    /// #[derive(Default)]
    /// struct LastNote(Option<u8>);
    ///
    /// impl MessageHandler for LastNote {
    ///     fn note_on(&mut self, _channel: Channel, note: Note, _velocity: Value7) {
    ///         self.0 = Some(note.into());
    ///     }
    /// }
    ///
    /// let mut decoder = MidiDecoder::new();
    /// let mut last = LastNote::default();
    ///
    /// decoder.parse(0x90, &mut last); // note-on, channel 0
    /// decoder.parse(60, &mut last);
    /// assert_eq!(last.0, None); // still waiting for the velocity
    ///
    /// decoder.parse(100, &mut last);
    /// assert_eq!(last.0, Some(60));
    /// ```
    pub fn parse<H: MessageHandler + ?Sized>(&mut self, byte: u8, handler: &mut H) {
        let event = ByteEvent::classify(byte);

        self.state = match (self.state, event) {
            // everything inside a sysex block is buffered until the terminator
            (DecoderState::InSysEx, ByteEvent::SysExEnd) => {
                handler.system_exclusive(&self.sysex);
                self.sysex.clear();
                DecoderState::Idle
            }
            (DecoderState::InSysEx, _) => {
                // bytes beyond the capacity are dropped
                self.sysex.push(byte).ok();
                DecoderState::InSysEx
            }

            // a status byte always starts a new message, dropping whatever was half received
            (state, ByteEvent::Status1 | ByteEvent::Status2 | ByteEvent::SysExStart) => {
                if state.is_pending() {
                    log::trace!("midi: {:#04X} interrupted {:?}, resynchronizing", byte, state);
                }
                self.start(byte, event)
            }

            (DecoderState::AwaitOneParam | DecoderState::RunningOneParam, ByteEvent::Data) => {
                self.dispatch_one_param(byte, handler);
                DecoderState::RunningOneParam
            }
            (DecoderState::AwaitTwoParam1 | DecoderState::RunningTwoParam, ByteEvent::Data) => {
                self.data1 = byte;
                DecoderState::AwaitTwoParam2
            }
            (DecoderState::AwaitTwoParam2, ByteEvent::Data) => {
                self.dispatch_two_param(byte, handler);
                DecoderState::RunningTwoParam
            }

            (DecoderState::Idle, _) => DecoderState::Idle,

            // anything else in the middle of a message throws the message away
            (state, _) => {
                log::trace!("midi: {:#04X} aborted {:?}, resynchronizing", byte, state);
                DecoderState::Idle
            }
        };
    }

    /// `d.parse_slice(bs, h)` feeds every byte in `bs` to the decoder in order
    pub fn parse_slice<H: MessageHandler + ?Sized>(&mut self, bytes: &[u8], handler: &mut H) {
        bytes.iter().for_each(|b| self.parse(*b, handler));
    }

    /// `d.state()` is the current state of the decoder
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// `d.pending_sysex()` is the part of a system exclusive block received so far
    ///
    /// Empty unless the decoder is in the middle of a block.
    pub fn pending_sysex(&self) -> &[u8] {
        &self.sysex
    }

    /// `d.reset()` forgets any partial message and running status
    pub fn reset(&mut self) {
        self.state = DecoderState::Idle;
        self.status = 0;
        self.data1 = 0;
        self.sysex.clear();
    }

    // the state entered on status byte `b`
    fn start(&mut self, byte: u8, event: ByteEvent) -> DecoderState {
        match event {
            ByteEvent::Status1 => {
                self.status = byte;
                DecoderState::AwaitOneParam
            }
            ByteEvent::Status2 => {
                self.status = byte;
                DecoderState::AwaitTwoParam1
            }
            _ => {
                self.sysex.clear();
                DecoderState::InSysEx
            }
        }
    }

    /// `d.dispatch_one_param(b, h)` completes a one data byte message with data byte `b`
    fn dispatch_one_param<H: MessageHandler + ?Sized>(&self, data: u8, handler: &mut H) {
        let channel = Channel::from(self.status & 0x0F);

        match self.status & 0xF0 {
            PROGRAM_CHANGE => {
                log::trace!("midi: program change {:?} {}", channel, data);
                handler.program_change(channel, Program::from(data));
            }
            CHANNEL_PRESSURE => handler.channel_pressure(channel, Value7::from(data)),
            _ => (),
        }
    }

    /// `d.dispatch_two_param(b, h)` completes a two data byte message with second data byte `b`
    fn dispatch_two_param<H: MessageHandler + ?Sized>(&self, data2: u8, handler: &mut H) {
        let channel = Channel::from(self.status & 0x0F);
        let data1 = self.data1;

        log::trace!("midi: {:#04X} {} {}", self.status, data1, data2);

        match self.status & 0xF0 {
            NOTE_OFF => handler.note_off(channel, Note::from(data1), Value7::from(data2)),
            NOTE_ON => handler.note_on(channel, Note::from(data1), Value7::from(data2)),
            POLY_PRESSURE => {
                handler.polyphonic_key_pressure(channel, Note::from(data1), Value7::from(data2))
            }
            CONTROL_CHANGE => {
                handler.control_change(channel, Control::from(data1), Value7::from(data2))
            }
            PITCH_BEND => {
                handler.pitch_bend_change(channel, Value7::from(data1), Value7::from(data2))
            }
            _ => (),
        }
    }
}

/// The maximum number of system exclusive bytes kept between `0xF0` and `0xF7`
pub const SYSEX_BUFFER_LEN: usize = 256;

// status nibbles of the channel voice messages
const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const POLY_PRESSURE: u8 = 0xA0;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;
const CHANNEL_PRESSURE: u8 = 0xD0;
const PITCH_BEND: u8 = 0xE0;

const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;
