//! # Engine
//!
//! The engine is the whole sound module behind one register bus: a MIDI decoder, the state of all 16 channels, and
//! the three sound drivers, one of which is active at a time.
//!
//! Bytes go in through [`Engine::play`]. Complete messages update the channel state first and are then handed to the
//! active driver, so a driver always sees controller values that already include the message it is reacting to.
//!
//! Switching drivers releases everything the old driver was playing and powers the chip up for the new one. The
//! decoder and the channel state carry over untouched, as do the settings of the inactive drivers.
//!
//! # Example
//!
//! ```
//! use nano_midi::{
//!     bus::RegisterBus,
//!     engine::{DriverKind, Engine, MidiSink},
//!     patch::{PatchTable, PATCH_LEN},
//! };
//!
//! #[derive(Default)]
//! struct CountingBus(usize);
//!
//! impl RegisterBus for CountingBus {
//!     fn write_burst(&mut self, _address: u8, _data: &[u8]) {
//!         self.0 += 1;
//!     }
//!     fn read(&mut self, _address: u8) -> u8 {
//!         0
//!     }
//! }
//!
//! static PATCHES: PatchTable = [[0; PATCH_LEN]; 128];
//!
//! let mut fm = Engine::new(CountingBus::default(), DriverKind::Mode4, &PATCHES);
//! let mut psg = Engine::new(CountingBus::default(), DriverKind::Psg, &PATCHES);
//!
//! // one stream, two chips
//! (&mut fm, &mut psg).play(&[0x90, 69, 100]);
//! assert_eq!(fm.sounding_voices(), 1);
//! assert_eq!(psg.sounding_voices(), 1);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use midi_convert::midi_types::{Channel, Control, Note, Program, Value7};

use crate::{
    bus::RegisterBus,
    channel_state::{ChannelState, ChannelStates, ControlEvent},
    decoder::{MessageHandler, MidiDecoder},
    driver::SoundDriver,
    error::{Error, Result},
    mode4::{Mode4Config, Mode4Driver},
    music_box::{MusicBoxConfig, MusicBoxDriver},
    patch::PatchTable,
    psg_player::{PsgChannelSetting, PsgPlayer},
    utils::bend_value,
    ymf825, ymz294,
};

/// The sound drivers an engine can run
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverKind {
    /// YMF825, one voice per MIDI channel
    #[default]
    Mode4,
    /// YMF825, one melodic and one percussive voice
    MusicBox,
    /// YMZ294, three voices shared by all channels
    Psg,
}

impl DriverKind {
    fn name(self) -> &'static str {
        match self {
            DriverKind::Mode4 => "mode4",
            DriverKind::MusicBox => "music box",
            DriverKind::Psg => "psg",
        }
    }
}

/// Anything MIDI bytes can be played into
pub trait MidiSink {
    fn play(&mut self, bytes: &[u8]);
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    fn play(&mut self, bytes: &[u8]) {
        (**self).play(bytes)
    }
}

/// A pair of sinks plays the same bytes into both, first then second
impl<A: MidiSink, C: MidiSink> MidiSink for (A, C) {
    fn play(&mut self, bytes: &[u8]) {
        self.0.play(bytes);
        self.1.play(bytes);
    }
}

/// A sound module driving one chip is represented here
pub struct Engine<'a, B: RegisterBus> {
    bus: B,
    decoder: MidiDecoder,
    channels: ChannelStates,
    drivers: Drivers<'a>,
}

impl<'a, B: RegisterBus> Engine<'a, B> {
    /// `Engine::new(bus, kind, patches)` is a new engine running the `kind` driver on `bus`
    ///
    /// The chip is initialized right away. The FM drivers load their tones from `patches`.
    pub fn new(bus: B, kind: DriverKind, patches: &'a PatchTable) -> Self {
        let mut engine = Self {
            bus,
            decoder: MidiDecoder::new(),
            channels: ChannelStates::new(),
            drivers: Drivers {
                active: kind,
                mode4: Mode4Driver::new(patches),
                music_box: MusicBoxDriver::new(patches),
                psg: PsgPlayer::new(),
            },
        };
        engine.drivers.init(&mut engine.bus);
        engine
    }

    /// `e.play(bytes)` feeds raw MIDI bytes through the decoder into the active driver
    ///
    /// Messages may be split across calls.
    pub fn play(&mut self, bytes: &[u8]) {
        let mut dispatch = Dispatch {
            bus: &mut self.bus,
            channels: &mut self.channels,
            drivers: &mut self.drivers,
        };
        self.decoder.parse_slice(bytes, &mut dispatch);
    }

    /// `e.switch_driver(kind)` tears down the active driver and initializes `kind` in its place
    ///
    /// Switching to the driver that is already active re-initializes it.
    pub fn switch_driver(&mut self, kind: DriverKind) {
        log::debug!("engine: switching from {} to {}", self.drivers.active.name(), kind.name());

        self.drivers.deinit(&mut self.bus);
        self.drivers.active = kind;
        self.drivers.init(&mut self.bus);
    }

    /// `e.driver_kind()` is the driver currently receiving MIDI
    pub fn driver_kind(&self) -> DriverKind {
        self.drivers.active
    }

    /// `e.channels()` is the performance state of every MIDI channel
    pub fn channels(&self) -> &ChannelStates {
        &self.channels
    }

    /// `e.sounding_voices()` is the number of voices the active driver is playing
    pub fn sounding_voices(&self) -> usize {
        self.drivers.sounding_voices()
    }

    /// `e.psg_setting(ch)` is the PSG setting of MIDI channel `ch`
    ///
    /// # Errors
    ///
    /// * `WrongDriver` - the PSG driver isn't active
    ///
    /// * `InvalidChannel` - `ch` is not in `[0..15]`
    pub fn psg_setting(&self, channel: u8) -> Result<PsgChannelSetting> {
        self.expect_driver(DriverKind::Psg)?;
        self.drivers.psg.setting(channel)
    }

    /// `e.set_psg_setting(ch, s)` replaces the PSG setting of MIDI channel `ch`
    ///
    /// # Errors
    ///
    /// * `WrongDriver` - the PSG driver isn't active
    ///
    /// * `InvalidChannel` - `ch` is not in `[0..15]`
    ///
    /// * `OutOfRange` - a field of `s` doesn't fit its register, nothing is changed
    pub fn set_psg_setting(&mut self, channel: u8, setting: PsgChannelSetting) -> Result<()> {
        self.expect_driver(DriverKind::Psg)?;
        self.drivers
            .psg
            .set_setting(channel, setting)
            .inspect_err(|e| log::warn!("engine: rejected psg setting for channel {}: {}", channel, e))
    }

    /// # Errors
    ///
    /// * `WrongDriver` - the music box driver isn't active
    pub fn music_box_config(&self) -> Result<MusicBoxConfig> {
        self.expect_driver(DriverKind::MusicBox)?;
        Ok(self.drivers.music_box.config())
    }

    /// `e.set_music_box_config(c)` changes the music box settings, reloading its tones if the program changed
    ///
    /// # Errors
    ///
    /// * `WrongDriver` - the music box driver isn't active
    ///
    /// * `InvalidProgram` - the program is outside `[1..128]`, nothing is changed
    pub fn set_music_box_config(&mut self, config: MusicBoxConfig) -> Result<()> {
        self.expect_driver(DriverKind::MusicBox)?;
        self.drivers
            .music_box
            .set_config(&mut self.bus, config)
            .inspect_err(|e| log::warn!("engine: rejected music box config: {}", e))
    }

    /// # Errors
    ///
    /// * `WrongDriver` - the mode4 driver isn't active
    pub fn mode4_config(&self) -> Result<Mode4Config> {
        self.expect_driver(DriverKind::Mode4)?;
        Ok(self.drivers.mode4.config())
    }

    /// # Errors
    ///
    /// * `WrongDriver` - the mode4 driver isn't active
    pub fn set_mode4_config(&mut self, config: Mode4Config) -> Result<()> {
        self.expect_driver(DriverKind::Mode4)?;
        self.drivers.mode4.set_config(config);
        Ok(())
    }

    /// `e.passthrough(bytes)` sends raw register traffic to the chip of the active driver
    ///
    /// The driver isn't told, so its idea of the chip may no longer hold afterwards.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(value))` - a YMF825 register was read
    ///
    /// * `Ok(None)` - the bytes were written
    ///
    /// * `Err(MissingRegisterData)` - a YMF825 write without data
    pub fn passthrough(&mut self, bytes: &[u8]) -> Result<Option<u8>> {
        match self.drivers.active {
            DriverKind::Mode4 | DriverKind::MusicBox => ymf825::passthrough(&mut self.bus, bytes),
            DriverKind::Psg => ymz294::passthrough(&mut self.bus, bytes),
        }
    }

    /// `e.bus()` is the register bus the engine writes to
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// `e.into_bus()` gives the bus back, leaving the chip as it is
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn expect_driver(&self, kind: DriverKind) -> Result<()> {
        if self.drivers.active == kind {
            Ok(())
        } else {
            Err(Error::WrongDriver {
                expected: kind.name(),
            })
        }
    }
}

impl<'a, B: RegisterBus> MidiSink for Engine<'a, B> {
    fn play(&mut self, bytes: &[u8]) {
        Engine::play(self, bytes)
    }
}

// every driver, with the active one receiving the traffic
#[derive(Debug, Clone)]
struct Drivers<'a> {
    active: DriverKind,
    mode4: Mode4Driver<'a>,
    music_box: MusicBoxDriver<'a>,
    psg: PsgPlayer,
}

impl<'a> SoundDriver for Drivers<'a> {
    fn init<B: RegisterBus>(&mut self, bus: &mut B) {
        match self.active {
            DriverKind::Mode4 => self.mode4.init(bus),
            DriverKind::MusicBox => self.music_box.init(bus),
            DriverKind::Psg => self.psg.init(bus),
        }
    }

    fn deinit<B: RegisterBus>(&mut self, bus: &mut B) {
        match self.active {
            DriverKind::Mode4 => self.mode4.deinit(bus),
            DriverKind::MusicBox => self.music_box.deinit(bus),
            DriverKind::Psg => self.psg.deinit(bus),
        }
    }

    fn note_on<B: RegisterBus>(
        &mut self,
        bus: &mut B,
        channel: u8,
        note: u8,
        velocity: u8,
        state: &ChannelState,
    ) {
        match self.active {
            DriverKind::Mode4 => self.mode4.note_on(bus, channel, note, velocity, state),
            DriverKind::MusicBox => self.music_box.note_on(bus, channel, note, velocity, state),
            DriverKind::Psg => self.psg.note_on(bus, channel, note, velocity, state),
        }
    }

    fn note_off<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, note: u8) {
        match self.active {
            DriverKind::Mode4 => self.mode4.note_off(bus, channel, note),
            DriverKind::MusicBox => self.music_box.note_off(bus, channel, note),
            DriverKind::Psg => self.psg.note_off(bus, channel, note),
        }
    }

    fn control<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, event: ControlEvent, state: &ChannelState) {
        match self.active {
            DriverKind::Mode4 => self.mode4.control(bus, channel, event, state),
            DriverKind::MusicBox => self.music_box.control(bus, channel, event, state),
            DriverKind::Psg => self.psg.control(bus, channel, event, state),
        }
    }

    fn program_change<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, program: u8) {
        match self.active {
            DriverKind::Mode4 => self.mode4.program_change(bus, channel, program),
            DriverKind::MusicBox => self.music_box.program_change(bus, channel, program),
            DriverKind::Psg => self.psg.program_change(bus, channel, program),
        }
    }

    fn pitch_bend<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, value: u16, state: &ChannelState) {
        match self.active {
            DriverKind::Mode4 => self.mode4.pitch_bend(bus, channel, value, state),
            DriverKind::MusicBox => self.music_box.pitch_bend(bus, channel, value, state),
            DriverKind::Psg => self.psg.pitch_bend(bus, channel, value, state),
        }
    }

    fn sounding_voices(&self) -> usize {
        match self.active {
            DriverKind::Mode4 => self.mode4.sounding_voices(),
            DriverKind::MusicBox => self.music_box.sounding_voices(),
            DriverKind::Psg => self.psg.sounding_voices(),
        }
    }
}

// routes decoded messages through the channel state into the drivers
struct Dispatch<'r, 'a, B> {
    bus: &'r mut B,
    channels: &'r mut ChannelStates,
    drivers: &'r mut Drivers<'a>,
}

impl<'r, 'a, B: RegisterBus> MessageHandler for Dispatch<'r, 'a, B> {
    fn note_off(&mut self, channel: Channel, note: Note, _velocity: Value7) {
        self.drivers.note_off(&mut *self.bus, channel.into(), note.into());
    }

    fn note_on(&mut self, channel: Channel, note: Note, velocity: Value7) {
        let channel = u8::from(channel);

        match u8::from(velocity) {
            0 => self.drivers.note_off(&mut *self.bus, channel, note.into()),
            velocity => self.drivers.note_on(
                &mut *self.bus,
                channel,
                note.into(),
                velocity,
                self.channels.get(channel),
            ),
        }
    }

    fn control_change(&mut self, channel: Channel, control: Control, value: Value7) {
        let channel = u8::from(channel);
        let event = self
            .channels
            .get_mut(channel)
            .apply_control_change(control.into(), value.into());

        if event != ControlEvent::None {
            self.drivers
                .control(&mut *self.bus, channel, event, self.channels.get(channel));
        }
    }

    fn program_change(&mut self, channel: Channel, program: Program) {
        self.drivers
            .program_change(&mut *self.bus, channel.into(), program.into());
    }

    fn pitch_bend_change(&mut self, channel: Channel, lsb: Value7, msb: Value7) {
        let channel = u8::from(channel);
        let value = bend_value(lsb.into(), msb.into());
        self.drivers
            .pitch_bend(&mut *self.bus, channel, value, self.channels.get(channel));
    }
}
