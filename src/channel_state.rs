//! # Channel Performance State
//!
//! MIDI's wire format is compact, a lot of the state needed to play a note correctly is set up by earlier control
//! changes: the registered parameter being addressed, the data entered into it, channel volume and expression.
//!
//! This module keeps that state for each of the 16 MIDI channels and interprets the control changes that modify it.
//! Drivers read the state when they play notes, and react to the [`ControlEvent`]s it reports.

/// The number of MIDI channels
pub const NUM_CHANNELS: usize = 16;

/// The registered parameter number which addresses no parameter at all
pub const RPN_NULL: u16 = 0x7F7F;

/// The registered parameter number of the pitch bend sensitivity
pub const RPN_PITCH_BEND_SENSITIVITY: u16 = 0x0000;

/// A parameter split into two 7-bit halves is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterPair {
    pub msb: u8,
    pub lsb: u8,
}

impl ParameterPair {
    /// `p.value()` is the pair combined as `msb << 8 | lsb`
    pub fn value(&self) -> u16 {
        (self.msb as u16) << 8 | self.lsb as u16
    }
}

/// What a control change did to a channel, so a driver knows what to update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// CC 7 changed the channel volume
    Volume,
    /// CC 11 changed the expression
    Expression,
    /// Data entry changed the pitch bend sensitivity
    PitchBendSensitivity,
    /// CC 120
    AllSoundOff,
    /// CC 121, the channel state has already been reset
    ResetAllControllers,
    /// CC 123
    AllNotesOff,
    /// The state changed (or not) but no driver needs to react
    None,
}

/// The performance state of one MIDI channel is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    rpn: ParameterPair,
    data_entry: ParameterPair,
    pitch_bend_sensitivity: u8,
    volume: u8,
    expression: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelState {
    /// `ChannelState::new()` is a channel state with every controller at its default
    pub fn new() -> Self {
        Self {
            rpn: ParameterPair {
                msb: (RPN_NULL >> 8) as u8,
                lsb: (RPN_NULL & 0xFF) as u8,
            },
            data_entry: ParameterPair { msb: 0, lsb: 0 },
            pitch_bend_sensitivity: DEFAULT_PITCH_BEND_SENSITIVITY,
            volume: DEFAULT_VOLUME,
            expression: DEFAULT_EXPRESSION,
        }
    }

    /// `cs.reset()` puts every controller back to its default
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// `cs.apply_control_change(cc, v)` updates the state for control change `cc` with value `v`
    ///
    /// # Returns
    ///
    /// * `ControlEvent` - what the control change means for a driver
    ///
    /// # Examples
    ///
    /// ```
    /// use nano_midi::channel_state::{ChannelState, ControlEvent};
    ///
    /// let mut cs = ChannelState::new();
    ///
    /// // select RPN 0 (pitch bend sensitivity) then enter 12 semitones
    /// cs.apply_control_change(101, 0);
    /// cs.apply_control_change(100, 0);
    /// assert_eq!(cs.apply_control_change(6, 12), ControlEvent::PitchBendSensitivity);
    ///
    /// assert_eq!(cs.pitch_bend_sensitivity(), 12);
    /// ```
    pub fn apply_control_change(&mut self, control: u8, value: u8) -> ControlEvent {
        let value = value & 0x7F;

        match control {
            CC_DATA_ENTRY_MSB => {
                self.data_entry.msb = value;
                self.apply_data_entry()
            }
            CC_DATA_ENTRY_LSB => {
                self.data_entry.lsb = value;
                self.apply_data_entry()
            }
            CC_VOLUME => {
                self.volume = value;
                ControlEvent::Volume
            }
            CC_EXPRESSION => {
                self.expression = value;
                ControlEvent::Expression
            }
            CC_RPN_LSB => {
                self.rpn.lsb = value;
                ControlEvent::None
            }
            CC_RPN_MSB => {
                self.rpn.msb = value;
                ControlEvent::None
            }
            CC_ALL_SOUND_OFF => ControlEvent::AllSoundOff,
            CC_RESET_ALL_CONTROLLERS => {
                self.reset();
                ControlEvent::ResetAllControllers
            }
            CC_ALL_NOTES_OFF => ControlEvent::AllNotesOff,
            _ => ControlEvent::None, // ignore all other MIDI CC messages
        }
    }

    /// `cs.apply_data_entry()` applies the data entry registers to the currently addressed RPN
    fn apply_data_entry(&mut self) -> ControlEvent {
        match self.rpn.value() {
            RPN_PITCH_BEND_SENSITIVITY => {
                // only whole semitones, the cents in the LSB are not used
                self.pitch_bend_sensitivity = self.data_entry.msb;
                ControlEvent::PitchBendSensitivity
            }
            _ => ControlEvent::None, // RPN NULL, or a parameter we don't implement
        }
    }

    /// `cs.rpn()` is the currently addressed registered parameter number
    pub fn rpn(&self) -> ParameterPair {
        self.rpn
    }

    /// `cs.data_entry()` is the last value written by data entry
    pub fn data_entry(&self) -> ParameterPair {
        self.data_entry
    }

    /// `cs.pitch_bend_sensitivity()` is the pitch bend range in semitones
    pub fn pitch_bend_sensitivity(&self) -> u8 {
        self.pitch_bend_sensitivity
    }

    /// `cs.volume()` is the channel volume in `[0..127]`
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// `cs.expression()` is the expression in `[0..127]`
    pub fn expression(&self) -> u8 {
        self.expression
    }
}

/// The state of all 16 MIDI channels
#[derive(Debug, Clone)]
pub struct ChannelStates {
    channels: [ChannelState; NUM_CHANNELS],
}

impl Default for ChannelStates {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelStates {
    pub fn new() -> Self {
        Self {
            channels: [ChannelState::new(); NUM_CHANNELS],
        }
    }

    /// `cs.get(ch)` is the state of channel `ch`, the channel is masked to `[0..15]`
    pub fn get(&self, channel: u8) -> &ChannelState {
        &self.channels[(channel & 0x0F) as usize]
    }

    /// `cs.get_mut(ch)` is the mutable state of channel `ch`, the channel is masked to `[0..15]`
    pub fn get_mut(&mut self, channel: u8) -> &mut ChannelState {
        &mut self.channels[(channel & 0x0F) as usize]
    }

    pub fn reset_all(&mut self) {
        self.channels.iter_mut().for_each(|c| c.reset());
    }
}

// the MIDI CCs we respond to
pub const CC_DATA_ENTRY_MSB: u8 = 6;
pub const CC_VOLUME: u8 = 7;
pub const CC_EXPRESSION: u8 = 11;
pub const CC_DATA_ENTRY_LSB: u8 = 38;
pub const CC_RPN_LSB: u8 = 100;
pub const CC_RPN_MSB: u8 = 101;
pub const CC_ALL_SOUND_OFF: u8 = 120;
pub const CC_RESET_ALL_CONTROLLERS: u8 = 121;
pub const CC_ALL_NOTES_OFF: u8 = 123;

const DEFAULT_PITCH_BEND_SENSITIVITY: u8 = 2;
const DEFAULT_VOLUME: u8 = 64;
const DEFAULT_EXPRESSION: u8 = 127;
