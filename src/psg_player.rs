//! # YMZ294 PSG player
//!
//! Three square wave voices shared by all 16 MIDI channels, handed out first free first. With all three busy further
//! note-ons are dropped.
//!
//! Each MIDI channel has a [`PsgChannelSetting`] choosing whether it plays at all, whether it plays the tone or the
//! noise generator, and whether its loudness comes from the velocity or from the hardware envelope.
//!
//! Pitch bend rescales the tone period of every voice the bending channel is sounding, always starting from the unbent
//! period so repeated bends never drift.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use crate::ymz294::Mixer;

use crate::{
    bus::RegisterBus,
    channel_state::{ChannelState, ControlEvent, NUM_CHANNELS},
    driver::SoundDriver,
    error::{Error, Result},
    lookup_tables::tone_period,
    patch::PERCUSSION_CHANNEL,
    utils::{bent_tone_period, psg_level},
    voice_pool::VoicePool,
    ymz294::{self, Ymz294},
};

/// How one MIDI channel plays on the PSG
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsgChannelSetting {
    /// note-ons on a disabled channel are dropped
    pub enabled: bool,
    pub mixer: Mixer,
    /// use the hardware envelope instead of the velocity
    pub envelope: bool,
    /// in `[0x0..0xF]`
    pub envelope_shape: u8,
    pub envelope_period: u16,
    /// in `[0x00..0x1F]`
    pub noise_period: u8,
}

impl Default for PsgChannelSetting {
    fn default() -> Self {
        Self {
            enabled: true,
            mixer: Mixer::Tone,
            envelope: false,
            envelope_shape: DEFAULT_ENVELOPE_SHAPE,
            envelope_period: DEFAULT_ENVELOPE_PERIOD,
            noise_period: 0,
        }
    }
}

impl PsgChannelSetting {
    /// `PsgChannelSetting::percussion()` is the default setting of the percussion channel, noise with the envelope,
    /// but disabled
    pub fn percussion() -> Self {
        Self {
            enabled: false,
            mixer: Mixer::Noise,
            envelope: true,
            ..Self::default()
        }
    }

    /// `s.validate()` checks every field fits its register
    pub fn validate(&self) -> Result<()> {
        if self.envelope_shape > MAX_ENVELOPE_SHAPE {
            return Err(Error::OutOfRange {
                field: "envelope_shape",
                value: self.envelope_shape as u32,
                max: MAX_ENVELOPE_SHAPE as u32,
            });
        }
        if self.noise_period > MAX_NOISE_PERIOD {
            return Err(Error::OutOfRange {
                field: "noise_period",
                value: self.noise_period as u32,
                max: MAX_NOISE_PERIOD as u32,
            });
        }
        Ok(())
    }
}

/// The YMZ294 driver is represented here
#[derive(Debug, Clone)]
pub struct PsgPlayer {
    chip: Ymz294,
    voices: VoicePool<NUM_VOICES>,
    settings: [PsgChannelSetting; NUM_CHANNELS],
}

impl Default for PsgPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PsgPlayer {
    /// `PsgPlayer::new()` is a new player with the default setting on every channel
    pub fn new() -> Self {
        let mut settings = [PsgChannelSetting::default(); NUM_CHANNELS];
        settings[PERCUSSION_CHANNEL as usize] = PsgChannelSetting::percussion();

        Self {
            chip: Ymz294::new(),
            voices: VoicePool::new(),
            settings,
        }
    }

    /// `psg.setting(ch)` is the setting of MIDI channel `ch`
    ///
    /// # Errors
    ///
    /// * `InvalidChannel` - `ch` is not in `[0..15]`
    pub fn setting(&self, channel: u8) -> Result<PsgChannelSetting> {
        self.settings
            .get(channel as usize)
            .copied()
            .ok_or(Error::InvalidChannel(channel))
    }

    /// `psg.set_setting(ch, s)` replaces the setting of MIDI channel `ch`
    ///
    /// Voices already sounding keep playing the way they started.
    ///
    /// # Errors
    ///
    /// * `InvalidChannel` - `ch` is not in `[0..15]`
    ///
    /// * `OutOfRange` - a field of `s` doesn't fit its register
    pub fn set_setting(&mut self, channel: u8, setting: PsgChannelSetting) -> Result<()> {
        let slot = self
            .settings
            .get_mut(channel as usize)
            .ok_or(Error::InvalidChannel(channel))?;
        setting.validate()?;
        *slot = setting;
        Ok(())
    }

    fn setting_of(&self, channel: u8) -> &PsgChannelSetting {
        &self.settings[(channel & 0x0F) as usize]
    }
}

impl SoundDriver for PsgPlayer {
    fn init<B: RegisterBus>(&mut self, bus: &mut B) {
        self.chip.init(bus);
        self.voices.clear();
    }

    fn deinit<B: RegisterBus>(&mut self, bus: &mut B) {
        for voice in 0..NUM_VOICES {
            if self.voices.release(voice).is_some() {
                self.chip.silence(bus, voice as u8);
            }
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
        let setting = *self.setting_of(channel);
        if !setting.enabled {
            return;
        }

        let period = tone_period(note);
        let Some(voice) = self.voices.claim(channel, note, velocity, period) else {
            log::debug!("psg: no free voice, dropping note {} on channel {}", note, channel);
            return;
        };
        let voice = voice as u8;

        match setting.mixer {
            Mixer::Tone => self.chip.set_tone_period(bus, voice, period),
            Mixer::Noise => self.chip.set_noise_period(bus, setting.noise_period),
        }
        self.chip.route(bus, voice, setting.mixer);

        if setting.envelope {
            self.chip
                .trigger_envelope(bus, voice, setting.envelope_period, setting.envelope_shape);
        } else {
            self.chip
                .set_level(bus, voice, psg_level(velocity, state.expression()));
        }
    }

    fn note_off<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, note: u8) {
        if let Some((voice, _)) = self.voices.release_note(channel, note) {
            self.chip.silence(bus, voice as u8);
        }
    }

    fn control<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, event: ControlEvent, state: &ChannelState) {
        match event {
            // the level doesn't depend on the channel volume
            ControlEvent::Volume => (),
            ControlEvent::Expression => {
                // enveloped voices aren't ours to set
                if self.setting_of(channel).envelope {
                    return;
                }
                for (voice, slot) in self.voices.sounding_on_channel(channel) {
                    self.chip
                        .set_level(bus, voice as u8, psg_level(slot.velocity, state.expression()));
                }
            }
            ControlEvent::AllSoundOff | ControlEvent::AllNotesOff | ControlEvent::ResetAllControllers => {
                for (voice, _) in self.voices.release_channel(channel) {
                    self.chip.silence(bus, voice as u8);
                }
            }
            ControlEvent::PitchBendSensitivity | ControlEvent::None => (),
        }
    }

    fn pitch_bend<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, value: u16, state: &ChannelState) {
        let sensitivity = state.pitch_bend_sensitivity();

        for (voice, slot) in self.voices.sounding_on_channel(channel) {
            let voice = voice as u8;
            if self.chip.routing(voice) == Mixer::Noise {
                continue;
            }
            let period = bent_tone_period(slot.frequency_code, sensitivity, value);
            self.chip.set_tone_period(bus, voice, period);
        }
    }

    fn sounding_voices(&self) -> usize {
        self.voices.sounding()
    }
}

const NUM_VOICES: usize = ymz294::NUM_VOICES as usize;

const MAX_ENVELOPE_SHAPE: u8 = 0x0F;
const MAX_NOISE_PERIOD: u8 = 0x1F;

const DEFAULT_ENVELOPE_SHAPE: u8 = 0x09;
// about 1 Hz
const DEFAULT_ENVELOPE_PERIOD: u16 = 0x1E85;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::RecordingBus;
    use crate::channel_state::{CC_ALL_SOUND_OFF, CC_EXPRESSION, CC_VOLUME};

    fn player() -> (PsgPlayer, RecordingBus) {
        let mut psg = PsgPlayer::new();
        let mut bus = RecordingBus::new();
        psg.init(&mut bus);
        bus.clear();
        (psg, bus)
    }

    #[test]
    fn default_settings() {
        let psg = PsgPlayer::new();
        let s = psg.setting(0).unwrap();
        assert!(s.enabled);
        assert_eq!(s.mixer, Mixer::Tone);
        assert!(!s.envelope);
        assert_eq!(s.envelope_shape, 0x09);
        assert_eq!(s.envelope_period, 0x1E85);

        let p = psg.setting(9).unwrap();
        assert!(!p.enabled);
        assert_eq!(p.mixer, Mixer::Noise);
        assert!(p.envelope);
    }

    #[test]
    fn settings_are_validated() {
        let mut psg = PsgPlayer::new();
        assert_eq!(psg.setting(16), Err(Error::InvalidChannel(16)));
        assert_eq!(
            psg.set_setting(16, PsgChannelSetting::default()),
            Err(Error::InvalidChannel(16))
        );

        let bad = PsgChannelSetting {
            noise_period: 0x20,
            ..PsgChannelSetting::default()
        };
        assert!(matches!(
            psg.set_setting(3, bad),
            Err(Error::OutOfRange {
                field: "noise_period",
                ..
            })
        ));

        let bad = PsgChannelSetting {
            envelope_shape: 0x10,
            ..PsgChannelSetting::default()
        };
        assert!(psg.set_setting(3, bad).is_err());

        // nothing changed
        assert_eq!(psg.setting(3), Ok(PsgChannelSetting::default()));
    }

    #[test]
    fn note_on_writes_period_and_level() {
        let (mut psg, mut bus) = player();
        psg.note_on(&mut bus, 0, 69, 127, &ChannelState::new());

        let period = tone_period(69);
        assert_eq!(
            bus.writes(),
            [
                (0x01, (period >> 8) as u8),
                (0x00, (period & 0xFF) as u8),
                (0x08, 15),
            ]
        );
    }

    #[test]
    fn fourth_note_is_dropped() {
        let (mut psg, mut bus) = player();
        let state = ChannelState::new();
        for note in 60..64 {
            psg.note_on(&mut bus, 0, note, 100, &state);
        }
        assert_eq!(psg.sounding_voices(), 3);
    }

    #[test]
    fn disabled_channel_is_silent() {
        let (mut psg, mut bus) = player();
        psg.note_on(&mut bus, 9, 38, 100, &ChannelState::new());
        assert_eq!(psg.sounding_voices(), 0);
        assert!(bus.ops.is_empty());
    }

    #[test]
    fn enabled_percussion_plays_noise_with_the_envelope() {
        let (mut psg, mut bus) = player();
        let setting = PsgChannelSetting {
            enabled: true,
            noise_period: 0x10,
            ..PsgChannelSetting::percussion()
        };
        psg.set_setting(9, setting).unwrap();

        psg.note_on(&mut bus, 9, 38, 100, &ChannelState::new());
        assert_eq!(
            bus.writes(),
            [
                (0x06, 0x10),
                (0x07, 0x31),
                (0x0B, 0x85),
                (0x0C, 0x1E),
                (0x08, 0x10),
                (0x0D, 0x09),
            ]
        );
    }

    #[test]
    fn note_off_silences_the_voice() {
        let (mut psg, mut bus) = player();
        let state = ChannelState::new();
        psg.note_on(&mut bus, 0, 60, 100, &state);
        psg.note_on(&mut bus, 0, 64, 100, &state);
        bus.clear();

        psg.note_off(&mut bus, 0, 64);
        assert_eq!(bus.writes(), [(0x09, 0)]);
        assert_eq!(psg.sounding_voices(), 1);
    }

    #[test]
    fn centered_bend_restores_the_table_period() {
        let (mut psg, mut bus) = player();
        let state = ChannelState::new();
        psg.note_on(&mut bus, 2, 60, 100, &state);
        psg.pitch_bend(&mut bus, 2, 16383, &state);
        bus.clear();

        psg.pitch_bend(&mut bus, 2, 8192, &state);
        let period = tone_period(60);
        assert_eq!(
            bus.writes(),
            [(0x01, (period >> 8) as u8), (0x00, (period & 0xFF) as u8)]
        );
    }

    #[test]
    fn bend_moves_every_voice_on_the_channel() {
        let (mut psg, mut bus) = player();
        let state = ChannelState::new();
        psg.note_on(&mut bus, 1, 60, 100, &state);
        psg.note_on(&mut bus, 2, 62, 100, &state);
        psg.note_on(&mut bus, 1, 64, 100, &state);
        bus.clear();

        psg.pitch_bend(&mut bus, 1, 12000, &state);
        let touched: std::vec::Vec<u8> = bus.writes().iter().map(|(a, _)| *a).collect();
        assert_eq!(touched, [0x01, 0x00, 0x05, 0x04]);
    }

    #[test]
    fn expression_rescales_sounding_voices() {
        let (mut psg, mut bus) = player();
        let mut state = ChannelState::new();
        psg.note_on(&mut bus, 0, 60, 127, &state);
        bus.clear();

        let event = state.apply_control_change(CC_EXPRESSION, 0);
        psg.control(&mut bus, 0, event, &state);
        assert_eq!(bus.writes(), [(0x08, 0)]);
    }

    #[test]
    fn channel_volume_leaves_levels_alone() {
        let (mut psg, mut bus) = player();
        let mut state = ChannelState::new();
        psg.note_on(&mut bus, 0, 60, 127, &state);
        bus.clear();

        let event = state.apply_control_change(CC_VOLUME, 10);
        assert_eq!(event, ControlEvent::Volume);
        psg.control(&mut bus, 0, event, &state);
        assert!(bus.ops.is_empty());
    }

    #[test]
    fn bend_skips_voices_on_the_noise_generator() {
        let (mut psg, mut bus) = player();
        let state = ChannelState::new();
        psg.note_on(&mut bus, 2, 60, 100, &state);

        let noise = PsgChannelSetting {
            mixer: Mixer::Noise,
            ..PsgChannelSetting::default()
        };
        psg.set_setting(2, noise).unwrap();
        psg.note_on(&mut bus, 2, 62, 100, &state);
        assert_eq!(psg.sounding_voices(), 2);
        bus.clear();

        psg.pitch_bend(&mut bus, 2, 12000, &state);
        let touched: std::vec::Vec<u8> = bus.writes().iter().map(|(a, _)| *a).collect();
        assert_eq!(touched, [0x01, 0x00]);
    }

    #[test]
    fn all_sound_off_silences_only_its_channel() {
        let (mut psg, mut bus) = player();
        let mut state = ChannelState::new();
        psg.note_on(&mut bus, 0, 60, 100, &state);
        psg.note_on(&mut bus, 1, 62, 100, &state);
        psg.note_on(&mut bus, 0, 64, 100, &state);
        bus.clear();

        let event = state.apply_control_change(CC_ALL_SOUND_OFF, 0);
        psg.control(&mut bus, 1, event, &state);
        assert_eq!(bus.writes(), [(0x09, 0)]);
        assert_eq!(psg.sounding_voices(), 2);

        // the freed voice is the one handed out next
        psg.note_on(&mut bus, 3, 67, 100, &state);
        let period = tone_period(67);
        assert_eq!(bus.writes()[1], (0x03, (period >> 8) as u8));
    }

    #[test]
    fn all_notes_off_only_releases_its_channel() {
        let (mut psg, mut bus) = player();
        let state = ChannelState::new();
        psg.note_on(&mut bus, 0, 60, 100, &state);
        psg.note_on(&mut bus, 1, 62, 100, &state);
        psg.note_on(&mut bus, 0, 64, 100, &state);
        bus.clear();

        psg.control(&mut bus, 0, ControlEvent::AllNotesOff, &state);
        assert_eq!(bus.writes(), [(0x08, 0), (0x0A, 0)]);
        assert_eq!(psg.sounding_voices(), 1);
    }
}
