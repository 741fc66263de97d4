//! # YMF825 with one voice per MIDI channel
//!
//! The YMF825 has 16 voices and MIDI has 16 channels, so each channel simply gets the voice with the same index.
//! There is no allocation and no contention. Each voice has its own tone, loaded by program change.
//!
//! A voice only plays one note at a time, so a note-off for any note on a channel releases that channel's voice.
//!
//! Channel 10 (index 9) plays a fixed noise patch for percussion unless [`Mode4Config::fixed_percussion`] is turned
//! off.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    bus::RegisterBus,
    channel_state::{ChannelState, ControlEvent},
    driver::SoundDriver,
    lookup_tables::fm_note,
    patch::{Patch, PatchTable, MODE4_PERCUSSION, PERCUSSION_CHANNEL},
    utils::{bend_ratio, fm_pitch_register, fm_volumes, FmPitch, FmVolumes},
    voice_pool::VoicePool,
    ymf825,
};

/// Settings of the one voice per channel driver
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode4Config {
    /// channel 10 keeps its noise patch and ignores program changes
    pub fixed_percussion: bool,
}

impl Default for Mode4Config {
    fn default() -> Self {
        Self {
            fixed_percussion: true,
        }
    }
}

/// The one voice per channel YMF825 driver is represented here
#[derive(Debug, Clone)]
pub struct Mode4Driver<'a> {
    patches: &'a PatchTable,
    tones: [Patch; NUM_VOICES],
    voices: VoicePool<NUM_VOICES>,
    config: Mode4Config,
}

impl<'a> Mode4Driver<'a> {
    /// `Mode4Driver::new(patches)` is a new driver that loads tones from `patches`
    pub fn new(patches: &'a PatchTable) -> Self {
        let mut driver = Self {
            patches,
            tones: [patches[0]; NUM_VOICES],
            voices: VoicePool::new(),
            config: Mode4Config::default(),
        };
        driver.tones[PERCUSSION_CHANNEL as usize] = MODE4_PERCUSSION;
        driver
    }

    /// `d.config()` is the current settings of the driver
    pub fn config(&self) -> Mode4Config {
        self.config
    }

    /// `d.set_config(c)` changes the settings, they apply from the next program change or controller reset on
    pub fn set_config(&mut self, config: Mode4Config) {
        self.config = config;
    }

    /// `d.tone(ch)` is the tone currently loaded for channel `ch`
    pub fn tone(&self, channel: u8) -> &Patch {
        &self.tones[(channel & 0x0F) as usize]
    }

    // the tone a channel falls back to when its controllers are reset
    fn default_tone(&self, channel: u8) -> Patch {
        if channel == PERCUSSION_CHANNEL && self.config.fixed_percussion {
            MODE4_PERCUSSION
        } else {
            self.patches[0]
        }
    }

    // key off the voice and put it back to its default tone, silent and unbent
    fn reset_voice<B: RegisterBus>(&mut self, bus: &mut B, channel: u8) {
        ymf825::select_voice(bus, channel);
        ymf825::key_off(bus, channel);
        self.voices.release(channel as usize);

        self.tones[channel as usize] = self.default_tone(channel);

        ymf825::set_volumes(bus, SILENT);
        ymf825::set_pitch(bus, FmPitch::UNITY);
    }

    fn release<B: RegisterBus>(&mut self, bus: &mut B, channel: u8) {
        ymf825::select_voice(bus, channel);
        ymf825::key_off(bus, channel);
        self.voices.release(channel as usize);
    }
}

impl<'a> SoundDriver for Mode4Driver<'a> {
    fn init<B: RegisterBus>(&mut self, bus: &mut B) {
        ymf825::init(bus);
        for channel in 0..NUM_VOICES as u8 {
            self.reset_voice(bus, channel);
        }
        ymf825::set_tone_parameters(bus, &self.tones);
    }

    fn deinit<B: RegisterBus>(&mut self, bus: &mut B) {
        for channel in 0..NUM_VOICES as u8 {
            if self.voices.slot(channel as usize).is_some() {
                self.release(bus, channel);
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
        let channel = voice_for(channel);
        let fnum = fm_note(note);

        ymf825::select_voice(bus, channel);
        ymf825::set_volumes(bus, fm_volumes(velocity, state.volume(), state.expression()));
        ymf825::set_note(bus, fnum);
        ymf825::key_on(bus, channel);

        self.voices
            .assign(channel as usize, channel, note, velocity, fnum.fnum);
    }

    fn note_off<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, _note: u8) {
        self.release(bus, voice_for(channel));
    }

    fn control<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, event: ControlEvent, state: &ChannelState) {
        let channel = voice_for(channel);

        match event {
            ControlEvent::Volume | ControlEvent::Expression => {
                if let Some(slot) = self.voices.slot(channel as usize) {
                    let volumes = fm_volumes(slot.velocity, state.volume(), state.expression());
                    ymf825::select_voice(bus, channel);
                    ymf825::set_volumes(bus, volumes);
                }
            }
            ControlEvent::AllSoundOff | ControlEvent::AllNotesOff => self.release(bus, channel),
            ControlEvent::ResetAllControllers => {
                self.reset_voice(bus, channel);
                ymf825::set_tone_parameters(bus, &self.tones);
            }
            ControlEvent::PitchBendSensitivity | ControlEvent::None => (),
        }
    }

    fn program_change<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, program: u8) {
        let channel = voice_for(channel);
        if channel == PERCUSSION_CHANNEL && self.config.fixed_percussion {
            return;
        }

        self.tones[channel as usize] = self.patches[(program & 0x7F) as usize];
        ymf825::set_tone_parameters(bus, &self.tones);
    }

    fn pitch_bend<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, value: u16, state: &ChannelState) {
        let ratio = bend_ratio(state.pitch_bend_sensitivity(), value);
        ymf825::select_voice(bus, voice_for(channel));
        ymf825::set_pitch(bus, fm_pitch_register(ratio));
    }

    fn sounding_voices(&self) -> usize {
        self.voices.sounding()
    }
}

// channel `ch` always plays on voice `ch`
fn voice_for(channel: u8) -> u8 {
    channel & 0x0F
}

const NUM_VOICES: usize = 16;

const SILENT: FmVolumes = FmVolumes {
    voice: 0,
    channel: 0,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::RecordingBus;
    use crate::channel_state::{CC_VOLUME, CC_EXPRESSION};
    use crate::patch::PATCH_LEN;

    // every patch is filled with its own program number
    fn numbered_patches() -> PatchTable {
        let mut table = [[0; PATCH_LEN]; 128];
        for (i, p) in table.iter_mut().enumerate() {
            *p = [i as u8; PATCH_LEN];
        }
        table
    }

    fn tone_burst(bus: &RecordingBus) -> std::vec::Vec<u8> {
        bus.bursts_to(0x07).pop().unwrap()
    }

    #[test]
    fn init_loads_default_tones_and_percussion() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        driver.init(&mut bus);

        let burst = tone_burst(&bus);
        assert_eq!(burst[0], 0x80 + 16);
        assert_eq!(burst[1..1 + PATCH_LEN], patches[0]);
        let ch9 = 1 + 9 * PATCH_LEN;
        assert_eq!(burst[ch9..ch9 + PATCH_LEN], MODE4_PERCUSSION);
        assert_eq!(driver.sounding_voices(), 0);
    }

    #[test]
    fn note_on_uses_the_channel_voice() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        let state = ChannelState::new();

        driver.note_on(&mut bus, 3, 69, 127, &state);

        assert_eq!(
            bus.writes(),
            [
                (0x0B, 3),
                (0x0C, 15 << 2), // default volume 64
                (0x10, 31 << 2),
                (0x0D, 0x14),
                (0x0E, 0x2C),
                (0x0F, 0x43),
            ]
        );
        assert_eq!(driver.sounding_voices(), 1);
    }

    #[test]
    fn any_note_off_releases_the_channel() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        let state = ChannelState::new();

        driver.note_on(&mut bus, 5, 60, 100, &state);
        bus.clear();
        driver.note_off(&mut bus, 5, 72);

        assert_eq!(bus.writes(), [(0x0B, 5), (0x0F, 0x05)]);
        assert_eq!(driver.sounding_voices(), 0);
    }

    #[test]
    fn sixteen_channels_sound_at_once() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        let state = ChannelState::new();

        for ch in 0..16 {
            driver.note_on(&mut bus, ch, 60, 100, &state);
        }
        assert_eq!(driver.sounding_voices(), 16);
    }

    #[test]
    fn program_change_loads_the_patch() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();

        driver.program_change(&mut bus, 2, 40);

        assert_eq!(driver.tone(2), &patches[40]);
        let burst = tone_burst(&bus);
        let ch2 = 1 + 2 * PATCH_LEN;
        assert_eq!(burst[ch2..ch2 + PATCH_LEN], patches[40]);
    }

    #[test]
    fn percussion_channel_ignores_program_change() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();

        driver.program_change(&mut bus, 9, 40);
        assert_eq!(driver.tone(9), &MODE4_PERCUSSION);
        assert!(bus.ops.is_empty());
    }

    #[test]
    fn percussion_channel_can_be_freed() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();

        driver.set_config(Mode4Config {
            fixed_percussion: false,
        });
        driver.program_change(&mut bus, 9, 40);
        assert_eq!(driver.tone(9), &patches[40]);
    }

    #[test]
    fn centered_bend_writes_unity_pitch() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();

        driver.pitch_bend(&mut bus, 4, 8192, &ChannelState::new());
        assert_eq!(bus.writes(), [(0x0B, 4), (0x12, 0x08), (0x13, 0x00)]);
    }

    #[test]
    fn volume_change_reapplies_to_a_sounding_voice() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        let mut state = ChannelState::new();

        driver.note_on(&mut bus, 1, 60, 127, &state);
        bus.clear();

        let event = state.apply_control_change(CC_EXPRESSION, 0);
        driver.control(&mut bus, 1, event, &state);
        assert_eq!(bus.writes(), [(0x0B, 1), (0x0C, 15 << 2), (0x10, 0)]);

        // nothing sounding on this channel, nothing to update
        bus.clear();
        let event = state.apply_control_change(CC_VOLUME, 127);
        driver.control(&mut bus, 2, event, &state);
        assert!(bus.ops.is_empty());
    }

    #[test]
    fn reset_all_controllers_restores_the_voice() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        let state = ChannelState::new();

        driver.program_change(&mut bus, 6, 12);
        driver.note_on(&mut bus, 6, 60, 100, &state);
        bus.clear();

        driver.control(&mut bus, 6, ControlEvent::ResetAllControllers, &state);

        assert_eq!(driver.tone(6), &patches[0]);
        assert_eq!(driver.sounding_voices(), 0);
        assert_eq!(
            bus.writes(),
            [
                (0x0B, 6),
                (0x0F, 0x06),
                (0x0C, 0),
                (0x10, 0),
                (0x12, 0x08),
                (0x13, 0x00),
                (0x08, 0xF6),
                (0x08, 0x00),
            ]
        );
    }

    #[test]
    fn all_notes_off_only_touches_its_channel() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        let state = ChannelState::new();

        driver.note_on(&mut bus, 0, 60, 100, &state);
        driver.note_on(&mut bus, 1, 60, 100, &state);
        driver.control(&mut bus, 0, ControlEvent::AllNotesOff, &state);

        assert_eq!(driver.sounding_voices(), 1);
    }

    #[test]
    fn out_of_range_channels_wrap_onto_the_16_voices() {
        let patches = numbered_patches();
        let mut driver = Mode4Driver::new(&patches);
        let mut bus = RecordingBus::new();
        let state = ChannelState::new();

        driver.control(&mut bus, 16, ControlEvent::ResetAllControllers, &state);
        assert_eq!(driver.tone(0), &patches[0]);

        driver.note_on(&mut bus, 17, 60, 100, &state);
        assert_eq!(driver.sounding_voices(), 1);
        driver.pitch_bend(&mut bus, 17, 8192, &state);
        driver.note_off(&mut bus, 17, 60);
        assert_eq!(driver.sounding_voices(), 0);

        // 25 lands on the percussion voice, which keeps its fixed tone
        driver.program_change(&mut bus, 25, 40);
        assert_eq!(driver.tone(9), &MODE4_PERCUSSION);
    }
}
