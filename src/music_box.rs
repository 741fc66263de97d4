//! # YMF825 music box
//!
//! A deliberately small driver: only two voices, shared by all 16 MIDI channels. Melodic channels play one tone,
//! loaded from the configured program. Channel 10 (index 9) plays a noise tone for percussion.
//!
//! Voices are handed out first free first. With both voices busy further note-ons are dropped, so at most two notes
//! sound at once no matter how many channels are playing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    bus::RegisterBus,
    channel_state::{ChannelState, ControlEvent},
    driver::SoundDriver,
    error::Result,
    lookup_tables::fm_note,
    patch::{program_index, PatchTable, MUSIC_BOX_NOISE, PERCUSSION_CHANNEL},
    utils::{bend_ratio, fm_pitch_register, fm_volumes, FmPitch, FmVolumes},
    voice_pool::VoicePool,
    ymf825,
};

/// Settings of the music box driver
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicBoxConfig {
    /// play notes on the percussion channel, or drop them
    pub accept_percussion: bool,
    /// the General MIDI program in `[1..128]` the melodic tone is loaded from
    pub program: u8,
}

impl Default for MusicBoxConfig {
    fn default() -> Self {
        Self {
            accept_percussion: true,
            program: DEFAULT_PROGRAM,
        }
    }
}

/// The two voice YMF825 driver is represented here
#[derive(Debug, Clone)]
pub struct MusicBoxDriver<'a> {
    patches: &'a PatchTable,
    voices: VoicePool<NUM_VOICES>,
    config: MusicBoxConfig,
}

impl<'a> MusicBoxDriver<'a> {
    /// `MusicBoxDriver::new(patches)` is a new driver that loads its melodic tone from `patches`
    pub fn new(patches: &'a PatchTable) -> Self {
        Self {
            patches,
            voices: VoicePool::new(),
            config: MusicBoxConfig::default(),
        }
    }

    /// `mb.config()` is the current settings of the driver
    pub fn config(&self) -> MusicBoxConfig {
        self.config
    }

    /// `mb.set_config(bus, c)` changes the settings, reloading the tones if the program changed
    ///
    /// # Errors
    ///
    /// * `InvalidProgram` - the program is outside `[1..128]`, nothing is changed
    pub fn set_config<B: RegisterBus>(&mut self, bus: &mut B, config: MusicBoxConfig) -> Result<()> {
        program_index(config.program)?;

        let program_changed = config.program != self.config.program;
        self.config = config;
        if program_changed {
            self.load_tones(bus);
        }
        Ok(())
    }

    fn load_tones<B: RegisterBus>(&self, bus: &mut B) {
        // validated whenever the config is set
        let melodic = program_index(self.config.program).unwrap_or(DEFAULT_PROGRAM as usize - 1);
        ymf825::set_tone_parameters(bus, &[self.patches[melodic], MUSIC_BOX_NOISE]);
    }

    fn release_voice<B: RegisterBus>(&self, bus: &mut B, voice: usize, channel: u8) {
        ymf825::select_voice(bus, voice as u8);
        ymf825::key_off(bus, tone_for(channel));
        ymf825::set_pitch(bus, FmPitch::UNITY);
    }
}

impl<'a> SoundDriver for MusicBoxDriver<'a> {
    fn init<B: RegisterBus>(&mut self, bus: &mut B) {
        ymf825::init(bus);

        for voice in 0..ymf825::MAX_TONES as u8 {
            ymf825::select_voice(bus, voice);
            ymf825::key_off(bus, voice);
            ymf825::set_volumes(bus, SILENT);
            ymf825::set_pitch(bus, FmPitch::UNITY);
        }
        self.voices.clear();

        self.load_tones(bus);
    }

    fn deinit<B: RegisterBus>(&mut self, bus: &mut B) {
        for voice in 0..NUM_VOICES {
            if let Some(slot) = self.voices.release(voice) {
                self.release_voice(bus, voice, slot.channel);
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
        if channel == PERCUSSION_CHANNEL && !self.config.accept_percussion {
            return;
        }

        let fnum = fm_note(note);
        let Some(voice) = self.voices.claim(channel, note, velocity, fnum.fnum) else {
            log::debug!("music box: no free voice, dropping note {} on channel {}", note, channel);
            return;
        };

        ymf825::select_voice(bus, voice as u8);
        ymf825::set_volumes(bus, fm_volumes(velocity, state.volume(), state.expression()));
        ymf825::set_note(bus, fnum);
        ymf825::key_on(bus, tone_for(channel));
    }

    fn note_off<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, note: u8) {
        if let Some((voice, _)) = self.voices.release_note(channel, note) {
            self.release_voice(bus, voice, channel);
        }
    }

    fn control<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, event: ControlEvent, state: &ChannelState) {
        match event {
            ControlEvent::Volume | ControlEvent::Expression => {
                for (voice, slot) in self.voices.sounding_on_channel(channel) {
                    ymf825::select_voice(bus, voice as u8);
                    ymf825::set_volumes(bus, fm_volumes(slot.velocity, state.volume(), state.expression()));
                }
            }
            ControlEvent::AllSoundOff | ControlEvent::AllNotesOff | ControlEvent::ResetAllControllers => {
                for (voice, _) in self.voices.release_channel(channel) {
                    self.release_voice(bus, voice, channel);
                }
            }
            ControlEvent::PitchBendSensitivity | ControlEvent::None => (),
        }
    }

    fn pitch_bend<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, value: u16, state: &ChannelState) {
        let pitch = fm_pitch_register(bend_ratio(state.pitch_bend_sensitivity(), value));

        for (voice, _) in self.voices.sounding_on_channel(channel) {
            ymf825::select_voice(bus, voice as u8);
            ymf825::set_pitch(bus, pitch);
        }
    }

    fn sounding_voices(&self) -> usize {
        self.voices.sounding()
    }
}

// percussion plays the noise tone, everything else the melodic tone
fn tone_for(channel: u8) -> u8 {
    if channel == PERCUSSION_CHANNEL {
        TONE_NOISE
    } else {
        TONE_MELODIC
    }
}

const NUM_VOICES: usize = 2;

const TONE_MELODIC: u8 = 0;
const TONE_NOISE: u8 = 1;

// General MIDI "Lead 1 (square)"
const DEFAULT_PROGRAM: u8 = 81;

const SILENT: FmVolumes = FmVolumes {
    voice: 0,
    channel: 0,
};
