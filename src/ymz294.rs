//! # YMZ294 register protocol
//!
//! The YMZ294 is an AY-3-8910 style PSG: three square wave tone generators, one shared noise generator, and one shared
//! hardware envelope.
//!
//! The mixer, noise period and envelope period registers are shared by all three voices, so a shadow copy is kept and
//! they are only written when they actually change.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{bus::RegisterBus, error::Result};

/// Which generator a voice is routed to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mixer {
    #[default]
    Tone,
    Noise,
}

/// The shared register state of one YMZ294 is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ymz294 {
    mixer: u8,
    noise_period: u8,
    envelope_period: u16,
}

impl Default for Ymz294 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ymz294 {
    /// `Ymz294::new()` is the register state right after power-up, every voice on its tone generator
    pub fn new() -> Self {
        Self {
            mixer: MIXER_TONES_ONLY,
            noise_period: 0,
            envelope_period: 0,
        }
    }

    /// `psg.init(bus)` routes every voice to its tone generator and silences it
    pub fn init<B: RegisterBus>(&mut self, bus: &mut B) {
        *self = Self::new();
        bus.write(REG_MIXER, self.mixer);
        for voice in 0..NUM_VOICES {
            self.silence(bus, voice);
        }
    }

    /// `psg.route(bus, v, m)` connects voice `v` to the tone or noise generator
    pub fn route<B: RegisterBus>(&mut self, bus: &mut B, voice: u8, mixer: Mixer) {
        let tone_bit = 1 << voice;
        let noise_bit = 1 << (voice + 3);

        // the mixer bits are active low
        let value = match mixer {
            Mixer::Tone => (self.mixer | noise_bit) & !tone_bit,
            Mixer::Noise => (self.mixer | tone_bit) & !noise_bit,
        };

        if value != self.mixer {
            self.mixer = value;
            bus.write(REG_MIXER, value);
        }
    }

    /// `psg.set_tone_period(bus, v, p)` writes the 12-bit tone period of voice `v`, high byte first
    pub fn set_tone_period<B: RegisterBus>(&self, bus: &mut B, voice: u8, period: u16) {
        bus.write(REG_TONE_PERIOD + 2 * voice + 1, ((period >> 8) & 0x0F) as u8);
        bus.write(REG_TONE_PERIOD + 2 * voice, (period & 0xFF) as u8);
    }

    /// `psg.set_noise_period(bus, p)` writes the 5-bit noise period if it changed
    pub fn set_noise_period<B: RegisterBus>(&mut self, bus: &mut B, period: u8) {
        let period = period & 0x1F;
        if period != self.noise_period {
            self.noise_period = period;
            bus.write(REG_NOISE_PERIOD, period);
        }
    }

    /// `psg.set_level(bus, v, l)` sets voice `v` to the fixed 4-bit level `l`
    pub fn set_level<B: RegisterBus>(&self, bus: &mut B, voice: u8, level: u8) {
        bus.write(REG_LEVEL + voice, level & 0x0F);
    }

    /// `psg.silence(bus, v)` sets the level of voice `v` to zero
    pub fn silence<B: RegisterBus>(&self, bus: &mut B, voice: u8) {
        self.set_level(bus, voice, 0);
    }

    /// `psg.trigger_envelope(bus, v, period, shape)` hands voice `v` over to the hardware envelope and restarts it
    ///
    /// Writing the shape register is what restarts the envelope, so it is always written.
    pub fn trigger_envelope<B: RegisterBus>(&mut self, bus: &mut B, voice: u8, period: u16, shape: u8) {
        if period != self.envelope_period {
            self.envelope_period = period;
            bus.write(REG_ENVELOPE_PERIOD_LOW, (period & 0xFF) as u8);
            bus.write(REG_ENVELOPE_PERIOD_HIGH, (period >> 8) as u8);
        }
        bus.write(REG_LEVEL + voice, LEVEL_ENVELOPE);
        bus.write(REG_ENVELOPE_SHAPE, shape & 0x0F);
    }

    /// `psg.routing(v)` is the generator voice `v` is currently connected to
    pub fn routing(&self, voice: u8) -> Mixer {
        // a set tone bit means the tone generator is off
        if self.mixer & (1 << voice) != 0 {
            Mixer::Noise
        } else {
            Mixer::Tone
        }
    }

    /// `psg.mixer()` is the last value written to the mixer register
    pub fn mixer(&self) -> u8 {
        self.mixer
    }
}

/// `passthrough(bus, bytes)` writes raw `(address, data)` pairs, a trailing odd byte is ignored
pub fn passthrough<B: RegisterBus>(bus: &mut B, bytes: &[u8]) -> Result<Option<u8>> {
    for pair in bytes.chunks_exact(2) {
        bus.write(pair[0], pair[1]);
    }
    Ok(None)
}

/// The number of tone generators
pub const NUM_VOICES: u8 = 3;

const MIXER_TONES_ONLY: u8 = 0x38;
const LEVEL_ENVELOPE: u8 = 0x10;

const REG_TONE_PERIOD: u8 = 0x00;
const REG_NOISE_PERIOD: u8 = 0x06;
const REG_MIXER: u8 = 0x07;
const REG_LEVEL: u8 = 0x08;
const REG_ENVELOPE_PERIOD_LOW: u8 = 0x0B;
const REG_ENVELOPE_PERIOD_HIGH: u8 = 0x0C;
const REG_ENVELOPE_SHAPE: u8 = 0x0D;
