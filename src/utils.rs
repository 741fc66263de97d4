//! Numeric translation from MIDI values to chip register values
//!
//! All quantization truncates toward zero, it never rounds.

use libm::{fabsf, powf};

/// `bend_value(lsb, msb)` is the 14-bit pitch bend value assembled from its two 7-bit halves, `8192` is centered
pub fn bend_value(lsb: u8, msb: u8) -> u16 {
    ((msb as u16 & 0x7F) << 7) | (lsb as u16 & 0x7F)
}

/// `bend_ratio(s, v)` is the frequency ratio for pitch bend value `v` with a sensitivity of `s` semitones
///
/// # Examples
///
/// ```
/// use nano_midi::utils::bend_ratio;
///
/// assert_eq!(bend_ratio(2, 8192), 1.0);
///
/// // full bend up with a one octave range doubles the frequency
/// assert!((bend_ratio(12, 16384) - 2.0).abs() < 1.0E-3);
/// ```
pub fn bend_ratio(sensitivity: u8, value: u16) -> f32 {
    powf(2.0_f32, bend_exponent(sensitivity, value))
}

// in octaves
fn bend_exponent(sensitivity: u8, value: u16) -> f32 {
    (sensitivity as f32 / 12.0_f32) * ((value as f32 - BEND_CENTER) / BEND_CENTER)
}

/// The YMF825 pitch register, a 2.9 fixed point multiplier applied to the note frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmPitch {
    /// in `[0..3]`
    pub integer: u8,
    /// in `[0..511]`
    pub fraction: u16,
}

impl FmPitch {
    /// The pitch register value that leaves the note unchanged
    pub const UNITY: Self = Self {
        integer: 1,
        fraction: 0,
    };
}

/// `fm_pitch_register(r)` is the YMF825 pitch register value for frequency ratio `r`, clamped to the largest value the
/// register can hold
pub fn fm_pitch_register(ratio: f32) -> FmPitch {
    let pitch = ((FM_PITCH_ONE as f32 * ratio) as u16).min(FM_PITCH_MAX);

    FmPitch {
        integer: ((pitch >> 9) & 0x03) as u8,
        fraction: pitch & 0x01FF,
    }
}

/// `bent_tone_period(p, s, v)` is tone period `p` shifted by pitch bend value `v` with a sensitivity of `s` semitones
///
/// Frequency is inversely proportional to the period, so bending up shortens it.
pub fn bent_tone_period(base_period: u16, sensitivity: u8, value: u16) -> u16 {
    let ratio = powf(2.0_f32, -bend_exponent(sensitivity, value));
    (base_period as f32 * ratio) as u16
}

/// `quantize(g, max)` is gain `g` in `[0.0, 1.0]` scaled to `[0..max]`, truncated
pub fn quantize(gain: f32, max: u8) -> u8 {
    (max as f32 * gain.clamp(0.0_f32, 1.0_f32)) as u8
}

/// The two YMF825 volume fields for one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmVolumes {
    /// in `[0..31]`, from the channel volume
    pub voice: u8,
    /// in `[0..31]`, from velocity and expression
    pub channel: u8,
}

/// `fm_volumes(vel, vol, exp)` is the YMF825 voice and channel volume for a note
pub fn fm_volumes(velocity: u8, volume: u8, expression: u8) -> FmVolumes {
    FmVolumes {
        voice: quantize(unit(volume), FM_VOLUME_MAX),
        channel: quantize(unit(velocity) * unit(expression), FM_VOLUME_MAX),
    }
}

/// `psg_level(vel, exp)` is the 4-bit YMZ294 level for a note
pub fn psg_level(velocity: u8, expression: u8) -> u8 {
    quantize(unit(velocity) * unit(expression), PSG_LEVEL_MAX)
}

// a 7-bit MIDI value as a number in `[0.0, 1.0]`
fn unit(v: u8) -> f32 {
    (v & 0x7F) as f32 / 127.0_f32
}

/// `is_almost(v1, v2, e)` is true iff `v1` is within `e` of `v2`
pub fn is_almost(v1: f32, v2: f32, eps: f32) -> bool {
    fabsf(v1 - v2) <= eps
}

const BEND_CENTER: f32 = 8192.0_f32;

const FM_PITCH_ONE: u16 = 512;
const FM_PITCH_MAX: u16 = 2047;

pub const FM_VOLUME_MAX: u8 = 31;
pub const PSG_LEVEL_MAX: u8 = 15;
