//! # YMF825 register protocol
//!
//! The YMF825 is a 16 voice, 4 operator FM synth on an SPI bus. A voice is selected first, then the per-voice
//! registers (volume, frequency, key on/off, pitch) address the selected voice.
//!
//! Tone parameters for all voices are loaded in one burst to the contents FIFO at register `0x07`.

use heapless::Vec;

use crate::{
    bus::RegisterBus,
    error::{Error, Result},
    lookup_tables::FmNote,
    patch::{Patch, PATCH_LEN},
    utils::{FmPitch, FmVolumes},
};

/// `init(bus)` runs the power-up sequence, leaving the chip with the analog block on and the sequencer cleared
pub fn init<B: RegisterBus>(bus: &mut B) {
    bus.write(REG_ANALOG_BLOCK_POWER, 0x01);
    bus.write(REG_ANALOG_POWER_DOWN, 0x0E);
    bus.delay_ms(1);
    bus.write(REG_CLOCK_ENABLE, 0x01);
    bus.write(REG_ALL_KEY_RESET, 0x00);
    bus.write(REG_SOFT_RESET, 0xA3);
    bus.delay_ms(1);
    bus.write(REG_SOFT_RESET, 0x00);
    bus.delay_ms(30);
    bus.write(REG_ANALOG_POWER_DOWN, 0x04);
    bus.delay_ms(1);
    bus.write(REG_ANALOG_POWER_DOWN, 0x00);

    set_master_volume(bus, DEFAULT_MASTER_VOLUME);
    bus.write(REG_INTERPOLATION_A, 0x3F);
    bus.write(REG_INTERPOLATION_B, 0x00);
    bus.write(REG_ANALOG_GAIN, 0x01);

    bus.write(REG_SEQUENCER, 0xF6);
    bus.delay_ms(21);
    bus.write(REG_SEQUENCER, 0x00);
    bus.write(REG_SEQUENCER_VOLUME, 0xF8);
    bus.write(REG_SEQUENCER_SIZE, 0x00);
    bus.write(REG_SEQUENCER_TIME_MSB, 0x40);
    bus.write(REG_SEQUENCER_TIME_LSB, 0x00);
}

/// `select_voice(bus, v)` makes voice `v` in `[0..15]` the target of the per-voice registers
pub fn select_voice<B: RegisterBus>(bus: &mut B, voice: u8) {
    bus.write(REG_VOICE_SELECT, voice & 0x0F);
}

/// `set_volumes(bus, vols)` writes the voice volume and channel volume of the selected voice
pub fn set_volumes<B: RegisterBus>(bus: &mut B, volumes: FmVolumes) {
    bus.write(REG_VOICE_VOLUME, (volumes.voice & 0x1F) << 2);
    bus.write(REG_CHANNEL_VOLUME, (volumes.channel & 0x1F) << 2);
}

/// `set_note(bus, n)` writes the frequency of the selected voice
pub fn set_note<B: RegisterBus>(bus: &mut B, note: FmNote) {
    bus.write(
        REG_FNUM_HIGH,
        (((note.fnum & 0x0380) >> 4) as u8) | (note.block & 0x07),
    );
    bus.write(REG_FNUM_LOW, (note.fnum & 0x7F) as u8);
}

/// `key_on(bus, t)` starts the selected voice playing tone `t` in `[0..15]`
pub fn key_on<B: RegisterBus>(bus: &mut B, tone: u8) {
    bus.write(REG_KEY, KEY_ON | (tone & 0x0F));
}

/// `key_off(bus, t)` releases the selected voice
pub fn key_off<B: RegisterBus>(bus: &mut B, tone: u8) {
    bus.write(REG_KEY, tone & 0x0F);
}

/// `set_pitch(bus, p)` writes the pitch multiplier of the selected voice
pub fn set_pitch<B: RegisterBus>(bus: &mut B, pitch: FmPitch) {
    bus.write(
        REG_PITCH_HIGH,
        ((pitch.integer & 0x03) << 3) | ((pitch.fraction >> 6) & 0x07) as u8,
    );
    bus.write(REG_PITCH_LOW, ((pitch.fraction & 0x3F) << 1) as u8);
}

/// `set_master_volume(bus, v)` writes the master volume, `v` in `[0..63]`
pub fn set_master_volume<B: RegisterBus>(bus: &mut B, volume: u8) {
    bus.write(REG_MASTER_VOLUME, (volume & 0x3F) << 2);
}

/// `set_tone_parameters(bus, patches)` loads `patches` into tones `0..patches.len()`
///
/// At most 16 patches are sent, any more are ignored.
pub fn set_tone_parameters<B: RegisterBus>(bus: &mut B, patches: &[Patch]) {
    let patches = &patches[..patches.len().min(MAX_TONES)];

    let mut burst: Vec<u8, TONE_BURST_CAPACITY> = Vec::new();
    burst.push(TONE_HEADER + patches.len() as u8).ok();
    for p in patches {
        burst.extend_from_slice(p).ok();
    }
    burst.extend_from_slice(&TONE_TAIL).ok();

    bus.write(REG_SEQUENCER, 0xF6);
    bus.delay_ms(1);
    bus.write(REG_SEQUENCER, 0x00);
    bus.write_burst(REG_CONTENTS_FIFO, &burst);
}

/// `passthrough(bus, bytes)` forwards raw register traffic to the chip
///
/// If the first byte has its high bit set it is a read of that register, otherwise the first byte is the register
/// address and the rest is written to it in one burst.
///
/// # Returns
///
/// * `Ok(Some(value))` - the value read
///
/// * `Ok(None)` - the write was sent
///
/// * `Err(MissingRegisterData)` - nothing to send
pub fn passthrough<B: RegisterBus>(bus: &mut B, bytes: &[u8]) -> Result<Option<u8>> {
    match bytes {
        [] => Err(Error::MissingRegisterData),
        [address, ..] if address & READ_FLAG != 0 => Ok(Some(bus.read(address & !READ_FLAG))),
        [_] => Err(Error::MissingRegisterData),
        [address, data @ ..] => {
            bus.write_burst(*address, data);
            Ok(None)
        }
    }
}

/// The number of voices (and of tone parameter slots)
pub const MAX_TONES: usize = 16;

const TONE_HEADER: u8 = 0x80;
const TONE_TAIL: [u8; 4] = [0x80, 0x03, 0x81, 0x80];
const TONE_BURST_CAPACITY: usize = 1 + MAX_TONES * PATCH_LEN + TONE_TAIL.len();

const KEY_ON: u8 = 0x40;
const READ_FLAG: u8 = 0x80;
const DEFAULT_MASTER_VOLUME: u8 = 40;

const REG_CLOCK_ENABLE: u8 = 0x00;
const REG_ALL_KEY_RESET: u8 = 0x01;
const REG_ANALOG_POWER_DOWN: u8 = 0x02;
const REG_ANALOG_GAIN: u8 = 0x03;
const REG_CONTENTS_FIFO: u8 = 0x07;
const REG_SEQUENCER: u8 = 0x08;
const REG_SEQUENCER_VOLUME: u8 = 0x09;
const REG_SEQUENCER_SIZE: u8 = 0x0A;
const REG_VOICE_SELECT: u8 = 0x0B;
const REG_VOICE_VOLUME: u8 = 0x0C;
const REG_FNUM_HIGH: u8 = 0x0D;
const REG_FNUM_LOW: u8 = 0x0E;
const REG_KEY: u8 = 0x0F;
const REG_CHANNEL_VOLUME: u8 = 0x10;
const REG_PITCH_HIGH: u8 = 0x12;
const REG_PITCH_LOW: u8 = 0x13;
const REG_INTERPOLATION_B: u8 = 0x14;
const REG_SEQUENCER_TIME_MSB: u8 = 0x17;
const REG_SEQUENCER_TIME_LSB: u8 = 0x18;
const REG_MASTER_VOLUME: u8 = 0x19;
const REG_SOFT_RESET: u8 = 0x1A;
const REG_INTERPOLATION_A: u8 = 0x1B;
const REG_ANALOG_BLOCK_POWER: u8 = 0x1D;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{BusOp, RecordingBus};

    #[test]
    fn init_sequence() {
        let mut bus = RecordingBus::new();
        init(&mut bus);

        assert_eq!(
            bus.writes(),
            [
                (0x1D, 0x01),
                (0x02, 0x0E),
                (0x00, 0x01),
                (0x01, 0x00),
                (0x1A, 0xA3),
                (0x1A, 0x00),
                (0x02, 0x04),
                (0x02, 0x00),
                (0x19, 40 << 2),
                (0x1B, 0x3F),
                (0x14, 0x00),
                (0x03, 0x01),
                (0x08, 0xF6),
                (0x08, 0x00),
                (0x09, 0xF8),
                (0x0A, 0x00),
                (0x17, 0x40),
                (0x18, 0x00),
            ]
        );

        let delays: std::vec::Vec<u32> = bus
            .ops
            .iter()
            .filter_map(|op| match op {
                BusOp::Delay(ms) => Some(*ms),
                _ => None,
            })
            .collect();
        assert_eq!(delays, [1, 1, 30, 1, 21]);
    }

    #[test]
    fn note_number_splits_fnum() {
        let mut bus = RecordingBus::new();
        // A440
        set_note(&mut bus, FmNote::new(4, 300));
        assert_eq!(bus.writes(), [(0x0D, 0x14), (0x0E, 0x2C)]);
    }

    #[test]
    fn volumes_are_shifted_into_place() {
        let mut bus = RecordingBus::new();
        set_volumes(
            &mut bus,
            FmVolumes {
                voice: 31,
                channel: 15,
            },
        );
        assert_eq!(bus.writes(), [(0x0C, 0x7C), (0x10, 0x3C)]);
    }

    #[test]
    fn key_on_and_off() {
        let mut bus = RecordingBus::new();
        select_voice(&mut bus, 17);
        key_on(&mut bus, 3);
        key_off(&mut bus, 3);
        assert_eq!(bus.writes(), [(0x0B, 1), (0x0F, 0x43), (0x0F, 0x03)]);
    }

    #[test]
    fn unity_pitch() {
        let mut bus = RecordingBus::new();
        set_pitch(&mut bus, FmPitch::UNITY);
        assert_eq!(bus.writes(), [(0x12, 0x08), (0x13, 0x00)]);
    }

    #[test]
    fn pitch_fraction_is_split() {
        let mut bus = RecordingBus::new();
        set_pitch(
            &mut bus,
            FmPitch {
                integer: 3,
                fraction: 0x1FF,
            },
        );
        assert_eq!(bus.writes(), [(0x12, 0x1F), (0x13, 0x7E)]);
    }

    #[test]
    fn tone_parameter_burst_framing() {
        let mut bus = RecordingBus::new();
        let patches = [[0x11; PATCH_LEN], [0x22; PATCH_LEN]];
        set_tone_parameters(&mut bus, &patches);

        assert_eq!(bus.writes(), [(0x08, 0xF6), (0x08, 0x00)]);

        let bursts = bus.bursts_to(0x07);
        assert_eq!(bursts.len(), 1);
        let burst = &bursts[0];
        assert_eq!(burst.len(), 1 + 2 * PATCH_LEN + 4);
        assert_eq!(burst[0], 0x82);
        assert_eq!(burst[1], 0x11);
        assert_eq!(burst[1 + PATCH_LEN], 0x22);
        assert_eq!(burst[burst.len() - 4..], [0x80, 0x03, 0x81, 0x80]);
    }

    #[test]
    fn full_tone_burst_fits() {
        let mut bus = RecordingBus::new();
        set_tone_parameters(&mut bus, &[[0; PATCH_LEN]; MAX_TONES]);
        let burst = &bus.bursts_to(0x07)[0];
        assert_eq!(burst.len(), TONE_BURST_CAPACITY);
        assert_eq!(burst[0], 0x90);
    }

    #[test]
    fn passthrough_read() {
        let mut bus = RecordingBus::new();
        bus.read_value = 0x5A;
        assert_eq!(passthrough(&mut bus, &[0x8B]), Ok(Some(0x5A)));
        assert_eq!(bus.ops, [BusOp::Read(0x0B)]);
    }

    #[test]
    fn passthrough_write() {
        let mut bus = RecordingBus::new();
        assert_eq!(passthrough(&mut bus, &[0x0B, 0x01, 0x02]), Ok(None));
        assert_eq!(bus.ops, [BusOp::Write(0x0B, vec![0x01, 0x02])]);
    }

    #[test]
    fn passthrough_write_needs_data() {
        let mut bus = RecordingBus::new();
        assert_eq!(passthrough(&mut bus, &[0x0B]), Err(Error::MissingRegisterData));
        assert_eq!(passthrough(&mut bus, &[]), Err(Error::MissingRegisterData));
        assert!(bus.ops.is_empty());
    }
}
