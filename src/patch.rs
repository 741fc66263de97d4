//! FM patches
//!
//! A YMF825 voice is programmed with a 30 byte tone parameter blob. The 128 General MIDI patches are supplied by the
//! caller as a [`PatchTable`], only the percussion blobs live in this crate.

use crate::error::{Error, Result};

/// The length of one YMF825 tone parameter blob
pub const PATCH_LEN: usize = 30;

/// One YMF825 tone parameter blob
pub type Patch = [u8; PATCH_LEN];

/// The patch for each MIDI program, indexed by the wire program byte `[0..127]`
pub type PatchTable = [Patch; 128];

/// `program_index(p)` is the table index for 1-based program number `p` in `[1..128]`
pub fn program_index(program: u8) -> Result<usize> {
    match program {
        1..=128 => Ok((program - 1) as usize),
        _ => Err(Error::InvalidProgram(program)),
    }
}

/// The fixed noise patch used for channel 10 (index 9) percussion when every channel has its own voice
#[rustfmt::skip]
pub const MODE4_PERCUSSION: Patch = [
    0x01, 0x80,
    0x00, 0x0F, 0xF0, 0x00, 0x00, 0x10, 0x07,
    0x40, 0xDF, 0xF0, 0x1C, 0x00, 0x00, 0x00,
    0x00, 0x2F, 0xF3, 0x9B, 0x00, 0x20, 0x41,
    0x00, 0xAF, 0xA0, 0x0E, 0x10, 0x10, 0x40,
];

/// The noise patch loaded into the percussion voice of the two voice music box
#[rustfmt::skip]
pub const MUSIC_BOX_NOISE: Patch = [
    0x01, 0x80,
    0x00, 0xF0, 0xF0, 0x00, 0x00, 0x10, 0x07,
    0x51, 0xF0, 0xF0, 0x1C, 0x00, 0x00, 0x00,
    0x00, 0x2F, 0xF3, 0x9B, 0x00, 0x20, 0x41,
    0x00, 0xAF, 0xA0, 0x02, 0x00, 0x10, 0x40,
];

/// The MIDI channel (0-based) that General MIDI reserves for percussion
pub const PERCUSSION_CHANNEL: u8 = 9;
