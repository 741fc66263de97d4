//! # Note Lookup Tables
//!
//! MIDI note numbers are mapped straight onto the frequency codes each sound chip expects, one table per chip.
//!
//! The YMF825 takes a 3-bit octave `BLOCK` and a 10-bit `FNUM`, where the pitch is roughly `FNUM * 2^(BLOCK - 1)`
//! times a constant. The YMZ294 takes a 12-bit tone period, the pitch is the master clock divided by 16 times the
//! period, so higher notes have smaller periods.

/// A YMF825 frequency code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmNote {
    /// The octave block in `[0..7]`
    pub block: u8,
    /// The frequency number in `[0..1023]`
    pub fnum: u16,
}

impl FmNote {
    pub const fn new(block: u8, fnum: u16) -> Self {
        Self { block, fnum }
    }
}

/// `fm_note(n)` is the YMF825 frequency code for MIDI note `n`, the note is masked to `[0..127]`
pub fn fm_note(note: u8) -> FmNote {
    YMF825_NOTE_TABLE[(note & 0x7F) as usize]
}

/// `tone_period(n)` is the YMZ294 tone period for MIDI note `n`, the note is masked to `[0..127]`
///
/// # Examples
///
/// ```
/// use nano_midi::lookup_tables::tone_period;
///
/// // the lowest note has the longest period
/// assert!(tone_period(0) > tone_period(127));
/// ```
pub fn tone_period(note: u8) -> u16 {
    YMZ294_TONE_PERIODS[(note & 0x7F) as usize]
}

/// YMF825 `BLOCK`/`FNUM` pairs for MIDI notes 0 through 127
///
/// Block 6 starts at note 84 and, from note 96 on, holds while the fnum keeps climbing up to 954 at note 113. Notes 114
/// and up use block 7, and the top note saturates at `FNUM = 1023`.
#[rustfmt::skip]
pub const YMF825_NOTE_TABLE: [FmNote; 128] = [
    FmNote::new(0, 89), FmNote::new(0, 95), FmNote::new(0, 100), FmNote::new(0, 106),
    FmNote::new(0, 113), FmNote::new(0, 119), FmNote::new(0, 126), FmNote::new(0, 134),
    FmNote::new(0, 142), FmNote::new(0, 150), FmNote::new(0, 159), FmNote::new(0, 169),
    FmNote::new(0, 179), FmNote::new(0, 189), FmNote::new(0, 200), FmNote::new(0, 212),
    FmNote::new(0, 225), FmNote::new(0, 238), FmNote::new(0, 253), FmNote::new(0, 268),
    FmNote::new(0, 284), FmNote::new(0, 300), FmNote::new(0, 318), FmNote::new(0, 337),
    FmNote::new(0, 357), FmNote::new(1, 189), FmNote::new(1, 200), FmNote::new(1, 212),
    FmNote::new(1, 225), FmNote::new(1, 238), FmNote::new(1, 253), FmNote::new(1, 268),
    FmNote::new(1, 284), FmNote::new(1, 300), FmNote::new(1, 318), FmNote::new(1, 337),
    FmNote::new(1, 357), FmNote::new(2, 189), FmNote::new(2, 200), FmNote::new(2, 212),
    FmNote::new(2, 225), FmNote::new(2, 238), FmNote::new(2, 253), FmNote::new(2, 268),
    FmNote::new(2, 284), FmNote::new(2, 300), FmNote::new(2, 318), FmNote::new(2, 337),
    FmNote::new(3, 179), FmNote::new(3, 189), FmNote::new(3, 200), FmNote::new(3, 212),
    FmNote::new(3, 225), FmNote::new(3, 238), FmNote::new(3, 253), FmNote::new(3, 268),
    FmNote::new(3, 284), FmNote::new(3, 300), FmNote::new(3, 318), FmNote::new(3, 337),
    FmNote::new(4, 179), FmNote::new(4, 189), FmNote::new(4, 200), FmNote::new(4, 212),
    FmNote::new(4, 225), FmNote::new(4, 238), FmNote::new(4, 253), FmNote::new(4, 268),
    FmNote::new(4, 284), FmNote::new(4, 300), FmNote::new(4, 318), FmNote::new(4, 337),
    FmNote::new(5, 179), FmNote::new(5, 189), FmNote::new(5, 200), FmNote::new(5, 212),
    FmNote::new(5, 225), FmNote::new(5, 238), FmNote::new(5, 253), FmNote::new(5, 268),
    FmNote::new(5, 284), FmNote::new(5, 300), FmNote::new(5, 318), FmNote::new(5, 337),
    FmNote::new(6, 179), FmNote::new(6, 189), FmNote::new(6, 200), FmNote::new(6, 212),
    FmNote::new(6, 225), FmNote::new(6, 238), FmNote::new(6, 253), FmNote::new(6, 268),
    FmNote::new(6, 284), FmNote::new(6, 300), FmNote::new(6, 318), FmNote::new(6, 337),
    FmNote::new(6, 357), FmNote::new(6, 378), FmNote::new(6, 401), FmNote::new(6, 425),
    FmNote::new(6, 450), FmNote::new(6, 477), FmNote::new(6, 505), FmNote::new(6, 535),
    FmNote::new(6, 567), FmNote::new(6, 601), FmNote::new(6, 636), FmNote::new(6, 674),
    FmNote::new(6, 714), FmNote::new(6, 757), FmNote::new(6, 802), FmNote::new(6, 850),
    FmNote::new(6, 900), FmNote::new(6, 954), FmNote::new(7, 505), FmNote::new(7, 535),
    FmNote::new(7, 567), FmNote::new(7, 601), FmNote::new(7, 636), FmNote::new(7, 674),
    FmNote::new(7, 714), FmNote::new(7, 757), FmNote::new(7, 802), FmNote::new(7, 850),
    FmNote::new(7, 900), FmNote::new(7, 954), FmNote::new(7, 1010), FmNote::new(7, 1023),
];

/// YMZ294 tone periods for MIDI notes 0 through 127, for a 4 MHz master clock
///
/// The chip's period register is 12 bits wide, the periods of the bottom two octaves are wider than that and get
/// masked when they are written.
#[rustfmt::skip]
pub const YMZ294_TONE_PERIODS: [u16; 128] = [
    0x3B8C, 0x3820, 0x3513, 0x3257, 0x2F68, 0x2CCC, 0x2A18, 0x2806,
    0x258F, 0x2362, 0x2172, 0x1FB5, 0x1DC6, 0x1C39, 0x1A89, 0x192B,
    0x17B4, 0x1666, 0x1523, 0x13EE, 0x12C8, 0x11C1, 0x10C8, 0x0FCD,
    0x0EEF, 0x0E1D, 0x0D4E, 0x0C8D, 0x0BDA, 0x0B2C, 0x0A92, 0x09F7,
    0x0968, 0x08E1, 0x0860, 0x07EA, 0x0777, 0x070C, 0x06A7, 0x0647,
    0x05ED, 0x0598, 0x0547, 0x04FC, 0x04B4, 0x0470, 0x0431, 0x03F4,
    0x03BC, 0x0386, 0x0353, 0x0323, 0x02F6, 0x02CC, 0x02A4, 0x027E,
    0x025A, 0x0238, 0x0218, 0x01FA, 0x01DE, 0x01C3, 0x01AA, 0x0192,
    0x017B, 0x0166, 0x0152, 0x013F, 0x012D, 0x011C, 0x010C, 0x00FD,
    0x00EF, 0x00E1, 0x00D5, 0x00C9, 0x00BE, 0x00B3, 0x00A9, 0x009F,
    0x0096, 0x008E, 0x0086, 0x007F, 0x0077, 0x0071, 0x006A, 0x0064,
    0x005F, 0x0059, 0x0054, 0x0050, 0x004B, 0x0047, 0x0043, 0x003F,
    0x003C, 0x0038, 0x0035, 0x0032, 0x002F, 0x002D, 0x002A, 0x0028,
    0x0026, 0x0024, 0x0022, 0x0020, 0x001E, 0x001C, 0x001B, 0x0019,
    0x0018, 0x0016, 0x0015, 0x0014, 0x0013, 0x0012, 0x0011, 0x0010,
    0x000F, 0x000E, 0x000D, 0x000D, 0x000C, 0x000B, 0x000B, 0x000A,
];
