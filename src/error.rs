//! Error types
//!
//! Errors only ever come out of the configuration and transport boundaries. The real-time path (decoding, voice
//! allocation, register writes) never fails, it degrades silently instead.

use thiserror::Error;

/// Errors reported at the configuration and transport boundaries
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI channel {0} is out of range [0..15]")]
    InvalidChannel(u8),

    #[error("{field} value {value:#X} is out of range [0..{max:#X}]")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("program number {0} is out of range [1..128]")]
    InvalidProgram(u8),

    #[error("the active driver is not {expected}")]
    WrongDriver { expected: &'static str },

    #[error("packet stream length {0} is not a multiple of 4")]
    UnalignedPacketStream(usize),

    #[error("register write needs at least one data byte")]
    MissingRegisterData,
}

impl Error {
    /// `e.status_code()` is the negative status code a C-style caller expects for this error
    ///
    /// A bad channel index is `-2`, everything else is `-1`.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::InvalidChannel(_) => -2,
            _ => -1,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
