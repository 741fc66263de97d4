#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

pub mod bus;
pub mod channel_state;
pub mod decoder;
pub mod driver;
pub mod engine;
pub mod error;
pub mod lookup_tables;
pub mod mode4;
pub mod music_box;
pub mod patch;
pub mod psg_player;
pub mod transport;
pub mod utils;
pub mod voice_pool;
pub mod ymf825;
pub mod ymz294;

pub use error::{Error, Result};
pub use midi_convert::midi_types;
