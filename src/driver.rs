//! Sound drivers
//!
//! A sound driver owns one chip's register protocol and its voices. It is told about notes, controller changes and
//! pitch bends after the channel state has already been updated, and turns them into register writes.
//!
//! The bus is passed in on every call rather than owned, so the engine can swap drivers without giving up the bus.

use crate::{
    bus::RegisterBus,
    channel_state::{ChannelState, ControlEvent},
};

/// The interface every sound driver implements
///
/// Channels are in `[0..15]`, notes and velocities in `[0..127]`. Note-ons always have a non-zero velocity, a
/// note-on with velocity zero arrives as a note-off.
pub trait SoundDriver {
    /// `d.init(bus)` powers up the chip and puts every voice into a known, silent state
    fn init<B: RegisterBus>(&mut self, bus: &mut B);

    /// `d.deinit(bus)` releases every sounding voice, called before another driver takes over the chip
    fn deinit<B: RegisterBus>(&mut self, bus: &mut B);

    fn note_on<B: RegisterBus>(
        &mut self,
        bus: &mut B,
        channel: u8,
        note: u8,
        velocity: u8,
        state: &ChannelState,
    );

    fn note_off<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, note: u8);

    /// `d.control(bus, ch, e, state)` reacts to a control change that has already been applied to `state`
    fn control<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, event: ControlEvent, state: &ChannelState);

    /// Program changes are ignored unless a driver has patches to load
    fn program_change<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, program: u8) {
        let _ = (bus, channel, program);
    }

    /// `d.pitch_bend(bus, ch, v, state)` bends every voice on channel `ch` to the 14-bit bend value `v`
    fn pitch_bend<B: RegisterBus>(&mut self, bus: &mut B, channel: u8, value: u16, state: &ChannelState);

    /// `d.sounding_voices()` is the number of voices currently playing a note
    fn sounding_voices(&self) -> usize;
}
