//! # Voice Pool
//!
//! A sound chip has a small, fixed number of voices, and MIDI can ask for any number of notes at once on 16 channels.
//!
//! The voice pool remembers which (channel, note) each physical voice is playing so that a later note-off finds the
//! right voice. When every voice is busy new notes are dropped, nothing already sounding is ever stolen.
//!
//! Lookups are linear scans from the lowest slot, so the first free slot always wins.

use heapless::Vec;

/// One physical voice and the note it is sounding is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSlot {
    /// the MIDI channel in `[0..15]` that owns this voice
    pub channel: u8,
    /// the MIDI note number in `[0..127]`
    pub note: u8,
    /// the note-on velocity, kept so volume changes can be re-applied
    pub velocity: u8,
    /// the unbent chip frequency code, kept so pitch bends never accumulate error
    pub frequency_code: u16,
}

/// A pool of `N` physical voices
#[derive(Debug, Clone)]
pub struct VoicePool<const N: usize> {
    slots: [Option<VoiceSlot>; N],
}

impl<const N: usize> Default for VoicePool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VoicePool<N> {
    /// `VoicePool::new()` is a new pool with every voice free
    pub fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// `vp.claim(ch, n, vel, code)` claims the first free voice for note `n` on channel `ch`
    ///
    /// # Returns
    ///
    /// * `Some(index)` - the index of the claimed voice
    ///
    /// * `None` - every voice is busy, the note should be dropped
    ///
    /// # Examples
    ///
    /// ```
    /// use nano_midi::voice_pool::VoicePool;
    ///
    /// let mut pool = VoicePool::<2>::new();
    ///
    /// assert_eq!(pool.claim(0, 60, 100, 0), Some(0));
    /// assert_eq!(pool.claim(1, 62, 100, 0), Some(1));
    /// assert_eq!(pool.claim(2, 64, 100, 0), None);
    /// ```
    pub fn claim(&mut self, channel: u8, note: u8, velocity: u8, frequency_code: u16) -> Option<usize> {
        let index = self.slots.iter().position(|s| s.is_none())?;
        self.assign(index, channel, note, velocity, frequency_code);
        Some(index)
    }

    /// `vp.assign(i, ch, n, vel, code)` puts the note into voice `i` whether or not it was busy
    ///
    /// Used where the voice is fixed by the channel rather than allocated. Out of range indices are ignored.
    pub fn assign(&mut self, index: usize, channel: u8, note: u8, velocity: u8, frequency_code: u16) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(VoiceSlot {
                channel: channel & 0x0F,
                note: note & 0x7F,
                velocity: velocity & 0x7F,
                frequency_code,
            });
        }
    }

    /// `vp.release_note(ch, n)` frees the first voice sounding note `n` on channel `ch`
    ///
    /// # Returns
    ///
    /// * `Some((index, slot))` - the freed voice and what it was playing
    ///
    /// * `None` - nothing matched, for example because the note-on was dropped
    pub fn release_note(&mut self, channel: u8, note: u8) -> Option<(usize, VoiceSlot)> {
        let index = self
            .slots
            .iter()
            .position(|s| matches!(s, Some(v) if v.channel == channel && v.note == note))?;

        self.release(index).map(|slot| (index, slot))
    }

    /// `vp.release(i)` frees voice `i`, returning what it was playing
    pub fn release(&mut self, index: usize) -> Option<VoiceSlot> {
        self.slots.get_mut(index).and_then(|s| s.take())
    }

    /// `vp.release_channel(ch)` frees every voice owned by channel `ch`
    ///
    /// # Returns
    ///
    /// * the indices and contents of the freed voices, lowest index first
    pub fn release_channel(&mut self, channel: u8) -> Vec<(usize, VoiceSlot), N> {
        let mut released = Vec::new();

        for (i, s) in self.slots.iter_mut().enumerate() {
            if matches!(s, Some(v) if v.channel == channel) {
                if let Some(v) = s.take() {
                    // can't overflow, there are only `N` slots
                    released.push((i, v)).ok();
                }
            }
        }

        released
    }

    /// `vp.sounding()` is the number of busy voices
    pub fn sounding(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// `vp.sounding_on_channel(ch)` iterates over the busy voices owned by channel `ch`
    pub fn sounding_on_channel(&self, channel: u8) -> impl Iterator<Item = (usize, &VoiceSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(i, s)| match s {
                Some(v) if v.channel == channel => Some((i, v)),
                _ => None,
            })
    }

    /// `vp.slot(i)` is what voice `i` is playing, or `None` if it is free or out of range
    pub fn slot(&self, index: usize) -> Option<&VoiceSlot> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// `vp.clear()` frees every voice
    pub fn clear(&mut self) {
        self.slots = [None; N];
    }

    /// `vp.capacity()` is the number of physical voices
    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_free_slot_wins() {
        let mut pool = VoicePool::<3>::new();
        assert_eq!(pool.claim(0, 60, 100, 0), Some(0));
        assert_eq!(pool.claim(0, 62, 100, 0), Some(1));

        pool.release_note(0, 60);
        assert_eq!(pool.claim(0, 64, 100, 0), Some(0));
    }

    #[test]
    fn exhausted_pool_drops_the_note() {
        let mut pool = VoicePool::<2>::new();
        pool.claim(0, 60, 100, 0);
        pool.claim(1, 62, 100, 0);
        assert_eq!(pool.claim(2, 64, 100, 0), None);
        assert_eq!(pool.sounding(), 2);

        // note-off for the dropped note doesn't touch the others
        assert_eq!(pool.release_note(2, 64), None);
        assert_eq!(pool.sounding(), 2);
    }

    #[test]
    fn release_note_needs_channel_and_note_to_match() {
        let mut pool = VoicePool::<3>::new();
        pool.claim(0, 60, 100, 0);
        assert_eq!(pool.release_note(1, 60), None);
        assert_eq!(pool.release_note(0, 61), None);

        let (i, slot) = pool.release_note(0, 60).unwrap();
        assert_eq!(i, 0);
        assert_eq!(slot.note, 60);
        assert_eq!(pool.sounding(), 0);
    }

    #[test]
    fn release_channel_only_touches_that_channel() {
        let mut pool = VoicePool::<3>::new();
        pool.claim(5, 60, 100, 0);
        pool.claim(6, 61, 100, 0);
        pool.claim(5, 62, 100, 0);

        let released = pool.release_channel(5);
        assert_eq!(released.len(), 2);
        assert_eq!(released[0].0, 0);
        assert_eq!(released[1].0, 2);

        assert_eq!(pool.sounding(), 1);
        assert_eq!(pool.slot(1).map(|s| s.channel), Some(6));
    }

    #[test]
    fn slots_remember_velocity_and_frequency_code() {
        let mut pool = VoicePool::<3>::new();
        pool.claim(2, 69, 90, 0x011C);
        let slot = pool.slot(0).unwrap();
        assert_eq!(slot.velocity, 90);
        assert_eq!(slot.frequency_code, 0x011C);
    }

    #[test]
    fn sounding_on_channel_lists_matching_voices() {
        let mut pool = VoicePool::<3>::new();
        pool.claim(1, 60, 100, 0);
        pool.claim(2, 61, 100, 0);
        pool.claim(1, 62, 100, 0);

        let notes: std::vec::Vec<u8> = pool.sounding_on_channel(1).map(|(_, s)| s.note).collect();
        assert_eq!(notes, [60, 62]);
    }

    #[test]
    fn assign_overwrites_a_fixed_voice() {
        let mut pool = VoicePool::<16>::new();
        pool.assign(3, 3, 60, 100, 0);
        pool.assign(3, 3, 67, 80, 0);
        assert_eq!(pool.slot(3).map(|s| s.note), Some(67));
        assert_eq!(pool.sounding(), 1);

        pool.assign(99, 0, 0, 0, 0);
        assert_eq!(pool.sounding(), 1);
    }

    #[test]
    fn clear_frees_everything() {
        let mut pool = VoicePool::<2>::new();
        pool.claim(0, 60, 100, 0);
        pool.claim(0, 61, 100, 0);
        pool.clear();
        assert_eq!(pool.sounding(), 0);
        assert_eq!(pool.capacity(), 2);
    }
}
