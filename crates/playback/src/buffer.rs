//! Sample buffers and the current/spare role arbiter.
//!
//! Two physical slots alternate between the "current" role (on the I2S bus or
//! next in line) and the "spare" role (being refilled from flash and
//! transformed). A third, smaller buffer of zeros stands in for the current
//! slot while the output is muted or when the spare is not ready in time.
//!
//! Roles are held as a [`SlotId`] index, never as references, so swapping
//! roles is a single assignment.
//!
//! Slot lifecycle:
//! ```text
//! Idle → Read → ReadWait → Edit → Ready → Busy
//!         ↑                                 │
//!         └──────────── retire ─────────────┘
//! ```

/// Capacity of one sample slot in bytes.
pub const SLOT_CAPACITY: usize = 2048;

/// Capacity of the silence buffer in bytes.
pub const SILENCE_CAPACITY: usize = 100;

/// Bytes cut per edit window until the first speed update.
pub const DEFAULT_SHIFTING_RATE: u16 = 1;

/// Lifecycle state of a sample buffer (and of the config table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferState {
    /// Nothing requested.
    #[default]
    Idle,
    /// A fill from flash is wanted.
    Read,
    /// The fill has been issued and is outstanding (or just completed).
    ReadWait,
    /// Filled; waiting for the transform.
    Edit,
    /// Transformed; may be handed to the transmitter.
    Ready,
    /// Owned by the transmitter until the transfer completes.
    Busy,
}

impl BufferState {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Read => "read",
            Self::ReadWait => "read-wait",
            Self::Edit => "edit",
            Self::Ready => "ready",
            Self::Busy => "busy",
        }
    }

    /// `true` while a refill is in progress (never transmittable).
    pub fn is_refilling(self) -> bool {
        matches!(self, Self::Read | Self::ReadWait | Self::Edit)
    }
}

/// One of the two physical sample slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotId {
    /// First slot; holds the current role after reset.
    A,
    /// Second slot; holds the spare role after reset.
    B,
}

impl SlotId {
    /// Both slots, in reset role order (current, spare).
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// The other slot.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Fixed-capacity byte buffer with its own lifecycle.
///
/// `max_size` is the capacity `N`; `current_size` shrinks when the frequency
/// shift removes samples and is restored when the buffer is refilled.
pub struct SampleBuffer<const N: usize> {
    storage: [u8; N],
    current_size: usize,
    shifting_rate: u16,
    state: BufferState,
}

impl<const N: usize> SampleBuffer<N> {
    /// Create a zeroed, full-size buffer in the `Idle` state.
    pub const fn new() -> Self {
        Self::with_shifting_rate(0)
    }

    /// Like [`SampleBuffer::new`] with a preset shifting rate.
    pub const fn with_shifting_rate(shifting_rate: u16) -> Self {
        Self {
            storage: [0; N],
            current_size: N,
            shifting_rate,
            state: BufferState::Idle,
        }
    }

    /// Capacity in bytes.
    pub const fn max_size(&self) -> usize {
        N
    }

    /// Number of valid bytes after the last transform.
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Set the number of valid bytes (clamped to the capacity).
    pub fn set_current_size(&mut self, size: usize) {
        self.current_size = size.min(N);
    }

    /// Samples removed per edit window.
    pub fn shifting_rate(&self) -> u16 {
        self.shifting_rate
    }

    /// Set the samples removed per edit window.
    pub fn set_shifting_rate(&mut self, rate: u16) {
        self.shifting_rate = rate;
    }

    /// Lifecycle state.
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Move to `state`.
    pub fn set_state(&mut self, state: BufferState) {
        self.state = state;
    }

    /// The valid samples.
    pub fn samples(&self) -> &[u8] {
        self.storage.get(..self.current_size).unwrap_or(&self.storage)
    }

    /// The whole storage, for flash fills and in-place transforms.
    pub fn storage_mut(&mut self) -> &mut [u8; N] {
        &mut self.storage
    }

    /// Storage and the mutable size together, for the transform.
    pub(crate) fn parts_mut(&mut self) -> (&mut [u8; N], &mut usize, u16) {
        (&mut self.storage, &mut self.current_size, self.shifting_rate)
    }
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// BufferPair (role arbiter)
// ---------------------------------------------------------------------------

/// Outcome of rotating roles after a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// The spare took over the current role.
    Swapped,
    /// The current slot is played again after a stretch of silence.
    Resumed,
    /// Muted: the silence buffer plays.
    Muted,
    /// No slot was ready in time: the silence buffer plays.
    Underrun,
}

impl Rotation {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swapped => "swapped",
            Self::Resumed => "resumed",
            Self::Muted => "muted",
            Self::Underrun => "underrun",
        }
    }
}

/// The two sample slots, the silence buffer and the role assignment.
pub struct BufferPair {
    slots: [SampleBuffer<SLOT_CAPACITY>; 2],
    silence: SampleBuffer<SILENCE_CAPACITY>,
    current: SlotId,
    silence_active: bool,
    /// Silence stands in for a `Ready` current slot that a mute skipped.
    substituted: bool,
}

impl BufferPair {
    /// Both slots `Idle` at the default shifting rate, slot A current,
    /// silence inactive.
    pub const fn new() -> Self {
        Self {
            slots: [
                SampleBuffer::with_shifting_rate(DEFAULT_SHIFTING_RATE),
                SampleBuffer::with_shifting_rate(DEFAULT_SHIFTING_RATE),
            ],
            silence: SampleBuffer::new(),
            current: SlotId::A,
            silence_active: false,
            substituted: false,
        }
    }

    /// Return to the state of [`BufferPair::new`].
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drop both slots back to `Idle` for a new audio file. While muted the
    /// silence buffer stays armed so the restarted stream opens with silence.
    pub fn restart(&mut self, muted: bool) {
        for slot in &mut self.slots {
            slot.set_state(BufferState::Idle);
        }
        self.silence_active = muted;
        self.substituted = false;
        self.silence.set_state(if muted {
            BufferState::Ready
        } else {
            BufferState::Idle
        });
    }

    /// Slot holding the current role.
    pub fn current_id(&self) -> SlotId {
        self.current
    }

    /// Slot holding the spare role.
    pub fn spare_id(&self) -> SlotId {
        self.current.other()
    }

    /// `true` while the silence buffer stands in for the current slot.
    pub fn silence_active(&self) -> bool {
        self.silence_active
    }

    /// Slot by id.
    pub fn slot(&self, id: SlotId) -> &SampleBuffer<SLOT_CAPACITY> {
        let [a, b] = &self.slots;
        match id {
            SlotId::A => a,
            SlotId::B => b,
        }
    }

    /// Mutable slot by id.
    pub fn slot_mut(&mut self, id: SlotId) -> &mut SampleBuffer<SLOT_CAPACITY> {
        let [a, b] = &mut self.slots;
        match id {
            SlotId::A => a,
            SlotId::B => b,
        }
    }

    /// Slot holding the current role.
    pub fn current(&self) -> &SampleBuffer<SLOT_CAPACITY> {
        self.slot(self.current)
    }

    /// Slot holding the spare role.
    pub fn spare(&self) -> &SampleBuffer<SLOT_CAPACITY> {
        self.slot(self.spare_id())
    }

    /// The silence buffer.
    pub fn silence(&self) -> &SampleBuffer<SILENCE_CAPACITY> {
        &self.silence
    }

    /// State of whichever buffer plays next (silence or current slot).
    pub fn active_state(&self) -> BufferState {
        if self.silence_active {
            self.silence.state()
        } else {
            self.current().state()
        }
    }

    /// Samples of whichever buffer plays next.
    pub fn active_samples(&self) -> &[u8] {
        if self.silence_active {
            self.silence.samples()
        } else {
            self.current().samples()
        }
    }

    /// Move whichever buffer plays next to `state`.
    pub fn set_active_state(&mut self, state: BufferState) {
        if self.silence_active {
            self.silence.set_state(state);
        } else {
            let current = self.current;
            self.slot_mut(current).set_state(state);
        }
    }

    /// Apply `rate` to both slots.
    pub fn set_shifting_rate(&mut self, rate: u16) {
        for slot in &mut self.slots {
            slot.set_shifting_rate(rate);
        }
    }

    /// `true` when both slots are `Ready`.
    pub fn both_ready(&self) -> bool {
        self.slots.iter().all(|s| s.state() == BufferState::Ready)
    }

    /// Request a refill of `id` unless one is already in progress.
    pub fn retire(&mut self, id: SlotId) {
        let slot = self.slot_mut(id);
        if !slot.state().is_refilling() {
            slot.set_state(BufferState::Read);
        }
    }

    /// Rotate roles after the active buffer finished transmitting.
    ///
    /// The buffer that just played is retired for refill (the silence buffer
    /// is simply re-armed). Muted output always continues with silence; an
    /// unmuted pipeline falls back to silence only when no slot is `Ready`.
    pub fn rotate(&mut self, muted: bool) -> Rotation {
        if muted {
            self.enter_silence();
            return Rotation::Muted;
        }

        if self.silence_active {
            if let Some(rotation) = self.leave_silence() {
                return rotation;
            }
            self.silence.set_state(BufferState::Ready);
            return Rotation::Underrun;
        }

        self.retire(self.current);
        let spare = self.spare_id();
        if self.slot(spare).state() == BufferState::Ready {
            self.current = spare;
            Rotation::Swapped
        } else {
            self.enter_silence();
            Rotation::Underrun
        }
    }

    /// Substitute silence for a `Ready` current slot. The slot keeps its
    /// samples and state; the spare is not touched.
    ///
    /// Returns `true` when the substitution happened.
    pub fn mute_substitute(&mut self) -> bool {
        if self.silence_active || self.current().state() != BufferState::Ready {
            return false;
        }
        self.silence_active = true;
        self.substituted = true;
        self.silence.set_state(BufferState::Ready);
        true
    }

    /// Hand a `Ready` silence buffer back to sample data.
    ///
    /// Returns `true` when a slot took over.
    pub fn unmute_restore(&mut self) -> bool {
        if !self.silence_active || self.silence.state() != BufferState::Ready {
            return false;
        }
        self.leave_silence().is_some()
    }

    /// Switch to silence, retiring the current slot if it was on the bus.
    fn enter_silence(&mut self) {
        if !self.silence_active {
            let current = self.current;
            if self.slot(current).state() == BufferState::Busy {
                self.retire(current);
            }
            self.silence_active = true;
        }
        self.silence.set_state(BufferState::Ready);
    }

    /// Leave silence for the spare or the current slot.
    ///
    /// A slot refilled while silence played holds the block after the spare,
    /// so it stays `Ready` and becomes the new spare. A slot skipped by a mute
    /// substitution is retired instead.
    fn leave_silence(&mut self) -> Option<Rotation> {
        let spare = self.spare_id();
        let rotation = if self.slot(spare).state() == BufferState::Ready {
            if self.substituted {
                self.retire(self.current);
            }
            self.current = spare;
            Rotation::Swapped
        } else if self.current().state() == BufferState::Ready {
            Rotation::Resumed
        } else {
            return None;
        };
        self.silence_active = false;
        self.substituted = false;
        self.silence.set_state(BufferState::Idle);
        Some(rotation)
    }
}

impl Default for BufferPair {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;

    fn ready_pair() -> BufferPair {
        let mut pair = BufferPair::new();
        pair.slot_mut(SlotId::A).set_state(BufferState::Ready);
        pair.slot_mut(SlotId::B).set_state(BufferState::Ready);
        pair
    }

    #[test]
    fn new_pair_has_a_current_and_silence_sized_100() {
        let pair = BufferPair::new();
        assert_eq!(pair.current_id(), SlotId::A);
        assert_eq!(pair.spare_id(), SlotId::B);
        assert_eq!(pair.silence().max_size(), SILENCE_CAPACITY);
        assert_eq!(pair.silence().shifting_rate(), 0);
        assert_eq!(pair.slot(SlotId::A).shifting_rate(), DEFAULT_SHIFTING_RATE);
        assert!(pair.silence().samples().iter().all(|&b| b == 0));
    }

    #[test]
    fn rotate_swaps_to_ready_spare_and_retires_current() {
        let mut pair = ready_pair();
        pair.set_active_state(BufferState::Busy);
        assert_eq!(pair.rotate(false), Rotation::Swapped);
        assert_eq!(pair.current_id(), SlotId::B);
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::Read);
        assert_eq!(pair.active_state(), BufferState::Ready);
    }

    #[test]
    fn rotate_without_ready_spare_plays_silence() {
        let mut pair = ready_pair();
        pair.set_active_state(BufferState::Busy);
        pair.slot_mut(SlotId::B).set_state(BufferState::Edit);
        assert_eq!(pair.rotate(false), Rotation::Underrun);
        assert!(pair.silence_active());
        assert_eq!(pair.current_id(), SlotId::A);
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::Read);
        assert_eq!(pair.slot(SlotId::B).state(), BufferState::Edit);
        assert_eq!(pair.active_samples().len(), SILENCE_CAPACITY);
    }

    #[test]
    fn silence_gives_way_to_spare_first() {
        let mut pair = ready_pair();
        pair.set_active_state(BufferState::Busy);
        pair.slot_mut(SlotId::B).set_state(BufferState::Edit);
        pair.rotate(false);
        pair.set_active_state(BufferState::Busy);
        pair.slot_mut(SlotId::B).set_state(BufferState::Ready);
        assert_eq!(pair.rotate(false), Rotation::Swapped);
        assert_eq!(pair.current_id(), SlotId::B);
        assert!(!pair.silence_active());
    }

    #[test]
    fn muted_rotation_keeps_playing_silence() {
        let mut pair = ready_pair();
        pair.set_active_state(BufferState::Busy);
        assert_eq!(pair.rotate(true), Rotation::Muted);
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::Read);
        pair.set_active_state(BufferState::Busy);
        assert_eq!(pair.rotate(true), Rotation::Muted);
        assert_eq!(pair.silence().state(), BufferState::Ready);
        assert_eq!(pair.slot(SlotId::B).state(), BufferState::Ready);
    }

    #[test]
    fn mute_substitute_leaves_slots_alone() {
        let mut pair = ready_pair();
        pair.slot_mut(SlotId::B).set_state(BufferState::ReadWait);
        assert!(pair.mute_substitute());
        assert!(pair.silence_active());
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::Ready);
        assert_eq!(pair.slot(SlotId::B).state(), BufferState::ReadWait);
    }

    #[test]
    fn mute_substitute_ignores_busy_current() {
        let mut pair = ready_pair();
        pair.set_active_state(BufferState::Busy);
        assert!(!pair.mute_substitute());
        assert!(!pair.silence_active());
    }

    #[test]
    fn unmute_restore_prefers_spare() {
        let mut pair = ready_pair();
        pair.mute_substitute();
        assert!(pair.unmute_restore());
        assert_eq!(pair.current_id(), SlotId::B);
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::Read);
    }

    #[test]
    fn leaving_underrun_keeps_the_unplayed_slot() {
        let mut pair = ready_pair();
        pair.set_active_state(BufferState::Busy);
        pair.slot_mut(SlotId::B).set_state(BufferState::Edit);
        pair.rotate(false);
        pair.set_active_state(BufferState::Busy);
        // A was refilled while silence played
        pair.slot_mut(SlotId::A).set_state(BufferState::Ready);
        pair.slot_mut(SlotId::B).set_state(BufferState::Ready);
        assert_eq!(pair.rotate(false), Rotation::Swapped);
        assert_eq!(pair.current_id(), SlotId::B);
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::Ready);
    }

    #[test]
    fn retire_does_not_restart_refill_in_progress() {
        let mut pair = BufferPair::new();
        pair.slot_mut(SlotId::A).set_state(BufferState::ReadWait);
        pair.retire(SlotId::A);
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::ReadWait);
        pair.slot_mut(SlotId::A).set_state(BufferState::Busy);
        pair.retire(SlotId::A);
        assert_eq!(pair.slot(SlotId::A).state(), BufferState::Read);
    }

    #[test]
    fn current_size_is_clamped_to_capacity() {
        let mut buf: SampleBuffer<8> = SampleBuffer::new();
        buf.set_current_size(100);
        assert_eq!(buf.current_size(), 8);
        buf.set_current_size(3);
        assert_eq!(buf.samples().len(), 3);
    }
}
