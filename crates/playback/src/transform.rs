//! In-place sample transform: frequency shift, then gain.
//!
//! The frequency shift raises the pitch by dropping `rate` bytes out of every
//! edit window of `window` bytes and closing the gap, so the buffer plays out
//! faster. Gain then scales each remaining byte on the 0–1000 scale.
//!
//! Both steps run to completion on the caller's stack; no allocation.

use platform::Gain;

use crate::buffer::SampleBuffer;

/// Shift `storage` left by `rate` bytes once per edit window.
///
/// The first cut happens at `window - rate` and each further cut is one
/// window later. A window no wider than the rate cuts once, at `rate`.
/// Bytes past the end of `storage` are never read. Returns the number of
/// bytes removed, which never exceeds what was actually cut out.
pub fn shift_in_place(storage: &mut [u8], rate: u16, window: u16) -> usize {
    let max = storage.len();
    let rate = usize::from(rate);
    let window = usize::from(window);
    if rate == 0 || window == 0 {
        return 0;
    }

    // a zero step would cut the same position until the buffer is gone
    let (mut pos, step) = match window.checked_sub(rate) {
        Some(step) if step != 0 => (step, step),
        _ => (rate, 0),
    };
    let mut remaining = max.saturating_sub(window);
    let mut removed = 0usize;

    while pos < max && remaining != 0 {
        let src = pos.saturating_add(rate).min(max);
        let end = src.saturating_add(remaining).min(max);
        storage.copy_within(src..end, pos);
        removed = removed.saturating_add(src.saturating_sub(pos));
        if step == 0 {
            break;
        }
        remaining = remaining.saturating_sub(window);
        pos = pos.saturating_add(step);
    }

    removed
}

/// Scale every byte of `samples` by `gain`, flooring: `byte × gain / 1000`.
///
/// Unity gain leaves the bytes untouched.
pub fn scale_in_place(samples: &mut [u8], gain: Gain) {
    if gain.is_unity() {
        return;
    }
    let gain = u32::from(gain.get());
    let scale = u32::from(Gain::SCALE);
    for byte in samples.iter_mut() {
        let scaled = u32::from(*byte)
            .saturating_mul(gain)
            .checked_div(scale)
            .unwrap_or(0);
        *byte = u8::try_from(scaled).unwrap_or(u8::MAX);
    }
}

/// Apply the frequency shift and the gain to a freshly filled buffer.
///
/// `window` is the edit window from the config table and the rate comes from
/// the buffer itself. Zero gain leaves the buffer untouched. The resulting
/// `current_size` is the capacity minus the removed bytes.
pub fn edit<const N: usize>(buffer: &mut SampleBuffer<N>, gain: Gain, window: u16) -> usize {
    if gain == Gain::ZERO {
        return 0;
    }
    let (storage, current_size, rate) = buffer.parts_mut();
    let removed = shift_in_place(storage, rate, window);
    *current_size = N.saturating_sub(removed);
    if let Some(samples) = storage.get_mut(..*current_size) {
        scale_in_place(samples, gain);
    }
    removed
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

    fn ramp<const N: usize>() -> [u8; N] {
        core::array::from_fn(|i| (i % 251) as u8)
    }

    #[test]
    fn rate_zero_removes_nothing() {
        let mut data: [u8; 16] = ramp();
        let original = data;
        assert_eq!(shift_in_place(&mut data, 0, 4), 0);
        assert_eq!(data, original);
    }

    #[test]
    fn one_byte_per_half_buffer_window() {
        let mut data: [u8; 8] = ramp();
        // window 4, rate 1: cut at index 3, tail of 4 bytes moves left once
        assert_eq!(shift_in_place(&mut data, 1, 4), 1);
        assert_eq!(&data[..7], &[0, 1, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn small_window_cuts_repeatedly() {
        let mut data: [u8; 8] = ramp();
        // window 2, rate 1: remaining 6 → 4 → 2 → 0, three cuts
        let removed = shift_in_place(&mut data, 1, 2);
        assert_eq!(removed, 3);
        assert_eq!(&data[..5], &[0, 2, 4, 6, 7]);
    }

    #[test]
    fn window_covering_whole_buffer_removes_nothing() {
        let mut data: [u8; 8] = ramp();
        assert_eq!(shift_in_place(&mut data, 1, 8), 0);
    }

    #[test]
    fn window_equal_to_rate_cuts_once() {
        let mut data: [u8; 32] = ramp();
        assert_eq!(shift_in_place(&mut data, 4, 4), 4);
        assert_eq!(&data[..6], &[0, 1, 2, 3, 8, 9]);
    }

    #[test]
    fn window_narrower_than_rate_cuts_once_at_rate() {
        let mut data = [7u8; 2048];
        assert_eq!(shift_in_place(&mut data, 4, 2), 4);

        let mut data: [u8; 12] = ramp();
        assert_eq!(shift_in_place(&mut data, 3, 1), 3);
        assert_eq!(&data[..9], &[0, 1, 2, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn narrow_window_edit_keeps_the_slot_playable() {
        let mut buf: SampleBuffer<2048> = SampleBuffer::new();
        buf.set_shifting_rate(4);
        assert_eq!(edit(&mut buf, Gain::UNITY, 2), 4);
        assert_eq!(buf.current_size(), 2044);
    }

    #[test]
    fn cut_near_the_end_counts_only_removed_bytes() {
        let mut data: [u8; 6] = ramp();
        assert_eq!(shift_in_place(&mut data, 4, 1), 2);
        assert_eq!(&data[..4], &[0, 1, 2, 3]);
    }

    #[test]
    fn unity_gain_is_identity() {
        let mut data: [u8; 64] = ramp();
        let original = data;
        scale_in_place(&mut data, Gain::UNITY);
        assert_eq!(data, original);
    }

    #[test]
    fn half_gain_floors() {
        let mut data = [0u8, 1, 3, 255];
        scale_in_place(&mut data, Gain::new(500));
        assert_eq!(data, [0, 0, 1, 127]);
    }

    #[test]
    fn zero_gain_edit_is_a_no_op() {
        let mut buf: SampleBuffer<16> = SampleBuffer::new();
        *buf.storage_mut() = ramp();
        buf.set_shifting_rate(1);
        assert_eq!(edit(&mut buf, Gain::ZERO, 4), 0);
        assert_eq!(buf.current_size(), 16);
        assert_eq!(buf.samples(), &ramp::<16>()[..]);
    }

    #[test]
    fn edit_shrinks_then_scales() {
        let mut buf: SampleBuffer<8> = SampleBuffer::new();
        *buf.storage_mut() = [10, 20, 30, 40, 50, 60, 70, 80];
        buf.set_shifting_rate(1);
        assert_eq!(edit(&mut buf, Gain::new(500), 4), 1);
        assert_eq!(buf.current_size(), 7);
        assert_eq!(buf.samples(), &[5, 10, 15, 25, 30, 35, 40]);
    }
}
