//! Property-based tests for the in-place sample transform.
//! Verifies the shift and gain invariants for arbitrary buffers, rates and
//! windows, not just the calibrated values.

#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::indexing_slicing
)]

use platform::Gain;
use playback::buffer::SampleBuffer;
use playback::transform::{edit, scale_in_place, shift_in_place};

/// `true` if `needle` can be obtained from `haystack` by deleting bytes.
fn is_subsequence(needle: &[u8], haystack: &[u8]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|b| rest.any(|h| h == b))
}

/// Distinct bytes, so order checks cannot be fooled by repeats.
fn distinct(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

proptest::proptest! {
    /// Rate 0 leaves every byte where it was.
    #[test]
    fn zero_rate_is_identity(data in proptest::collection::vec(0u8..=255, 0..512), window in 0u16..=600) {
        let mut shifted = data.clone();
        assert_eq!(shift_in_place(&mut shifted, 0, window), 0);
        assert_eq!(shifted, data);
    }

    /// With a window wider than the rate, the removed byte count is a whole
    /// number of rate steps.
    #[test]
    fn removed_is_multiple_of_rate(len in 0usize..=256, rate in 1u16..=32, window in 1u16..=300) {
        proptest::prop_assume!(window > rate);
        let mut data = distinct(len);
        let removed = shift_in_place(&mut data, rate, window);
        assert_eq!(removed % usize::from(rate), 0,
            "rate {} window {} removed {}", rate, window, removed);
    }

    /// The surviving prefix keeps the original byte order.
    #[test]
    fn survivors_keep_their_order(len in 0usize..=256, rate in 1u16..=16, window in 1u16..=300) {
        let original = distinct(len);
        let mut data = original.clone();
        let removed = shift_in_place(&mut data, rate, window);
        let kept = len.saturating_sub(removed);
        assert!(is_subsequence(&data[..kept], &original),
            "rate {} window {}: {:?}", rate, window, &data[..kept]);
    }

    /// A window no wider than the rate cuts exactly once.
    #[test]
    fn narrow_window_cuts_once(rate in 1u16..=32, window in 1u16..=32, gain in 1u16..=1000) {
        proptest::prop_assume!(window <= rate);
        let mut data = distinct(256);
        assert!(shift_in_place(&mut data, rate, window) <= usize::from(rate));

        let mut buf: SampleBuffer<256> = SampleBuffer::new();
        buf.set_shifting_rate(rate);
        let removed = edit(&mut buf, Gain::new(gain), window);
        assert_eq!(removed, usize::from(rate));
        assert_eq!(buf.current_size(), 256 - usize::from(rate));
    }

    /// A window at least as large as the buffer never cuts.
    #[test]
    fn whole_buffer_window_never_cuts(len in 0usize..=200, rate in 1u16..=16, extra in 0u16..=50) {
        let mut data = distinct(len);
        let window = len as u16 + extra;
        if usize::from(rate) <= usize::from(window) {
            assert_eq!(shift_in_place(&mut data, rate, window), 0);
        }
    }

    /// Gain scaling floors `byte × gain / 1000` for every byte.
    #[test]
    fn gain_floors_every_byte(data in proptest::collection::vec(0u8..=255, 0..256), gain in 0u16..=1000) {
        let mut scaled = data.clone();
        scale_in_place(&mut scaled, Gain::new(gain));
        for (out, inp) in scaled.iter().zip(&data) {
            let expected = u32::from(*inp) * u32::from(gain) / 1000;
            assert_eq!(u32::from(*out), expected, "byte {} gain {}", inp, gain);
        }
    }

    /// Gain never makes a byte louder.
    #[test]
    fn gain_never_amplifies(byte in 0u8..=255, gain in 0u16..=2000) {
        let mut data = [byte];
        scale_in_place(&mut data, Gain::new(gain));
        assert!(data[0] <= byte);
    }

    /// After an edit the valid size is the capacity minus the removed bytes.
    #[test]
    fn edit_size_accounts_for_removed(rate in 0u16..=8, window in 0u16..=128, gain in 1u16..=1000) {
        let mut buf: SampleBuffer<256> = SampleBuffer::new();
        *buf.storage_mut() = core::array::from_fn(|i| i as u8);
        buf.set_shifting_rate(rate);
        let removed = edit(&mut buf, Gain::new(gain), window);
        assert_eq!(buf.current_size(), 256usize.saturating_sub(removed));
        assert_eq!(buf.samples().len(), buf.current_size());
    }
}
