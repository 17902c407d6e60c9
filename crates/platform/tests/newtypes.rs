//! Type system enforcement tests for audio domain newtypes.
//! These newtypes keep out-of-range slot, gain and speed values from ever
//! reaching the engine's address arithmetic and table lookups.

#![allow(clippy::unwrap_used)]

use platform::audio_types::{AudioSlot, ByteOrder, Gain, SpeedIndex};
use platform::flash_layout::AUDIO_SLOT_COUNT;
use proptest::prelude::*;

// ── AudioSlot ────────────────────────────────────────────────────────────────

#[test]
fn audio_slot_accepts_every_stored_file() {
    for index in 0..AUDIO_SLOT_COUNT {
        assert_eq!(AudioSlot::try_new(index).unwrap().get(), index);
    }
}

#[test]
fn audio_slot_rejects_past_last_file() {
    let err = AudioSlot::try_new(AUDIO_SLOT_COUNT).unwrap_err();
    assert_eq!(err.value, u32::from(AUDIO_SLOT_COUNT));
    assert_eq!(err.max, 2);
    assert!(AudioSlot::try_new(255).is_err());
}

#[test]
fn audio_slot_defaults_to_first() {
    assert_eq!(AudioSlot::default(), AudioSlot::FIRST);
    assert_eq!(core::mem::size_of::<AudioSlot>(), 1);
}

// ── Gain ─────────────────────────────────────────────────────────────────────

#[test]
fn gain_clamps_above_unity() {
    assert_eq!(Gain::new(1001).get(), 1000);
    assert_eq!(Gain::new(u16::MAX), Gain::UNITY);
}

#[test]
fn gain_unity_detection() {
    assert!(Gain::UNITY.is_unity());
    assert!(!Gain::new(999).is_unity());
    assert!(!Gain::ZERO.is_unity());
}

// ── SpeedIndex ───────────────────────────────────────────────────────────────

#[test]
fn speed_index_rejects_table_overflow() {
    assert!(SpeedIndex::try_new(99).is_ok());
    let err = SpeedIndex::try_new(100).unwrap_err();
    assert_eq!((err.min, err.max), (0, 99));
}

// ── ByteOrder ────────────────────────────────────────────────────────────────

#[test]
fn byte_order_defaults_to_big_endian() {
    assert_eq!(ByteOrder::default(), ByteOrder::Big);
    assert_eq!(ByteOrder::Big.u16_from([0x03, 0xE8]), 1000);
    assert_eq!(ByteOrder::Little.u16_from([0xE8, 0x03]), 1000);
    assert_eq!(ByteOrder::Big.u32_from([0, 0, 0x10, 0]), 4096);
}

proptest! {
    #[test]
    fn gain_never_exceeds_scale(raw in any::<u16>()) {
        prop_assert!(Gain::new(raw).get() <= Gain::SCALE);
    }

    #[test]
    fn speed_index_valid_iff_below_steps(speed in any::<u16>()) {
        prop_assert_eq!(SpeedIndex::try_new(speed).is_ok(), speed < SpeedIndex::STEPS);
    }

    #[test]
    fn byte_order_encode_matches_decode(value in any::<u32>(), big in any::<bool>()) {
        let order = if big { ByteOrder::Big } else { ByteOrder::Little };
        prop_assert_eq!(order.u32_from(order.u32_to(value)), value);
    }
}
