//! AVAS audio playback engine: flash read pipeline, double-buffered I2S
//! streaming and speed-dependent pitch/gain transform.
//!
//! # Architecture
//!
//! ```text
//!   process() ──► playback machine ──► refill dispatcher ──► DataStore::read
//!            └──► flash machine ─────┘        │
//!                                             ▼
//!   on_flash_complete() ──► slot ReadWait ──► Edit ──► transform ──► Ready
//!                                                                     │
//!   on_transfer_event() ──► role rotation ──► SampleTransmitter::write ◄┘
//! ```
//!
//! Everything lives in one [`AudioEngine`] value; no statics, no allocation.
//! Wrap it in a [`SharedAudioEngine`] when interrupts deliver the
//! completions.
//!
//! # Features
//!
//! - `defmt`: log through defmt and derive `defmt::Format` (target builds)
//! - `tracing`: log through tracing (host builds)
//! - `std`: host build of the collaborator mocks
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

pub mod buffer;
pub mod config;
pub mod config_table;
pub mod engine;
pub mod error;
pub mod flash;
pub mod shared;
pub mod transform;

pub use buffer::{BufferState, SlotId};
pub use config::EngineConfig;
pub use config_table::{ConfigTable, ConfigTableImage};
pub use engine::{AudioEngine, AudioParameters, PlayStatus, PlaybackState};
pub use error::EngineError;
pub use flash::{FlashReadState, PendingRead};
pub use shared::SharedAudioEngine;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    /// Config table decoding tests
    mod config_table_tests {
        use crate::config_table::{ConfigTable, ConfigTableImage};
        use crate::error::EngineError;
        use platform::{ByteOrder, SpeedIndex};

        fn table_from(image: &ConfigTableImage<'_>, order: ByteOrder) -> ConfigTable {
            let mut table = ConfigTable::new(order);
            *table.bytes_mut() = image.encode(order);
            table
        }

        fn sample_image() -> ConfigTableImage<'static> {
            let mut image = ConfigTableImage {
                name: "Pedestrian chime",
                audio_size: 204_800,
                version: "V1.2",
                calib_version: "C003",
                calib_tool_version: "T010",
                calib_date: "2024-03-18",
                max_edit_sample_count: 512,
                ..ConfigTableImage::default()
            };
            image.gains[20] = 750;
            image.frequencies[20] = 4;
            image.gains[99] = 1000;
            image.frequencies[99] = 16;
            image
        }

        #[test]
        fn test_decodes_big_endian_fields() {
            let table = table_from(&sample_image(), ByteOrder::Big);
            assert_eq!(table.name(), Ok("Pedestrian chime"));
            assert_eq!(table.audio_size(), 204_800);
            assert_eq!(table.version(), Ok("V1.2"));
            assert_eq!(table.calib_version(), Ok("C003"));
            assert_eq!(table.calib_tool_version(), Ok("T010"));
            assert_eq!(table.calib_date(), Ok("2024-03-18"));
            assert_eq!(table.max_edit_sample_count(), 512);
        }

        #[test]
        fn test_size_field_is_big_endian_on_the_wire() {
            let bytes = sample_image().encode(ByteOrder::Big);
            assert_eq!(&bytes[32..36], &204_800u32.to_be_bytes());
            assert_eq!(&bytes[64..66], &[0x02, 0x00]);
        }

        #[test]
        fn test_speed_rows_are_two_bytes_apart() {
            let table = table_from(&sample_image(), ByteOrder::Little);
            let row = SpeedIndex::try_new(20).unwrap();
            assert_eq!(table.gain(row), 750);
            assert_eq!(table.frequency(row), 4);
            let last = SpeedIndex::try_new(99).unwrap();
            assert_eq!(table.frequency(last), 16);
            assert_eq!(table.gain(SpeedIndex::try_new(0).unwrap()), 1000);
        }

        #[test]
        fn test_wrong_byte_order_swaps_values() {
            let bytes = sample_image().encode(ByteOrder::Big);
            let mut table = ConfigTable::new(ByteOrder::Little);
            *table.bytes_mut() = bytes;
            assert_eq!(table.max_edit_sample_count(), 2);
        }

        #[test]
        fn test_full_width_name_has_no_terminator() {
            let name = "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";
            let image = ConfigTableImage {
                name,
                ..ConfigTableImage::default()
            };
            let table = table_from(&image, ByteOrder::Big);
            assert_eq!(table.name(), Ok(name));
        }

        #[test]
        fn test_invalid_utf8_text_is_rejected() {
            let mut table = ConfigTable::new(ByteOrder::Big);
            table.bytes_mut()[36] = 0xFF;
            assert_eq!(table.version(), Err(EngineError::MalformedText));
        }

        #[test]
        fn test_reset_zeroes_and_idles() {
            let mut table = table_from(&sample_image(), ByteOrder::Big);
            table.set_state(crate::BufferState::Ready);
            table.reset();
            assert!(!table.is_ready());
            assert_eq!(table.name(), Ok(""));
            assert_eq!(table.audio_size(), 0);
        }
    }

    /// Engine state-name tests
    mod state_name_tests {
        use crate::{BufferState, EngineError, FlashReadState, PlaybackState};

        #[test]
        fn test_state_names_are_distinct() {
            let names = [
                PlaybackState::Init.as_str(),
                PlaybackState::Ready.as_str(),
                PlaybackState::Run.as_str(),
                PlaybackState::Switch.as_str(),
            ];
            for (i, a) in names.iter().enumerate() {
                for b in names.iter().skip(i + 1) {
                    assert_ne!(a, b);
                }
            }
        }

        #[test]
        fn test_log_names() {
            assert_eq!(BufferState::ReadWait.as_str(), "read-wait");
            assert_eq!(FlashReadState::ConfigTable.as_str(), "config-table");
            assert_eq!(EngineError::InvalidAudioIndex(7).as_str(), "invalid audio index");
        }

        #[test]
        fn test_error_display() {
            let e = EngineError::SpeedOutOfRange(120);
            assert_eq!(format!("{e}"), "speed 120 outside the calibration tables");
        }
    }
}
