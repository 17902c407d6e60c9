//! EEPROM / external-flash address layout for the stored audio files.
//!
//! ## Address space
//!
//! EEPROM parameters and the external flash share one linear address space.
//! The parameter labels occupy the first [`EEPROM_END`] bytes; the three audio
//! files follow, each as a 500-byte configuration table immediately followed
//! by its sample data region:
//!
//! ```text
//! 0x0000_0000  ┌──────────────────────────┐
//!              │  EEPROM labels           │   355 B (auth, speed, DTCs, DIDs…)
//! 0x0000_0163  ├──────────────────────────┤
//!              │  Audio 1 config table    │   500 B
//!              │  Audio 1 samples         │   500 KiB
//!              ├──────────────────────────┤
//!              │  Audio 2 config table    │   500 B
//!              │  Audio 2 samples         │   500 KiB
//!              ├──────────────────────────┤
//!              │  Audio 3 config table    │   500 B
//!              │  Audio 3 samples         │   500 KiB
//!              └──────────────────────────┘
//! ```
//!
//! The calibration tool writes the config table and the raw sample data as
//! one image per audio file, so the sample data of slot `i` always starts
//! [`CONFIG_TABLE_SIZE`] bytes after its table.

use crate::audio_types::AudioSlot;

// ── EEPROM labels ────────────────────────────────────────────────────────────

/// EEPROM address of the persisted current-audio index (1 byte).
pub const LABEL_CURRENT_AUDIO: u32 = 41;

/// First address past the EEPROM parameter labels.
pub const EEPROM_END: u32 = 355;

// ── Audio file regions ───────────────────────────────────────────────────────

/// Size of one audio configuration table in bytes.
pub const CONFIG_TABLE_SIZE: usize = 500;

/// Size reserved for the sample data of one audio file (500 KiB).
pub const AUDIO_REGION_SIZE: u32 = 500 * 1024;

/// Number of audio files stored in flash.
pub const AUDIO_SLOT_COUNT: u8 = 3;

/// Location of the audio files inside the shared address space.
///
/// [`FlashLayout::default`] matches the production ECU; tests and bench
/// setups may move the audio area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashLayout {
    /// Address of the first audio config table.
    pub base_address: u32,
    /// Bytes reserved for the samples of one audio file.
    pub audio_region_size: u32,
}

impl FlashLayout {
    /// Distance between two consecutive audio config tables.
    #[allow(clippy::cast_possible_truncation)] // CONFIG_TABLE_SIZE is 500
    pub fn slot_stride(&self) -> u32 {
        (CONFIG_TABLE_SIZE as u32).saturating_add(self.audio_region_size)
    }

    /// Address of the config table of `slot`.
    pub fn config_table_address(&self, slot: AudioSlot) -> u32 {
        self.slot_stride()
            .saturating_mul(u32::from(slot.get()))
            .saturating_add(self.base_address)
    }

    /// Address of the first sample of `slot`.
    #[allow(clippy::cast_possible_truncation)] // CONFIG_TABLE_SIZE is 500
    pub fn audio_address(&self, slot: AudioSlot) -> u32 {
        self.config_table_address(slot)
            .saturating_add(CONFIG_TABLE_SIZE as u32)
    }
}

impl Default for FlashLayout {
    fn default() -> Self {
        Self {
            base_address: EEPROM_END,
            audio_region_size: AUDIO_REGION_SIZE,
        }
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

    #[test]
    fn first_slot_starts_after_eeprom_labels() {
        let layout = FlashLayout::default();
        assert_eq!(layout.config_table_address(AudioSlot::FIRST), 355);
        assert_eq!(layout.audio_address(AudioSlot::FIRST), 855);
    }

    #[test]
    fn slots_are_one_stride_apart() {
        let layout = FlashLayout::default();
        let stride = 500 + 500 * 1024;
        for index in 0..AUDIO_SLOT_COUNT {
            let slot = AudioSlot::try_new(index).unwrap();
            assert_eq!(
                layout.config_table_address(slot),
                355 + stride * u32::from(index)
            );
            assert_eq!(
                layout.audio_address(slot),
                layout.config_table_address(slot) + 500
            );
        }
    }

    #[test]
    fn custom_base_moves_every_slot() {
        let layout = FlashLayout {
            base_address: 0x1000,
            audio_region_size: 4096,
        };
        let third = AudioSlot::try_new(2).unwrap();
        assert_eq!(layout.config_table_address(third), 0x1000 + 2 * 4596);
    }
}
