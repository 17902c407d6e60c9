//! Persistent data store abstraction (EEPROM parameters + external flash)
//!
//! The ECU keeps small parameters (labels) in EEPROM and the audio files in
//! external SPI flash. Both are reached through one byte-oriented contract:
//!
//! - label reads are served from EEPROM and complete before [`DataStore::read`]
//!   returns;
//! - address reads start an external-flash transfer. The store reports
//!   [`DataStore::is_busy`] until the transfer ends, and the completion is
//!   delivered to the engine's flash-completion handler by the integrator.
//!
//! The flash supports a single outstanding transfer. Callers must not issue a
//! read while the store is busy; implementations refuse such requests.

use crate::flash_layout;

/// EEPROM parameter labels used by the audio engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataLabel {
    /// Index of the audio file selected for playback (1 byte).
    CurrentAudio,
}

impl DataLabel {
    /// EEPROM address of the label.
    pub const fn address(self) -> u32 {
        match self {
            Self::CurrentAudio => flash_layout::LABEL_CURRENT_AUDIO,
        }
    }

    /// Size of the label's value in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::CurrentAudio => 1,
        }
    }
}

/// Where a read is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataLocation {
    /// A named EEPROM parameter.
    Label(DataLabel),
    /// A raw external-flash address.
    Address(u32),
}

/// Byte-oriented read access to EEPROM and external flash.
pub trait DataStore {
    /// Error type
    type Error: core::fmt::Debug;

    /// `true` while an external-flash transfer is outstanding.
    fn is_busy(&self) -> bool;

    /// Read `buf.len()` bytes from `location + offset` into `buf`.
    ///
    /// For [`DataLocation::Address`] an `Ok` means the transfer was accepted;
    /// the data is valid once the completion notification arrives.
    fn read(
        &mut self,
        location: DataLocation,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;
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
    fn labels_live_inside_the_eeprom_area() {
        let label = DataLabel::CurrentAudio;
        let end = label.address().saturating_add(u32::try_from(label.size()).unwrap_or(u32::MAX));
        assert!(end <= flash_layout::EEPROM_END);
    }
}
