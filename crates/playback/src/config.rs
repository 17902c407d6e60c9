//! Engine configuration.

use platform::flash_layout::FlashLayout;
use platform::ByteOrder;

/// Build-time configuration of an [`AudioEngine`](crate::AudioEngine).
///
/// [`EngineConfig::default`] matches the production ECU: big-endian config
/// tables and the audio area right after the EEPROM labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Byte order of the multi-byte config-table fields.
    pub byte_order: ByteOrder,
    /// Where the audio files live in the data store.
    pub layout: FlashLayout,
}

impl EngineConfig {
    /// Override the config-table byte order.
    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Move the audio area to start at `address`.
    #[must_use]
    pub fn with_base_address(mut self, address: u32) -> Self {
        self.layout.base_address = address;
        self
    }

    /// Change the space reserved for the samples of one audio file.
    #[must_use]
    pub fn with_audio_region_size(mut self, size: u32) -> Self {
        self.layout.audio_region_size = size;
        self
    }
}
