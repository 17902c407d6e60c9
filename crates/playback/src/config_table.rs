//! Audio configuration table.
//!
//! Each stored audio file is preceded by a 500-byte table written by the
//! calibration tool. Multi-byte integers use the configured [`ByteOrder`]
//! (big-endian for tool-generated images); text fields are NUL-padded.
//!
//! Layout (500 bytes total):
//! ```text
//! [0..32]    name                  text
//! [32..36]   audio size            u32   (bytes of sample data)
//! [36..40]   audio version         text
//! [40..44]   calibration version   text
//! [44..48]   calibration tool ver  text
//! [48..64]   calibration date      text
//! [64..66]   max edit sample count u16   (edit window in bytes)
//! [66..100]  reserved
//! [100..300] gain table            100 × u16, indexed by speed
//! [300..500] frequency-shift table 100 × u16, indexed by speed
//! ```

use platform::flash_layout::CONFIG_TABLE_SIZE;
use platform::{ByteOrder, SpeedIndex};

use crate::buffer::BufferState;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Field offsets
// ---------------------------------------------------------------------------

const NAME: (usize, usize) = (0, 32);
const SIZE: usize = 32;
const VERSION: (usize, usize) = (36, 4);
const CALIB_VERSION: (usize, usize) = (40, 4);
const CALIB_TOOL_VERSION: (usize, usize) = (44, 4);
const CALIB_DATE: (usize, usize) = (48, 16);
const MAX_EDIT_SAMPLE_COUNT: usize = 64;
const GAIN_TABLE: usize = 100;
const FREQUENCY_TABLE: usize = 300;

// ---------------------------------------------------------------------------
// ConfigTable
// ---------------------------------------------------------------------------

/// In-RAM copy of the config table of the selected audio file.
///
/// The table has its own lifecycle: `Idle` until a read is issued, `Read`
/// while the read is outstanding, `Ready` once the flash machine has decoded
/// it. Field getters decode whatever bytes are present; gating on `Ready` is
/// the engine's job.
pub struct ConfigTable {
    bytes: [u8; CONFIG_TABLE_SIZE],
    state: BufferState,
    byte_order: ByteOrder,
}

impl ConfigTable {
    /// Size of the table in bytes.
    pub const SIZE: usize = CONFIG_TABLE_SIZE;

    /// Create a zeroed table in the `Idle` state.
    pub const fn new(byte_order: ByteOrder) -> Self {
        Self {
            bytes: [0; CONFIG_TABLE_SIZE],
            state: BufferState::Idle,
            byte_order,
        }
    }

    /// Zero the contents and return to `Idle`.
    pub fn reset(&mut self) {
        self.bytes = [0; CONFIG_TABLE_SIZE];
        self.state = BufferState::Idle;
    }

    /// Lifecycle state.
    pub fn state(&self) -> BufferState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: BufferState) {
        self.state = state;
    }

    /// `true` once the table has been read and decoded.
    pub fn is_ready(&self) -> bool {
        self.state == BufferState::Ready
    }

    /// Raw table bytes.
    pub fn as_bytes(&self) -> &[u8; CONFIG_TABLE_SIZE] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8; CONFIG_TABLE_SIZE] {
        &mut self.bytes
    }

    /// Audio file name.
    pub fn name(&self) -> Result<&str, EngineError> {
        self.text(NAME)
    }

    /// Size of the sample data in bytes.
    pub fn audio_size(&self) -> u32 {
        self.u32_at(SIZE)
    }

    /// Audio file version.
    pub fn version(&self) -> Result<&str, EngineError> {
        self.text(VERSION)
    }

    /// Calibration data version.
    pub fn calib_version(&self) -> Result<&str, EngineError> {
        self.text(CALIB_VERSION)
    }

    /// Version of the tool that produced the calibration.
    pub fn calib_tool_version(&self) -> Result<&str, EngineError> {
        self.text(CALIB_TOOL_VERSION)
    }

    /// Calibration date as written by the tool.
    pub fn calib_date(&self) -> Result<&str, EngineError> {
        self.text(CALIB_DATE)
    }

    /// Edit window of the frequency shift, in bytes.
    pub fn max_edit_sample_count(&self) -> u16 {
        self.u16_at(MAX_EDIT_SAMPLE_COUNT)
    }

    /// Raw gain (0–1000) for `speed`.
    pub fn gain(&self, speed: SpeedIndex) -> u16 {
        self.u16_at(table_offset(GAIN_TABLE, speed))
    }

    /// Samples removed per edit window at `speed`.
    pub fn frequency(&self, speed: SpeedIndex) -> u16 {
        self.u16_at(table_offset(FREQUENCY_TABLE, speed))
    }

    fn u16_at(&self, offset: usize) -> u16 {
        let mut raw = [0u8; 2];
        if let Some(src) = self.bytes.get(offset..offset.saturating_add(2)) {
            raw.copy_from_slice(src);
        }
        self.byte_order.u16_from(raw)
    }

    fn u32_at(&self, offset: usize) -> u32 {
        let mut raw = [0u8; 4];
        if let Some(src) = self.bytes.get(offset..offset.saturating_add(4)) {
            raw.copy_from_slice(src);
        }
        self.byte_order.u32_from(raw)
    }

    fn text(&self, (offset, len): (usize, usize)) -> Result<&str, EngineError> {
        let field = self
            .bytes
            .get(offset..offset.saturating_add(len))
            .unwrap_or_default();
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let text = field.get(..end).unwrap_or_default();
        core::str::from_utf8(text).map_err(|_| EngineError::MalformedText)
    }
}

fn table_offset(base: usize, speed: SpeedIndex) -> usize {
    speed.as_usize().saturating_mul(2).saturating_add(base)
}

// ---------------------------------------------------------------------------
// ConfigTableImage (writer side)
// ---------------------------------------------------------------------------

/// Field values of a config table, encoded the way the calibration tool
/// writes them. Used by bench tooling and tests to produce flash images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTableImage<'a> {
    /// Audio file name (truncated to 32 bytes).
    pub name: &'a str,
    /// Size of the sample data in bytes.
    pub audio_size: u32,
    /// Audio file version (truncated to 4 bytes).
    pub version: &'a str,
    /// Calibration version (truncated to 4 bytes).
    pub calib_version: &'a str,
    /// Calibration tool version (truncated to 4 bytes).
    pub calib_tool_version: &'a str,
    /// Calibration date (truncated to 16 bytes).
    pub calib_date: &'a str,
    /// Edit window of the frequency shift, in bytes.
    pub max_edit_sample_count: u16,
    /// Gain per speed row.
    pub gains: [u16; SpeedIndex::STEPS as usize],
    /// Samples removed per edit window, per speed row.
    pub frequencies: [u16; SpeedIndex::STEPS as usize],
}

impl Default for ConfigTableImage<'_> {
    fn default() -> Self {
        Self {
            name: "",
            audio_size: 0,
            version: "",
            calib_version: "",
            calib_tool_version: "",
            calib_date: "",
            max_edit_sample_count: 0,
            gains: [1000; SpeedIndex::STEPS as usize],
            frequencies: [0; SpeedIndex::STEPS as usize],
        }
    }
}

impl ConfigTableImage<'_> {
    /// Encode into a 500-byte table.
    ///
    /// # Safety (lint allow)
    /// All range indices are compile-time constants within `[0, SIZE)`.
    /// The buffer is `[u8; CONFIG_TABLE_SIZE]` so all slices are always valid.
    #[must_use]
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
    pub fn encode(&self, byte_order: ByteOrder) -> [u8; CONFIG_TABLE_SIZE] {
        let mut buf = [0u8; CONFIG_TABLE_SIZE];
        put_text(&mut buf, NAME, self.name);
        buf[SIZE..SIZE + 4].copy_from_slice(&byte_order.u32_to(self.audio_size));
        put_text(&mut buf, VERSION, self.version);
        put_text(&mut buf, CALIB_VERSION, self.calib_version);
        put_text(&mut buf, CALIB_TOOL_VERSION, self.calib_tool_version);
        put_text(&mut buf, CALIB_DATE, self.calib_date);
        buf[MAX_EDIT_SAMPLE_COUNT..MAX_EDIT_SAMPLE_COUNT + 2]
            .copy_from_slice(&byte_order.u16_to(self.max_edit_sample_count));
        for (row, (gain, freq)) in self.gains.iter().zip(&self.frequencies).enumerate() {
            let g = GAIN_TABLE + row * 2;
            let f = FREQUENCY_TABLE + row * 2;
            buf[g..g + 2].copy_from_slice(&byte_order.u16_to(*gain));
            buf[f..f + 2].copy_from_slice(&byte_order.u16_to(*freq));
        }
        buf
    }
}

fn put_text(buf: &mut [u8; CONFIG_TABLE_SIZE], (offset, len): (usize, usize), text: &str) {
    let bytes = text.as_bytes();
    let n = bytes.len().min(len);
    if let (Some(dst), Some(src)) = (buf.get_mut(offset..offset.saturating_add(n)), bytes.get(..n)) {
        dst.copy_from_slice(src);
    }
}
