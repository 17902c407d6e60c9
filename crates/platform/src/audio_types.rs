//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `AudioSlot`: one of the three audio files stored in flash
//! - `Gain`: playback amplitude on the 0–1000 scale (1000 = unity)
//! - `SpeedIndex`: row of the per-speed gain/shift tables (0–99)

use thiserror_no_std::Error;

use crate::flash_layout::AUDIO_SLOT_COUNT;

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("value {value} outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── AudioSlot ────────────────────────────────────────────────────────────────

/// Index of a stored audio file, validated to `0..AUDIO_SLOT_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct AudioSlot(u8);

impl AudioSlot {
    /// The first audio file; used whenever the persisted selection is unusable.
    pub const FIRST: Self = Self(0);

    /// Create an `AudioSlot`, returning an error for indices past the last file.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `index >= AUDIO_SLOT_COUNT`.
    pub fn try_new(index: u8) -> Result<Self, OutOfRangeError> {
        if index >= AUDIO_SLOT_COUNT {
            Err(OutOfRangeError {
                value: u32::from(index),
                min: 0,
                max: u32::from(AUDIO_SLOT_COUNT.saturating_sub(1)),
            })
        } else {
            Ok(Self(index))
        }
    }

    /// Return the raw index.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for AudioSlot {
    fn default() -> Self {
        Self::FIRST
    }
}

// ── Gain ─────────────────────────────────────────────────────────────────────

/// Playback gain on a 0–1000 integer scale.
///
/// | Raw   | Effect                      |
/// |-------|-----------------------------|
/// | 0     | reserved (hard mute)        |
/// | 500   | samples halved              |
/// | 1000  | unity, samples untouched    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Gain(u16);

impl Gain {
    /// Scale denominator: the raw value that leaves samples untouched.
    pub const SCALE: u16 = 1000;

    /// Unity gain.
    pub const UNITY: Self = Self(Self::SCALE);

    /// Zero gain.
    pub const ZERO: Self = Self(0);

    /// Create a `Gain`, clamping values above [`Gain::SCALE`].
    #[must_use]
    pub fn new(raw: u16) -> Self {
        Self(raw.min(Self::SCALE))
    }

    /// Return the raw 0–1000 value.
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }

    /// `true` for unity gain.
    #[must_use]
    pub fn is_unity(self) -> bool {
        self.0 == Self::SCALE
    }
}

// ── SpeedIndex ───────────────────────────────────────────────────────────────

/// Vehicle speed used as a row index into the config-table curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SpeedIndex(u16);

impl SpeedIndex {
    /// Number of rows in the gain and frequency-shift tables.
    pub const STEPS: u16 = 100;

    /// Create a `SpeedIndex`, returning an error past the last table row.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `speed >= SpeedIndex::STEPS`.
    pub fn try_new(speed: u16) -> Result<Self, OutOfRangeError> {
        if speed >= Self::STEPS {
            Err(OutOfRangeError {
                value: u32::from(speed),
                min: 0,
                max: u32::from(Self::STEPS.saturating_sub(1)),
            })
        } else {
            Ok(Self(speed))
        }
    }

    /// Return the speed value.
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }

    /// Row index as `usize`.
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

// ── ByteOrder ────────────────────────────────────────────────────────────────

/// Byte order of the multi-byte fields in a stored config table.
///
/// The calibration tool writes big-endian images; bench images produced on a
/// little-endian host may be flagged [`ByteOrder::Little`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    /// Most significant byte first.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

impl ByteOrder {
    /// Decode a `u16` from two bytes.
    pub fn u16_from(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::Big => u16::from_be_bytes(bytes),
            Self::Little => u16::from_le_bytes(bytes),
        }
    }

    /// Decode a `u32` from four bytes.
    pub fn u32_from(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }

    /// Encode a `u16`.
    pub fn u16_to(self, value: u16) -> [u8; 2] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Encode a `u32`.
    pub fn u32_to(self, value: u32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }
}
