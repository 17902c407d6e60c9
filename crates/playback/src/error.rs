//! Engine error type.

use thiserror_no_std::Error;

/// Errors returned by [`AudioEngine`](crate::AudioEngine) operations.
///
/// Collaborator errors are mapped into these variants at the boundary; the
/// underlying driver error is logged, not carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// The call requires a successful `init()` first.
    #[error("engine not initialized")]
    NotInitialized,
    /// The audio config table has not been read yet.
    #[error("audio config table not ready")]
    ConfigNotReady,
    /// The audio file index is not one of the stored files.
    #[error("invalid audio index {0}")]
    InvalidAudioIndex(u8),
    /// The vehicle speed has no row in the gain and shift tables.
    #[error("speed {0} outside the calibration tables")]
    SpeedOutOfRange(u16),
    /// The data store refused the request.
    #[error("data store unavailable")]
    StorageUnavailable,
    /// The amplifier rejected a mute or unmute request.
    #[error("amplifier fault")]
    AmplifierFault,
    /// A text field of the config table is not valid UTF-8.
    #[error("malformed text in config table")]
    MalformedText,
}

impl EngineError {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotInitialized => "not initialized",
            Self::ConfigNotReady => "config not ready",
            Self::InvalidAudioIndex(_) => "invalid audio index",
            Self::SpeedOutOfRange(_) => "speed out of range",
            Self::StorageUnavailable => "storage unavailable",
            Self::AmplifierFault => "amplifier fault",
            Self::MalformedText => "malformed text",
        }
    }
}
