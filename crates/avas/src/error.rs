//! Application error type.

use playback::EngineError;
use thiserror_no_std::Error;

/// Errors surfaced by [`AvasApp`](crate::AvasApp).
///
/// The `*RetriesExhausted` variants carry the number of failed attempts; the
/// caller decides whether to reset the ECU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppError {
    /// An engine request was rejected.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// The engine could not be initialised.
    #[error("engine initialization failed after {0} attempts")]
    InitRetriesExhausted(u8),
    /// The amplifier could not be muted.
    #[error("mute failed after {0} attempts")]
    MuteRetriesExhausted(u8),
    /// The amplifier could not be unmuted.
    #[error("unmute failed after {0} attempts")]
    UnmuteRetriesExhausted(u8),
    /// The message inbox is full.
    #[error("message queue full")]
    QueueFull,
}

impl AppError {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Engine(e) => e.as_str(),
            Self::InitRetriesExhausted(_) => "init retries exhausted",
            Self::MuteRetriesExhausted(_) => "mute retries exhausted",
            Self::UnmuteRetriesExhausted(_) => "unmute retries exhausted",
            Self::QueueFull => "queue full",
        }
    }
}
