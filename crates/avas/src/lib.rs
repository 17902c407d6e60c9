//! AVAS application: runs the playback engine from vehicle messages.
//!
//! The application owns the engine behind a
//! [`SharedAudioEngine`](playback::SharedAudioEngine), applies the vehicle
//! speed to the calibrated gain and pitch tables, switches between the
//! stored audio files and mutes on request. Failed engine starts, mutes and
//! unmutes are retried on later ticks with a bounded number of attempts
//! ([`AppConfig`]).
//!
//! # Features
//!
//! - `defmt`: log through defmt (target builds)
//! - `tracing`: log through tracing (host builds)
//! - `std`: host build of the platform mocks
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

pub mod app;
pub mod error;
pub mod retry;

pub use app::{AppConfig, AppState, AvasApp, Message, QUEUE_DEPTH};
pub use error::AppError;
pub use retry::Retry;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    /// Log-name and policy tests
    mod app_tests {
        use crate::{AppConfig, AppError, AppState, Message};
        use platform::config::{init_retry_ticks, INIT_MAX_ATTEMPTS};
        use playback::EngineError;

        #[test]
        fn test_default_policy_matches_platform_timing() {
            let config = AppConfig::default();
            assert_eq!(config.init_attempts, INIT_MAX_ATTEMPTS);
            assert_eq!(config.retry_interval_ticks, init_retry_ticks());
        }

        #[test]
        fn test_state_names() {
            assert_eq!(AppState::default(), AppState::Deinit);
            assert_eq!(AppState::Mute.as_str(), "mute");
            assert_eq!(Message::SelectAudio(1).as_str(), "select-audio");
        }

        #[test]
        fn test_engine_errors_convert() {
            let e: AppError = EngineError::AmplifierFault.into();
            assert_eq!(e, AppError::Engine(EngineError::AmplifierFault));
            assert_eq!(e.as_str(), "amplifier fault");
            assert_eq!(
                format!("{}", AppError::InitRetriesExhausted(5)),
                "engine initialization failed after 5 attempts"
            );
        }
    }
}
