//! Application identity and timing constants
//!
//! Central values shared by the engine and the application layer. Branding
//! and tick timing should reference these constants rather than hardcoding
//! values.

/// The application name
pub const APP_NAME: &str = "AVAS";

/// The application type/category
pub const APP_TYPE: &str = "Acoustic Vehicle Alerting System";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Period of the main control loop tick in milliseconds.
pub const TICK_PERIOD_MS: u32 = 10;

/// Delay between two engine initialisation attempts in milliseconds.
pub const INIT_RETRY_DELAY_MS: u32 = 100;

/// Maximum number of engine initialisation attempts before giving up.
pub const INIT_MAX_ATTEMPTS: u8 = 5;

/// Number of control-loop ticks between two initialisation attempts.
pub const fn init_retry_ticks() -> u32 {
    match INIT_RETRY_DELAY_MS.checked_div(TICK_PERIOD_MS) {
        Some(ticks) => ticks,
        None => INIT_RETRY_DELAY_MS,
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
    fn retry_delay_is_whole_ticks() {
        assert_eq!(init_retry_ticks(), 10);
        assert_eq!(INIT_RETRY_DELAY_MS % TICK_PERIOD_MS, 0);
    }
}
