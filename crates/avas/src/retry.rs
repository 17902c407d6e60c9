//! Bounded, tick-paced retry counter.
//!
//! The application never blocks: a failed operation arms a countdown of
//! `interval` ticks and is attempted again when [`Retry::due`] turns true,
//! until `max_attempts` attempts have failed in a row.
//!
//! ```rust,ignore
//! if retry.due() {
//!     match amplifier_op() {
//!         Ok(()) => retry.reset(),
//!         Err(_) if !retry.fail() => return Err(exhausted),
//!         Err(_) => {}
//!     }
//! }
//! ```

/// Retry bookkeeping for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Retry {
    max_attempts: u8,
    interval: u32,
    attempts: u8,
    countdown: u32,
}

impl Retry {
    /// A fresh counter: the first attempt is due immediately.
    pub const fn new(max_attempts: u8, interval: u32) -> Self {
        Self {
            max_attempts,
            interval,
            attempts: 0,
            countdown: 0,
        }
    }

    /// Count down one tick. Returns `true` when the next attempt is due.
    pub fn due(&mut self) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown == 0
    }

    /// Record a failed attempt and arm the countdown.
    ///
    /// Returns `false` once `max_attempts` attempts have failed.
    #[must_use]
    pub fn fail(&mut self) -> bool {
        self.attempts = self.attempts.saturating_add(1);
        self.countdown = self.interval;
        self.attempts < self.max_attempts
    }

    /// Forget earlier failures; the next attempt is due immediately.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.countdown = 0;
    }

    /// Failed attempts since the last reset.
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Attempts allowed before giving up.
    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
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
    fn fresh_counter_is_due() {
        let mut retry = Retry::new(3, 10);
        assert!(retry.due());
        assert_eq!(retry.attempts(), 0);
    }

    #[test]
    fn failure_waits_a_full_interval() {
        let mut retry = Retry::new(3, 4);
        assert!(retry.fail());
        assert!(!retry.due());
        assert!(!retry.due());
        assert!(!retry.due());
        assert!(retry.due());
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut retry = Retry::new(2, 1);
        assert!(retry.fail());
        assert!(!retry.fail());
        assert_eq!(retry.attempts(), 2);
        retry.reset();
        assert!(retry.due());
        assert!(retry.fail());
    }

    #[test]
    fn zero_interval_retries_every_tick() {
        let mut retry = Retry::new(5, 0);
        assert!(retry.fail());
        assert!(retry.due());
    }
}
