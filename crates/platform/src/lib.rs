//! Hardware collaborator contracts for the AVAS audio ECU
//!
//! This crate provides trait-based abstractions for every peripheral the
//! audio engine talks to, enabling development and testing without the
//! physical ECU.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (avas crate)
//!         ↓
//! Engine Layer (playback crate)
//!         ↓
//! Collaborator contracts (this crate - trait abstractions)
//!         ↓
//! BSP drivers (I2S, SPI flash, EEPROM, amplifier GPIO)
//! ```
//!
//! # Collaborators
//!
//! - [`DataStore`] - EEPROM parameters and external-flash audio data
//! - [`SampleTransmitter`] - I2S sample output with completion events
//! - [`Amplifier`] - Amplifier mute control
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] (for host tests)
//! - `defmt`: Enable `defmt::Format` derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{DataLocation, DataStore};
//!
//! fn load<S: DataStore>(store: &mut S, buf: &mut [u8]) -> Result<(), S::Error> {
//!     store.read(DataLocation::Address(0x0163), 0, buf)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and label names in doc comments
#![allow(clippy::must_use_candidate)] // accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod amplifier;
pub mod audio_types;
pub mod config;
pub mod flash_layout;
pub mod storage;
pub mod transmit;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export main collaborator traits
pub use amplifier::Amplifier;
pub use storage::{DataLabel, DataLocation, DataStore};
pub use transmit::{SampleTransmitter, TransferEvent};

// Re-export domain newtypes
pub use audio_types::{AudioSlot, ByteOrder, Gain, OutOfRangeError, SpeedIndex};
