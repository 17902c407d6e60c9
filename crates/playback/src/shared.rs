//! Engine shared between the main loop and interrupt handlers.
//!
//! On target the flash-completion and I2S interrupts call into the same
//! engine the main loop polls. `SharedAudioEngine` puts the engine behind a
//! critical-section mutex so each call runs to completion with interrupts
//! masked; the completion handlers can be wired directly to the ISRs.
//!
//! ```ignore
//! static ENGINE: StaticCell<SharedAudioEngine<Flash, I2s, Amp>> = StaticCell::new();
//!
//! #[interrupt]
//! fn SPI1() {
//!     engine.on_flash_complete(flash.take_result());
//! }
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::{Amplifier, DataStore, SampleTransmitter, TransferEvent};

use crate::engine::AudioEngine;

/// [`AudioEngine`] behind a critical-section mutex.
pub struct SharedAudioEngine<S, T, A> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<AudioEngine<S, T, A>>>,
}

impl<S, T, A> SharedAudioEngine<S, T, A>
where
    S: DataStore,
    T: SampleTransmitter,
    A: Amplifier,
{
    /// Wrap `engine`.
    pub const fn new(engine: AudioEngine<S, T, A>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine.
    ///
    /// `f` must not call back into the same `SharedAudioEngine`.
    pub fn with<R>(&self, f: impl FnOnce(&mut AudioEngine<S, T, A>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Main-loop tick.
    pub fn process(&self) {
        self.with(AudioEngine::process);
    }

    /// Flash-completion interrupt entry.
    pub fn on_flash_complete(&self, result: Result<(), S::Error>) {
        self.with(|engine| engine.on_flash_complete(result));
    }

    /// I2S interrupt entry.
    pub fn on_transfer_event(&self, event: TransferEvent) {
        self.with(|engine| engine.on_transfer_event(event));
    }

    /// Unwrap the engine.
    pub fn into_inner(self) -> AudioEngine<S, T, A> {
        self.inner.into_inner().into_inner()
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
    use platform::mocks::{MockAmplifier, MockDataStore, MockTransmitter};
    use platform::TransferEvent;

    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::PlaybackState;
    use crate::flash::PendingRead;

    fn shared() -> SharedAudioEngine<MockDataStore, MockTransmitter, MockAmplifier> {
        let store = MockDataStore::new().with_current_audio(Some(0));
        SharedAudioEngine::new(AudioEngine::new(
            store,
            MockTransmitter::new(),
            MockAmplifier::new(),
            EngineConfig::default(),
        ))
    }

    #[test]
    fn calls_reach_the_wrapped_engine() {
        let engine = shared();
        engine.with(|e| e.init()).unwrap();
        assert_eq!(
            engine.with(|e| e.pending_read()),
            Some(PendingRead::ConfigTable)
        );
        engine.on_flash_complete(Ok(()));
        engine.process();
        assert!(engine.with(|e| e.config_table().is_ready()));
    }

    #[test]
    fn transfer_events_in_init_are_ignored() {
        let engine = shared();
        engine.with(|e| e.init()).unwrap();
        engine.on_transfer_event(TransferEvent::EndTransfer);
        let inner = engine.into_inner();
        assert_eq!(inner.state(), PlaybackState::Init);
        assert_eq!(inner.transmitter().write_count(), 0);
    }
}
