//! Flash read state machine and buffer refill dispatcher.
//!
//! The external flash accepts one transfer at a time, so reads are
//! serialised: config table first, then the current slot, then the spare.
//!
//! ```text
//! Idle → Init → ConfigTable → CurrentBuffer → SpareBuffer → Idle
//! ```
//!
//! The machine advances once per [`AudioEngine::process`] tick, and only
//! while the store is idle. Read results arrive through
//! [`AudioEngine::on_flash_complete`]; until then the single outstanding
//! request is remembered as a [`PendingRead`].

use platform::{Amplifier, DataLocation, DataStore, SampleTransmitter};

use crate::buffer::{BufferState, SlotId, SLOT_CAPACITY};
use crate::engine::AudioEngine;
use crate::error::EngineError;
use crate::transform;

/// State of the flash read sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashReadState {
    /// Sequence finished; promotes filled slots to `Edit`.
    #[default]
    Idle,
    /// Config table must be (re)read.
    Init,
    /// Config table read issued; decoded once it has landed.
    ConfigTable,
    /// Current slot must be requested.
    CurrentBuffer,
    /// Spare slot must be requested.
    SpareBuffer,
}

impl FlashReadState {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Init => "init",
            Self::ConfigTable => "config-table",
            Self::CurrentBuffer => "current-buffer",
            Self::SpareBuffer => "spare-buffer",
        }
    }
}

/// The one read the store is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingRead {
    /// Config table of the selected audio file.
    ConfigTable,
    /// Sample data into the given slot.
    Sample(SlotId),
}

impl<S, T, A> AudioEngine<S, T, A>
where
    S: DataStore,
    T: SampleTransmitter,
    A: Amplifier,
{
    /// Advance the flash read sequence by one step.
    pub(crate) fn flash_step(&mut self) {
        let current = self.buffers.current_id();
        let spare = self.buffers.spare_id();

        match self.flash_state {
            FlashReadState::Init => {
                if let Err(e) = self.request_config_table() {
                    debug!("config table read deferred: {}", e.as_str());
                }
            }
            FlashReadState::ConfigTable => {
                if self.pending == Some(PendingRead::ConfigTable) {
                    return;
                }
                self.decode_config_table();
                self.buffers.slot_mut(current).set_state(BufferState::Read);
                self.set_flash_state(FlashReadState::SpareBuffer);
                self.issue_fill(current);
            }
            FlashReadState::CurrentBuffer => {
                self.buffers.slot_mut(current).set_state(BufferState::Read);
                self.set_flash_state(FlashReadState::SpareBuffer);
                self.issue_fill(current);
            }
            FlashReadState::SpareBuffer => {
                self.promote_filled(current);
                self.buffers.slot_mut(spare).set_state(BufferState::Read);
                self.set_flash_state(FlashReadState::Idle);
                self.issue_fill(spare);
            }
            FlashReadState::Idle => {
                self.promote_filled(spare);
                self.promote_filled(current);
            }
        }
    }

    /// Issue the config-table read for the selected audio file.
    ///
    /// On acceptance the flash machine moves to `ConfigTable` and the table
    /// to `Read`; otherwise both stay where a retry will pick them up.
    pub(crate) fn request_config_table(&mut self) -> Result<(), EngineError> {
        if self.pending.is_some() {
            return Err(EngineError::StorageUnavailable);
        }
        let address = self.params.config_table_address;
        match self
            .store
            .read(DataLocation::Address(address), 0, self.table.bytes_mut())
        {
            Ok(()) => {
                self.table.set_state(BufferState::Read);
                self.pending = Some(PendingRead::ConfigTable);
                self.set_flash_state(FlashReadState::ConfigTable);
                Ok(())
            }
            Err(_) => {
                warn!("config table read refused at {}", address);
                self.table.set_state(BufferState::Idle);
                Err(EngineError::StorageUnavailable)
            }
        }
    }

    /// Drive the slot through its `Read` and `Edit` work.
    pub(crate) fn service_slot(&mut self, id: SlotId) {
        match self.buffers.slot(id).state() {
            BufferState::Read => self.issue_fill(id),
            BufferState::Edit => {
                let gain = self.params.gain;
                let window = self.params.max_edit_sample_count;
                let slot = self.buffers.slot_mut(id);
                let removed = transform::edit(slot, gain, window);
                slot.set_state(BufferState::Ready);
                trace!("slot {} ready, {} bytes removed", id.as_str(), removed);
            }
            _ => {}
        }
    }

    /// Resolve the outstanding read.
    pub(crate) fn complete_read(&mut self, ok: bool) {
        let Some(pending) = self.pending.take() else {
            warn!("flash completion without a pending read");
            return;
        };

        match pending {
            PendingRead::ConfigTable if ok => debug!("config table landed"),
            PendingRead::ConfigTable => {
                warn!("config table read failed, retrying");
                self.table.set_state(BufferState::Idle);
                self.set_flash_state(FlashReadState::Init);
            }
            PendingRead::Sample(id) => {
                let slot = self.buffers.slot_mut(id);
                if slot.state() != BufferState::ReadWait {
                    debug!("stale fill for slot {} dropped", id.as_str());
                } else if ok {
                    slot.set_current_size(SLOT_CAPACITY);
                    self.params.cursor = self.params.cursor.wrapping_add(1);
                } else {
                    warn!("fill of slot {} failed, retrying", id.as_str());
                    slot.set_state(BufferState::Read);
                }
            }
        }
    }

    /// Request the next sample block into `id`, wrapping at the end of the
    /// audio data. Leaves the slot in `Read` if the store refuses.
    fn issue_fill(&mut self, id: SlotId) {
        if self.pending.is_some() || self.store.is_busy() {
            return;
        }
        if self.buffers.slot(id).state() != BufferState::Read {
            return;
        }

        #[allow(clippy::cast_possible_truncation)] // SLOT_CAPACITY is 2048
        let block = SLOT_CAPACITY as u32;
        let mut offset = self.params.cursor.saturating_mul(block);
        if offset.saturating_add(block) > self.params.total_size {
            info!("end of audio after {} blocks, restarting", self.params.cursor);
            self.params.cursor = 0;
            offset = 0;
        }

        let address = self.params.audio_address;
        let slot = self.buffers.slot_mut(id);
        match self
            .store
            .read(DataLocation::Address(address), offset, slot.storage_mut())
        {
            Ok(()) => {
                slot.set_state(BufferState::ReadWait);
                self.pending = Some(PendingRead::Sample(id));
            }
            Err(_) => warn!("fill of slot {} refused", id.as_str()),
        }
    }

    /// `ReadWait → Edit` once the fill has been confirmed.
    fn promote_filled(&mut self, id: SlotId) {
        if self.pending == Some(PendingRead::Sample(id)) {
            return;
        }
        let slot = self.buffers.slot_mut(id);
        if slot.state() == BufferState::ReadWait {
            slot.set_state(BufferState::Edit);
        }
    }

    fn decode_config_table(&mut self) {
        self.table.set_state(BufferState::Ready);
        self.params.total_size = self.table.audio_size();
        self.params.max_edit_sample_count = self.table.max_edit_sample_count();
        debug!(
            "config table decoded: {} bytes, edit window {}",
            self.params.total_size,
            self.params.max_edit_sample_count
        );
    }

    pub(crate) fn set_flash_state(&mut self, next: FlashReadState) {
        if self.flash_state != next {
            debug!(
                "flash {} -> {}",
                self.flash_state.as_str(),
                next.as_str()
            );
            self.flash_state = next;
        }
    }
}
