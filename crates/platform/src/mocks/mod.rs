//! Mock implementations for testing
//!
//! This module provides mock implementations of all collaborator traits
//! for use in unit and integration tests. Mocks record every call so tests
//! can assert on the exact sequence of reads, writes and mute changes.

#![cfg(any(test, feature = "std"))]

extern crate std;

use std::vec::Vec;

use thiserror_no_std::Error;

use crate::*;

/// Errors injected by the mocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MockError {
    /// A read was issued while a previous transfer was still outstanding.
    #[error("store busy")]
    Busy,
    /// The request was refused on purpose by the test.
    #[error("request refused")]
    Refused,
    /// The EEPROM label has no stored value.
    #[error("label not programmed")]
    LabelMissing,
    /// The driver was told to fail.
    #[error("injected driver failure")]
    Injected,
}

// ── MockDataStore ────────────────────────────────────────────────────────────

/// One accepted read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRecord {
    /// Where the read was served from.
    pub location: DataLocation,
    /// Offset added to the location.
    pub offset: u32,
    /// Requested length in bytes.
    pub len: usize,
}

/// In-memory EEPROM + external flash.
///
/// Address reads copy the mapped bytes into the caller's buffer immediately;
/// unmapped addresses read as erased flash (`0xFF`). With
/// [`MockDataStore::hold_reads`] enabled the store stays busy after each
/// address read until [`MockDataStore::finish`] is called, mirroring a DMA
/// transfer in flight.
#[derive(Debug, Default)]
pub struct MockDataStore {
    regions: Vec<(u32, Vec<u8>)>,
    current_audio: Option<u8>,
    hold_reads: bool,
    busy: bool,
    refuse_next: usize,
    reads: Vec<ReadRecord>,
    refused: usize,
}

impl MockDataStore {
    /// Create an empty store with no programmed labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `bytes` at `address`. Later regions shadow earlier ones.
    pub fn with_region(mut self, address: u32, bytes: &[u8]) -> Self {
        self.set_region(address, bytes);
        self
    }

    /// Map `bytes` at `address` on an existing store.
    pub fn set_region(&mut self, address: u32, bytes: &[u8]) {
        self.regions.push((address, bytes.to_vec()));
    }

    /// Program the persisted current-audio label (`None` makes label reads fail).
    pub fn with_current_audio(mut self, index: Option<u8>) -> Self {
        self.current_audio = index;
        self
    }

    /// Keep the store busy after each address read until [`Self::finish`].
    pub fn hold_reads(&mut self, hold: bool) {
        self.hold_reads = hold;
    }

    /// Refuse the next `count` read requests.
    pub fn refuse_next(&mut self, count: usize) {
        self.refuse_next = count;
    }

    /// End the outstanding transfer.
    pub fn finish(&mut self) {
        self.busy = false;
    }

    /// Every accepted read, oldest first.
    pub fn reads(&self) -> &[ReadRecord] {
        &self.reads
    }

    /// The most recent accepted read.
    pub fn last_read(&self) -> Option<ReadRecord> {
        self.reads.last().copied()
    }

    /// Accepted reads that targeted the external flash.
    pub fn flash_reads(&self) -> impl Iterator<Item = &ReadRecord> {
        self.reads
            .iter()
            .filter(|r| matches!(r.location, DataLocation::Address(_)))
    }

    /// Number of requests refused so far (busy or injected).
    pub fn refused_count(&self) -> usize {
        self.refused
    }

    fn byte_at(&self, address: u32) -> u8 {
        self.regions
            .iter()
            .rev()
            .find_map(|(start, bytes)| {
                let index = address.checked_sub(*start)?;
                bytes.get(usize::try_from(index).ok()?).copied()
            })
            .unwrap_or(0xFF)
    }
}

impl DataStore for MockDataStore {
    type Error = MockError;

    fn is_busy(&self) -> bool {
        self.busy
    }

    fn read(
        &mut self,
        location: DataLocation,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        if self.busy {
            self.refused = self.refused.saturating_add(1);
            return Err(MockError::Busy);
        }
        if self.refuse_next > 0 {
            self.refuse_next = self.refuse_next.saturating_sub(1);
            self.refused = self.refused.saturating_add(1);
            return Err(MockError::Refused);
        }

        match location {
            DataLocation::Label(DataLabel::CurrentAudio) => {
                let value = self.current_audio.ok_or(MockError::LabelMissing)?;
                if let Some(first) = buf.first_mut() {
                    *first = value;
                }
            }
            DataLocation::Address(base) => {
                let start = base.saturating_add(offset);
                let mut address = start;
                for byte in buf.iter_mut() {
                    *byte = self.byte_at(address);
                    address = address.saturating_add(1);
                }
                self.busy = self.hold_reads;
            }
        }

        self.reads.push(ReadRecord {
            location,
            offset,
            len: buf.len(),
        });
        Ok(())
    }
}

// ── MockTransmitter ──────────────────────────────────────────────────────────

/// I2S transmitter that records every buffer handed to it.
#[derive(Debug, Default)]
pub struct MockTransmitter {
    writes: Vec<Vec<u8>>,
    /// When set, every write fails with [`MockError::Injected`].
    pub fail: bool,
}

impl MockTransmitter {
    /// Create new mock transmitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted writes.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Every accepted buffer, oldest first.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// The most recently accepted buffer.
    pub fn last_write(&self) -> Option<&[u8]> {
        self.writes.last().map(Vec::as_slice)
    }
}

impl SampleTransmitter for MockTransmitter {
    type Error = MockError;

    fn write(&mut self, samples: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError::Injected);
        }
        self.writes.push(samples.to_vec());
        Ok(())
    }
}

// ── MockAmplifier ────────────────────────────────────────────────────────────

/// Amplifier with a mute line and call counters.
#[derive(Debug, Default)]
pub struct MockAmplifier {
    /// Current state of the mute line.
    pub muted: bool,
    /// When set, mute and unmute fail with [`MockError::Injected`].
    pub fail: bool,
    /// Number of successful mute calls.
    pub mute_calls: u32,
    /// Number of successful unmute calls.
    pub unmute_calls: u32,
}

impl MockAmplifier {
    /// Create an unmuted amplifier.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Amplifier for MockAmplifier {
    type Error = MockError;

    fn mute(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError::Injected);
        }
        self.muted = true;
        self.mute_calls = self.mute_calls.saturating_add(1);
        Ok(())
    }

    fn unmute(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError::Injected);
        }
        self.muted = false;
        self.unmute_calls = self.unmute_calls.saturating_add(1);
        Ok(())
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
    fn address_read_copies_mapped_bytes_and_pads_with_erased() {
        let mut store = MockDataStore::new().with_region(100, &[1, 2, 3]);
        let mut buf = [0u8; 5];
        store
            .read(DataLocation::Address(100), 1, &mut buf)
            .unwrap();
        assert_eq!(buf, [2, 3, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            store.last_read(),
            Some(ReadRecord {
                location: DataLocation::Address(100),
                offset: 1,
                len: 5
            })
        );
    }

    #[test]
    fn held_read_blocks_until_finished() {
        let mut store = MockDataStore::new();
        store.hold_reads(true);
        let mut buf = [0u8; 4];
        store.read(DataLocation::Address(0), 0, &mut buf).unwrap();
        assert!(store.is_busy());
        assert_eq!(
            store.read(DataLocation::Address(0), 0, &mut buf),
            Err(MockError::Busy)
        );
        store.finish();
        assert!(!store.is_busy());
        assert_eq!(store.refused_count(), 1);
    }

    #[test]
    fn missing_label_fails_without_touching_buffer() {
        let mut store = MockDataStore::new();
        let mut buf = [7u8; 1];
        assert_eq!(
            store.read(DataLocation::Label(DataLabel::CurrentAudio), 0, &mut buf),
            Err(MockError::LabelMissing)
        );
        assert_eq!(buf, [7]);
        assert!(store.reads().is_empty());
    }

    #[test]
    fn label_read_does_not_occupy_the_store() {
        let mut store = MockDataStore::new().with_current_audio(Some(2));
        store.hold_reads(true);
        let mut buf = [0u8; 1];
        store
            .read(DataLocation::Label(DataLabel::CurrentAudio), 0, &mut buf)
            .unwrap();
        assert_eq!(buf, [2]);
        assert!(!store.is_busy());
    }

    #[test]
    fn refused_requests_are_not_recorded() {
        let mut store = MockDataStore::new();
        store.refuse_next(1);
        let mut buf = [0u8; 2];
        assert!(store.read(DataLocation::Address(0), 0, &mut buf).is_err());
        assert!(store.read(DataLocation::Address(0), 0, &mut buf).is_ok());
        assert_eq!(store.reads().len(), 1);
    }

    #[test]
    fn transmitter_records_writes() {
        let mut tx = MockTransmitter::new();
        tx.write(&[1, 2]).unwrap();
        tx.fail = true;
        assert!(tx.write(&[3]).is_err());
        assert_eq!(tx.write_count(), 1);
        assert_eq!(tx.last_write(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn amplifier_failure_leaves_line_unchanged() {
        let mut amp = MockAmplifier::new();
        amp.mute().unwrap();
        amp.fail = true;
        assert!(amp.unmute().is_err());
        assert!(amp.muted);
        assert_eq!(amp.mute_calls, 1);
        assert_eq!(amp.unmute_calls, 0);
    }
}
