//! End-to-end engine scenarios against the platform mocks.
//!
//! Each test drives the engine the way the firmware does: `process()` ticks
//! from the main loop, flash completions and I2S events injected in between.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]

use platform::flash_layout::{FlashLayout, CONFIG_TABLE_SIZE};
use platform::mocks::{MockAmplifier, MockDataStore, MockError, MockTransmitter, ReadRecord};
use platform::{AudioSlot, ByteOrder, DataLabel, DataLocation, DataStore, TransferEvent};
use playback::buffer::{BufferState, SILENCE_CAPACITY, SLOT_CAPACITY};
use playback::{
    AudioEngine, ConfigTableImage, EngineConfig, EngineError, FlashReadState, PendingRead,
    PlayStatus, PlaybackState, SlotId,
};

type Engine = AudioEngine<MockDataStore, MockTransmitter, MockAmplifier>;

const BLOCKS: u32 = 4;

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn source_byte(offset: usize) -> u8 {
    (offset % 251) as u8
}

fn source(len: usize) -> Vec<u8> {
    (0..len).map(source_byte).collect()
}

fn block(index: usize) -> Vec<u8> {
    let start = index * SLOT_CAPACITY;
    (start..start + SLOT_CAPACITY).map(source_byte).collect()
}

fn image(name: &str, gain: u16, rate: u16, window: u16) -> ConfigTableImage<'_> {
    ConfigTableImage {
        name,
        audio_size: BLOCKS * SLOT_CAPACITY as u32,
        version: "V001",
        calib_version: "C002",
        calib_tool_version: "T003",
        calib_date: "2024-05-02",
        max_edit_sample_count: window,
        gains: [gain; 100],
        frequencies: [rate; 100],
    }
}

fn store_with(slot: u8, table: &ConfigTableImage<'_>) -> MockDataStore {
    let layout = FlashLayout::default();
    let slot = AudioSlot::try_new(slot).unwrap();
    MockDataStore::new()
        .with_region(layout.config_table_address(slot), &table.encode(ByteOrder::Big))
        .with_region(
            layout.audio_address(slot),
            &source(BLOCKS as usize * SLOT_CAPACITY),
        )
}

fn engine_with(store: MockDataStore) -> Engine {
    AudioEngine::new(
        store,
        MockTransmitter::new(),
        MockAmplifier::new(),
        EngineConfig::default(),
    )
}

fn default_engine() -> Engine {
    engine_with(store_with(0, &image("Chime", 1000, 0, 0)).with_current_audio(Some(0)))
}

/// Complete any outstanding read, then tick.
fn step(engine: &mut Engine) {
    if engine.pending_read().is_some() {
        engine.on_flash_complete(Ok(()));
    }
    engine.process();
}

/// Tick until the engine reaches `state` (bounded).
fn drive_to(engine: &mut Engine, state: PlaybackState) {
    for _ in 0..32 {
        if engine.state() == state {
            return;
        }
        step(engine);
    }
    panic!("engine stuck in {:?}", engine.state());
}

fn busy_count(engine: &Engine) -> usize {
    let buffers = engine.buffers();
    [
        buffers.slot(SlotId::A).state(),
        buffers.slot(SlotId::B).state(),
        buffers.silence().state(),
    ]
    .iter()
    .filter(|s| **s == BufferState::Busy)
    .count()
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn init_reads_persisted_index_then_its_config_table() {
    let layout = FlashLayout::default();
    let second = AudioSlot::try_new(1).unwrap();
    let mut engine = engine_with(
        store_with(1, &image("Second", 1000, 0, 0)).with_current_audio(Some(1)),
    );
    engine.init().unwrap();

    assert_eq!(engine.current_audio(), second);
    assert_eq!(engine.flash_state(), FlashReadState::ConfigTable);
    assert_eq!(engine.config_table().state(), BufferState::Read);
    assert_eq!(
        engine.store().reads(),
        &[
            ReadRecord {
                location: DataLocation::Label(DataLabel::CurrentAudio),
                offset: 0,
                len: 1
            },
            ReadRecord {
                location: DataLocation::Address(layout.config_table_address(second)),
                offset: 0,
                len: CONFIG_TABLE_SIZE
            },
        ]
    );
}

#[test]
fn init_with_unreadable_index_defaults_to_first_file() {
    let mut engine = engine_with(store_with(0, &image("Chime", 1000, 0, 0)));
    engine.init().unwrap();
    assert_eq!(engine.current_audio(), AudioSlot::FIRST);
    assert_eq!(
        engine.store().last_read().unwrap().location,
        DataLocation::Address(355)
    );
    assert_eq!(engine.pending_read(), Some(PendingRead::ConfigTable));
}

#[test]
fn init_with_out_of_range_index_defaults_to_first_file() {
    let mut engine =
        engine_with(store_with(0, &image("Chime", 1000, 0, 0)).with_current_audio(Some(7)));
    engine.init().unwrap();
    assert_eq!(engine.current_audio(), AudioSlot::FIRST);
}

#[test]
fn init_fails_only_when_config_table_read_is_refused() {
    let mut engine = default_engine();
    engine.store_mut().refuse_next(2);
    assert_eq!(engine.init(), Err(EngineError::StorageUnavailable));
    assert!(!engine.is_initialized());
    assert_eq!(engine.pending_read(), None);

    engine.init().unwrap();
    assert!(engine.is_initialized());
}

#[test]
fn failed_reinit_leaves_the_engine_uninitialized() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);

    engine.store_mut().refuse_next(2);
    assert_eq!(engine.init(), Err(EngineError::StorageUnavailable));
    assert!(!engine.is_initialized());
    assert_eq!(engine.play(), Err(EngineError::NotInitialized));

    let reads = engine.store().reads().len();
    for _ in 0..5 {
        engine.process();
    }
    assert_eq!(engine.store().reads().len(), reads);

    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);
    assert_eq!(engine.current_buffer().samples(), &block(0)[..]);
}

#[test]
fn calls_before_init_are_rejected() {
    let mut engine = default_engine();
    assert_eq!(engine.mute(), Err(EngineError::NotInitialized));
    assert_eq!(engine.play(), Err(EngineError::NotInitialized));
    assert_eq!(engine.switch_audio(1), Err(EngineError::NotInitialized));
    assert_eq!(engine.name(), Err(EngineError::NotInitialized));
    assert_eq!(engine.update_params_for_speed(10), Err(EngineError::NotInitialized));
    assert!(!engine.is_playing());

    engine.process();
    engine.on_flash_complete(Ok(()));
    engine.on_transfer_event(TransferEvent::EndTransfer);
    assert!(engine.store().reads().is_empty());
    assert_eq!(engine.amplifier().mute_calls, 0);
}

#[test]
fn accessors_wait_for_decoded_config_table() {
    let mut engine = default_engine();
    engine.init().unwrap();
    assert_eq!(engine.name(), Err(EngineError::ConfigNotReady));
    assert_eq!(engine.gain(0), Err(EngineError::ConfigNotReady));
    assert_eq!(
        engine.update_params_for_speed(0),
        Err(EngineError::ConfigNotReady)
    );

    step(&mut engine);
    assert_eq!(engine.name(), Ok("Chime"));
    assert_eq!(engine.size(), Ok(BLOCKS * SLOT_CAPACITY as u32));
    assert_eq!(engine.version(), Ok("V001"));
    assert_eq!(engine.calib_version(), Ok("C002"));
    assert_eq!(engine.calib_tool_version(), Ok("T003"));
    assert_eq!(engine.calib_date(), Ok("2024-05-02"));
    assert_eq!(engine.gain(42), Ok(1000));
    assert_eq!(engine.frequency(42), Ok(0));
    assert_eq!(engine.gain(100), Err(EngineError::SpeedOutOfRange(100)));
}

#[test]
fn deinit_ignores_late_callbacks() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);
    engine.deinit();

    let reads = engine.store().reads().len();
    engine.on_flash_complete(Ok(()));
    engine.on_transfer_event(TransferEvent::EndTransfer);
    engine.process();

    assert!(!engine.is_initialized());
    assert_eq!(engine.state(), PlaybackState::Init);
    assert_eq!(engine.store().reads().len(), reads);
    assert_eq!(engine.transmitter().write_count(), 0);
    assert_eq!(engine.unmute(), Err(EngineError::NotInitialized));
}

// ── Flash pipeline ───────────────────────────────────────────────────────────

#[test]
fn primes_current_then_spare_from_consecutive_blocks() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);

    let offsets: Vec<u32> = engine.store().flash_reads().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 0, SLOT_CAPACITY as u32]);
    assert_eq!(engine.current_buffer().samples(), &block(0)[..]);
    assert_eq!(engine.spare_buffer().samples(), &block(1)[..]);
    assert_eq!(engine.cursor(), 2);
    assert_eq!(engine.flash_state(), FlashReadState::Idle);
}

#[test]
fn unity_gain_shift_one_removes_exactly_one_sample() {
    let mut engine = engine_with(
        store_with(0, &image("Chime", 1000, 1, 1024)).with_current_audio(Some(0)),
    );
    engine.init().unwrap();
    step(&mut engine);
    engine.update_params_for_speed(30).unwrap();
    drive_to(&mut engine, PlaybackState::Ready);

    let mut expected = block(0);
    expected.remove(1023);
    let current = engine.current_buffer();
    assert_eq!(current.current_size(), SLOT_CAPACITY - 1);
    assert_eq!(current.samples(), &expected[..]);
    assert_eq!(current.shifting_rate(), 1);
}

#[test]
fn gain_scales_every_remaining_byte() {
    let mut engine = engine_with(
        store_with(0, &image("Chime", 300, 0, 0)).with_current_audio(Some(0)),
    );
    engine.init().unwrap();
    step(&mut engine);
    engine.update_params_for_speed(0).unwrap();
    drive_to(&mut engine, PlaybackState::Ready);

    let expected: Vec<u8> = block(0)
        .iter()
        .map(|&b| (u32::from(b) * 300 / 1000) as u8)
        .collect();
    assert_eq!(engine.current_buffer().samples(), &expected[..]);
}

#[test]
fn little_endian_tables_decode_with_matching_config() {
    let table = image("LE", 1000, 0, 0).encode(ByteOrder::Little);
    let store = MockDataStore::new()
        .with_current_audio(Some(0))
        .with_region(355, &table);
    let mut engine = AudioEngine::new(
        store,
        MockTransmitter::new(),
        MockAmplifier::new(),
        EngineConfig::default().with_byte_order(ByteOrder::Little),
    );
    engine.init().unwrap();
    step(&mut engine);
    assert_eq!(engine.size(), Ok(BLOCKS * SLOT_CAPACITY as u32));
    assert_eq!(engine.name(), Ok("LE"));
}

#[test]
fn relocated_audio_area_is_honoured() {
    let config = EngineConfig::default()
        .with_base_address(0x1000)
        .with_audio_region_size(0x4000);
    let store = MockDataStore::new().with_current_audio(Some(1));
    let mut engine = AudioEngine::new(store, MockTransmitter::new(), MockAmplifier::new(), config);
    engine.init().unwrap();
    assert_eq!(
        engine.store().last_read().unwrap().location,
        DataLocation::Address(0x1000 + 500 + 0x4000)
    );
}

#[test]
fn config_table_failure_is_retried_from_init() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.on_flash_complete(Err(MockError::Injected));
    assert_eq!(engine.flash_state(), FlashReadState::Init);
    assert_eq!(engine.config_table().state(), BufferState::Idle);

    engine.process();
    assert_eq!(engine.pending_read(), Some(PendingRead::ConfigTable));
    assert_eq!(engine.flash_state(), FlashReadState::ConfigTable);
    assert_eq!(engine.store().flash_reads().count(), 2);
}

#[test]
fn failed_fill_rereads_the_same_block() {
    let mut engine = default_engine();
    engine.init().unwrap();
    step(&mut engine);
    assert_eq!(engine.pending_read(), Some(PendingRead::Sample(SlotId::A)));

    engine.on_flash_complete(Err(MockError::Injected));
    assert_eq!(engine.current_buffer().state(), BufferState::Read);
    assert_eq!(engine.cursor(), 0);

    engine.process();
    let last = engine.store().last_read().unwrap();
    assert_eq!(last.offset, 0);
    assert_eq!(engine.current_buffer().state(), BufferState::ReadWait);
}

#[test]
fn refused_fill_stays_queued() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.on_flash_complete(Ok(()));
    engine.store_mut().refuse_next(1);
    engine.process();
    assert_eq!(engine.current_buffer().state(), BufferState::Read);
    assert_eq!(engine.pending_read(), None);

    engine.process();
    assert_eq!(engine.current_buffer().state(), BufferState::ReadWait);
}

#[test]
fn busy_store_freezes_the_tick() {
    let mut engine = default_engine();
    engine.store_mut().hold_reads(true);
    engine.init().unwrap();
    engine.on_flash_complete(Ok(()));

    engine.process();
    assert!(!engine.config_table().is_ready());

    engine.store_mut().finish();
    engine.process();
    assert!(engine.config_table().is_ready());
    assert!(engine.store().is_busy());
}

#[test]
fn cursor_wraps_at_end_of_audio() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);

    let mut offsets = Vec::new();
    for _ in 0..12 {
        step(&mut engine);
        engine.on_transfer_event(TransferEvent::EndTransfer);
        if let Some(read) = engine.store().last_read() {
            if offsets.last() != Some(&read.offset) {
                offsets.push(read.offset);
            }
        }
    }
    let block = SLOT_CAPACITY as u32;
    assert!(offsets.windows(2).any(|w| w == [3 * block, 0]));
}

// ── Streaming and arbitration ────────────────────────────────────────────────

#[test]
fn play_before_ready_starts_once_primed() {
    let mut engine = default_engine();
    engine.init().unwrap();
    assert_eq!(engine.play(), Ok(PlayStatus::Pending));
    assert!(engine.is_playing());
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();
    assert_eq!(engine.transmitter().last_write(), Some(&block(0)[..]));
}

#[test]
fn completed_transfer_hands_over_the_spare() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);
    assert_eq!(engine.play(), Ok(PlayStatus::Started));
    engine.process();
    assert_eq!(engine.current_buffer().state(), BufferState::Busy);

    engine.on_transfer_event(TransferEvent::EndTransfer);
    assert_eq!(engine.buffers().current_id(), SlotId::B);
    assert_eq!(engine.current_buffer().state(), BufferState::Busy);
    assert_eq!(engine.spare_buffer().state(), BufferState::Read);
    assert_eq!(engine.transmitter().writes(), &[block(0), block(1)]);
}

#[test]
fn tx_empty_rotates_like_end_transfer() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();
    engine.on_transfer_event(TransferEvent::TxEmpty);
    assert_eq!(engine.transmitter().write_count(), 2);
}

#[test]
fn at_most_one_buffer_is_ever_busy() {
    let mut engine = engine_with(
        store_with(0, &image("Chime", 800, 2, 256)).with_current_audio(Some(0)),
    );
    engine.init().unwrap();
    step(&mut engine);
    engine.update_params_for_speed(50).unwrap();
    engine.play().unwrap();

    for tick in 0..200u32 {
        step(&mut engine);
        assert!(busy_count(&engine) <= 1, "tick {tick}");
        if tick % 3 == 0 {
            engine.on_transfer_event(TransferEvent::EndTransfer);
            assert!(busy_count(&engine) <= 1, "tick {tick} after transfer");
        }
        if tick == 90 {
            engine.mute().unwrap();
        }
        if tick == 140 {
            engine.unmute().unwrap();
        }
    }
    assert!(engine.transmitter().write_count() > 50);
}

#[test]
fn underrun_plays_silence_instead_of_an_unfinished_buffer() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();

    engine.on_transfer_event(TransferEvent::EndTransfer);
    engine.on_transfer_event(TransferEvent::EndTransfer);

    assert!(engine.buffers().silence_active());
    let last = engine.transmitter().last_write().unwrap();
    assert_eq!(last.len(), SILENCE_CAPACITY);
    assert!(last.iter().all(|&b| b == 0));
}

#[test]
fn recovery_from_underrun_plays_every_block_in_order() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();

    engine.on_transfer_event(TransferEvent::EndTransfer);
    engine.on_transfer_event(TransferEvent::EndTransfer);
    assert!(engine.buffers().silence_active());

    for _ in 0..8 {
        for _ in 0..4 {
            step(&mut engine);
        }
        engine.on_transfer_event(TransferEvent::EndTransfer);
    }

    let blocks = BLOCKS as usize;
    let played: Vec<usize> = engine
        .transmitter()
        .writes()
        .iter()
        .filter(|w| w.len() != SILENCE_CAPACITY)
        .map(|w| {
            (0..blocks)
                .find(|&i| w[..] == block(i)[..])
                .unwrap_or_else(|| panic!("unknown block of {} bytes", w.len()))
        })
        .collect();
    assert!(played.len() >= 8, "{played:?}");
    for (n, index) in played.iter().enumerate() {
        assert_eq!(*index, n % blocks, "{played:?}");
    }
}

#[test]
fn mute_with_ready_current_substitutes_silence() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);

    engine.mute().unwrap();
    let buffers = engine.buffers();
    assert!(engine.is_muted());
    assert!(engine.amplifier().muted);
    assert!(buffers.silence_active());
    assert_eq!(buffers.silence().state(), BufferState::Ready);
    assert_eq!(buffers.silence().max_size(), SILENCE_CAPACITY);
    assert_eq!(buffers.silence().shifting_rate(), 0);
    assert_eq!(engine.spare_buffer().state(), BufferState::Ready);

    engine.play().unwrap();
    engine.process();
    assert_eq!(
        engine.transmitter().last_write(),
        Some(&[0u8; SILENCE_CAPACITY][..])
    );
}

#[test]
fn muted_completions_keep_sending_silence() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();
    engine.mute().unwrap();

    for _ in 0..3 {
        engine.on_transfer_event(TransferEvent::EndTransfer);
        step(&mut engine);
    }
    let writes = engine.transmitter().writes();
    assert_eq!(writes[0], block(0));
    assert!(writes[1..].iter().all(|w| w.len() == SILENCE_CAPACITY));
}

#[test]
fn unmute_resumes_samples_on_next_completion() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);
    engine.mute().unwrap();
    engine.play().unwrap();
    engine.process();

    engine.unmute().unwrap();
    assert!(engine.buffers().silence_active());
    engine.on_transfer_event(TransferEvent::EndTransfer);
    assert!(!engine.buffers().silence_active());
    assert_eq!(engine.transmitter().last_write(), Some(&block(1)[..]));
}

#[test]
fn unmute_before_transmit_swaps_back_to_spare() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);
    engine.mute().unwrap();
    engine.unmute().unwrap();
    assert!(!engine.buffers().silence_active());
    assert_eq!(engine.buffers().current_id(), SlotId::B);
}

#[test]
fn amplifier_failure_changes_nothing() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);
    engine.amplifier_mut().fail = true;

    assert_eq!(engine.mute(), Err(EngineError::AmplifierFault));
    assert!(!engine.is_muted());
    assert!(!engine.buffers().silence_active());
}

#[test]
fn transfer_error_retransmits_the_same_buffer() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();

    engine.on_transfer_event(TransferEvent::Error);
    assert_eq!(engine.current_buffer().state(), BufferState::Ready);
    engine.process();
    assert_eq!(engine.transmitter().writes(), &[block(0), block(0)]);
}

#[test]
fn refused_transmit_is_retried_next_tick() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.transmitter_mut().fail = true;
    engine.process();
    assert_eq!(engine.current_buffer().state(), BufferState::Ready);

    engine.transmitter_mut().fail = false;
    engine.process();
    assert_eq!(engine.current_buffer().state(), BufferState::Busy);
}

// ── Switching ────────────────────────────────────────────────────────────────

#[test]
fn switch_to_current_index_has_no_side_effects() {
    let mut engine = default_engine();
    engine.init().unwrap();
    drive_to(&mut engine, PlaybackState::Ready);
    let reads = engine.store().reads().len();

    assert_eq!(engine.switch_audio(0), Ok(()));
    engine.process();
    assert_eq!(engine.state(), PlaybackState::Ready);
    assert_eq!(engine.store().reads().len(), reads);
}

#[test]
fn switch_to_unknown_index_is_rejected() {
    let mut engine = default_engine();
    engine.init().unwrap();
    assert_eq!(engine.switch_audio(3), Err(EngineError::InvalidAudioIndex(3)));
    assert_eq!(engine.current_audio(), AudioSlot::FIRST);
}

#[test]
fn switch_reloads_the_selected_file() {
    let layout = FlashLayout::default();
    let third = AudioSlot::try_new(2).unwrap();
    let store = store_with(0, &image("First", 1000, 0, 0))
        .with_current_audio(Some(0))
        .with_region(
            layout.config_table_address(third),
            &image("Third", 1000, 0, 0).encode(ByteOrder::Big),
        );
    let mut engine = engine_with(store);
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();

    engine.switch_audio(2).unwrap();
    assert_eq!(engine.state(), PlaybackState::Switch);
    engine.process();
    assert_eq!(engine.state(), PlaybackState::Init);
    assert_eq!(engine.flash_state(), FlashReadState::ConfigTable);
    assert_eq!(
        engine.store().last_read().unwrap().location,
        DataLocation::Address(layout.config_table_address(third))
    );

    engine.on_flash_complete(Ok(()));
    assert_eq!(engine.current_audio(), third);
    assert_eq!(engine.state(), PlaybackState::Init);

    drive_to(&mut engine, PlaybackState::Run);
    assert_eq!(engine.name(), Ok("Third"));
    let first_fill = engine
        .store()
        .flash_reads()
        .filter(|r| r.location == DataLocation::Address(layout.audio_address(third)))
        .map(|r| r.offset)
        .next();
    assert_eq!(first_fill, Some(0));
}

#[test]
fn switch_during_fill_waits_for_the_store() {
    let mut engine = default_engine();
    engine.init().unwrap();
    step(&mut engine);
    assert_eq!(engine.pending_read(), Some(PendingRead::Sample(SlotId::A)));

    engine.switch_audio(1).unwrap();
    engine.process();
    assert_eq!(engine.state(), PlaybackState::Init);
    assert_eq!(engine.flash_state(), FlashReadState::Init);

    engine.on_flash_complete(Ok(()));
    assert_eq!(engine.cursor(), 0);
    engine.process();
    assert_eq!(engine.pending_read(), Some(PendingRead::ConfigTable));
}

#[test]
fn transfer_events_during_reload_are_ignored() {
    let mut engine = default_engine();
    engine.init().unwrap();
    engine.play().unwrap();
    drive_to(&mut engine, PlaybackState::Run);
    engine.process();
    engine.switch_audio(1).unwrap();
    engine.process();

    let writes = engine.transmitter().write_count();
    engine.on_transfer_event(TransferEvent::EndTransfer);
    assert_eq!(engine.transmitter().write_count(), writes);
}
