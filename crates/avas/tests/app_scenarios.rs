//! Application scenarios against the platform mocks.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use avas::{AppConfig, AppError, AppState, AvasApp, Message, QUEUE_DEPTH};
use platform::flash_layout::FlashLayout;
use platform::mocks::{MockAmplifier, MockDataStore, MockTransmitter};
use platform::{AudioSlot, ByteOrder, Gain};
use playback::{AudioEngine, ConfigTableImage, EngineConfig, EngineError, PlaybackState};

type App = AvasApp<MockDataStore, MockTransmitter, MockAmplifier>;

const INTERVAL: u32 = 10;

fn table(name: &str) -> ConfigTableImage<'_> {
    let mut image = ConfigTableImage {
        name,
        audio_size: 4 * 2048,
        version: "V100",
        max_edit_sample_count: 1024,
        ..ConfigTableImage::default()
    };
    image.gains[40] = 500;
    image.frequencies[40] = 2;
    image
}

fn store() -> MockDataStore {
    let layout = FlashLayout::default();
    let mut store = MockDataStore::new().with_current_audio(Some(0));
    for (index, name) in [(0u8, "Low"), (1, "High")] {
        let slot = AudioSlot::try_new(index).unwrap();
        store.set_region(
            layout.config_table_address(slot),
            &table(name).encode(ByteOrder::Big),
        );
    }
    store
}

fn app_with(store: MockDataStore, config: AppConfig) -> App {
    let engine = AudioEngine::new(
        store,
        MockTransmitter::new(),
        MockAmplifier::new(),
        EngineConfig::default(),
    );
    AvasApp::new(engine, config)
}

fn policy(attempts: u8) -> AppConfig {
    AppConfig {
        init_attempts: attempts,
        retry_interval_ticks: INTERVAL,
    }
}

/// One control-loop tick with any outstanding flash read completed first.
fn tick(app: &mut App) -> Result<(), AppError> {
    if app.engine().with(|e| e.pending_read().is_some()) {
        app.engine().on_flash_complete(Ok(()));
    }
    app.run()
}

// ── Start-up ─────────────────────────────────────────────────────────────────

#[test]
fn init_starts_playback_and_unmutes() {
    let mut app = app_with(store(), policy(5));
    assert!(app.is_muted());
    app.init().unwrap();

    assert_eq!(app.state(), AppState::Run);
    assert!(!app.is_muted());
    app.engine().with(|e| {
        assert!(e.is_playing());
        assert_eq!(e.amplifier().unmute_calls, 1);
    });
}

#[test]
fn failed_start_is_retried_after_the_interval() {
    let mut app = app_with(store(), policy(5));
    app.engine().with(|e| e.store_mut().refuse_next(2));
    app.init().unwrap();
    assert_eq!(app.state(), AppState::Init);

    for _ in 1..INTERVAL {
        app.run().unwrap();
        assert_eq!(app.state(), AppState::Init);
    }
    assert!(app.engine().with(|e| e.store().reads().is_empty()));

    app.run().unwrap();
    assert_eq!(app.state(), AppState::Run);
    assert_eq!(app.engine().with(|e| e.store().reads().len()), 2);
}

#[test]
fn start_gives_up_after_the_configured_attempts() {
    let mut app = app_with(
        store(),
        AppConfig {
            init_attempts: 3,
            retry_interval_ticks: 1,
        },
    );
    app.engine().with(|e| e.store_mut().refuse_next(usize::MAX));
    app.init().unwrap();
    app.run().unwrap();
    assert_eq!(app.run(), Err(AppError::InitRetriesExhausted(3)));
    assert_eq!(app.state(), AppState::Deinit);
    app.run().unwrap();
}

#[test]
fn single_attempt_policy_fails_in_init() {
    let mut app = app_with(store(), policy(1));
    app.engine().with(|e| e.store_mut().refuse_next(2));
    assert_eq!(app.init(), Err(AppError::InitRetriesExhausted(1)));
    assert_eq!(app.state(), AppState::Deinit);
}

#[test]
fn failed_unmute_keeps_output_muted_until_retry_succeeds() {
    let mut app = app_with(store(), policy(5));
    app.engine().with(|e| e.amplifier_mut().fail = true);
    app.init().unwrap();
    assert_eq!(app.state(), AppState::Run);
    assert!(app.is_muted());

    app.engine().with(|e| e.amplifier_mut().fail = false);
    for _ in 1..INTERVAL {
        tick(&mut app).unwrap();
    }
    assert!(app.is_muted());
    tick(&mut app).unwrap();
    assert!(!app.is_muted());
}

#[test]
fn unmute_gives_up_after_the_configured_attempts() {
    let mut app = app_with(
        store(),
        AppConfig {
            init_attempts: 2,
            retry_interval_ticks: 1,
        },
    );
    app.engine().with(|e| e.amplifier_mut().fail = true);
    app.init().unwrap();
    assert_eq!(tick(&mut app), Err(AppError::UnmuteRetriesExhausted(2)));
    assert!(app.is_muted());
}

// ── Messages ─────────────────────────────────────────────────────────────────

#[test]
fn vehicle_speed_is_applied_once_the_table_is_loaded() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();
    app.post(Message::VehicleSpeed(40)).unwrap();

    tick(&mut app).unwrap();
    assert_eq!(app.applied_speed(), Some(40));
    app.engine().with(|e| {
        assert_eq!(e.gain_setting(), Gain::new(500));
        assert_eq!(e.current_buffer().shifting_rate(), 2);
    });
}

#[test]
fn speed_before_table_is_deferred() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();
    app.handle(Message::VehicleSpeed(40)).unwrap();
    app.run().unwrap();
    assert_eq!(app.applied_speed(), None);
    tick(&mut app).unwrap();
    assert_eq!(app.applied_speed(), Some(40));
}

#[test]
fn out_of_range_speed_is_not_retried() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();
    app.post(Message::VehicleSpeed(250)).unwrap();
    tick(&mut app).unwrap();
    assert_eq!(app.applied_speed(), Some(250));
    assert_eq!(app.engine().with(|e| e.gain_setting()), Gain::UNITY);
}

#[test]
fn select_audio_switches_and_reapplies_speed() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();
    app.post(Message::VehicleSpeed(40)).unwrap();
    for _ in 0..12 {
        tick(&mut app).unwrap();
    }
    assert_eq!(app.engine().with(|e| e.name().map(str::len)), Ok(3));

    app.post(Message::SelectAudio(1)).unwrap();
    app.run().unwrap();
    assert_eq!(app.applied_speed(), None);
    app.engine().with(|e| {
        assert_eq!(e.current_audio().get(), 1);
        assert_eq!(e.state(), PlaybackState::Init);
    });

    for _ in 0..12 {
        tick(&mut app).unwrap();
    }
    assert_eq!(app.applied_speed(), Some(40));
    assert_eq!(app.engine().with(|e| e.name().map(str::len)), Ok(4));
}

#[test]
fn invalid_audio_selection_is_rejected() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();
    assert_eq!(
        app.handle(Message::SelectAudio(9)),
        Err(AppError::Engine(EngineError::InvalidAudioIndex(9)))
    );
    app.post(Message::SelectAudio(9)).unwrap();
    app.run().unwrap();
    assert_eq!(app.engine().with(|e| e.current_audio().get()), 0);
}

#[test]
fn mute_status_round_trip() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();

    app.post(Message::MuteStatus(true)).unwrap();
    tick(&mut app).unwrap();
    assert_eq!(app.state(), AppState::Mute);
    assert!(app.is_muted());
    assert!(app.engine().with(|e| e.amplifier().muted));

    app.post(Message::MuteStatus(false)).unwrap();
    tick(&mut app).unwrap();
    assert_eq!(app.state(), AppState::Run);
    assert!(!app.is_muted());
    assert!(!app.engine().with(|e| e.amplifier().muted));
}

#[test]
fn mute_requested_during_start_up_is_honoured() {
    let mut app = app_with(store(), policy(5));
    app.engine().with(|e| e.store_mut().refuse_next(2));
    app.init().unwrap();
    app.handle(Message::MuteStatus(true)).unwrap();
    assert_eq!(app.state(), AppState::Init);

    for _ in 0..INTERVAL {
        app.run().unwrap();
    }
    assert_eq!(app.state(), AppState::Mute);
    tick(&mut app).unwrap();
    assert!(app.is_muted());
    assert_eq!(app.engine().with(|e| e.amplifier().unmute_calls), 0);
}

#[test]
fn full_inbox_rejects_messages() {
    let mut app = app_with(store(), policy(5));
    for speed in 0..QUEUE_DEPTH {
        app.post(Message::VehicleSpeed(speed as u16)).unwrap();
    }
    assert_eq!(app.post(Message::VehicleSpeed(0)), Err(AppError::QueueFull));
    assert_eq!(app.pending_messages(), QUEUE_DEPTH);
    app.run().unwrap();
    assert_eq!(app.pending_messages(), 0);
}

// ── Shutdown ─────────────────────────────────────────────────────────────────

#[test]
fn deinit_mutes_then_stops_the_engine() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();
    app.deinit().unwrap();

    assert_eq!(app.state(), AppState::Deinit);
    assert!(app.is_muted());
    app.engine().with(|e| {
        assert!(!e.is_initialized());
        assert!(e.amplifier().muted);
    });
}

#[test]
fn deinit_reports_a_stuck_amplifier() {
    let mut app = app_with(store(), policy(5));
    app.init().unwrap();
    app.engine().with(|e| e.amplifier_mut().fail = true);

    assert_eq!(app.deinit(), Err(AppError::MuteRetriesExhausted(5)));
    assert!(!app.is_muted());
    assert!(!app.engine().with(|e| e.is_initialized()));
}

#[test]
fn deinit_before_init_touches_nothing() {
    let mut app = app_with(store(), policy(5));
    app.deinit().unwrap();
    assert_eq!(app.engine().with(|e| e.amplifier().mute_calls), 0);
}
