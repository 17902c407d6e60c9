//! AVAS application layer.
//!
//! Drives the playback engine from vehicle messages: the vehicle speed picks
//! the calibrated gain and pitch shift, the selected-audio message switches
//! the stored sound, and the mute status silences the amplifier. Engine and
//! amplifier failures are retried on later ticks, never by blocking.
//!
//! ```text
//!            init()                     MuteStatus(true)
//! Deinit ──────────► Init ──► Run ◄──────────────────► Mute
//!   ▲                 │          MuteStatus(false)
//!   └── retries ──────┘
//!       exhausted
//! ```

use heapless::Deque;
use platform::config::{init_retry_ticks, APP_NAME, APP_TYPE, APP_VERSION, INIT_MAX_ATTEMPTS};
use platform::{Amplifier, DataStore, SampleTransmitter};
use playback::{AudioEngine, EngineError, PlayStatus, SharedAudioEngine};

use crate::error::AppError;
use crate::retry::Retry;

/// Capacity of the message inbox.
pub const QUEUE_DEPTH: usize = 8;

/// Vehicle messages routed to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Vehicle speed, used as the calibration table row.
    VehicleSpeed(u16),
    /// Index of the audio file to play.
    SelectAudio(u8),
    /// `true` mutes the output, `false` unmutes it.
    MuteStatus(bool),
}

impl Message {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VehicleSpeed(_) => "vehicle-speed",
            Self::SelectAudio(_) => "select-audio",
            Self::MuteStatus(_) => "mute-status",
        }
    }
}

/// Application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppState {
    /// Not started, stopped, or given up.
    #[default]
    Deinit,
    /// Waiting for the engine to initialise.
    Init,
    /// Output muted on request.
    Mute,
    /// Streaming.
    Run,
}

impl AppState {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deinit => "deinit",
            Self::Init => "init",
            Self::Mute => "mute",
            Self::Run => "run",
        }
    }
}

/// Retry policy of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppConfig {
    /// Attempts per operation before giving up.
    pub init_attempts: u8,
    /// Ticks between two attempts.
    pub retry_interval_ticks: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            init_attempts: INIT_MAX_ATTEMPTS,
            retry_interval_ticks: init_retry_ticks(),
        }
    }
}

/// The AVAS application.
///
/// Call [`AvasApp::init`] once, post vehicle messages with
/// [`AvasApp::post`], and call [`AvasApp::run`] every control-loop tick.
/// Interrupt handlers reach the engine through [`AvasApp::engine`].
pub struct AvasApp<S, T, A> {
    engine: SharedAudioEngine<S, T, A>,
    config: AppConfig,
    state: AppState,
    init_retry: Retry,
    mute_retry: Retry,
    unmute_retry: Retry,
    muted: bool,
    mute_requested: bool,
    speed: Option<u16>,
    applied_speed: Option<u16>,
    metadata_logged: bool,
    inbox: Deque<Message, QUEUE_DEPTH>,
}

impl<S, T, A> AvasApp<S, T, A>
where
    S: DataStore,
    T: SampleTransmitter,
    A: Amplifier,
{
    /// Wrap `engine`. The amplifier is assumed muted until the first
    /// successful unmute.
    pub fn new(engine: AudioEngine<S, T, A>, config: AppConfig) -> Self {
        let retry = Retry::new(config.init_attempts, config.retry_interval_ticks);
        Self {
            engine: SharedAudioEngine::new(engine),
            config,
            state: AppState::Deinit,
            init_retry: retry,
            mute_retry: retry,
            unmute_retry: retry,
            muted: true,
            mute_requested: false,
            speed: None,
            applied_speed: None,
            metadata_logged: false,
            inbox: Deque::new(),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Initialise the engine, request playback and unmute.
    ///
    /// A failed engine start is retried from [`AvasApp::run`]; only a
    /// policy without retries fails here. A failed unmute keeps the output
    /// muted and is retried the same way.
    pub fn init(&mut self) -> Result<(), AppError> {
        info!("{} ({}) v{} starting", APP_NAME, APP_TYPE, APP_VERSION);
        self.set_state(AppState::Init);
        self.init_retry.reset();
        self.attempt_start()
    }

    /// Mute (with bounded retry) and stop the engine.
    ///
    /// The engine is stopped even when muting fails.
    pub fn deinit(&mut self) -> Result<(), AppError> {
        let result = self.mute_for_shutdown();
        self.engine.with(AudioEngine::deinit);
        self.init_retry.reset();
        self.mute_retry.reset();
        self.unmute_retry.reset();
        self.mute_requested = false;
        self.applied_speed = None;
        self.metadata_logged = false;
        self.inbox.clear();
        self.set_state(AppState::Deinit);
        result
    }

    /// One control-loop tick: drain the inbox, then advance the state.
    pub fn run(&mut self) -> Result<(), AppError> {
        while let Some(message) = self.inbox.pop_front() {
            if let Err(e) = self.handle(message) {
                error!("{} rejected: {}", message.as_str(), e.as_str());
            }
        }

        match self.state {
            AppState::Deinit => Ok(()),
            AppState::Init => {
                if self.init_retry.due() {
                    self.attempt_start()
                } else {
                    Ok(())
                }
            }
            AppState::Mute => {
                self.engine.process();
                self.drive_mute()
            }
            AppState::Run => {
                let unmuted = self.drive_unmute();
                self.engine.process();
                self.apply_speed();
                self.log_metadata();
                unmuted
            }
        }
    }

    // ── Messages ────────────────────────────────────────────────────────────

    /// Queue `message` for the next [`AvasApp::run`].
    pub fn post(&mut self, message: Message) -> Result<(), AppError> {
        self.inbox.push_back(message).map_err(|_| {
            warn!("inbox full, {} dropped", message.as_str());
            AppError::QueueFull
        })
    }

    /// Act on `message` immediately.
    pub fn handle(&mut self, message: Message) -> Result<(), AppError> {
        match message {
            Message::VehicleSpeed(speed) => {
                self.speed = Some(speed);
                Ok(())
            }
            Message::SelectAudio(index) => {
                self.metadata_logged = false;
                self.applied_speed = None;
                self.engine.with(|engine| engine.switch_audio(index))?;
                Ok(())
            }
            Message::MuteStatus(true) => {
                self.mute_requested = true;
                if self.state == AppState::Run {
                    self.mute_retry.reset();
                    self.set_state(AppState::Mute);
                }
                Ok(())
            }
            Message::MuteStatus(false) => {
                self.mute_requested = false;
                if self.state == AppState::Mute {
                    self.unmute_retry.reset();
                    self.set_state(AppState::Run);
                }
                Ok(())
            }
        }
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    /// Current application state.
    pub fn state(&self) -> AppState {
        self.state
    }

    /// `true` until an unmute has succeeded, and again after a mute.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// The retry policy.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Messages waiting for the next tick.
    pub fn pending_messages(&self) -> usize {
        self.inbox.len()
    }

    /// Last speed applied to the engine.
    pub fn applied_speed(&self) -> Option<u16> {
        self.applied_speed
    }

    /// The shared engine, for interrupt handlers and diagnostics.
    pub fn engine(&self) -> &SharedAudioEngine<S, T, A> {
        &self.engine
    }

    // ── Steps ───────────────────────────────────────────────────────────────

    fn attempt_start(&mut self) -> Result<(), AppError> {
        match self.start_engine() {
            Ok(()) => {
                self.init_retry.reset();
                if self.mute_requested {
                    self.mute_retry.reset();
                    self.set_state(AppState::Mute);
                } else {
                    self.unmute_retry.reset();
                    self.set_state(AppState::Run);
                    return self.drive_unmute();
                }
                Ok(())
            }
            Err(e) => {
                warn!(
                    "engine start failed ({}), attempt {}",
                    e.as_str(),
                    self.init_retry.attempts().saturating_add(1)
                );
                if self.init_retry.fail() {
                    return Ok(());
                }
                let attempts = self.init_retry.attempts();
                error!("engine could not be started after {} attempts", attempts);
                self.set_state(AppState::Deinit);
                Err(AppError::InitRetriesExhausted(attempts))
            }
        }
    }

    fn start_engine(&self) -> Result<(), EngineError> {
        self.engine.with(|engine| {
            engine.init()?;
            if !engine.is_playing() && engine.play()? == PlayStatus::Pending {
                info!("audio buffers not ready yet, playback pending");
            }
            Ok(())
        })
    }

    fn drive_mute(&mut self) -> Result<(), AppError> {
        if self.muted || !self.mute_retry.due() {
            return Ok(());
        }
        match self.engine.with(AudioEngine::mute) {
            Ok(()) => {
                self.muted = true;
                self.mute_retry.reset();
                Ok(())
            }
            Err(_) if self.mute_retry.fail() => Ok(()),
            Err(_) => {
                let attempts = self.mute_retry.attempts();
                error!("mute failed after {} attempts", attempts);
                self.mute_retry.reset();
                Err(AppError::MuteRetriesExhausted(attempts))
            }
        }
    }

    fn drive_unmute(&mut self) -> Result<(), AppError> {
        if !self.muted || self.mute_requested || !self.unmute_retry.due() {
            return Ok(());
        }
        match self.engine.with(AudioEngine::unmute) {
            Ok(()) => {
                self.muted = false;
                self.unmute_retry.reset();
                Ok(())
            }
            Err(_) if self.unmute_retry.fail() => {
                warn!("unmute failed, output stays muted");
                Ok(())
            }
            Err(_) => {
                let attempts = self.unmute_retry.attempts();
                error!("unmute failed after {} attempts", attempts);
                self.unmute_retry.reset();
                Err(AppError::UnmuteRetriesExhausted(attempts))
            }
        }
    }

    fn mute_for_shutdown(&mut self) -> Result<(), AppError> {
        if !self.engine.with(|engine| engine.is_initialized()) {
            return Ok(());
        }
        let attempts = self.config.init_attempts.max(1);
        for attempt in 1..=attempts {
            match self.engine.with(AudioEngine::mute) {
                Ok(()) => {
                    self.muted = true;
                    return Ok(());
                }
                Err(e) => warn!("shutdown mute attempt {} failed: {}", attempt, e.as_str()),
            }
        }
        error!("failed to mute after {} attempts", attempts);
        self.muted = false;
        Err(AppError::MuteRetriesExhausted(attempts))
    }

    /// Push the latest speed into the engine when it changed or the previous
    /// push could not complete.
    fn apply_speed(&mut self) {
        let Some(speed) = self.speed else {
            return;
        };
        if self.applied_speed == Some(speed) {
            return;
        }
        let result = self.engine.with(|engine| {
            engine.update_params_for_speed(speed)?;
            Ok::<_, EngineError>((engine.gain(speed)?, engine.frequency(speed)?))
        });
        match result {
            Ok((gain, frequency)) => {
                debug!("vehicle speed {}: gain {}, shift {}", speed, gain, frequency);
                self.applied_speed = Some(speed);
            }
            Err(EngineError::ConfigNotReady) => trace!("speed {} deferred", speed),
            Err(e) => {
                warn!("speed {} not applied: {}", speed, e.as_str());
                self.applied_speed = Some(speed);
            }
        }
    }

    /// Log the config-table metadata once per loaded audio file.
    fn log_metadata(&mut self) {
        if self.metadata_logged {
            return;
        }
        let logged = self.engine.with(|engine| -> Result<(), EngineError> {
            info!("audio name: {}", engine.name()?);
            info!("audio file version: {}", engine.version()?);
            info!("calibration version: {}", engine.calib_version()?);
            info!("calibration tool version: {}", engine.calib_tool_version()?);
            info!("calibration date: {}", engine.calib_date()?);
            Ok(())
        });
        self.metadata_logged = logged.is_ok();
    }

    fn set_state(&mut self, next: AppState) {
        if self.state != next {
            debug!("avas {} -> {}", self.state.as_str(), next.as_str());
            self.state = next;
        }
    }
}
