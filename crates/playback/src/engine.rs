//! Playback state machine and public engine API.
//!
//! `AudioEngine` owns every piece of playback state: the config table, the
//! two sample slots plus the silence buffer, the flash read sequence and the
//! top-level playback state. It is driven from three places:
//!
//! - [`AudioEngine::process`] from the main loop,
//! - [`AudioEngine::on_flash_complete`] when the store finishes a transfer,
//! - [`AudioEngine::on_transfer_event`] from the I2S interrupt.
//!
//! All three take `&mut self`, so the borrow checker (and, on target,
//! [`SharedAudioEngine`](crate::SharedAudioEngine)) guarantees they never
//! overlap.
//!
//! ```text
//!           play()            switch_audio()
//! Init ──► Ready ──► Run ─────────────► Switch ──► Init
//!  ▲                                                │
//!  └────────────────────────────────────────────────┘
//! ```

use platform::flash_layout::FlashLayout;
use platform::{
    Amplifier, AudioSlot, DataLabel, DataLocation, DataStore, Gain, SampleTransmitter,
    SpeedIndex, TransferEvent,
};

use crate::buffer::{BufferPair, BufferState, Rotation, SampleBuffer, SlotId, SLOT_CAPACITY};
use crate::config::EngineConfig;
use crate::config_table::ConfigTable;
use crate::error::EngineError;
use crate::flash::{FlashReadState, PendingRead};

/// Top-level playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// Waiting for the config table and both slots.
    #[default]
    Init,
    /// Buffers primed; waiting for a play request.
    Ready,
    /// Streaming to the transmitter.
    Run,
    /// A different audio file was selected; reload on the next tick.
    Switch,
}

impl PlaybackState {
    /// Short name for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Ready => "ready",
            Self::Run => "run",
            Self::Switch => "switch",
        }
    }
}

/// Result of a play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayStatus {
    /// The engine is streaming.
    Started,
    /// Playback starts as soon as the buffers are primed.
    Pending,
}

/// Runtime parameters of the selected audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioParameters {
    /// Selected audio file.
    pub current_audio: AudioSlot,
    /// Output muted.
    pub muted: bool,
    /// Play requested.
    pub playing: bool,
    /// Top-level state.
    pub state: PlaybackState,
    /// Next sample block to fetch.
    pub cursor: u32,
    /// Bytes of sample data, from the config table.
    pub total_size: u32,
    /// Edit window of the frequency shift, from the config table.
    pub max_edit_sample_count: u16,
    /// Gain applied by the transform.
    pub gain: Gain,
    /// Address of the first sample of the selected file.
    pub audio_address: u32,
    /// Address of the config table of the selected file.
    pub config_table_address: u32,
}

impl AudioParameters {
    const fn new() -> Self {
        Self {
            current_audio: AudioSlot::FIRST,
            muted: false,
            playing: false,
            state: PlaybackState::Init,
            cursor: 0,
            total_size: 0,
            max_edit_sample_count: 0,
            gain: Gain::UNITY,
            audio_address: 0,
            config_table_address: 0,
        }
    }

    fn select(&mut self, slot: AudioSlot, layout: &FlashLayout) {
        self.current_audio = slot;
        self.config_table_address = layout.config_table_address(slot);
        self.audio_address = layout.audio_address(slot);
    }
}

/// The audio playback engine.
pub struct AudioEngine<S, T, A> {
    pub(crate) store: S,
    transmitter: T,
    amplifier: A,
    config: EngineConfig,
    pub(crate) params: AudioParameters,
    pub(crate) table: ConfigTable,
    pub(crate) buffers: BufferPair,
    pub(crate) flash_state: FlashReadState,
    pub(crate) pending: Option<PendingRead>,
    initialized: bool,
}

impl<S, T, A> AudioEngine<S, T, A>
where
    S: DataStore,
    T: SampleTransmitter,
    A: Amplifier,
{
    /// Create an uninitialised engine around its collaborators.
    pub fn new(store: S, transmitter: T, amplifier: A, config: EngineConfig) -> Self {
        Self {
            store,
            transmitter,
            amplifier,
            config,
            params: AudioParameters::new(),
            table: ConfigTable::new(config.byte_order),
            buffers: BufferPair::new(),
            flash_state: FlashReadState::Idle,
            pending: None,
            initialized: false,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Reset all state, select the persisted audio file and request its
    /// config table.
    ///
    /// An unreadable or out-of-range persisted index falls back to the first
    /// audio file. Only a refused config-table read fails the call, and the
    /// engine then stays uninitialized until a later `init` succeeds.
    pub fn init(&mut self) -> Result<(), EngineError> {
        self.reset();
        self.initialized = false;

        let mut raw = [0u8; 1];
        let slot = match self
            .store
            .read(DataLocation::Label(DataLabel::CurrentAudio), 0, &mut raw)
        {
            Ok(()) => {
                let [index] = raw;
                AudioSlot::try_new(index).unwrap_or_else(|_| {
                    warn!("persisted audio index {} invalid, using first", index);
                    AudioSlot::FIRST
                })
            }
            Err(_) => {
                error!("current audio index unreadable, using first");
                AudioSlot::FIRST
            }
        };
        self.params.select(slot, &self.config.layout);

        if let Err(e) = self.request_config_table() {
            error!("config table of audio {} could not be read", slot.get());
            return Err(e);
        }
        self.initialized = true;
        info!("initialized with audio {}", slot.get());
        Ok(())
    }

    /// Reset all state. Later completions and calls are ignored or rejected
    /// until the next successful [`AudioEngine::init`].
    pub fn deinit(&mut self) {
        self.reset();
        self.initialized = false;
        info!("deinitialized");
    }

    /// `true` after a successful [`AudioEngine::init`].
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn reset(&mut self) {
        self.params = AudioParameters::new();
        self.table.reset();
        self.buffers.reset();
        self.flash_state = FlashReadState::Idle;
        self.pending = None;
    }

    fn ensure_initialized(&self) -> Result<(), EngineError> {
        if self.initialized {
            Ok(())
        } else {
            Err(EngineError::NotInitialized)
        }
    }

    fn ensure_table_ready(&self) -> Result<&ConfigTable, EngineError> {
        self.ensure_initialized()?;
        if self.table.is_ready() {
            Ok(&self.table)
        } else {
            Err(EngineError::ConfigNotReady)
        }
    }

    // ── Tick and completions ────────────────────────────────────────────────

    /// Advance the playback machine, then the flash machine. Each step is
    /// skipped while the data store is busy.
    pub fn process(&mut self) {
        if !self.initialized {
            trace!("process called before init");
            return;
        }
        if !self.store.is_busy() {
            self.playback_step();
        }
        if !self.store.is_busy() {
            self.flash_step();
        }
    }

    /// Deliver the result of the outstanding data-store transfer.
    pub fn on_flash_complete(&mut self, result: Result<(), S::Error>) {
        if !self.initialized {
            trace!("flash completion ignored, not initialized");
            return;
        }
        self.complete_read(result.is_ok());
    }

    /// Handle an I2S transfer event.
    ///
    /// A completed transfer rotates the buffer roles and immediately hands
    /// the next buffer to the transmitter. Events are ignored while the
    /// engine is not initialized or (re)loading a config table.
    pub fn on_transfer_event(&mut self, event: TransferEvent) {
        if !self.initialized || self.params.state == PlaybackState::Init {
            trace!("transfer event ignored in init");
            return;
        }

        if event.is_completion() {
            let rotation = self.buffers.rotate(self.params.muted);
            match rotation {
                Rotation::Underrun => warn!("spare not ready, playing silence"),
                other => trace!("buffers {}", other.as_str()),
            }
            if self.params.state == PlaybackState::Run {
                self.start_transfer();
            }
        } else if event == TransferEvent::Error {
            error!("I2S transfer error");
            if self.buffers.active_state() == BufferState::Busy {
                self.buffers.set_active_state(BufferState::Ready);
            }
        } else {
            debug!("unexpected I2S rx-full event");
        }
    }

    fn playback_step(&mut self) {
        match self.params.state {
            PlaybackState::Init => {
                if self.flash_state == FlashReadState::Init {
                    if self.request_config_table().is_err() {
                        debug!("config table read deferred");
                    }
                } else if self.buffers.both_ready() {
                    self.set_state(PlaybackState::Ready);
                }
            }
            PlaybackState::Ready => {
                if self.params.playing {
                    self.set_state(PlaybackState::Run);
                }
            }
            PlaybackState::Run => self.start_transfer(),
            PlaybackState::Switch => self.reload(),
        }

        for id in SlotId::ALL {
            self.service_slot(id);
        }
    }

    /// Hand the active buffer to the transmitter if it is ready.
    fn start_transfer(&mut self) {
        if self.buffers.active_state() != BufferState::Ready {
            return;
        }
        match self.transmitter.write(self.buffers.active_samples()) {
            Ok(()) => self.buffers.set_active_state(BufferState::Busy),
            Err(_) => warn!("transmitter refused buffer"),
        }
    }

    /// Restart the pipeline on the newly selected audio file.
    fn reload(&mut self) {
        self.set_flash_state(FlashReadState::Init);
        self.table.set_state(BufferState::Read);
        self.buffers.restart(self.params.muted);
        self.params.cursor = 0;
        self.set_state(PlaybackState::Init);
        if self.request_config_table().is_err() {
            warn!("config table read refused, retrying");
        }
    }

    fn set_state(&mut self, next: PlaybackState) {
        if self.params.state != next {
            debug!(
                "playback {} -> {}",
                self.params.state.as_str(),
                next.as_str()
            );
            self.params.state = next;
        }
    }

    // ── Controls ────────────────────────────────────────────────────────────

    /// Mute the amplifier. A `Ready` current slot is swapped for silence.
    pub fn mute(&mut self) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        if self.amplifier.mute().is_err() {
            error!("amplifier mute failed");
            return Err(EngineError::AmplifierFault);
        }
        info!("amplifier muted");
        self.params.muted = true;
        if self.buffers.mute_substitute() {
            debug!("silence substituted");
        }
        Ok(())
    }

    /// Unmute the amplifier. A `Ready` silence buffer gives way to samples.
    pub fn unmute(&mut self) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        if self.amplifier.unmute().is_err() {
            error!("amplifier unmute failed");
            return Err(EngineError::AmplifierFault);
        }
        info!("amplifier unmuted");
        self.params.muted = false;
        if self.buffers.unmute_restore() {
            debug!("samples restored");
        }
        Ok(())
    }

    /// Request playback. Starts immediately when the buffers are primed.
    pub fn play(&mut self) -> Result<PlayStatus, EngineError> {
        self.ensure_initialized()?;
        self.params.playing = true;
        info!("play requested");
        match self.params.state {
            PlaybackState::Ready => {
                self.set_state(PlaybackState::Run);
                Ok(PlayStatus::Started)
            }
            PlaybackState::Run => Ok(PlayStatus::Started),
            PlaybackState::Init | PlaybackState::Switch => Ok(PlayStatus::Pending),
        }
    }

    /// Withdraw the play request. A running stream keeps running; use
    /// [`AudioEngine::mute`] to silence it.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        self.params.playing = false;
        info!("play request withdrawn");
        Ok(())
    }

    /// `true` while a play request is pending or active.
    pub fn is_playing(&self) -> bool {
        self.initialized && self.params.playing
    }

    /// Load gain and shifting rate for `speed` from the config table.
    pub fn update_params_for_speed(&mut self, speed: u16) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        let row = SpeedIndex::try_new(speed).map_err(|_| EngineError::SpeedOutOfRange(speed))?;
        let table = self.ensure_table_ready()?;
        let gain = Gain::new(table.gain(row));
        let rate = table.frequency(row);
        self.params.gain = gain;
        self.buffers.set_shifting_rate(rate);
        trace!("speed {}: gain {}, rate {}", speed, gain.get(), rate);
        Ok(())
    }

    /// Select another stored audio file. The reload happens on the next tick.
    pub fn switch_audio(&mut self, index: u8) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        let from = self.params.current_audio.get();
        if index == from {
            return Ok(());
        }
        let slot = AudioSlot::try_new(index).map_err(|_| {
            error!("invalid audio index for switching: {}", index);
            EngineError::InvalidAudioIndex(index)
        })?;
        self.params.select(slot, &self.config.layout);
        self.set_state(PlaybackState::Switch);
        info!("switch audio {} to audio {}", from, index);
        Ok(())
    }

    // ── Config table accessors ──────────────────────────────────────────────

    /// Name of the loaded audio file.
    pub fn name(&self) -> Result<&str, EngineError> {
        self.ensure_table_ready()?.name()
    }

    /// Size of the loaded sample data in bytes.
    pub fn size(&self) -> Result<u32, EngineError> {
        Ok(self.ensure_table_ready()?.audio_size())
    }

    /// Version of the loaded audio file.
    pub fn version(&self) -> Result<&str, EngineError> {
        self.ensure_table_ready()?.version()
    }

    /// Calibration version of the loaded audio file.
    pub fn calib_version(&self) -> Result<&str, EngineError> {
        self.ensure_table_ready()?.calib_version()
    }

    /// Calibration tool version of the loaded audio file.
    pub fn calib_tool_version(&self) -> Result<&str, EngineError> {
        self.ensure_table_ready()?.calib_tool_version()
    }

    /// Calibration date of the loaded audio file.
    pub fn calib_date(&self) -> Result<&str, EngineError> {
        self.ensure_table_ready()?.calib_date()
    }

    /// Calibrated gain at `speed`.
    pub fn gain(&self, speed: u16) -> Result<u16, EngineError> {
        let table = self.ensure_table_ready()?;
        let row = SpeedIndex::try_new(speed).map_err(|_| EngineError::SpeedOutOfRange(speed))?;
        Ok(table.gain(row))
    }

    /// Calibrated shifting rate at `speed`.
    pub fn frequency(&self, speed: u16) -> Result<u16, EngineError> {
        let table = self.ensure_table_ready()?;
        let row = SpeedIndex::try_new(speed).map_err(|_| EngineError::SpeedOutOfRange(speed))?;
        Ok(table.frequency(row))
    }

    /// Edit window of the loaded audio file.
    pub fn max_edit_sample_count(&self) -> Result<u16, EngineError> {
        Ok(self.ensure_table_ready()?.max_edit_sample_count())
    }

    // ── State inspection ────────────────────────────────────────────────────

    /// Top-level playback state.
    pub fn state(&self) -> PlaybackState {
        self.params.state
    }

    /// Flash read sequence state.
    pub fn flash_state(&self) -> FlashReadState {
        self.flash_state
    }

    /// Selected audio file.
    pub fn current_audio(&self) -> AudioSlot {
        self.params.current_audio
    }

    /// Runtime parameters.
    pub fn params(&self) -> &AudioParameters {
        &self.params
    }

    /// `true` while muted.
    pub fn is_muted(&self) -> bool {
        self.params.muted
    }

    /// Gain currently applied by the transform.
    pub fn gain_setting(&self) -> Gain {
        self.params.gain
    }

    /// Next sample block to fetch.
    pub fn cursor(&self) -> u32 {
        self.params.cursor
    }

    /// The in-RAM config table.
    pub fn config_table(&self) -> &ConfigTable {
        &self.table
    }

    /// The slots, silence buffer and role assignment.
    pub fn buffers(&self) -> &BufferPair {
        &self.buffers
    }

    /// Slot holding the current role.
    pub fn current_buffer(&self) -> &SampleBuffer<SLOT_CAPACITY> {
        self.buffers.current()
    }

    /// Slot holding the spare role.
    pub fn spare_buffer(&self) -> &SampleBuffer<SLOT_CAPACITY> {
        self.buffers.spare()
    }

    /// The outstanding data-store request, if any.
    pub fn pending_read(&self) -> Option<PendingRead> {
        self.pending
    }

    /// The data store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The data store, mutably (completion bookkeeping in BSP glue).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The transmitter.
    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    /// The transmitter, mutably.
    pub fn transmitter_mut(&mut self) -> &mut T {
        &mut self.transmitter
    }

    /// The amplifier.
    pub fn amplifier(&self) -> &A {
        &self.amplifier
    }

    /// The amplifier, mutably.
    pub fn amplifier_mut(&mut self) -> &mut A {
        &mut self.amplifier
    }
}
