//! Protocol decoder engine contract and its scoped teardown

use crate::config::LogLevel;

/// Lifecycle of an optional subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubsystemState {
    /// Not compiled in, or not attempted yet
    #[default]
    NotRequested,
    /// Initialization was attempted and failed
    InitFailed,
    /// Initialized and usable
    Ready,
}

impl SubsystemState {
    pub fn is_ready(self) -> bool {
        self == SubsystemState::Ready
    }
}

/// Process-wide protocol decoder runtime
pub trait DecoderEngine {
    /// Decoder-engine log verbosity; valid before `init`
    fn set_log_level(&mut self, level: LogLevel);

    /// Bring the runtime up
    fn init(&mut self) -> Result<(), DecoderError>;

    /// Load the full decoder catalog, returning how many were loaded
    fn load_all(&mut self) -> Result<usize, DecoderError>;

    /// Tear the runtime down
    fn exit(&mut self);
}

/// Owns the decoder engine and guarantees symmetric teardown
///
/// `exit` runs exactly once when the session is dropped, and only if
/// `init` succeeded.
pub struct DecoderSession {
    engine: Option<Box<dyn DecoderEngine>>,
    state: SubsystemState,
}

impl DecoderSession {
    /// Session for a build without the decoder engine
    pub fn absent() -> Self {
        Self {
            engine: None,
            state: SubsystemState::NotRequested,
        }
    }

    pub fn new(engine: Box<dyn DecoderEngine>) -> Self {
        Self {
            engine: Some(engine),
            state: SubsystemState::NotRequested,
        }
    }

    pub fn state(&self) -> SubsystemState {
        self.state
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_log_level(level);
        }
    }

    /// Initialize the engine and load its catalog
    ///
    /// Failure leaves the session in `InitFailed`; it is reported, never
    /// propagated.
    pub fn start(&mut self) -> SubsystemState {
        let Some(engine) = self.engine.as_mut() else {
            return self.state;
        };
        if self.state != SubsystemState::NotRequested {
            return self.state;
        }

        if let Err(e) = engine.init() {
            log::error!("Decoder engine init failed: {}", e);
            self.state = SubsystemState::InitFailed;
            return self.state;
        }
        self.state = SubsystemState::Ready;

        match engine.load_all() {
            Ok(count) => log::info!("Loaded {} protocol decoders", count),
            Err(e) => log::warn!("Failed to load protocol decoders: {}", e),
        }
        self.state
    }

    /// Tear the engine down now; later calls and the drop are no-ops
    pub fn shutdown(&mut self) {
        if !self.state.is_ready() {
            return;
        }
        if let Some(mut engine) = self.engine.take() {
            log::debug!("Shutting down decoder engine");
            engine.exit();
        }
        self.state = SubsystemState::NotRequested;
    }
}

impl Drop for DecoderSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Decoder engine errors
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Decoder engine initialization failed: {0}")]
    Init(String),

    #[error("Failed to load decoder catalog: {0}")]
    Load(String),
}
