use std::io;

use crossbeam::channel::Sender;
use thiserror::Error;

use crate::frame_worker::{FrameCounter, FrameWorkerError};
use crate::framing::Frame;
use crate::options::KeyProviderOptions;
use crate::sif_guard::SifGuardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local sender: plaintext in, ciphertext out.
    Encrypt,
    /// Remote participant: ciphertext in, plaintext out.
    Decrypt,
}

#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub participant: String,
    pub track_id: String,
    pub direction: Direction,
    pub failure_tolerance: u32,
    pub sif: SifGuardConfig,
    /// Sender frame counter for an encrypting track. Tracks of the same
    /// participant must share one, or their IVs collide.
    pub frame_counter: FrameCounter,
}

impl TrackConfig {
    pub fn from_options(
        participant: &str,
        track_id: &str,
        direction: Direction,
        options: &KeyProviderOptions,
    ) -> Self {
        Self {
            participant: participant.to_string(),
            track_id: track_id.to_string(),
            direction,
            failure_tolerance: options.failure_tolerance,
            sif: SifGuardConfig::from(options),
            frame_counter: FrameCounter::default(),
        }
    }

    pub fn with_frame_counter(mut self, counter: FrameCounter) -> Self {
        self.frame_counter = counter;
        self
    }
}

/// Why a frame produced no output. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Filler run over budget; the filler was dropped.
    SifBudgetExceeded { consecutive: u32, elapsed_ms: u64 },
    /// Per-frame codec failure, counted against tolerance.
    Frame(FrameWorkerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Forward(Frame),
    Dropped(DropReason),
}

/// Track-level errors. Everything here except `Sink` ends the track; a sink
/// error only ends the current [`run`](super::TrackPipeline::run).
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("track `{track_id}`: {failures} consecutive failures, last: {last}")]
    ToleranceExceeded { track_id: String, failures: u32, last: FrameWorkerError },

    #[error("track `{track_id}`: no key available for participant `{participant}`")]
    KeyUnavailable { track_id: String, participant: String },

    #[error("track `{track_id}`: fatal codec error: {source}")]
    Fatal { track_id: String, source: FrameWorkerError },

    #[error("track is closed")]
    Closed,

    #[error("sink rejected frame: {0}")]
    Sink(#[from] SinkError),

    #[error("failed to spawn track worker: {0}")]
    Spawn(io::Error),

    #[error("track worker panicked")]
    WorkerPanicked,
}

impl TrackError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TrackError::Sink(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Downstream consumer of processed frames. `push` may block for backpressure.
pub trait FrameSink {
    fn push(&mut self, frame: Frame) -> Result<(), SinkError>;
}

impl FrameSink for Vec<Frame> {
    fn push(&mut self, frame: Frame) -> Result<(), SinkError> {
        Vec::push(self, frame);
        Ok(())
    }
}

impl FrameSink for Sender<Frame> {
    fn push(&mut self, frame: Frame) -> Result<(), SinkError> {
        self.send(frame).map_err(|_| SinkError("receiver disconnected".into()))
    }
}
