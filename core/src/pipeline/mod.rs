//! Transform pipeline: one instance per media track.
//!
//! Responsibilities:
//! - Pull frames, run the codec, push results downstream
//! - Route filler frames through the SIF guard
//! - Absorb per-frame failures up to the tolerance, then close the track
//! - Optionally run the whole track on a dedicated worker thread
//!
//! Non-responsibilities:
//! - Cryptography
//! - Key distribution

pub mod types;
pub mod tolerance;
pub mod track;
pub mod worker;

pub use types::{
    Direction,
    DropReason,
    FrameOutcome,
    FrameSink,
    SinkError,
    TrackConfig,
    TrackError,
};
pub use tolerance::FailureTolerance;
pub use track::{TrackPipeline, TransformStream};
pub use worker::{spawn_track_worker, TrackHandle};
