//! e2ee-core
//!
//! Frame-level end-to-end encryption for real-time media tracks.
//! Pure Rust, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod options;
pub mod events;

// Building blocks
pub mod crypto;
pub mod keys;
pub mod framing;
pub mod frame_worker;
pub mod sif_guard;
pub mod telemetry;

// Track layer
pub mod pipeline;
pub mod session;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::events::{E2eeEvent, EventEmitter};
    pub use crate::framing::{Frame, FrameKind};
    pub use crate::keys::{KeyMaterial, KeyProvider, RotatingKeyProvider, SharedKeyProvider};
    pub use crate::options::KeyProviderOptions;
    pub use crate::pipeline::{
        spawn_track_worker, Direction, FrameOutcome, TrackConfig, TrackError, TrackPipeline,
    };
    pub use crate::session::E2eeSession;
    pub use crate::types::E2eeError;
}
