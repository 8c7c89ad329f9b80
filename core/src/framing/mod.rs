//! Frame model and wire layout.
//!
//! Responsibilities:
//! - Classify frames and map each kind to its clear header length
//! - Encode the metadata trailer and join wire regions
//! - Split encrypted frames with strict length validation
//!
//! Non-responsibilities:
//! - Cryptography
//! - Key lookup
//! - Threading

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{
    EncryptedFrameView,
    Frame,
    FrameError,
    FrameKind,
    FrameTrailer,
};
