//! Frame codec: per-frame AES-GCM encode/decode.
//!
//! Responsibilities:
//! - Encrypt individual frames, preserving the clear header
//! - Decrypt individual frames, resolving keys by trailer index
//! - Build AAD
//! - Derive IVs
//! - Follow the sender's key ratchet
//!
//! Non-responsibilities:
//! - Threading
//! - Failure tolerance
//! - Filler-run policy

pub mod types;
pub mod encrypt;
pub mod decrypt;

pub use types::{
    DecryptedFrame,
    EncryptedFrame,
    FrameWorkerError,
};
pub use encrypt::{encode_frame, FrameCounter, FrameEncryptor};
pub use decrypt::{decode_frame, FrameDecryptor};
