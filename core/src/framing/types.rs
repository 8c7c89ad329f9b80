use bytes::Bytes;
use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::constants::{
    AUDIO_FRAME_HEADER_LEN, DELTA_FRAME_HEADER_LEN, EMPTY_FRAME_HEADER_LEN, KEY_FRAME_HEADER_LEN,
    TRAILER_COUNTER_LEN, TRAILER_IV_LEN, TRAILER_KEY_INDEX_LEN, TRAILER_LEN,
};
use crate::crypto::TAG_LEN;

/// Media frame classification, as supplied by the encoder/depacketizer.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum FrameKind {
    /// Full/reference video frame.
    Key   = 0x00,
    /// Incremental video frame.
    Delta = 0x01,
    Audio = 0x02,
    /// Filler/silence (SIF) frame.
    Empty = 0x03,
}

impl FrameKind {
    /// Bytes at the front of the frame that stay in the clear.
    #[inline(always)]
    pub const fn header_len(self) -> usize {
        match self {
            FrameKind::Key => KEY_FRAME_HEADER_LEN,
            FrameKind::Delta => DELTA_FRAME_HEADER_LEN,
            FrameKind::Audio => AUDIO_FRAME_HEADER_LEN,
            FrameKind::Empty => EMPTY_FRAME_HEADER_LEN,
        }
    }

    /// Smallest encrypted frame of this kind: header + tag + trailer.
    #[inline(always)]
    pub const fn min_encrypted_len(self) -> usize {
        self.header_len() + TAG_LEN + TRAILER_LEN
    }

    /// Wire/FFI tag to kind.
    #[inline(always)]
    pub fn try_from_u8(v: u8) -> Result<Self, FrameError> {
        FrameKind::try_from_primitive(v).map_err(|_| FrameError::InvalidKind(v))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Key => "key",
            FrameKind::Delta => "delta",
            FrameKind::Audio => "audio",
            FrameKind::Empty => "empty",
        }
    }
}

/// One encoded media unit travelling through a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub data: Bytes,
    /// RTP-style media timestamp; carried through untouched.
    pub timestamp: u32,
}

impl Frame {
    pub fn new(kind: FrameKind, data: impl Into<Bytes>) -> Self {
        Self { kind, data: data.into(), timestamp: 0 }
    }

    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Filler frames are either tagged `Empty` or carry no bytes at all.
    #[inline]
    pub fn is_filler(&self) -> bool {
        self.kind == FrameKind::Empty || self.data.is_empty()
    }

    /// Same frame, new payload.
    pub fn replace_data(&self, data: impl Into<Bytes>) -> Self {
        Self { kind: self.kind, data: data.into(), timestamp: self.timestamp }
    }
}

/// Self-describing metadata appended to every encrypted frame.
///
/// All multi-byte fields are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTrailer {
    pub iv: [u8; TRAILER_IV_LEN],
    pub key_index: u8,
    pub frame_counter: u64,
}

impl FrameTrailer {
    pub const LEN: usize = TRAILER_IV_LEN // iv
        + TRAILER_KEY_INDEX_LEN          // key_index
        + TRAILER_COUNTER_LEN;           // frame_counter
}

/// Borrowed view of an encrypted frame split along the wire layout.
#[derive(Debug, Clone, Copy)]
pub struct EncryptedFrameView<'a> {
    pub header: &'a [u8],
    /// Ciphertext followed by the 16-byte tag.
    pub ciphertext_and_tag: &'a [u8],
    pub trailer: FrameTrailer,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame too short for {kind}: need at least {min} bytes, got {actual}")]
    TooShort { kind: &'static str, min: usize, actual: usize },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid frame kind: {0}")]
    InvalidKind(u8),
}
