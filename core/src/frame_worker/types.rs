use thiserror::Error;

use crate::crypto::types::{CryptoError, NonceError};
use crate::framing::types::{Frame, FrameError, FrameTrailer};
use crate::keys::KeyError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameWorkerError {
    /// Frame too short or structurally inconsistent.
    #[error("malformed frame: {0}")]
    Malformed(#[from] FrameError),

    /// Trailer names a key index the provider does not hold.
    #[error("decryption failed: no key at index {index} for `{participant}`")]
    UnknownKeyIndex { participant: String, index: u8 },

    /// Tag did not verify (tamper or wrong key).
    #[error("decryption failed: {0}")]
    Decryption(CryptoError),

    /// No key was ever delivered for the participant.
    #[error("no key available for participant `{participant}`")]
    KeyUnavailable { participant: String },

    #[error("nonce error: {0}")]
    Nonce(#[from] NonceError),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("key provider error: {0}")]
    Key(KeyError),
}

impl FrameWorkerError {
    /// Fatal errors end the track at once; the rest count against tolerance.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FrameWorkerError::KeyUnavailable { .. } | FrameWorkerError::Nonce(_) | FrameWorkerError::Key(_)
        )
    }

    /// Auth-tag mismatch or unknown key index.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            FrameWorkerError::UnknownKeyIndex { .. } | FrameWorkerError::Decryption(_)
        )
    }
}

impl From<KeyError> for FrameWorkerError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::NoKeyForParticipant { participant } => FrameWorkerError::KeyUnavailable { participant },
            KeyError::IndexNotFound { participant, index } => FrameWorkerError::UnknownKeyIndex { participant, index },
            KeyError::Crypto(c) => FrameWorkerError::Crypto(c),
            other => FrameWorkerError::Key(other),
        }
    }
}

impl From<CryptoError> for FrameWorkerError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::TagMismatch => FrameWorkerError::Decryption(e),
            other => FrameWorkerError::Crypto(other),
        }
    }
}

/// Output of encryption.
#[derive(Debug, Clone)]
pub struct EncryptedFrame {
    pub frame: Frame,
    /// `None` for filler frames, which pass through untouched.
    pub trailer: Option<FrameTrailer>,
}

/// Output of decryption.
#[derive(Debug, Clone)]
pub struct DecryptedFrame {
    pub frame: Frame,
    pub trailer: Option<FrameTrailer>,
    /// Ratchet steps needed to open the frame (0 = key as stored).
    pub ratchet_steps: u8,
}
