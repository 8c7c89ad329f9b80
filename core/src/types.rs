use crate::{
    crypto::{CryptoError, NonceError},
    frame_worker::FrameWorkerError,
    framing::FrameError,
    keys::KeyError,
    options::OptionsError,
    pipeline::TrackError,
};

/// Unified error covering options, keys, framing, crypto and track failures.
/// - `From<T>` impls let `?` cross every layer.
/// - Messages are stable and contextual for logs and events.
#[derive(Debug)]
pub enum E2eeError {
    /// Options failed to parse or validate.
    Options(OptionsError),

    /// Key provider error (missing participant, bad index, derivation).
    Key(KeyError),

    /// Wire-level error (validation or parse).
    Frame(FrameError),

    /// Per-frame codec error.
    FrameWorker(FrameWorkerError),

    /// Cryptographic error (AEAD, KDF).
    Crypto(CryptoError),

    /// IV derivation error.
    Nonce(NonceError),

    /// Track-level error, usually fatal for that track.
    Track(TrackError),

    /// The session was shut down.
    SessionClosed,
}

impl std::fmt::Display for E2eeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            E2eeError::Options(e) => write!(f, "options error: {}", e),
            E2eeError::Key(e) => write!(f, "key error: {}", e),
            E2eeError::Frame(e) => write!(f, "frame error: {}", e),
            E2eeError::FrameWorker(e) => write!(f, "frame codec error: {}", e),
            E2eeError::Crypto(e) => write!(f, "crypto error: {}", e),
            E2eeError::Nonce(e) => write!(f, "nonce error: {}", e),
            E2eeError::Track(e) => write!(f, "track error: {}", e),

            E2eeError::SessionClosed => write!(f, "session is shut down"),
        }
    }
}

impl std::error::Error for E2eeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            E2eeError::Options(e) => Some(e),
            E2eeError::Key(e) => Some(e),
            E2eeError::Frame(e) => Some(e),
            E2eeError::FrameWorker(e) => Some(e),
            E2eeError::Crypto(e) => Some(e),
            E2eeError::Nonce(e) => Some(e),
            E2eeError::Track(e) => Some(e),
            E2eeError::SessionClosed => None,
        }
    }
}

impl E2eeError {
    /// True when the error ends a track or the session.
    pub fn is_fatal(&self) -> bool {
        match self {
            E2eeError::Track(e) => e.is_fatal(),
            E2eeError::FrameWorker(e) => e.is_fatal(),
            E2eeError::SessionClosed => true,
            _ => false,
        }
    }
}

impl From<OptionsError> for E2eeError {
    fn from(e: OptionsError) -> Self {
        E2eeError::Options(e)
    }
}

impl From<KeyError> for E2eeError {
    fn from(e: KeyError) -> Self {
        E2eeError::Key(e)
    }
}

impl From<FrameError> for E2eeError {
    fn from(e: FrameError) -> Self {
        E2eeError::Frame(e)
    }
}

impl From<FrameWorkerError> for E2eeError {
    fn from(e: FrameWorkerError) -> Self {
        E2eeError::FrameWorker(e)
    }
}

impl From<CryptoError> for E2eeError {
    fn from(e: CryptoError) -> Self {
        E2eeError::Crypto(e)
    }
}

impl From<NonceError> for E2eeError {
    fn from(e: NonceError) -> Self {
        E2eeError::Nonce(e)
    }
}

impl From<TrackError> for E2eeError {
    fn from(e: TrackError) -> Self {
        E2eeError::Track(e)
    }
}
