use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::crypto::types::{NonceError, IV_SALT_LEN};
use crate::crypto::{aad::build_aad, nonce::derive_frame_iv, nonce::iv_salt_for_participant};
use crate::framing::encode::encode_encrypted_frame;
use crate::framing::types::{Frame, FrameError, FrameTrailer};
use crate::keys::KeySet;
use super::types::{EncryptedFrame, FrameWorkerError};

/// Encrypt one frame under `key_set` with an explicit frame counter.
///
/// Result: `header || ciphertext || tag || trailer`. The header is passed
/// through and bound as AAD. Filler frames come back unchanged.
pub fn encode_frame(
    frame: &Frame,
    key_set: &KeySet,
    iv_salt: &[u8; IV_SALT_LEN],
    frame_counter: u64,
) -> Result<EncryptedFrame, FrameWorkerError> {
    if frame.is_filler() {
        return Ok(EncryptedFrame { frame: frame.clone(), trailer: None });
    }

    let header_len = frame.kind.header_len();
    if frame.data.len() < header_len {
        return Err(FrameError::TooShort {
            kind: frame.kind.as_str(),
            min: header_len,
            actual: frame.data.len(),
        }
        .into());
    }
    let (header, body) = frame.data.split_at(header_len);

    // 1. Derive IV from (salt, key index, counter)
    let iv = derive_frame_iv(iv_salt, key_set.index, frame_counter)?;

    // 2. AAD from the clear header and the trailer fields
    let aad = build_aad(header, key_set.index, frame_counter);

    // 3. Encrypt the body
    let ciphertext = key_set.cipher.seal(&iv, &aad, body)?;

    // 4. Append the trailer
    let trailer = FrameTrailer { iv, key_index: key_set.index, frame_counter };
    let wire = encode_encrypted_frame(header, &ciphertext, &trailer)?;

    Ok(EncryptedFrame { frame: frame.replace_data(wire), trailer: Some(trailer) })
}

/// Next frame counter for one sender, shared by every track that encrypts
/// under that sender's IV salt.
///
/// Values are handed out once. A reserved value is never returned again,
/// even if the frame it was reserved for fails to encrypt.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter(Arc<AtomicU64>);

impl FrameCounter {
    pub fn new(start: u64) -> Self {
        Self(Arc::new(AtomicU64::new(start)))
    }

    /// Counter the next reservation will get.
    pub fn peek(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Take the next counter. Refuses to wrap.
    pub fn reserve(&self) -> Result<u64, NonceError> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_add(1))
            .map_err(|_| NonceError::CounterExhausted)
    }
}

/// Sender-side codec state: the IV salt and frame counter for one
/// participant.
#[derive(Debug)]
pub struct FrameEncryptor {
    participant: String,
    iv_salt: [u8; IV_SALT_LEN],
    counter: FrameCounter,
}

impl FrameEncryptor {
    pub fn new(participant: &str) -> Self {
        Self::with_counter(participant, 0)
    }

    /// Resume from a known counter with a counter of its own.
    pub fn with_counter(participant: &str, frame_counter: u64) -> Self {
        Self::with_shared_counter(participant, FrameCounter::new(frame_counter))
    }

    /// Draw counters from `counter`. Every encryptor for the same
    /// participant must share one.
    pub fn with_shared_counter(participant: &str, counter: FrameCounter) -> Self {
        Self {
            participant: participant.to_string(),
            iv_salt: iv_salt_for_participant(participant),
            counter,
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// Counter the next non-filler frame will carry, unless another track
    /// sharing the counter gets there first.
    pub fn frame_counter(&self) -> u64 {
        self.counter.peek()
    }

    /// Encrypt under the next counter. Malformed frames are rejected before
    /// a counter is taken. The counter never wraps.
    pub fn encrypt_frame(&mut self, frame: &Frame, key_set: &KeySet) -> Result<EncryptedFrame, FrameWorkerError> {
        if frame.is_filler() {
            return encode_frame(frame, key_set, &self.iv_salt, self.counter.peek());
        }

        let header_len = frame.kind.header_len();
        if frame.data.len() < header_len {
            return Err(FrameError::TooShort {
                kind: frame.kind.as_str(),
                min: header_len,
                actual: frame.data.len(),
            }
            .into());
        }

        let counter = self.counter.reserve()?;
        let out = encode_frame(frame, key_set, &self.iv_salt, counter)?;

        trace!(participant = %self.participant, key_index = key_set.index, counter, "frame encrypted");
        Ok(out)
    }
}
