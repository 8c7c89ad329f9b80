use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::crypto::aad::build_aad;
use crate::crypto::types::CryptoError;
use crate::framing::decode::decode_encrypted_frame;
use crate::framing::types::{EncryptedFrameView, Frame};
use crate::keys::{KeyProvider, KeySet};
use super::types::{DecryptedFrame, FrameWorkerError};

/// Open one encrypted frame with a specific key set.
///
/// Fails closed: on tag mismatch no plaintext is returned.
pub fn decode_frame(frame: &Frame, key_set: &KeySet) -> Result<DecryptedFrame, FrameWorkerError> {
    if frame.is_filler() {
        return Ok(DecryptedFrame { frame: frame.clone(), trailer: None, ratchet_steps: 0 });
    }

    let view = decode_encrypted_frame(frame.kind, &frame.data)?;
    let plaintext = open_view(&view, key_set)?;

    Ok(DecryptedFrame {
        frame: frame.replace_data(join_plaintext(view.header, &plaintext)),
        trailer: Some(view.trailer),
        ratchet_steps: 0,
    })
}

#[inline]
fn open_view(view: &EncryptedFrameView<'_>, key_set: &KeySet) -> Result<Vec<u8>, CryptoError> {
    let aad = build_aad(view.header, view.trailer.key_index, view.trailer.frame_counter);
    key_set.cipher.open(&view.trailer.iv, &aad, view.ciphertext_and_tag)
}

#[inline]
fn join_plaintext(header: &[u8], body: &[u8]) -> bytes::Bytes {
    let mut out = BytesMut::with_capacity(header.len() + body.len());
    out.put_slice(header);
    out.put_slice(body);
    out.freeze()
}

/// Receiver-side codec for frames from one remote participant.
///
/// Resolves the key named by each frame's trailer through the provider and,
/// when a ratchet window is configured, follows the sender's ratchet.
#[derive(Debug, Clone)]
pub struct FrameDecryptor {
    participant: String,
    provider: Arc<dyn KeyProvider>,
}

impl FrameDecryptor {
    pub fn new(participant: &str, provider: Arc<dyn KeyProvider>) -> Self {
        Self { participant: participant.to_string(), provider }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn decrypt_frame(&self, frame: &Frame) -> Result<DecryptedFrame, FrameWorkerError> {
        if frame.is_filler() {
            return Ok(DecryptedFrame { frame: frame.clone(), trailer: None, ratchet_steps: 0 });
        }

        // Length check first: never touch keys for a malformed frame
        let view = decode_encrypted_frame(frame.kind, &frame.data)?;
        let key_set = self.provider.get_key(&self.participant, Some(view.trailer.key_index))?;

        let (plaintext, ratchet_steps) = match open_view(&view, &key_set) {
            Ok(pt) => (pt, 0),
            Err(CryptoError::TagMismatch) => self.open_with_ratchet(&view, &key_set)?,
            Err(e) => return Err(e.into()),
        };

        trace!(
            participant = %self.participant,
            key_index = view.trailer.key_index,
            counter = view.trailer.frame_counter,
            "frame decrypted"
        );

        Ok(DecryptedFrame {
            frame: frame.replace_data(join_plaintext(view.header, &plaintext)),
            trailer: Some(view.trailer),
            ratchet_steps,
        })
    }

    /// Try successive ratchets of `key_set`; commit the first that opens.
    fn open_with_ratchet(
        &self,
        view: &EncryptedFrameView<'_>,
        key_set: &KeySet,
    ) -> Result<(Vec<u8>, u8), FrameWorkerError> {
        let window = self.provider.options().ratchet_window_size;
        if window == 0 {
            return Err(FrameWorkerError::Decryption(CryptoError::TagMismatch));
        }

        let salt = &self.provider.options().ratchet_salt;
        let mut candidate = key_set.ratchet(salt)?;
        for step in 1..=window {
            if let Ok(pt) = open_view(view, &candidate) {
                debug!(participant = %self.participant, key_index = candidate.index, step, "followed sender ratchet");
                self.provider.replace_key_set(&self.participant, Arc::new(candidate))?;
                return Ok((pt, step));
            }
            if step < window {
                candidate = candidate.ratchet(salt)?;
            }
        }

        Err(FrameWorkerError::Decryption(CryptoError::TagMismatch))
    }
}
