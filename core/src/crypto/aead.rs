//! AES-256-GCM interface for frame payloads.
//!
//! Design notes:
//! - 32-byte keys, 12-byte IVs, 16-byte tags appended to the ciphertext.
//! - Tag verification is constant-time and fails closed (no partial plaintext).
//! - Caller provides IV and AAD per frame.
//! - An empty payload is legal: the frame then carries only its tag, which
//!   still authenticates the header.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};

use crate::crypto::types::{CryptoError, KEY_LEN_32, NONCE_LEN_12, TAG_LEN};

/// Opaque key handle used for every frame operation.
#[derive(Clone)]
pub struct FrameCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for FrameCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FrameCipher(AES-256-GCM)")
    }
}

impl FrameCipher {
    /// Construct the handle from a derived 32-byte frame key.
    pub fn from_key(frame_key: &[u8]) -> Result<Self, CryptoError> {
        if frame_key.len() != KEY_LEN_32 {
            return Err(CryptoError::InvalidKeyLen {
                expected: KEY_LEN_32,
                actual: frame_key.len(),
            });
        }

        let cipher = Aes256Gcm::new_from_slice(frame_key).map_err(|_| CryptoError::InvalidKeyLen {
            expected: KEY_LEN_32,
            actual: frame_key.len(),
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext`; returns `ciphertext || tag`.
    pub fn seal(&self, iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_iv(iv)?;

        self.cipher
            .encrypt(AesNonce::from_slice(iv), Payload { msg: plaintext, aad })
            .map_err(|_| CryptoError::Failure("AES-GCM seal failed".into()))
    }

    /// Decrypt `ciphertext || tag`.
    pub fn open(&self, iv: &[u8], aad: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_iv(iv)?;

        if ciphertext_and_tag.len() < TAG_LEN {
            return Err(CryptoError::Failure("ciphertext too short".into()));
        }

        self.cipher
            .decrypt(AesNonce::from_slice(iv), Payload { msg: ciphertext_and_tag, aad })
            .map_err(|_| CryptoError::TagMismatch)
    }
}

#[inline]
fn check_iv(iv: &[u8]) -> Result<(), CryptoError> {
    if iv.len() != NONCE_LEN_12 {
        return Err(CryptoError::InvalidNonceLen {
            expected: NONCE_LEN_12,
            actual: iv.len(),
        });
    }
    Ok(())
}
