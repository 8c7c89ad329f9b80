//! Deterministic per-frame IV derivation.
//!
//! Design:
//! - TLS-like scheme: a 16-byte per-sender salt provides the 12-byte base IV.
//!   Bytes 0..4 are XORed with the little-endian key index, bytes 4..12 with
//!   the little-endian frame counter.
//! - Same `(salt, key_index, counter)` always gives the same IV, which keeps
//!   frames reproducible when debugging.
//!
//! Security notes:
//! - The sender never reuses a counter, so a key never sees the same IV twice.
//! - The salt is bound to the sender identity, so two senders sharing one key
//!   still produce disjoint IV sequences.
//! - All-zero salts are rejected.

use sha2::{Digest, Sha256};

use crate::constants::IV_SALT_DOMAIN;
use crate::crypto::types::{NonceError, IV_SALT_LEN, NONCE_LEN_12};

/// Build the IV salt for one sender: `SHA-256(domain || participant)[..16]`.
pub fn iv_salt_for_participant(participant: &str) -> [u8; IV_SALT_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(IV_SALT_DOMAIN);
    hasher.update(participant.as_bytes());
    let digest = hasher.finalize();

    let mut salt = [0u8; IV_SALT_LEN];
    salt.copy_from_slice(&digest[..IV_SALT_LEN]);
    salt
}

/// Derive the 12-byte IV for one frame.
///
/// The decoder takes the IV from the trailer and never recomputes it.
#[inline]
pub fn derive_frame_iv(
    salt: &[u8; IV_SALT_LEN],
    key_index: u8,
    frame_counter: u64,
) -> Result<[u8; NONCE_LEN_12], NonceError> {
    validate_salt(salt)?;

    let mut iv = [0u8; NONCE_LEN_12];
    iv.copy_from_slice(&salt[..NONCE_LEN_12]);

    let idx = (key_index as u32).to_le_bytes();
    for (j, b) in idx.iter().enumerate() {
        iv[j] ^= b;
    }

    let ctr = frame_counter.to_le_bytes();
    for (j, b) in ctr.iter().enumerate() {
        iv[4 + j] ^= b;
    }

    Ok(iv)
}

/// Reject an all-zero salt.
#[inline]
pub fn validate_salt(salt: &[u8; IV_SALT_LEN]) -> Result<(), NonceError> {
    if salt.iter().all(|&b| b == 0) {
        return Err(NonceError::InvalidSalt);
    }
    Ok(())
}
