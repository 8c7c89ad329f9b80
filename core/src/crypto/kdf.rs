//! HKDF-based derivation of frame keys and ratchet steps from raw key material.
//!
//! Design:
//! - frame key   = HKDF-SHA256(salt = ratchet_salt, ikm = raw, info = "e2ee frame key")
//! - ratchet(raw) = HKDF-SHA256(salt = ratchet_salt, ikm = raw, info = "e2ee ratchet")
//!
//! Raw material is never used directly as an AES key.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::constants::kdf_labels;
use crate::crypto::types::{CryptoError, KEY_LEN_32};

#[inline]
fn expand_32(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN_32], CryptoError> {
    if ikm.is_empty() {
        return Err(CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: 0 });
    }

    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut out = [0u8; KEY_LEN_32];
    hk.expand(info, &mut out)
        .map_err(|_| CryptoError::Kdf("HKDF expand failed (SHA-256)".into()))?;
    Ok(out)
}

/// Derive the 32-byte AES-256-GCM key from raw material.
pub fn derive_frame_key_32(raw: &[u8], ratchet_salt: &[u8]) -> Result<[u8; KEY_LEN_32], CryptoError> {
    expand_32(ratchet_salt, raw, kdf_labels::FRAME_KEY)
}

/// One ratchet step: new raw material from the current one.
///
/// Both sides ratchet in lockstep; the output is raw material, so the frame
/// key is derived from it exactly as for freshly delivered keys.
pub fn ratchet_material_32(raw: &[u8], ratchet_salt: &[u8]) -> Result<[u8; KEY_LEN_32], CryptoError> {
    expand_32(ratchet_salt, raw, kdf_labels::RATCHET)
}
