use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{derive_frame_key_32, ratchet_material_32, CryptoError, FrameCipher, KEY_LEN_32};
use crate::options::KeyProviderOptions;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Nothing was ever delivered for this participant.
    #[error("no key available for participant `{participant}`")]
    NoKeyForParticipant { participant: String },

    /// Participant is known but the slot is empty (stale or future index).
    #[error("no key at index {index} for participant `{participant}`")]
    IndexNotFound { participant: String, index: u8 },

    #[error("key index {index} out of range for a ring of {ring_size}")]
    IndexOutOfRange { index: u8, ring_size: u8 },

    #[error("key material must not be empty")]
    EmptyMaterial,

    #[error("key derivation failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("key table lock poisoned")]
    Poisoned,
}

/// Raw symmetric key material as delivered by the key-exchange layer.
///
/// Wiped from memory on drop. `Debug` prints a short fingerprint only.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    raw: Vec<u8>,
}

impl KeyMaterial {
    pub fn new(raw: &[u8]) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::EmptyMaterial);
        }
        Ok(Self { raw: raw.to_vec() })
    }

    /// Fresh random 32-byte material.
    pub fn generate() -> Self {
        let mut raw = vec![0u8; KEY_LEN_32];
        rand::thread_rng().fill_bytes(&mut raw);
        Self { raw }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// First 4 bytes of SHA-256(raw), hex encoded. Safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.raw);
        hex::encode(&digest[..4])
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({})", self.fingerprint())
    }
}

/// A usable key handle paired with the material it came from.
///
/// Immutable: rotation and ratcheting produce a new `KeySet`.
#[derive(Debug)]
pub struct KeySet {
    pub index: u8,
    pub material: KeyMaterial,
    pub cipher: FrameCipher,
}

impl KeySet {
    /// Derive the AES-256-GCM handle from `material`.
    pub fn derive(index: u8, material: KeyMaterial, ratchet_salt: &[u8]) -> Result<Self, KeyError> {
        let mut frame_key = derive_frame_key_32(material.as_bytes(), ratchet_salt)?;
        let cipher = FrameCipher::from_key(&frame_key);
        frame_key.zeroize();

        Ok(Self { index, material, cipher: cipher? })
    }

    /// The next key in the ratchet chain, at the same index.
    pub fn ratchet(&self, ratchet_salt: &[u8]) -> Result<Self, KeyError> {
        let mut next = ratchet_material_32(self.material.as_bytes(), ratchet_salt)?;
        let material = KeyMaterial::new(&next);
        next.zeroize();

        KeySet::derive(self.index, material?, ratchet_salt)
    }
}

/// Source of key material for the frame codec.
///
/// Implementations are read-mostly: lookups run per frame on every track,
/// writes only on rotation. Readers racing a rotation may see either the
/// old or the new key; both stay valid during the grace period.
pub trait KeyProvider: Send + Sync + fmt::Debug {
    /// Key for `participant` at `index` (`None` = current).
    fn get_key(&self, participant: &str, index: Option<u8>) -> Result<Arc<KeySet>, KeyError>;

    /// Install new material; returns the index it now lives at.
    fn set_key(&self, participant: &str, material: KeyMaterial, index: Option<u8>) -> Result<u8, KeyError>;

    /// Index new frames from `participant` are encrypted under.
    fn current_index(&self, participant: &str) -> Option<u8>;

    /// Store an already-derived key set in its slot without moving the current index.
    fn replace_key_set(&self, participant: &str, key_set: Arc<KeySet>) -> Result<(), KeyError>;

    /// Forget every key held for `participant`.
    fn remove_participant(&self, participant: &str);

    fn options(&self) -> &KeyProviderOptions;

    /// Advance the key at `index` one ratchet step and store it.
    fn ratchet_key(&self, participant: &str, index: u8) -> Result<Arc<KeySet>, KeyError> {
        let current = self.get_key(participant, Some(index))?;
        let next = Arc::new(current.ratchet(&self.options().ratchet_salt)?);
        self.replace_key_set(participant, next.clone())?;
        Ok(next)
    }
}
