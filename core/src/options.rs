//! Options consumed from the enclosing session.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! { "shared_key": true, "failure_tolerance": 5 }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_FAILURE_TOLERANCE, DEFAULT_KEYRING_SIZE, DEFAULT_RATCHET_SALT, DEFAULT_RATCHET_WINDOW_SIZE,
    MAX_SIF_COUNT, MAX_SIF_DURATION_MS, MIN_KEYRING_SIZE,
};

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("options parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid option `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyProviderOptions {
    /// One key for the whole session instead of a per-participant table.
    pub shared_key: bool,
    /// HKDF salt for frame-key derivation and ratcheting.
    pub ratchet_salt: Vec<u8>,
    /// Ratchet attempts on tag mismatch (0 = off).
    pub ratchet_window_size: u8,
    /// Consecutive decode failures before a track is torn down.
    pub failure_tolerance: u32,
    pub keyring_size: u8,
    pub sif_max_count: u32,
    pub sif_max_duration_ms: u64,
}

impl Default for KeyProviderOptions {
    fn default() -> Self {
        Self {
            shared_key: false,
            ratchet_salt: DEFAULT_RATCHET_SALT.to_vec(),
            ratchet_window_size: DEFAULT_RATCHET_WINDOW_SIZE,
            failure_tolerance: DEFAULT_FAILURE_TOLERANCE,
            keyring_size: DEFAULT_KEYRING_SIZE,
            sif_max_count: MAX_SIF_COUNT,
            sif_max_duration_ms: MAX_SIF_DURATION_MS,
        }
    }
}

impl KeyProviderOptions {
    pub fn shared() -> Self {
        Self { shared_key: true, ..Self::default() }
    }

    /// Parse and validate.
    pub fn from_json(raw: &str) -> Result<Self, OptionsError> {
        let opts: Self = serde_json::from_str(raw)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.ratchet_salt.is_empty() {
            return Err(invalid("ratchet_salt", "must not be empty"));
        }
        if self.keyring_size < MIN_KEYRING_SIZE {
            return Err(invalid(
                "keyring_size",
                format!("must be at least {}, got {}", MIN_KEYRING_SIZE, self.keyring_size),
            ));
        }
        if self.failure_tolerance == 0 {
            return Err(invalid("failure_tolerance", "must be at least 1"));
        }
        if self.sif_max_count == 0 {
            return Err(invalid("sif_max_count", "must be at least 1"));
        }
        if self.sif_max_duration_ms == 0 {
            return Err(invalid("sif_max_duration_ms", "must be at least 1"));
        }
        Ok(())
    }

    pub fn sif_max_duration(&self) -> Duration {
        Duration::from_millis(self.sif_max_duration_ms)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> OptionsError {
    OptionsError::Invalid { field, reason: reason.into() }
}
