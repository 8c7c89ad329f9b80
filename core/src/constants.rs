//! Wire sizes, derivation labels and policy defaults shared by every layer.

/// Unencrypted header bytes for a key (reference) video frame.
pub const KEY_FRAME_HEADER_LEN: usize = 10;
/// Unencrypted header bytes for a delta video frame.
pub const DELTA_FRAME_HEADER_LEN: usize = 3;
/// Unencrypted header bytes for an audio frame (the codec TOC byte).
pub const AUDIO_FRAME_HEADER_LEN: usize = 1;
/// Filler frames carry no header.
pub const EMPTY_FRAME_HEADER_LEN: usize = 0;

/// Trailer layout: `iv (12) || key_index (1) || frame_counter (8, LE)`.
pub const TRAILER_IV_LEN: usize = 12;
pub const TRAILER_KEY_INDEX_LEN: usize = 1;
pub const TRAILER_COUNTER_LEN: usize = 8;
pub const TRAILER_LEN: usize = TRAILER_IV_LEN + TRAILER_KEY_INDEX_LEN + TRAILER_COUNTER_LEN;

/// Domain label mixed with the participant identity to build a sender's IV salt.
pub const IV_SALT_DOMAIN: &[u8] = b"E2EE|IV|SALT|V1";

/// Default HKDF salt used to turn raw key material into a frame key, and to ratchet it.
pub const DEFAULT_RATCHET_SALT: &[u8] = b"E2EEFrameEncryptionKey";

/// HKDF `info` labels.
pub mod kdf_labels {
    pub const FRAME_KEY: &[u8] = b"e2ee frame key";
    pub const RATCHET: &[u8] = b"e2ee ratchet";
}

/// Consecutive decode failures a track absorbs before it is torn down.
pub const DEFAULT_FAILURE_TOLERANCE: u32 = 10;

/// Slots in a participant's key ring.
pub const DEFAULT_KEYRING_SIZE: u8 = 16;
/// Smallest ring that still keeps the previous key alive across a rotation.
pub const MIN_KEYRING_SIZE: u8 = 2;

/// Ratchet attempts on tag mismatch. Zero disables decode-side ratcheting.
pub const DEFAULT_RATCHET_WINDOW_SIZE: u8 = 0;

/// Filler frames allowed in one run.
pub const MAX_SIF_COUNT: u32 = 100;
/// Longest filler run, in milliseconds.
pub const MAX_SIF_DURATION_MS: u64 = 2_000;
