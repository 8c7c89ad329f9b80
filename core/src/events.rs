//! Observable events surfaced to the session owner.

use crossbeam::channel::Sender;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum E2eeEvent {
    /// New key material is in force for a participant.
    KeyRotated { participant: String, key_index: u8 },
    /// A key slot was replaced by its ratchet successor.
    KeyRatcheted { participant: String, key_index: u8 },
    /// A filler run outlived its budget; the offending frame was dropped.
    SifBudgetExceeded { participant: String, track_id: String, consecutive: u32, elapsed_ms: u64 },
    /// Fatal: the track was torn down after too many consecutive failures.
    ToleranceExceeded { participant: String, track_id: String, failures: u32 },
}

/// Fire-and-forget event sink. A missing or disconnected receiver is not an error.
#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    tx: Option<Sender<E2eeEvent>>,
}

impl EventEmitter {
    pub fn new(tx: Sender<E2eeEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: E2eeEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                debug!("event receiver gone, dropping event");
            }
        }
    }
}
