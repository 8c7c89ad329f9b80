use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::sync::ShardedLock;
use tracing::{debug, info};

use crate::events::{E2eeEvent, EventEmitter};
use crate::keys::types::{KeyError, KeyMaterial, KeyProvider, KeySet};
use crate::options::{KeyProviderOptions, OptionsError};

/// Per-participant ring of key slots.
#[derive(Debug)]
struct KeyRing {
    current: u8,
    slots: Vec<Option<Arc<KeySet>>>,
}

impl KeyRing {
    fn new(size: u8) -> Self {
        Self { current: 0, slots: vec![None; size as usize] }
    }

    fn size(&self) -> u8 {
        self.slots.len() as u8
    }
}

/// Per-participant key table with rotation.
///
/// Rotating to a new index keeps the older slots readable until the ring
/// wraps around to them, so frames already in flight under the previous key
/// still decode.
#[derive(Debug)]
pub struct RotatingKeyProvider {
    options: KeyProviderOptions,
    table: ShardedLock<HashMap<String, KeyRing>>,
    events: EventEmitter,
}

impl RotatingKeyProvider {
    /// Fails if `options` do not validate; a ring needs at least two slots.
    pub fn new(options: KeyProviderOptions, events: EventEmitter) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self { options, table: ShardedLock::new(HashMap::new()), events })
    }

    /// Participants with at least one key.
    pub fn participants(&self) -> Vec<String> {
        match self.table.read() {
            Ok(table) => table.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl KeyProvider for RotatingKeyProvider {
    fn get_key(&self, participant: &str, index: Option<u8>) -> Result<Arc<KeySet>, KeyError> {
        let table = self.table.read().map_err(|_| KeyError::Poisoned)?;
        let ring = table.get(participant).ok_or_else(|| KeyError::NoKeyForParticipant {
            participant: participant.to_string(),
        })?;

        let index = index.unwrap_or(ring.current);
        ring.slots
            .get(index as usize)
            .and_then(|slot| slot.clone())
            .ok_or_else(|| KeyError::IndexNotFound {
                participant: participant.to_string(),
                index,
            })
    }

    fn set_key(&self, participant: &str, material: KeyMaterial, index: Option<u8>) -> Result<u8, KeyError> {
        let ring_size = self.options.keyring_size;
        if let Some(i) = index {
            if i >= ring_size {
                return Err(KeyError::IndexOutOfRange { index: i, ring_size });
            }
        }

        let fingerprint = material.fingerprint();
        let mut table = self.table.write().map_err(|_| KeyError::Poisoned)?;
        let is_new = !table.contains_key(participant);
        let ring = table
            .entry(participant.to_string())
            .or_insert_with(|| KeyRing::new(ring_size));

        let next = match index {
            Some(i) => i,
            None if is_new => 0,
            None => (ring.current + 1) % ring.size(),
        };

        let key_set = KeySet::derive(next, material, &self.options.ratchet_salt)?;
        let previous = ring.current;
        ring.slots[next as usize] = Some(Arc::new(key_set));
        ring.current = next;
        drop(table);

        info!(participant, key_index = next, previous_index = previous, key = %fingerprint, "key rotated");
        self.events.emit(E2eeEvent::KeyRotated {
            participant: participant.to_string(),
            key_index: next,
        });
        Ok(next)
    }

    fn current_index(&self, participant: &str) -> Option<u8> {
        let table = self.table.read().ok()?;
        table.get(participant).map(|ring| ring.current)
    }

    fn replace_key_set(&self, participant: &str, key_set: Arc<KeySet>) -> Result<(), KeyError> {
        let index = key_set.index;
        let mut table = self.table.write().map_err(|_| KeyError::Poisoned)?;
        let ring = table.get_mut(participant).ok_or_else(|| KeyError::NoKeyForParticipant {
            participant: participant.to_string(),
        })?;

        let size = ring.size();
        let slot = ring
            .slots
            .get_mut(index as usize)
            .ok_or(KeyError::IndexOutOfRange { index, ring_size: size })?;
        *slot = Some(key_set);
        drop(table);

        debug!(participant, key_index = index, "key ratcheted");
        self.events.emit(E2eeEvent::KeyRatcheted {
            participant: participant.to_string(),
            key_index: index,
        });
        Ok(())
    }

    fn remove_participant(&self, participant: &str) {
        if let Ok(mut table) = self.table.write() {
            if table.remove(participant).is_some() {
                debug!(participant, "participant keys removed");
            }
        }
    }

    fn options(&self) -> &KeyProviderOptions {
        &self.options
    }
}
