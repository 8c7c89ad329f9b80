use std::sync::Arc;

use crossbeam::sync::ShardedLock;
use tracing::info;

use crate::events::{E2eeEvent, EventEmitter};
use crate::keys::types::{KeyError, KeyMaterial, KeyProvider, KeySet};
use crate::options::{KeyProviderOptions, OptionsError};

/// One key for the whole session. Participant identity and key index are
/// ignored on lookup.
#[derive(Debug)]
pub struct SharedKeyProvider {
    options: KeyProviderOptions,
    key: ShardedLock<Option<Arc<KeySet>>>,
    events: EventEmitter,
}

impl SharedKeyProvider {
    /// Fails if `options` do not validate.
    pub fn new(options: KeyProviderOptions, events: EventEmitter) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self { options, key: ShardedLock::new(None), events })
    }
}

impl KeyProvider for SharedKeyProvider {
    fn get_key(&self, participant: &str, _index: Option<u8>) -> Result<Arc<KeySet>, KeyError> {
        let guard = self.key.read().map_err(|_| KeyError::Poisoned)?;
        guard.clone().ok_or_else(|| KeyError::NoKeyForParticipant {
            participant: participant.to_string(),
        })
    }

    fn set_key(&self, participant: &str, material: KeyMaterial, index: Option<u8>) -> Result<u8, KeyError> {
        let ring = self.options.keyring_size;
        if let Some(i) = index {
            if i >= ring {
                return Err(KeyError::IndexOutOfRange { index: i, ring_size: ring });
            }
        }

        let fingerprint = material.fingerprint();
        let mut guard = self.key.write().map_err(|_| KeyError::Poisoned)?;
        let next = index.unwrap_or_else(|| match guard.as_ref() {
            Some(ks) => (ks.index + 1) % ring,
            None => 0,
        });

        let key_set = KeySet::derive(next, material, &self.options.ratchet_salt)?;
        *guard = Some(Arc::new(key_set));
        drop(guard);

        info!(participant, key_index = next, key = %fingerprint, "shared key set");
        self.events.emit(E2eeEvent::KeyRotated {
            participant: participant.to_string(),
            key_index: next,
        });
        Ok(next)
    }

    fn current_index(&self, _participant: &str) -> Option<u8> {
        self.key.read().ok().and_then(|g| g.as_ref().map(|ks| ks.index))
    }

    fn replace_key_set(&self, participant: &str, key_set: Arc<KeySet>) -> Result<(), KeyError> {
        let index = key_set.index;
        *self.key.write().map_err(|_| KeyError::Poisoned)? = Some(key_set);

        self.events.emit(E2eeEvent::KeyRatcheted {
            participant: participant.to_string(),
            key_index: index,
        });
        Ok(())
    }

    /// The shared key belongs to the session, not to one participant.
    fn remove_participant(&self, _participant: &str) {}

    fn options(&self) -> &KeyProviderOptions {
        &self.options
    }
}
