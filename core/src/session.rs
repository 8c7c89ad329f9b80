//! Session-scoped state: options, key provider and the event channel.
//!
//! Nothing here is global. Each `E2eeSession` is an isolated instance that
//! hands pipelines their collaborators explicitly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};
use crossbeam::sync::ShardedLock;
use tracing::info;

use crate::events::{E2eeEvent, EventEmitter};
use crate::frame_worker::FrameCounter;
use crate::keys::{key_provider_from_options, KeyError, KeyMaterial, KeyProvider};
use crate::options::KeyProviderOptions;
use crate::pipeline::{Direction, TrackConfig, TrackPipeline};
use crate::types::E2eeError;

#[derive(Debug)]
pub struct E2eeSession {
    options: KeyProviderOptions,
    provider: Arc<dyn KeyProvider>,
    events_tx: Sender<E2eeEvent>,
    events_rx: Receiver<E2eeEvent>,
    /// One frame counter per local sender, outliving individual tracks.
    frame_counters: ShardedLock<HashMap<String, FrameCounter>>,
    open: AtomicBool,
}

impl E2eeSession {
    /// Validate `options` and build the provider variant they name.
    pub fn new(options: KeyProviderOptions) -> Result<Self, E2eeError> {
        options.validate()?;
        let (events_tx, events_rx) = unbounded();
        let provider = key_provider_from_options(options.clone(), EventEmitter::new(events_tx.clone()))?;

        info!(shared_key = options.shared_key, failure_tolerance = options.failure_tolerance, "e2ee session created");
        Ok(Self::assemble(options, provider, events_tx, events_rx))
    }

    /// Use a caller-supplied provider. Key events are only seen on this
    /// session's channel if the provider was built with a matching emitter.
    pub fn with_provider(options: KeyProviderOptions, provider: Arc<dyn KeyProvider>) -> Result<Self, E2eeError> {
        options.validate()?;
        let (events_tx, events_rx) = unbounded();
        Ok(Self::assemble(options, provider, events_tx, events_rx))
    }

    fn assemble(
        options: KeyProviderOptions,
        provider: Arc<dyn KeyProvider>,
        events_tx: Sender<E2eeEvent>,
        events_rx: Receiver<E2eeEvent>,
    ) -> Self {
        Self {
            options,
            provider,
            events_tx,
            events_rx,
            frame_counters: ShardedLock::new(HashMap::new()),
            open: AtomicBool::new(true),
        }
    }

    pub fn options(&self) -> &KeyProviderOptions {
        &self.options
    }

    pub fn key_provider(&self) -> Arc<dyn KeyProvider> {
        self.provider.clone()
    }

    /// Receiver for session events. Clones share one queue.
    pub fn events(&self) -> Receiver<E2eeEvent> {
        self.events_rx.clone()
    }

    pub fn emitter(&self) -> EventEmitter {
        EventEmitter::new(self.events_tx.clone())
    }

    /// Deliver key material for `participant`. Returns the index it landed at.
    pub fn set_key(&self, participant: &str, raw: &[u8], index: Option<u8>) -> Result<u8, E2eeError> {
        self.ensure_open()?;
        let material = KeyMaterial::new(raw)?;
        Ok(self.provider.set_key(participant, material, index)?)
    }

    /// Pipeline for the local sender's outgoing track. All encrypting tracks
    /// of one participant draw from the same frame counter, including tracks
    /// re-created after a restart.
    pub fn encrypt_track(&self, participant: &str, track_id: &str) -> Result<TrackPipeline, E2eeError> {
        self.ensure_open()?;
        let counter = self.frame_counter(participant)?;
        let config = TrackConfig::from_options(participant, track_id, Direction::Encrypt, &self.options)
            .with_frame_counter(counter);
        Ok(TrackPipeline::new(config, self.provider.clone(), self.emitter()))
    }

    /// Pipeline for a remote participant's incoming track.
    pub fn decrypt_track(&self, participant: &str, track_id: &str) -> Result<TrackPipeline, E2eeError> {
        self.ensure_open()?;
        let config = TrackConfig::from_options(participant, track_id, Direction::Decrypt, &self.options);
        Ok(TrackPipeline::new(config, self.provider.clone(), self.emitter()))
    }

    /// Shared sender counter for `participant`, created on first use.
    pub fn frame_counter(&self, participant: &str) -> Result<FrameCounter, E2eeError> {
        if let Some(counter) = self.frame_counters.read().map_err(|_| KeyError::Poisoned)?.get(participant) {
            return Ok(counter.clone());
        }
        let mut counters = self.frame_counters.write().map_err(|_| KeyError::Poisoned)?;
        Ok(counters.entry(participant.to_string()).or_default().clone())
    }

    /// Stop handing out pipelines and keys. Running tracks keep their own
    /// provider handle until they close.
    pub fn shutdown(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            info!("e2ee session shut down");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), E2eeError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(E2eeError::SessionClosed)
        }
    }
}
