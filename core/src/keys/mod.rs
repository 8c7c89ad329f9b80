//! Key providers: where the frame codec gets its keys.
//!
//! Two variants behind one trait:
//! - [`SharedKeyProvider`]: a single session-wide key.
//! - [`RotatingKeyProvider`]: a per-participant ring with rotation grace.

pub mod types;
pub mod shared;
pub mod rotating;

use std::sync::Arc;

pub use types::{KeyError, KeyMaterial, KeyProvider, KeySet};
pub use shared::SharedKeyProvider;
pub use rotating::RotatingKeyProvider;

use crate::events::EventEmitter;
use crate::options::{KeyProviderOptions, OptionsError};

/// Pick the provider variant named by `options.shared_key`.
pub fn key_provider_from_options(
    options: KeyProviderOptions,
    events: EventEmitter,
) -> Result<Arc<dyn KeyProvider>, OptionsError> {
    let provider: Arc<dyn KeyProvider> = if options.shared_key {
        Arc::new(SharedKeyProvider::new(options, events)?)
    } else {
        Arc::new(RotatingKeyProvider::new(options, events)?)
    };
    Ok(provider)
}
