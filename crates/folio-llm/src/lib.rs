//! Folio LLM - hosted model providers
//!
//! Implements the `folio_core::Model` seam over HTTPS. Providers perform one
//! round trip per call; retries and caching are left to callers.

pub mod config;
pub mod provider;

use std::sync::Arc;

use folio_core::{Model, ModelResult};
use tracing::info;

pub use config::{api_key_from_env, ModelConfig, API_KEY_ENV_VARS, DEFAULT_ENDPOINT};
pub use provider::GoogleProvider;

/// Create the hosted model client from configuration
///
/// Fails with `ModelError::Config` when no API key is available, which is
/// fatal at start-up for any flow that needs model access.
pub fn create_model(config: ModelConfig) -> ModelResult<Arc<dyn Model>> {
    let provider = GoogleProvider::create(config)?;
    info!("Model client ready: {}", provider.config().endpoint());
    Ok(Arc::new(provider))
}
