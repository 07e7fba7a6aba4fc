use crate::config::Config;
use crate::error::Result;
use crate::llm::{GeminiClient, TextCompletion};
use std::sync::Arc;
use std::time::Duration;

/// Builds the completion client from configuration.
///
/// A missing credential fails here, at construction, rather than on every
/// call.
pub fn create_client(config: &Config) -> Result<Arc<dyn TextCompletion>> {
    let api_key = config.gemini_api_key.as_ref().ok_or_else(|| {
        crate::RitmoError::Config("Gemini API key is not configured".to_string())
    })?;

    let client = GeminiClient::new(
        config.gemini_base_url.clone(),
        api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    Ok(Arc::new(client))
}
