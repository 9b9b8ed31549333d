//! Provider adapters: one integration per hosted LLM backend family.
//!
//! Every supported backend speaks the OpenAI-compatible chat completions
//! shape; adapters differ in endpoint and authentication. Exactly one
//! adapter is constructed at startup from the resolved [`ProviderSession`]
//! and never swapped for the lifetime of the conversation.

mod anthropic;
mod openai;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiCompatAdapter;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{ChatRequest, CompletionResponse};
use crate::core::models::ProviderSession;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderRequestError(pub String);

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider identifier, e.g. `"deepseek"`.
    fn id(&self) -> &str;

    /// Human-readable model name for banners and errors.
    fn display_name(&self) -> &str;

    /// Model string sent on every request.
    fn model(&self) -> &str;

    /// Authenticated POST to the backend's chat completions endpoint. The
    /// request body is attached by the caller.
    fn request_builder(&self, client: &reqwest::Client) -> reqwest::RequestBuilder;

    /// One-shot, non-streaming completion returning the raw structured
    /// payload text.
    async fn complete(
        &self,
        client: &reqwest::Client,
        request: &ChatRequest,
    ) -> Result<String, ProviderRequestError> {
        let response = self
            .request_builder(client)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderRequestError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ProviderRequestError(format!(
                "API request failed with status {status}: {body}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderRequestError(e.to_string()))?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Select the adapter for a resolved provider session. Called once at
/// startup; the auth-mode split mirrors the registry's `mode` column.
pub fn create_adapter(session: ProviderSession) -> Arc<dyn ProviderAdapter> {
    if session.spec.is_anthropic_mode() {
        Arc::new(AnthropicAdapter::new(session))
    } else {
        Arc::new(OpenAiCompatAdapter::new(session))
    }
}
