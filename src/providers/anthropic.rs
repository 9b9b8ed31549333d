//! Adapter for Anthropic's OpenAI-compatible endpoint, which authenticates
//! with `x-api-key` plus a pinned `anthropic-version` instead of a bearer
//! token.

use crate::core::models::ProviderSession;
use crate::providers::ProviderAdapter;
use crate::utils::url::endpoint_url;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    session: ProviderSession,
}

impl AnthropicAdapter {
    pub fn new(session: ProviderSession) -> Self {
        Self { session }
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> &str {
        &self.session.spec.provider
    }

    fn display_name(&self) -> &str {
        &self.session.spec.display_name
    }

    fn model(&self) -> &str {
        &self.session.spec.id
    }

    fn request_builder(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        client
            .post(endpoint_url(&self.session.spec.base_url, "chat/completions"))
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.session.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}
