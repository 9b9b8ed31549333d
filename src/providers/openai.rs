//! Adapter for OpenAI-compatible backends (OpenAI, DeepSeek, Gemini's
//! compatibility endpoint) using standard bearer authentication.

use crate::core::models::ProviderSession;
use crate::providers::ProviderAdapter;
use crate::utils::url::endpoint_url;

pub struct OpenAiCompatAdapter {
    session: ProviderSession,
}

impl OpenAiCompatAdapter {
    pub fn new(session: ProviderSession) -> Self {
        Self { session }
    }
}

impl ProviderAdapter for OpenAiCompatAdapter {
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
            .header(
                "Authorization",
                format!("Bearer {}", self.session.api_key),
            )
    }
}
