//! Endpoint URL construction.

/// Join a provider base URL and an endpoint path without producing double
/// slashes, whatever mix of trailing/leading slashes the inputs carry.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_clean_inputs() {
        assert_eq!(
            endpoint_url("https://api.deepseek.com", "chat/completions"),
            "https://api.deepseek.com/chat/completions"
        );
    }

    #[test]
    fn strips_redundant_slashes() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1///", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
