//! Built-in model registry and startup resolution.
//!
//! The supported model table lives in `builtin_models.toml` and is compiled
//! into the binary. Resolution happens exactly once at startup: the selected
//! model id is looked up, the matching API key is read from the environment,
//! and the result is handed to the adapter factory as an explicit struct.
//! Nothing reads the environment after that.

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub display_name: String,
    pub provider: String,
    pub env_key: String,
    pub base_url: String,
    pub mode: Option<String>,
}

impl ModelSpec {
    pub fn auth_mode(&self) -> &str {
        self.mode.as_deref().unwrap_or("openai")
    }

    pub fn is_anthropic_mode(&self) -> bool {
        self.auth_mode() == "anthropic"
    }
}

#[derive(Deserialize)]
struct BuiltinModelsConfig {
    models: Vec<ModelSpec>,
}

/// Everything the adapter factory needs for one configured backend.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub spec: ModelSpec,
    pub api_key: String,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("unknown model '{id}'. Supported models:\n{listing}")]
    UnknownModel { id: String, listing: String },
    #[error("API key for {display_name} not found. Set {env_key} in the environment or a .env file.")]
    MissingApiKey {
        display_name: String,
        env_key: String,
    },
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        2
    }

    pub fn quick_fixes(&self) -> Vec<String> {
        match self {
            StartupError::UnknownModel { .. } => {
                vec!["decker models                  # list supported models".to_string()]
            }
            StartupError::MissingApiKey { env_key, .. } => vec![
                format!("export {env_key}=...           # use an environment variable"),
                format!("echo '{env_key}=...' >> .env   # or a local .env file"),
            ],
        }
    }
}

/// Load the embedded model table.
pub fn load_builtin_models() -> Vec<ModelSpec> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_models.toml");

    let config: BuiltinModelsConfig =
        toml::from_str(CONFIG_CONTENT).expect("failed to parse builtin_models.toml");
    config.models
}

/// Find a supported model by id (case-insensitive).
pub fn find_model(id: &str) -> Option<ModelSpec> {
    load_builtin_models()
        .into_iter()
        .find(|m| m.id.eq_ignore_ascii_case(id))
}

/// Bulleted listing of the supported models, used in errors and `decker models`.
pub fn model_listing() -> String {
    load_builtin_models()
        .iter()
        .map(|m| format!("  • {} ({})", m.id, m.display_name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve the selected model against the registry and the environment.
pub fn resolve_session(model_id: &str) -> Result<ProviderSession, StartupError> {
    resolve_session_with(model_id, |key| std::env::var(key).ok())
}

fn resolve_session_with(
    model_id: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProviderSession, StartupError> {
    let spec = find_model(model_id).ok_or_else(|| StartupError::UnknownModel {
        id: model_id.to_string(),
        listing: model_listing(),
    })?;

    let api_key = lookup(&spec.env_key)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| StartupError::MissingApiKey {
            display_name: spec.display_name.clone(),
            env_key: spec.env_key.clone(),
        })?;

    Ok(ProviderSession { spec, api_key })
}
