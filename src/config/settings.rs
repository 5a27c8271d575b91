//! Client Configuration
//!
//! Defines the configuration schema for the chat client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";
pub const DEFAULT_COMPLETIONS_URL: &str =
    "https://copilot-proxy.githubusercontent.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "copilot-chat";
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-3.5-turbo";

/// Environment variable holding the long-lived credential
pub const CREDENTIAL_ENV: &str = "COPILOT_KEY";

/// Environment variable overriding the requested model
pub const MODEL_ENV: &str = "COPILOT_MODEL";

/// Configuration for a [`ChatClient`](crate::ChatClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Long-lived credential exchanged for a bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,

    /// Token-exchange endpoint
    pub token_url: String,

    /// Streaming chat completions endpoint
    pub completions_url: String,

    /// Optional model-lookup endpoint; `<models_url>/<model>` must answer 200
    /// for the requested model to be used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_url: Option<String>,

    /// Requested model
    pub model: String,

    /// Model used when the requested one is unavailable
    pub fallback_model: String,

    /// Sampling temperature, sent only when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    pub editor_version: String,
    pub editor_plugin_version: String,
    pub user_agent: String,

    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credential: None,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            completions_url: DEFAULT_COMPLETIONS_URL.to_string(),
            models_url: None,
            model: DEFAULT_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            temperature: None,
            editor_version: "vscode/1.79.0-insider".to_string(),
            editor_plugin_version: "copilot/1.86.92".to_string(),
            user_agent: "GithubCopilot/1.86.92".to_string(),
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Set the credential
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Set the requested model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Apply environment overrides (`COPILOT_KEY`, `COPILOT_MODEL`)
    ///
    /// Empty values are treated as unset.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides read through `lookup` instead of the process environment
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(key) = non_empty(CREDENTIAL_ENV) {
            self.credential = Some(key);
        }
        if let Some(model) = non_empty(MODEL_ENV) {
            self.model = model;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
