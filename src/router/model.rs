//! Model Selection
//!
//! Checks that the requested model is available and falls back otherwise.

use crate::client::http::{bearer, HttpClient};
use crate::config::ClientConfig;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use tracing::{debug, warn};

/// Resolves the model a client will use
#[derive(Debug, Clone)]
pub struct ModelSelector {
    /// Lookup endpoint; `None` disables the check
    models_url: Option<String>,

    /// Model used when the lookup fails
    fallback: String,
}

impl ModelSelector {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            models_url: config.models_url.clone(),
            fallback: config.fallback_model.clone(),
        }
    }

    /// Return `requested` when the lookup endpoint knows it, else the fallback
    ///
    /// A failed lookup is never an error: it is logged and the fallback model
    /// is used instead.
    pub async fn resolve(&self, http: &HttpClient, requested: &str, token: &str) -> String {
        let Some(base) = self.models_url.as_deref() else {
            return requested.to_string();
        };

        let url = format!("{}/{}", base.trim_end_matches('/'), requested);
        let mut headers = HeaderMap::new();
        if let Ok(value) = bearer(token) {
            headers.insert(AUTHORIZATION, value);
        }

        match http.get(&url, headers).await {
            Ok((status, _)) if status.is_success() => {
                debug!(model = requested, "model available");
                requested.to_string()
            }
            Ok((status, _)) => {
                warn!(
                    %status,
                    "Model {} not available for provided credential. Reverting to {}.",
                    requested,
                    self.fallback
                );
                self.fallback.clone()
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Model lookup for {} failed. Reverting to {}.",
                    requested,
                    self.fallback
                );
                self.fallback.clone()
            }
        }
    }
}
