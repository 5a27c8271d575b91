//! Token Exchange
//!
//! Trades the long-lived credential for a short-lived bearer token.

use crate::client::http::HttpClient;
use crate::config::ClientConfig;
use crate::error::{CopilotError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Fetches bearer tokens from the token-exchange endpoint
#[derive(Debug, Clone)]
pub struct TokenProvider {
    url: String,
    credential: Option<String>,
    editor_version: String,
    editor_plugin_version: String,
    user_agent: String,
}

impl TokenProvider {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            url: config.token_url.clone(),
            credential: config.credential.clone(),
            editor_version: config.editor_version.clone(),
            editor_plugin_version: config.editor_plugin_version.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Request a bearer token
    ///
    /// Every failure collapses to `None`: a missing credential, a transport
    /// error, a non-200 status or a body without a `token` field. The caller
    /// proceeds without a token.
    pub async fn fetch(&self, http: &HttpClient) -> Option<String> {
        let Some(credential) = self.credential.as_deref() else {
            warn!("no credential configured, skipping token exchange");
            return None;
        };

        let headers = match self.headers(credential) {
            Ok(headers) => headers,
            Err(e) => {
                warn!(error = %e, "cannot build token request");
                return None;
            }
        };

        let (status, body) = match http.get(&self.url, headers).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.url, error = %e, "token request failed");
                return None;
            }
        };

        if status != StatusCode::OK {
            warn!(url = %self.url, %status, "token endpoint refused the credential");
            return None;
        }

        match serde_json::from_str::<TokenResponse>(&body) {
            Ok(TokenResponse { token: Some(token) }) => {
                debug!("obtained bearer token");
                Some(token)
            }
            Ok(TokenResponse { token: None }) => {
                warn!("token response has no `token` field");
                None
            }
            Err(e) => {
                warn!(error = %e, "token response is not valid JSON");
                None
            }
        }
    }

    fn headers(&self, credential: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&format!("token {}", credential))?);
        headers.insert(
            HeaderName::from_static("editor-version"),
            header_value(&self.editor_version)?,
        );
        headers.insert(
            HeaderName::from_static("editor-plugin-version"),
            header_value(&self.editor_plugin_version)?,
        );
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| CopilotError::Config(format!("Invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn http() -> HttpClient {
        HttpClient::new(Duration::from_secs(5), Duration::from_secs(1)).unwrap()
    }

    fn provider(server: &mockito::Server, credential: Option<&str>) -> TokenProvider {
        let mut config = ClientConfig {
            token_url: format!("{}/copilot_internal/v2/token", server.url()),
            ..Default::default()
        };
        config.credential = credential.map(str::to_string);
        TokenProvider::new(&config)
    }

    #[tokio::test]
    async fn test_fetch_token_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/copilot_internal/v2/token")
            .match_header("authorization", "token ghu_secret")
            .match_header("editor-version", "vscode/1.79.0-insider")
            .match_header("editor-plugin-version", "copilot/1.86.92")
            .match_header("user-agent", "GithubCopilot/1.86.92")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"tid=abc;exp=1","expires_at":1}"#)
            .create_async()
            .await;

        let token = provider(&server, Some("ghu_secret")).fetch(&http()).await;

        mock.assert_async().await;
        assert_eq!(token.as_deref(), Some("tid=abc;exp=1"));
    }

    #[tokio::test]
    async fn test_fetch_token_not_found_is_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/copilot_internal/v2/token")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let token = provider(&server, Some("ghu_secret")).fetch(&http()).await;

        mock.assert_async().await;
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_token_without_token_field_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/copilot_internal/v2/token")
            .with_status(200)
            .with_body(r#"{"expires_at":1}"#)
            .create_async()
            .await;

        assert!(provider(&server, Some("k")).fetch(&http()).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_token_without_credential_skips_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/copilot_internal/v2/token")
            .expect(0)
            .create_async()
            .await;

        assert!(provider(&server, None).fetch(&http()).await.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_token_connection_failure_is_none() {
        let config = ClientConfig {
            token_url: "http://127.0.0.1:1/token".to_string(),
            credential: Some("k".to_string()),
            ..Default::default()
        };

        assert!(TokenProvider::new(&config).fetch(&http()).await.is_none());
    }
}
