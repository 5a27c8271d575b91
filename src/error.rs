//! Copilot Chat Error Types
//!
//! Error handling for the chat client.

use thiserror::Error;

/// Main error type for chat client operations
#[derive(Debug, Error)]
pub enum CopilotError {
    /// Configuration errors (invalid JSON, unreadable file, bad header value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    Request(String),

    /// Completion endpoint rejected the bearer token
    #[error("Authentication failed: {0}. Check your COPILOT_KEY credential.")]
    Auth(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// A streamed payload could not be decoded
    #[error("Failed to decode stream payload: {message}. Data: {payload}")]
    Decode { message: String, payload: String },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CopilotError {
    pub(crate) fn decode(message: impl ToString, payload: &[u8]) -> Self {
        let payload = String::from_utf8_lossy(payload);
        CopilotError::Decode {
            message: message.to_string(),
            payload: payload.chars().take(500).collect(),
        }
    }
}

impl From<reqwest::Error> for CopilotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CopilotError::Timeout(err.to_string())
        } else if err.is_connect() {
            CopilotError::Request(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            CopilotError::Request(format!("Failed to decode response: {}", err))
        } else {
            CopilotError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CopilotError {
    fn from(err: serde_json::Error) -> Self {
        CopilotError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for CopilotError {
    fn from(err: std::io::Error) -> Self {
        CopilotError::Config(format!("IO error: {}", err))
    }
}

/// Result type alias for chat client operations
pub type Result<T> = std::result::Result<T, CopilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_truncates_payload() {
        let payload = vec![b'x'; 2000];
        let err = CopilotError::decode("bad json", &payload);
        match err {
            CopilotError::Decode { message, payload } => {
                assert_eq!(message, "bad json");
                assert_eq!(payload.len(), 500);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let err = CopilotError::Auth("401 Unauthorized".to_string());
        assert!(err.to_string().starts_with("Authentication failed: 401"));
    }
}
