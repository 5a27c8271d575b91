//! Copilot Chat - minimal streaming chat-completion client
//!
//! Exchanges a long-lived credential for a bearer token, posts a conversation
//! to the chat completions endpoint and decodes the streamed reply into text.
//!
//! ```no_run
//! use copilot_chat::{ChatClient, ClientConfig};
//!
//! # async fn run() -> copilot_chat::error::Result<()> {
//! let config = ClientConfig::default().with_credential("ghu_...");
//! let client = ChatClient::new(config).await?;
//! let conversation = client.start("You are terse.", "Say hi").await?;
//! println!("{}", conversation.last().map(|m| m.content.as_str()).unwrap_or(""));
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod router;

pub use api::{Message, Role, StreamDecoder};
pub use config::{ClientConfig, ConfigLoader};
pub use error::{CopilotError, Result};

use api::CompletionRequest;
use client::{HttpClient, TokenProvider};
use router::ModelSelector;
use tracing::debug;

/// The main chat client
pub struct ChatClient {
    config: ClientConfig,

    /// Bearer token; `None` when the exchange failed
    token: Option<String>,

    /// Model resolved at construction
    model: String,

    http_client: HttpClient,
}

impl ChatClient {
    /// Create a client: fetch a bearer token and resolve the model
    ///
    /// A failed token exchange does not fail construction; requests are then
    /// sent with an empty bearer token.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let http_client = HttpClient::new(config.request_timeout(), config.connect_timeout())?;

        let token = TokenProvider::new(&config).fetch(&http_client).await;
        let model = ModelSelector::new(&config)
            .resolve(&http_client, &config.model, token.as_deref().unwrap_or_default())
            .await;

        debug!(%model, has_token = token.is_some(), "chat client ready");

        Ok(Self {
            config,
            token,
            model,
            http_client,
        })
    }

    /// Create a client from an already known token and model, without I/O
    pub fn with_token(
        config: ClientConfig,
        token: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let http_client = HttpClient::new(config.request_timeout(), config.connect_timeout())?;

        Ok(Self {
            config,
            token,
            model: model.into(),
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a conversation from a system prompt and a user message
    pub async fn start(&self, system: &str, user: &str) -> Result<Vec<Message>> {
        let messages = [Message::system(system), Message::user(user)];
        self.next(&messages, None).await
    }

    /// Continue a conversation
    ///
    /// Appends `prompt` as a user message when given, then the assistant's
    /// reply, and returns the extended conversation. `messages` is left as is.
    pub async fn next(&self, messages: &[Message], prompt: Option<&str>) -> Result<Vec<Message>> {
        let mut conversation = messages.to_vec();
        if let Some(prompt) = prompt {
            conversation.push(Message::user(prompt));
        }

        debug!(?conversation, "Creating a new chat completion");

        let reply = self.complete(&conversation).await?;
        conversation.push(Message::assistant(reply));

        debug!(?conversation, "Chat completion finished");

        Ok(conversation)
    }

    /// Send a conversation and return the decoded assistant text
    pub async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = CompletionRequest::new(&self.model, messages)
            .with_temperature(self.config.temperature);

        let lines = self
            .http_client
            .post_stream(
                &self.config.completions_url,
                &request,
                self.token.as_deref().unwrap_or_default(),
            )
            .await?;

        StreamDecoder::decode_stream(lines).await
    }
}
