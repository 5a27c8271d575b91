//! Send one prompt and print the streamed reply.
//!
//! ```text
//! COPILOT_KEY=ghu_... cargo run --example chat -- "Explain SSE in one line"
//! ```

use anyhow::Context;
use copilot_chat::{ChatClient, ConfigLoader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let prompt = std::env::args()
        .nth(1)
        .context("usage: chat <prompt>")?;

    let config = ConfigLoader::new()?.into_config()?;
    let client = ChatClient::new(config).await?;

    let conversation = client
        .start("You are a helpful assistant.", &prompt)
        .await
        .context("chat completion failed")?;

    if let Some(reply) = conversation.last() {
        println!("{}", reply.content);
    }

    Ok(())
}
