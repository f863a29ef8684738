//! Chat transport stand-in: reads commands from stdin, prints replies.
//!
//! Run with `RUST_LOG=debug` to watch the rule cascade decide.

use anyhow::Result;
use payment_approval::{CommandExecutor, Config, DocumentStore, IntentParser, OpenAiFallback};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let db = Arc::new(sled::open(&config.db_path)?);
    let store = DocumentStore::open(&db)?;

    let parser = match &config.fallback_api_base {
        Some(base) => IntentParser::with_fallback(
            Arc::new(OpenAiFallback::new(
                base,
                &config.fallback_api_key,
                &config.fallback_model,
            )),
            Duration::from_millis(config.fallback_timeout_ms),
        ),
        None => IntentParser::new(),
    };
    let executor = CommandExecutor::new(store, parser, &config.default_company);

    info!(db = %config.db_path, "ready; type a command, ctrl-d to quit");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = executor.handle_text(&line, "chat-user").await?;
        println!("{}", reply.text);
    }

    Ok(())
}
