//! Operator confirmation for destructive actions

use async_trait::async_trait;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Asks the operator to confirm an action
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Prompt on stderr, read the answer from stdin. Anything but y/yes declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut input = BufReader::new(io::stdin());
        ask(prompt, &mut io::stderr(), &mut input).await
    }
}

/// Confirmation given up front (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

async fn ask<W, R>(prompt: &str, output: &mut W, input: &mut R) -> bool
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    let line = format!("{} [y/N] ", prompt);
    if let Err(e) = output.write_all(line.as_bytes()).await {
        debug!("Failed to write prompt: {}", e);
        return false;
    }
    if output.flush().await.is_err() {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer).await {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            debug!("Failed to read answer: {}", e);
            false
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
