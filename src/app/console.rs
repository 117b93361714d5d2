use crate::app::render::{help_text, render_resolution};
use crate::core::engine::LookupEngine;
use crate::domain::model::RawMessage;
use crate::domain::ports::CardTransport;
use crate::utils::error::Result;
use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Terminal stand-in for a chat surface: one input line is one message.
pub struct ConsoleAdapter<T: CardTransport> {
    engine: LookupEngine<T>,
    requester: String,
}

impl<T: CardTransport> ConsoleAdapter<T> {
    pub fn new(engine: LookupEngine<T>, requester: impl Into<String>) -> Self {
        Self {
            engine,
            requester: requester.into(),
        }
    }

    /// Help segments add the help block; every other segment is still resolved.
    pub async fn handle_line(&self, line: &str) -> Vec<String> {
        let mut blocks = Vec::new();
        if self.engine.parser().wants_help(line) {
            blocks.push(help_text(self.engine.parser().prefix()));
        }
        let message = RawMessage::new(line, self.requester.as_str(), Utc::now());
        blocks.extend(render_resolution(&self.engine.resolve_message(&message).await));
        blocks
    }

    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            for block in self.handle_line(&line).await {
                writer.write_all(block.as_bytes()).await?;
                writer.write_all(b"\n\n").await?;
            }
            writer.flush().await?;
        }
        tracing::info!("Input closed, shutting down console");
        Ok(())
    }
}
