use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::blocks::MessageTemplate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("message post failed: {0}")]
    Post(String),
    #[error("message update failed: {0}")]
    Update(String),
}

/// Outbound side of the bot: channel posts and in-place panel edits.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Posts to a channel and returns the new message's timestamp.
    async fn post(&self, channel_id: &str, message: &MessageTemplate) -> Result<String, SinkError>;

    async fn update(
        &self,
        channel_id: &str,
        message_ts: &str,
        message: &MessageTemplate,
    ) -> Result<(), SinkError>;
}

/// Accepts everything and hands out sequential timestamps.
#[derive(Debug, Default)]
pub struct NoopMessageSink {
    next_ts: AtomicU64,
}

#[async_trait]
impl MessageSink for NoopMessageSink {
    async fn post(&self, _channel_id: &str, _message: &MessageTemplate) -> Result<String, SinkError> {
        let sequence = self.next_ts.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("noop-{sequence}"))
    }

    async fn update(
        &self,
        _channel_id: &str,
        _message_ts: &str,
        _message: &MessageTemplate,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageSink, NoopMessageSink};
    use crate::blocks::help_message;

    #[tokio::test]
    async fn noop_sink_hands_out_distinct_timestamps() {
        let sink = NoopMessageSink::default();
        let first = sink.post("C1", &help_message()).await.expect("post");
        let second = sink.post("C1", &help_message()).await.expect("post");

        assert_eq!(first, "noop-1");
        assert_eq!(second, "noop-2");
        sink.update("C1", &first, &help_message()).await.expect("update");
    }
}
