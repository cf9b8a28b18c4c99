// ABOUTME: Broadcast scheduler that splits mentions into chunks and staggers their delivery
// ABOUTME: Chunk i fires i * interval after enqueue as an independent reply to the anchor message

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::mention::MentionToken;
use crate::metrics;
use crate::partition;
use crate::timer::{ScheduleError, Timer, TimerJob};
use crate::traits::{ChatId, ChatSender, MessageContent, MessageId};

/// Separator between mentions inside one chunk message
const MENTION_SEPARATOR: &str = ", ";

/// A bounded, ordered group of mentions delivered in one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(Vec<MentionToken>);

impl Chunk {
    pub fn tokens(&self) -> &[MentionToken] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message body: the mentions as a human-readable list
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(MentionToken::as_str)
            .collect::<Vec<_>>()
            .join(MENTION_SEPARATOR)
    }
}

/// One chunk's delayed delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledSend {
    pub chat_id: ChatId,
    pub anchor_message_id: MessageId,
    pub chunk: Chunk,
    pub fire_delay: Duration,
}

/// What `enqueue_broadcast` put on the timer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReceipt {
    pub fire_delays: Vec<Duration>,
}

impl BroadcastReceipt {
    pub fn chunks(&self) -> usize {
        self.fire_delays.len()
    }
}

pub struct BroadcastScheduler {
    sender: Arc<dyn ChatSender>,
    timer: Arc<dyn Timer>,
    chunk_size: NonZeroUsize,
    interval: Duration,
}

impl BroadcastScheduler {
    pub fn new(
        sender: Arc<dyn ChatSender>,
        timer: Arc<dyn Timer>,
        chunk_size: NonZeroUsize,
        interval: Duration,
    ) -> Self {
        Self {
            sender,
            timer,
            chunk_size,
            interval,
        }
    }

    /// Lay out the sends for a broadcast without scheduling anything
    pub fn plan(
        &self,
        chat_id: ChatId,
        anchor_message_id: MessageId,
        tokens: &[MentionToken],
    ) -> Vec<ScheduledSend> {
        partition::split(tokens, self.chunk_size)
            .enumerate()
            .map(|(i, chunk)| ScheduledSend {
                chat_id,
                anchor_message_id,
                chunk: Chunk(chunk.to_vec()),
                fire_delay: self
                    .interval
                    .saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)),
            })
            .collect()
    }

    /// Schedule every chunk of `tokens` as a reply to `anchor_message_id`.
    ///
    /// No tokens means nothing is scheduled. Either every chunk is accepted by
    /// the timer or none is; once accepted, a failed send of one chunk does
    /// not affect the others.
    pub fn enqueue_broadcast(
        &self,
        chat_id: ChatId,
        anchor_message_id: MessageId,
        tokens: &[MentionToken],
    ) -> Result<BroadcastReceipt, ScheduleError> {
        let sends = self.plan(chat_id, anchor_message_id, tokens);
        if sends.is_empty() {
            tracing::info!(chat_id = %chat_id, "No participants to mention, nothing scheduled");
            return Ok(BroadcastReceipt::default());
        }

        let receipt = BroadcastReceipt {
            fire_delays: sends.iter().map(|s| s.fire_delay).collect(),
        };
        let total = sends.len();
        let jobs = sends
            .into_iter()
            .enumerate()
            .map(|(index, send)| {
                let sender = Arc::clone(&self.sender);
                TimerJob::new(send.fire_delay, fire(sender, send, index, total))
            })
            .collect();

        if let Err(e) = self.timer.schedule(jobs) {
            metrics::record_schedule_error(e.kind());
            tracing::error!(
                chat_id = %chat_id,
                chunks = total,
                error = %e,
                "Failed to schedule broadcast"
            );
            return Err(e);
        }

        metrics::record_chunks_scheduled(total);
        tracing::info!(
            chat_id = %chat_id,
            anchor = %anchor_message_id,
            tokens = tokens.len(),
            chunks = total,
            "Broadcast scheduled"
        );
        Ok(receipt)
    }
}

async fn fire(sender: Arc<dyn ChatSender>, send: ScheduledSend, index: usize, total: usize) {
    let content = MessageContent::markdown(send.chunk.render());
    match sender
        .send_reply(send.chat_id, send.anchor_message_id, content)
        .await
    {
        Ok(()) => {
            metrics::record_chunk_send("ok");
            tracing::debug!(
                chat_id = %send.chat_id,
                chunk = index + 1,
                of = total,
                "Broadcast chunk sent"
            );
        }
        Err(e) => {
            metrics::record_chunk_send("failed");
            tracing::warn!(
                chat_id = %send.chat_id,
                chunk = index + 1,
                of = total,
                error = %e,
                "Broadcast chunk failed to send"
            );
        }
    }
}
