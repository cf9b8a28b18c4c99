// ABOUTME: Telegram implementation of the ChatSender seam
// ABOUTME: Every message is sent as a reply; Markdown content goes out as MarkdownV2

use anyhow::{Context, Result};
use async_trait::async_trait;
use tagall_core::traits::{ChatId, ChatSender, MessageContent, MessageId};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

/// Sends replies through the Bot API
#[derive(Debug, Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Parse mode for a piece of content; plain text is sent without entity parsing
pub(crate) fn parse_mode(content: &MessageContent) -> Option<ParseMode> {
    match content {
        MessageContent::Plain(_) => None,
        MessageContent::Markdown(_) => Some(ParseMode::MarkdownV2),
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_reply(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        content: MessageContent,
    ) -> Result<()> {
        let mode = parse_mode(&content);
        let text = match content {
            MessageContent::Plain(text) | MessageContent::Markdown(text) => text,
        };

        let mut req = self
            .bot
            .send_message(teloxide::types::ChatId(chat_id.0), text)
            .reply_parameters(ReplyParameters::new(teloxide::types::MessageId(reply_to.0)));
        if let Some(pm) = mode {
            req = req.parse_mode(pm);
        }
        req.await
            .with_context(|| format!("Failed to send reply to chat {}", chat_id))?;
        Ok(())
    }
}
