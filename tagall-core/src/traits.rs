// ABOUTME: Core identifiers, message types, and the platform seams the broadcast core talks through
// ABOUTME: ChatSender delivers replies, ParticipantDirectory resolves who is in a chat

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Platform user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Platform chat identifier (groups are negative on Telegram)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Message identifier, unique within a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Message Content Types
// =============================================================================

/// Content that can be sent to a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Plain text, no entity parsing
    Plain(String),
    /// Telegram MarkdownV2; the caller is responsible for escaping
    Markdown(String),
}

impl MessageContent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Markdown(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Markdown(text) => text,
        }
    }
}

// =============================================================================
// Incoming Message
// =============================================================================

/// Identity of a chat user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatUser {
    pub id: UserId,
    /// Full display name (first + last)
    pub display_name: String,
}

impl ChatUser {
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            display_name: display_name.into(),
        }
    }
}

/// Kind of chat a message was sent in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Group-type chats are the only place broadcasts and role changes apply
    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// The message an incoming command replies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub message_id: MessageId,
    /// Author of the replied-to message; absent for anonymous/channel posts
    pub author: Option<ChatUser>,
}

/// Incoming text message from a chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    pub sender: ChatUser,
    pub body: String,
    pub reply_to: Option<ReplyTarget>,
}

// =============================================================================
// Platform Seams
// =============================================================================

/// Directory lookup result: participant id -> display name
pub type Participants = BTreeMap<UserId, String>;

/// Outbound side of a chat platform.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send `content` to `chat_id` as a reply to `reply_to`
    async fn send_reply(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        content: MessageContent,
    ) -> Result<()>;
}

/// Resolves the known participants of a chat.
///
/// Implementations never fail: an unreachable or misbehaving directory
/// yields an empty mapping.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn fetch(&self, chat_id: ChatId) -> Participants;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_kind_is_group() {
        assert!(ChatKind::Group.is_group());
        assert!(ChatKind::Supergroup.is_group());
        assert!(!ChatKind::Private.is_group());
        assert!(!ChatKind::Channel.is_group());
    }

    #[test]
    fn test_ids_display_raw_number() {
        assert_eq!(ChatId(-100123).to_string(), "-100123");
        assert_eq!(UserId(42).to_string(), "42");
        assert_eq!(MessageId(7).to_string(), "7");
    }

    #[test]
    fn test_message_content_text() {
        assert_eq!(MessageContent::plain("hi").text(), "hi");
        assert_eq!(MessageContent::markdown("*hi*").text(), "*hi*");
    }

    #[test]
    fn test_ids_serialize_transparent() {
        assert_eq!(serde_json::to_string(&UserId(5)).unwrap(), "5");
        let chat: ChatId = serde_json::from_str("-9").unwrap();
        assert_eq!(chat, ChatId(-9));
    }
}
