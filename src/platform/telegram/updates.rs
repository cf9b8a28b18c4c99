// ABOUTME: Conversion of Telegram updates into platform-agnostic incoming messages
// ABOUTME: UpdateRouter hands each message to the MessageHandler on its own task

use std::sync::Arc;
use tagall_core::traits::{ChatId, ChatKind, ChatUser, IncomingMessage, MessageId, ReplyTarget};
use tagall_core::MessageHandler;
use teloxide::types::{Chat, Message, Update, UpdateKind, User};

fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    }
}

/// `None` when the Telegram id does not fit the signed user id.
fn chat_user(user: &User) -> Option<ChatUser> {
    let id = i64::try_from(user.id.0).ok()?;
    Some(ChatUser::new(id, user.full_name()))
}

/// Author of a replied-to message.
///
/// Posts sent on behalf of a chat (anonymous admins, linked channels) carry a
/// placeholder bot in `from`, so they have no user author.
fn reply_author(reply: &Message) -> Option<ChatUser> {
    if reply.sender_chat.is_some() {
        return None;
    }
    reply.from.as_ref().and_then(chat_user)
}

/// Convert a text message into an `IncomingMessage`.
///
/// Returns `None` for non-text messages, messages without a usable sender,
/// and the bot's own messages.
pub fn to_incoming(message: &Message, bot_user_id: u64) -> Option<IncomingMessage> {
    let body = message.text()?;
    let from = message.from.as_ref()?;
    if from.id.0 == bot_user_id {
        return None;
    }
    let sender = chat_user(from)?;

    let reply_to = message.reply_to_message().map(|reply| ReplyTarget {
        message_id: MessageId(reply.id.0),
        author: reply_author(reply),
    });

    Some(IncomingMessage {
        chat_id: ChatId(message.chat.id.0),
        chat_kind: chat_kind(&message.chat),
        message_id: MessageId(message.id.0),
        sender,
        body: body.to_string(),
        reply_to,
    })
}

/// Routes updates from any update source into the message handler
#[derive(Clone)]
pub struct UpdateRouter {
    handler: Arc<MessageHandler>,
    bot_user_id: u64,
}

impl UpdateRouter {
    pub fn new(handler: Arc<MessageHandler>, bot_user_id: u64) -> Self {
        Self {
            handler,
            bot_user_id,
        }
    }

    /// Spawn handling of `update` if it carries a message we act on
    pub fn route(&self, update: Update) {
        let UpdateKind::Message(message) = update.kind else {
            return;
        };
        let Some(msg) = to_incoming(&message, self.bot_user_id) else {
            return;
        };

        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            if let Err(e) = handler.handle(&msg).await {
                tracing::error!(
                    platform = "telegram",
                    chat_id = %msg.chat_id,
                    message_id = %msg.message_id,
                    error = %e,
                    "Error handling message"
                );
            }
        });
    }
}
