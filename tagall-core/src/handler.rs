// ABOUTME: Turns incoming chat messages into dispatch calls and user-facing replies
// ABOUTME: Platform adapters feed IncomingMessage in; replies go out through ChatSender

use anyhow::Result;
use std::sync::Arc;

use crate::commands::{self, BotCommand};
use crate::dispatch::{self, DispatchError, Dispatcher, GrantKind};
use crate::texts;
use crate::traits::{ChatSender, IncomingMessage, MessageContent};

pub struct MessageHandler {
    dispatcher: Arc<Dispatcher>,
    sender: Arc<dyn ChatSender>,
    bot_username: Option<String>,
}

impl MessageHandler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        sender: Arc<dyn ChatSender>,
        bot_username: Option<String>,
    ) -> Self {
        Self {
            dispatcher,
            sender,
            bot_username,
        }
    }

    /// Handle one message, sending any reply back to its chat
    pub async fn handle(&self, msg: &IncomingMessage) -> Result<()> {
        if let Some(reply) = self.respond(msg).await {
            self.sender
                .send_reply(msg.chat_id, msg.message_id, reply)
                .await?;
        }
        Ok(())
    }

    /// Work out the reply for `msg` without sending it.
    ///
    /// Non-commands and successful broadcasts have no reply.
    pub async fn respond(&self, msg: &IncomingMessage) -> Option<MessageContent> {
        let command = commands::parse_bot_command(&msg.body, self.bot_username.as_deref())?;
        tracing::debug!(
            chat_id = %msg.chat_id,
            sender = %msg.sender.id,
            command = ?command,
            "Handling command"
        );

        let text = match command {
            BotCommand::Start => texts::START_TEXT.to_string(),
            BotCommand::Help => texts::HELP_TEXT.to_string(),
            BotCommand::Broadcast => return self.broadcast(msg).await,
            BotCommand::GrantTag => self.change_role(msg, GrantKind::Tag, true),
            BotCommand::RevokeTag => self.change_role(msg, GrantKind::Tag, false),
            BotCommand::GrantSudo => self.change_role(msg, GrantKind::Sudo, true),
            BotCommand::RevokeSudo => self.change_role(msg, GrantKind::Sudo, false),
        };
        Some(MessageContent::plain(text))
    }

    async fn broadcast(&self, msg: &IncomingMessage) -> Option<MessageContent> {
        let result = match dispatch::require_group_reply(msg.chat_kind, msg.reply_to.as_ref()) {
            Ok(anchor) => {
                self.dispatcher
                    .request_broadcast(msg.sender.id, msg.chat_id, anchor.message_id)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(receipt) => {
                if receipt.chunks() == 0 {
                    tracing::info!(chat_id = %msg.chat_id, "Broadcast produced no mentions");
                }
                None
            }
            Err(e) => Some(MessageContent::plain(error_text(&e, texts::REPLY_TO_TAG_TEXT))),
        }
    }

    fn change_role(&self, msg: &IncomingMessage, kind: GrantKind, grant: bool) -> String {
        let reply_hint = if grant {
            texts::REPLY_TO_GRANT_TEXT
        } else {
            texts::REPLY_TO_REVOKE_TEXT
        };
        let target = match dispatch::require_target_user(msg.chat_kind, msg.reply_to.as_ref()) {
            Ok(target) => target,
            Err(e) => return error_text(&e, reply_hint),
        };

        let result = if grant {
            self.dispatcher
                .request_grant(kind, msg.sender.id, target.id, msg.chat_id)
        } else {
            self.dispatcher
                .request_revoke(kind, msg.sender.id, target.id, msg.chat_id)
        };

        let power = texts::power_name(kind == GrantKind::Sudo);
        match (result, grant) {
            (Ok(()), true) => texts::granted(power, &target.display_name),
            (Ok(()), false) => texts::revoked(power, &target.display_name),
            (Err(e @ DispatchError::Role(_)), _) => {
                tracing::error!(
                    chat_id = %msg.chat_id,
                    target = %target.id,
                    error = %e,
                    "Role change failed"
                );
                if grant {
                    texts::grant_failed(power, &target.display_name)
                } else {
                    texts::revoke_failed(power, &target.display_name)
                }
            }
            (Err(e), _) => error_text(&e, reply_hint),
        }
    }
}

/// Reply text for a dispatch failure; `reply_hint` explains a missing reply
fn error_text(e: &DispatchError, reply_hint: &str) -> String {
    match e {
        DispatchError::NotInGroup => texts::GROUP_ONLY_TEXT.to_string(),
        DispatchError::NoReplyTarget => reply_hint.to_string(),
        DispatchError::NoTargetUser => texts::NO_TARGET_USER_TEXT.to_string(),
        DispatchError::Unauthorized(_) => texts::NOT_ALLOWED_TEXT.to_string(),
        DispatchError::Schedule(_) => texts::SCHEDULE_FAILED_TEXT.to_string(),
        DispatchError::Role(_) => texts::ROLE_STORE_FAILED_TEXT.to_string(),
    }
}
