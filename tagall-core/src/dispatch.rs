// ABOUTME: Command dispatch façade between incoming commands and the broadcast core
// ABOUTME: Checks authorization before touching the directory, scheduler, or role store

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::gate::{Action, AuthorizationGate, RoleError};
use crate::mention;
use crate::metrics;
use crate::scheduler::{BroadcastReceipt, BroadcastScheduler};
use crate::timer::ScheduleError;
use crate::traits::{ChatId, ChatKind, ChatUser, MessageId, ParticipantDirectory, ReplyTarget, UserId};

/// Which delegated power a grant or revoke concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantKind {
    /// Chat-scoped broadcast power
    Tag,
    /// Process-wide delegated admin
    Sudo,
}

impl GrantKind {
    fn grant_action(self) -> Action {
        match self {
            GrantKind::Tag => Action::GrantTag,
            GrantKind::Sudo => Action::GrantSudo,
        }
    }

    fn revoke_action(self) -> Action {
        match self {
            GrantKind::Tag => Action::RevokeTag,
            GrantKind::Sudo => Action::RevokeSudo,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command must be used in a group chat")]
    NotInGroup,

    #[error("command must be sent as a reply")]
    NoReplyTarget,

    #[error("replied-to message has no user author")]
    NoTargetUser,

    #[error("not authorized to {0}")]
    Unauthorized(Action),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl DispatchError {
    /// Input and authorization problems are the requester's, not the system's
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DispatchError::NotInGroup
                | DispatchError::NoReplyTarget
                | DispatchError::NoTargetUser
                | DispatchError::Unauthorized(_)
        )
    }
}

/// Require a group chat and a reply target, returning the target
pub fn require_group_reply(
    chat_kind: ChatKind,
    reply_to: Option<&ReplyTarget>,
) -> Result<&ReplyTarget, DispatchError> {
    if !chat_kind.is_group() {
        return Err(DispatchError::NotInGroup);
    }
    reply_to.ok_or(DispatchError::NoReplyTarget)
}

/// Like `require_group_reply`, but the target must have a user author
pub fn require_target_user(
    chat_kind: ChatKind,
    reply_to: Option<&ReplyTarget>,
) -> Result<&ChatUser, DispatchError> {
    require_group_reply(chat_kind, reply_to)?
        .author
        .as_ref()
        .ok_or(DispatchError::NoTargetUser)
}

pub struct Dispatcher {
    gate: Arc<AuthorizationGate>,
    directory: Arc<dyn ParticipantDirectory>,
    scheduler: BroadcastScheduler,
    dnd: HashSet<UserId>,
}

impl Dispatcher {
    pub fn new(
        gate: Arc<AuthorizationGate>,
        directory: Arc<dyn ParticipantDirectory>,
        scheduler: BroadcastScheduler,
        dnd: HashSet<UserId>,
    ) -> Self {
        Self {
            gate,
            directory,
            scheduler,
            dnd,
        }
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Mention everyone in `chat_id` in replies to `anchor`.
    ///
    /// A chat the directory knows nothing about yields an empty receipt.
    pub async fn request_broadcast(
        &self,
        actor: UserId,
        chat_id: ChatId,
        anchor: MessageId,
    ) -> Result<BroadcastReceipt, DispatchError> {
        metrics::record_broadcast_requested();
        if !self.gate.is_authorized(Action::Broadcast, actor, chat_id) {
            metrics::record_broadcast_denied();
            tracing::info!(actor = %actor, chat_id = %chat_id, "Broadcast denied");
            return Err(DispatchError::Unauthorized(Action::Broadcast));
        }

        let participants = self.directory.fetch(chat_id).await;
        let tokens = mention::mention_tokens(&participants, &self.dnd);
        tracing::debug!(
            chat_id = %chat_id,
            participants = participants.len(),
            tokens = tokens.len(),
            "Resolved broadcast mentions"
        );

        Ok(self.scheduler.enqueue_broadcast(chat_id, anchor, &tokens)?)
    }

    pub fn request_grant(
        &self,
        kind: GrantKind,
        actor: UserId,
        target: UserId,
        chat_id: ChatId,
    ) -> Result<(), DispatchError> {
        self.authorize(kind.grant_action(), actor, chat_id)?;
        match kind {
            GrantKind::Tag => self.gate.grant_tag(target, chat_id)?,
            GrantKind::Sudo => self.gate.grant_sudo(target)?,
        }
        Ok(())
    }

    pub fn request_revoke(
        &self,
        kind: GrantKind,
        actor: UserId,
        target: UserId,
        chat_id: ChatId,
    ) -> Result<(), DispatchError> {
        self.authorize(kind.revoke_action(), actor, chat_id)?;
        match kind {
            GrantKind::Tag => self.gate.revoke_tag(target, chat_id)?,
            GrantKind::Sudo => self.gate.revoke_sudo(target)?,
        }
        Ok(())
    }

    fn authorize(&self, action: Action, actor: UserId, chat_id: ChatId) -> Result<(), DispatchError> {
        if self.gate.is_authorized(action, actor, chat_id) {
            Ok(())
        } else {
            tracing::info!(actor = %actor, chat_id = %chat_id, %action, "Role change denied");
            Err(DispatchError::Unauthorized(action))
        }
    }
}
