// ABOUTME: Authorization gate owning the owner, sudo, and tag role sets
// ABOUTME: Mutations persist first and only then touch the in-memory cache

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::metrics;
use crate::roles::{Role, RoleRecord, RoleStore};
use crate::traits::{ChatId, UserId};

/// Something an actor may attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Broadcast,
    GrantTag,
    RevokeTag,
    GrantSudo,
    RevokeSudo,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Broadcast => write!(f, "broadcast"),
            Action::GrantTag => write!(f, "grant_tag"),
            Action::RevokeTag => write!(f, "revoke_tag"),
            Action::GrantSudo => write!(f, "grant_sudo"),
            Action::RevokeSudo => write!(f, "revoke_sudo"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RoleError {
    #[error("failed to persist {role} change: {source}")]
    Persistence {
        role: Role,
        #[source]
        source: anyhow::Error,
    },
}

/// Point-in-time copy of the role sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSnapshot {
    pub owners: HashSet<UserId>,
    pub sudo_users: HashSet<UserId>,
    pub tag_users: HashSet<(UserId, ChatId)>,
}

/// Owns every role set and is the only writer of the role store.
///
/// Each mutable set sits behind its own lock, and a mutation holds the write
/// lock across both the store write and the cache update, so two changes to
/// the same set never interleave. A failed store write leaves the cache as it
/// was.
pub struct AuthorizationGate {
    owners: HashSet<UserId>,
    sudo_users: RwLock<HashSet<UserId>>,
    tag_users: RwLock<HashSet<(UserId, ChatId)>>,
    store: Arc<dyn RoleStore>,
}

impl AuthorizationGate {
    /// Build the gate and hydrate the delegated role caches from `store`
    pub fn load(owners: HashSet<UserId>, store: Arc<dyn RoleStore>) -> anyhow::Result<Self> {
        let mut sudo_users = HashSet::new();
        let mut tag_users = HashSet::new();
        for record in store.load_all()? {
            match (record.role, record.chat_id) {
                (Role::SudoUser, _) => {
                    sudo_users.insert(record.user_id);
                }
                (Role::TagUser, Some(chat_id)) => {
                    tag_users.insert((record.user_id, chat_id));
                }
                _ => {}
            }
        }

        tracing::info!(
            owners = owners.len(),
            sudo_users = sudo_users.len(),
            tag_users = tag_users.len(),
            "Authorization gate loaded"
        );

        Ok(Self {
            owners,
            sudo_users: RwLock::new(sudo_users),
            tag_users: RwLock::new(tag_users),
            store,
        })
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owners.contains(&user_id)
    }

    pub fn is_sudo(&self, user_id: UserId) -> bool {
        self.sudo_users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user_id)
    }

    /// Tag power only counts in the chat it was granted for
    pub fn is_tag_user(&self, user_id: UserId, chat_id: ChatId) -> bool {
        self.tag_users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(user_id, chat_id))
    }

    /// Whether `actor` may perform `action` in `chat_id`
    pub fn is_authorized(&self, action: Action, actor: UserId, chat_id: ChatId) -> bool {
        match action {
            Action::Broadcast => {
                self.is_owner(actor) || self.is_sudo(actor) || self.is_tag_user(actor, chat_id)
            }
            Action::GrantTag | Action::RevokeTag => self.is_owner(actor) || self.is_sudo(actor),
            Action::GrantSudo | Action::RevokeSudo => self.is_owner(actor),
        }
    }

    pub fn grant_tag(&self, user_id: UserId, chat_id: ChatId) -> Result<(), RoleError> {
        let record = RoleRecord::tag(user_id, chat_id);
        let mut tag_users = self
            .tag_users
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.persist(&record, true)?;
        tag_users.insert((user_id, chat_id));
        Ok(())
    }

    pub fn revoke_tag(&self, user_id: UserId, chat_id: ChatId) -> Result<(), RoleError> {
        let record = RoleRecord::tag(user_id, chat_id);
        let mut tag_users = self
            .tag_users
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.persist(&record, false)?;
        tag_users.remove(&(user_id, chat_id));
        Ok(())
    }

    pub fn grant_sudo(&self, user_id: UserId) -> Result<(), RoleError> {
        let record = RoleRecord::sudo(user_id);
        let mut sudo_users = self
            .sudo_users
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.persist(&record, true)?;
        sudo_users.insert(user_id);
        Ok(())
    }

    pub fn revoke_sudo(&self, user_id: UserId) -> Result<(), RoleError> {
        let record = RoleRecord::sudo(user_id);
        let mut sudo_users = self
            .sudo_users
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.persist(&record, false)?;
        sudo_users.remove(&user_id);
        Ok(())
    }

    pub fn snapshot(&self) -> RoleSnapshot {
        RoleSnapshot {
            owners: self.owners.clone(),
            sudo_users: self
                .sudo_users
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            tag_users: self
                .tag_users
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    fn persist(&self, record: &RoleRecord, grant: bool) -> Result<(), RoleError> {
        let result = if grant {
            self.store.insert(record)
        } else {
            self.store.delete(record)
        };
        let role = record.role.as_str();
        match result {
            Ok(()) => {
                metrics::record_role_mutation(role, "ok");
                tracing::info!(
                    role,
                    user_id = %record.user_id,
                    chat_id = ?record.chat_id.map(|c| c.0),
                    grant,
                    "Role membership persisted"
                );
                Ok(())
            }
            Err(source) => {
                metrics::record_role_mutation(role, "failed");
                tracing::error!(
                    role,
                    user_id = %record.user_id,
                    chat_id = ?record.chat_id.map(|c| c.0),
                    grant,
                    error = %source,
                    "Failed to persist role membership"
                );
                Err(RoleError::Persistence {
                    role: record.role,
                    source,
                })
            }
        }
    }
}
