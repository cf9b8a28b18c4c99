// ABOUTME: Durable storage of delegated roles (sudo and chat-scoped tag power) in SQLite
// ABOUTME: RoleStore is the persistence seam the authorization gate writes through

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::traits::{ChatId, UserId};

/// Sudo rows are process-wide and stored under this chat id
const GLOBAL_SCOPE: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Configured at startup, never stored
    Owner,
    SudoUser,
    /// Scoped to one chat
    TagUser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::SudoUser => "sudo",
            Role::TagUser => "tag",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "owner" => Ok(Role::Owner),
            "sudo" => Ok(Role::SudoUser),
            "tag" => Ok(Role::TagUser),
            _ => anyhow::bail!("Unknown role kind: {}", s),
        }
    }
}

/// One persisted role membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleRecord {
    pub role: Role,
    pub user_id: UserId,
    /// Only set for `Role::TagUser`
    pub chat_id: Option<ChatId>,
}

impl RoleRecord {
    pub fn sudo(user_id: UserId) -> Self {
        Self {
            role: Role::SudoUser,
            user_id,
            chat_id: None,
        }
    }

    pub fn tag(user_id: UserId, chat_id: ChatId) -> Self {
        Self {
            role: Role::TagUser,
            user_id,
            chat_id: Some(chat_id),
        }
    }

    fn scope(&self) -> i64 {
        self.chat_id.map(|c| c.0).unwrap_or(GLOBAL_SCOPE)
    }
}

/// Durable keyed store of role memberships.
///
/// `insert` of an existing record and `delete` of a missing one both succeed.
pub trait RoleStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<RoleRecord>>;
    fn insert(&self, record: &RoleRecord) -> Result<()>;
    fn delete(&self, record: &RoleRecord) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteRoleStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteRoleStore {
    /// Open (or create) the role database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create workspace directory: {}", parent.display())
            })?;
        }
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let store = Self::new(Arc::new(Mutex::new(conn)));
        store.initialize_schema()?;

        tracing::info!(db = %path.display(), "RoleStore initialized");
        Ok(store)
    }

    /// Wrap an existing connection; call `initialize_schema` before use
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    pub fn initialize_schema(&self) -> Result<()> {
        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("Database mutex poisoned: {}", e))?;
        db.execute(
            "CREATE TABLE IF NOT EXISTS roles (
                kind TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                chat_id INTEGER NOT NULL DEFAULT 0,
                granted_at TEXT NOT NULL,
                PRIMARY KEY (kind, user_id, chat_id)
            )",
            [],
        )?;
        Ok(())
    }
}

impl RoleStore for SqliteRoleStore {
    fn load_all(&self) -> Result<Vec<RoleRecord>> {
        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("Database mutex poisoned: {}", e))?;
        let mut stmt = db.prepare("SELECT kind, user_id, chat_id FROM roles ORDER BY granted_at")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (kind, user_id, chat_id) = row?;
            let role = match kind.parse::<Role>() {
                Ok(Role::Owner) | Err(_) => {
                    tracing::warn!(kind = %kind, user_id, "Ignoring unexpected role row");
                    continue;
                }
                Ok(role) => role,
            };
            records.push(RoleRecord {
                role,
                user_id: UserId(user_id),
                chat_id: (role == Role::TagUser).then_some(ChatId(chat_id)),
            });
        }
        Ok(records)
    }

    fn insert(&self, record: &RoleRecord) -> Result<()> {
        if record.role == Role::Owner {
            anyhow::bail!("Owners come from configuration and cannot be stored");
        }
        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("Database mutex poisoned: {}", e))?;
        db.execute(
            "INSERT OR IGNORE INTO roles (kind, user_id, chat_id, granted_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.role.as_str(),
                record.user_id.0,
                record.scope(),
                Utc::now().to_rfc3339()
            ],
        )
        .context("Failed to insert role")?;
        Ok(())
    }

    fn delete(&self, record: &RoleRecord) -> Result<()> {
        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("Database mutex poisoned: {}", e))?;
        db.execute(
            "DELETE FROM roles WHERE kind = ?1 AND user_id = ?2 AND chat_id = ?3",
            params![record.role.as_str(), record.user_id.0, record.scope()],
        )
        .context("Failed to delete role")?;
        Ok(())
    }
}
