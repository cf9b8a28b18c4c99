// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Validates required fields and provides sensible defaults for optional ones
use crate::paths;
use crate::traits::UserId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub directory: DirectoryConfig,
    pub roles: RolesConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

// ─── TelegramConfig ─────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// When present the bot receives updates through a webhook, otherwise it long-polls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
}

// Custom Debug impl to redact bot_token
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("webhook", &self.webhook)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Public base URL; the bot token is appended as the path
    pub url: String,
    #[serde(default = "default_webhook_host")]
    pub host: String,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

// ─── DirectoryConfig ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the participant directory service
    pub api_url: String,
    #[serde(default = "default_directory_timeout_secs")]
    pub timeout_secs: u64,
}

// ─── RolesConfig ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Process-wide owners; immutable while running
    #[serde(default)]
    pub owners: Vec<i64>,
    /// Users never mentioned by a broadcast
    #[serde(default)]
    pub dnd_users: Vec<i64>,
}

// ─── BroadcastConfig ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Seconds between consecutive chunks of one broadcast
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upper bound on sends waiting to fire across all broadcasts
    #[serde(default = "default_max_pending_sends")]
    pub max_pending_sends: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            interval_secs: default_interval_secs(),
            max_pending_sends: default_max_pending_sends(),
        }
    }
}

// ─── WorkspaceConfig ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_workspace_path")]
    pub path: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            path: default_workspace_path(),
        }
    }
}

fn default_webhook_host() -> String {
    "0.0.0.0".to_string()
}

fn default_webhook_port() -> u16 {
    8443
}

fn default_directory_timeout_secs() -> u64 {
    10
}

fn default_chunk_size() -> usize {
    5 // stays well under Telegram's per-message mention ceiling
}

fn default_interval_secs() -> u64 {
    3
}

fn default_max_pending_sends() -> usize {
    10_000
}

fn default_workspace_path() -> String {
    paths::data_dir().to_string_lossy().to_string()
}

/// Expand tilde (~) to home directory in paths
fn expand_tilde(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            return base_dirs
                .home_dir()
                .join(stripped)
                .to_string_lossy()
                .to_string();
        }
        tracing::warn!(
            path = %path,
            "Failed to expand tilde in path: could not determine home directory"
        );
    }
    path.to_string()
}

/// Parse a comma separated list of numeric ids from an env var
fn parse_id_list(var: &str, value: &str) -> Result<Vec<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("{} must be a comma separated list of ids, got: {}", var, s))
        })
        .collect()
}

impl Config {
    /// Find the config file, checking multiple locations in order:
    /// 1. TAGALL_CONFIG_PATH env var (if set)
    /// 2. ./config.toml (current directory - for development)
    /// 3. ~/.config/tagall/config.toml (XDG config dir)
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var("TAGALL_CONFIG_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let xdg_config = paths::config_file();
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    /// Load configuration from the first config file found, with environment variable overrides
    pub fn load() -> Result<Self> {
        Self::load_from(Self::find_config_file().as_deref())
    }

    /// Load configuration from `path` (or defaults when `None`), then apply env overrides and validate
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(config_path) => {
                tracing::info!(
                    path = %config_path.display(),
                    "Loading configuration from file"
                );
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                toml::from_str::<Config>(&content)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?
            }
            None => {
                tracing::info!("No config file found, using environment variables and defaults");
                Config {
                    telegram: TelegramConfig {
                        bot_token: String::new(),
                        webhook: None,
                    },
                    directory: DirectoryConfig {
                        api_url: String::new(),
                        timeout_secs: default_directory_timeout_secs(),
                    },
                    roles: RolesConfig::default(),
                    broadcast: BroadcastConfig::default(),
                    workspace: WorkspaceConfig::default(),
                }
            }
        };

        config.apply_env_overrides()?;
        config.workspace.path = expand_tilde(&config.workspace.path);
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = val;
        }
        if let Ok(val) = std::env::var("DIRECTORY_API_URL") {
            self.directory.api_url = val;
        }
        if let Ok(val) = std::env::var("DIRECTORY_TIMEOUT_SECS") {
            self.directory.timeout_secs = val.parse().with_context(|| {
                format!("DIRECTORY_TIMEOUT_SECS must be a number of seconds, got: {}", val)
            })?;
        }
        if let Ok(val) = std::env::var("TAGALL_OWNERS") {
            self.roles.owners = parse_id_list("TAGALL_OWNERS", &val)?;
        }
        if let Ok(val) = std::env::var("TAGALL_DND_USERS") {
            self.roles.dnd_users = parse_id_list("TAGALL_DND_USERS", &val)?;
        }
        if let Ok(val) = std::env::var("BROADCAST_INTERVAL_SECS") {
            self.broadcast.interval_secs = val.parse().with_context(|| {
                format!("BROADCAST_INTERVAL_SECS must be a number of seconds, got: {}", val)
            })?;
        }
        if let Ok(val) = std::env::var("WORKSPACE_PATH") {
            self.workspace.path = val;
        }
        if let Ok(url) = std::env::var("WEBHOOK_URL") {
            let webhook = self.telegram.webhook.get_or_insert_with(|| WebhookConfig {
                url: String::new(),
                host: default_webhook_host(),
                port: default_webhook_port(),
            });
            webhook.url = url;
        }
        if let Some(webhook) = self.telegram.webhook.as_mut() {
            if let Ok(val) = std::env::var("WEBHOOK_HOST") {
                webhook.host = val;
            }
            if let Ok(val) = std::env::var("WEBHOOK_PORT") {
                webhook.port = val.parse().with_context(|| {
                    format!("WEBHOOK_PORT must be a valid port number, got: {}", val)
                })?;
            }
        }
        Ok(())
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!(
                "telegram.bot_token is required (set in config.toml or TELEGRAM_BOT_TOKEN env var)"
            );
        }
        if self.directory.api_url.trim().is_empty() {
            anyhow::bail!(
                "directory.api_url is required (set in config.toml or DIRECTORY_API_URL env var)"
            );
        }
        if self.roles.owners.is_empty() {
            anyhow::bail!(
                "roles.owners must contain at least one user id (set in config.toml or TAGALL_OWNERS env var)"
            );
        }
        if self.broadcast.chunk_size == 0 {
            anyhow::bail!("broadcast.chunk_size must be greater than zero");
        }
        if self.broadcast.max_pending_sends == 0 {
            anyhow::bail!("broadcast.max_pending_sends must be greater than zero");
        }
        if let Some(webhook) = &self.telegram.webhook {
            if webhook.url.trim().is_empty() {
                anyhow::bail!(
                    "telegram.webhook.url must not be empty (set in config.toml or WEBHOOK_URL env var)"
                );
            }
        }
        Ok(())
    }

    pub fn owner_ids(&self) -> HashSet<UserId> {
        self.roles.owners.iter().copied().map(UserId).collect()
    }

    pub fn dnd_ids(&self) -> HashSet<UserId> {
        self.roles.dnd_users.iter().copied().map(UserId).collect()
    }

    /// Chunk size; a zero value is rejected by `validate`, this falls back to the default
    pub fn chunk_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.broadcast.chunk_size)
            .or_else(|| NonZeroUsize::new(default_chunk_size()))
            .unwrap_or(NonZeroUsize::MIN)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(self.broadcast.interval_secs)
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_secs(self.directory.timeout_secs)
    }

    /// Location of the SQLite role database
    pub fn roles_db_path(&self) -> PathBuf {
        Path::new(&self.workspace.path).join("roles.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Config {
        toml::from_str(
            r#"
[telegram]
bot_token = "123:abc"

[directory]
api_url = "http://directory.local"

[roles]
owners = [1]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = minimal();
        assert_eq!(config.broadcast.chunk_size, 5);
        assert_eq!(config.broadcast.interval_secs, 3);
        assert_eq!(config.directory.timeout_secs, 10);
        assert!(config.telegram.webhook.is_none());
        assert!(config.roles.dnd_users.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", minimal().telegram);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("123:abc"));
    }

    #[test]
    fn test_validate_requires_owner() {
        let mut config = minimal();
        config.roles.owners.clear();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("roles.owners"));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = minimal();
        config.broadcast.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_webhook_url() {
        let mut config = minimal();
        config.telegram.webhook = Some(WebhookConfig {
            url: " ".to_string(),
            host: default_webhook_host(),
            port: default_webhook_port(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_id_sets() {
        let mut config = minimal();
        config.roles.dnd_users = vec![5, 6, 5];
        assert_eq!(config.dnd_ids().len(), 2);
        assert!(config.owner_ids().contains(&UserId(1)));
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("X", " 1, -2 ,,3").unwrap(), vec![1, -2, 3]);
        assert!(parse_id_list("X", "1,abc").is_err());
    }

    #[test]
    fn test_roles_db_path() {
        let mut config = minimal();
        config.workspace.path = "/tmp/tagall".to_string();
        assert_eq!(config.roles_db_path(), PathBuf::from("/tmp/tagall/roles.db"));
    }
}
