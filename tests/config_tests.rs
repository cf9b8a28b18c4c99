// ABOUTME: Tests for configuration loading and validation
// ABOUTME: Verifies TOML parsing, env var overrides, and required field validation

use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tagall::config::Config;
use tagall::traits::UserId;

const CONFIG_ENV_VARS: &[&str] = &[
    "TAGALL_CONFIG_PATH",
    "TELEGRAM_BOT_TOKEN",
    "DIRECTORY_API_URL",
    "DIRECTORY_TIMEOUT_SECS",
    "TAGALL_OWNERS",
    "TAGALL_DND_USERS",
    "WEBHOOK_URL",
    "WEBHOOK_HOST",
    "WEBHOOK_PORT",
    "BROADCAST_INTERVAL_SECS",
    "WORKSPACE_PATH",
];

/// Helper to clear all config-related env vars
fn clear_config_env_vars() {
    for var in CONFIG_ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let config_path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    config_path
}

const FULL_CONFIG: &str = r#"
[telegram]
bot_token = "123456:file-token"

[telegram.webhook]
url = "https://bot.example.com/hooks"
port = 9443

[directory]
api_url = "http://directory.internal:5000"
timeout_secs = 4

[roles]
owners = [11, 12]
dnd_users = [40]

[broadcast]
chunk_size = 7
interval_secs = 2
max_pending_sends = 500

[workspace]
path = "/srv/tagall"
"#;

#[test]
#[serial]
fn test_config_loads_from_toml_file() {
    clear_config_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&temp_dir, FULL_CONFIG);

    std::env::set_var("TAGALL_CONFIG_PATH", &config_path);
    let config = Config::load().unwrap();

    assert_eq!(config.telegram.bot_token, "123456:file-token");
    let webhook = config.telegram.webhook.as_ref().unwrap();
    assert_eq!(webhook.url, "https://bot.example.com/hooks");
    assert_eq!(webhook.host, "0.0.0.0");
    assert_eq!(webhook.port, 9443);
    assert_eq!(config.directory.api_url, "http://directory.internal:5000");
    assert_eq!(config.directory_timeout(), Duration::from_secs(4));
    assert!(config.owner_ids().contains(&UserId(12)));
    assert!(config.dnd_ids().contains(&UserId(40)));
    assert_eq!(config.chunk_size().get(), 7);
    assert_eq!(config.broadcast_interval(), Duration::from_secs(2));
    assert_eq!(config.broadcast.max_pending_sends, 500);
    assert_eq!(config.roles_db_path(), PathBuf::from("/srv/tagall/roles.db"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_env_var_overrides() {
    clear_config_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&temp_dir, FULL_CONFIG);

    std::env::set_var("TELEGRAM_BOT_TOKEN", "654321:env-token");
    std::env::set_var("DIRECTORY_API_URL", "http://other-directory:5000");
    std::env::set_var("TAGALL_OWNERS", "1, 2,3");
    std::env::set_var("TAGALL_DND_USERS", "");
    std::env::set_var("BROADCAST_INTERVAL_SECS", "9");
    std::env::set_var("WEBHOOK_PORT", "8080");

    let config = Config::load_from(Some(config_path.as_path())).unwrap();

    assert_eq!(config.telegram.bot_token, "654321:env-token");
    assert_eq!(config.directory.api_url, "http://other-directory:5000");
    assert_eq!(config.roles.owners, vec![1, 2, 3]);
    assert!(config.roles.dnd_users.is_empty());
    assert_eq!(config.broadcast_interval(), Duration::from_secs(9));
    assert_eq!(config.telegram.webhook.as_ref().unwrap().port, 8080);

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_from_env_only_uses_polling() {
    clear_config_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();

    std::env::set_var("TELEGRAM_BOT_TOKEN", "654321:env-token");
    std::env::set_var("DIRECTORY_API_URL", "http://directory:5000");
    std::env::set_var("TAGALL_OWNERS", "77");
    std::env::set_var("WORKSPACE_PATH", temp_dir.path());

    let config = Config::load_from(None).unwrap();

    assert!(config.telegram.webhook.is_none());
    assert_eq!(config.chunk_size().get(), 5);
    assert_eq!(config.broadcast_interval(), Duration::from_secs(3));
    assert_eq!(config.directory_timeout(), Duration::from_secs(10));
    assert_eq!(config.roles_db_path(), temp_dir.path().join("roles.db"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_webhook_url_env_enables_webhook_mode() {
    clear_config_env_vars();

    std::env::set_var("TELEGRAM_BOT_TOKEN", "654321:env-token");
    std::env::set_var("DIRECTORY_API_URL", "http://directory:5000");
    std::env::set_var("TAGALL_OWNERS", "77");
    std::env::set_var("WEBHOOK_URL", "https://bot.example.com");
    std::env::set_var("WEBHOOK_HOST", "127.0.0.1");

    let config = Config::load_from(None).unwrap();
    let webhook = config.telegram.webhook.unwrap();
    assert_eq!(webhook.url, "https://bot.example.com");
    assert_eq!(webhook.host, "127.0.0.1");
    assert_eq!(webhook.port, 8443);

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_missing_token_is_rejected() {
    clear_config_env_vars();

    std::env::set_var("DIRECTORY_API_URL", "http://directory:5000");
    std::env::set_var("TAGALL_OWNERS", "77");

    let err = Config::load_from(None).unwrap_err();
    assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_bad_owner_list_is_rejected() {
    clear_config_env_vars();

    std::env::set_var("TELEGRAM_BOT_TOKEN", "654321:env-token");
    std::env::set_var("DIRECTORY_API_URL", "http://directory:5000");
    std::env::set_var("TAGALL_OWNERS", "77,not-a-number");

    let err = Config::load_from(None).unwrap_err();
    assert!(format!("{:#}", err).contains("TAGALL_OWNERS"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_malformed_toml_is_rejected() {
    clear_config_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&temp_dir, "[telegram\nbot_token = ");

    let err = Config::load_from(Some(config_path.as_path())).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}
