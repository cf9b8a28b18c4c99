// ABOUTME: Telegram platform: bot identity, reply sender, and update sources
// ABOUTME: Updates arrive by long polling or by webhook and are routed to the MessageHandler

pub mod channel;
pub mod updates;
pub mod webhook;

pub use channel::TelegramSender;
pub use updates::{to_incoming, UpdateRouter};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tagall_core::config::{TelegramConfig, WebhookConfig};
use tagall_core::MessageHandler;
use teloxide::prelude::*;

/// Long polling timeout passed to getUpdates
const POLL_TIMEOUT_SECS: u32 = 30;
/// Wait after a failed getUpdates call
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Authenticated Telegram bot
pub struct TelegramPlatform {
    bot: Bot,
    token: String,
    bot_user_id: u64,
    bot_username: String,
}

impl TelegramPlatform {
    /// Create the bot and resolve its identity via `getMe`
    pub async fn connect(config: &TelegramConfig) -> Result<Self> {
        // The HTTP timeout must outlast a long poll
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(u64::from(POLL_TIMEOUT_SECS) + 10))
            .build()
            .context("Failed to build Telegram HTTP client")?;
        let bot = Bot::with_client(&config.bot_token, client);

        let me = bot.get_me().await.context("Failed to call Telegram getMe")?;
        let bot_user_id = me.id.0;
        let bot_username = me.username().to_string();

        tracing::info!(
            bot_username = %bot_username,
            bot_id = bot_user_id,
            "Telegram bot authenticated"
        );

        Ok(Self {
            bot,
            token: config.bot_token.clone(),
            bot_user_id,
            bot_username,
        })
    }

    pub fn sender(&self) -> TelegramSender {
        TelegramSender::new(self.bot.clone())
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    pub fn router(&self, handler: Arc<MessageHandler>) -> UpdateRouter {
        UpdateRouter::new(handler, self.bot_user_id)
    }

    /// Receive updates until the update source fails.
    ///
    /// A configured webhook selects webhook mode; otherwise long polling.
    pub async fn run(&self, router: UpdateRouter, webhook: Option<&WebhookConfig>) -> Result<()> {
        match webhook {
            Some(webhook) => self.run_webhook(router, webhook).await,
            None => self.run_polling(router).await,
        }
    }

    async fn run_polling(&self, router: UpdateRouter) -> Result<()> {
        // getUpdates is refused while a webhook is set
        self.bot
            .delete_webhook()
            .await
            .context("Failed to delete Telegram webhook")?;
        tracing::info!(platform = "telegram", "Starting long polling");

        let mut offset: i32 = 0;
        loop {
            let updates = match self
                .bot
                .get_updates()
                .offset(offset)
                .timeout(POLL_TIMEOUT_SECS)
                .await
            {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!(
                        platform = "telegram",
                        error = %e,
                        "Long polling error, retrying in 5s"
                    );
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = update.id.as_offset();
                router.route(update);
            }
        }
    }

    async fn run_webhook(&self, router: UpdateRouter, webhook: &WebhookConfig) -> Result<()> {
        let url = webhook::webhook_url(&webhook.url, &self.token)?;
        self.bot
            .set_webhook(url)
            .await
            .context("Failed to set Telegram webhook")?;
        // The registered URL embeds the token, so only the base is logged
        tracing::info!(platform = "telegram", url = %webhook.url, "Webhook registered");

        let app = webhook::webhook_router(&self.token, router);
        webhook::start_webhook_server(&webhook.host, webhook.port, app).await
    }
}
