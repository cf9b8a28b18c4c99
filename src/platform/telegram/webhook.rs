// ABOUTME: HTTP webhook server receiving Telegram updates
// ABOUTME: Telegram posts each update to POST /{bot_token}; handling runs on spawned tasks

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use teloxide::types::Update;

use super::updates::UpdateRouter;

#[derive(Clone)]
struct WebhookState {
    token: String,
    router: UpdateRouter,
}

/// Build the webhook router; only the bot's own token path accepts updates
pub fn webhook_router(token: &str, router: UpdateRouter) -> Router {
    let state = WebhookState {
        token: token.to_string(),
        router,
    };
    Router::new()
        .route("/{token}", post(receive_update))
        .with_state(Arc::new(state))
}

/// Public URL Telegram should post updates to
pub fn webhook_url(base: &str, token: &str) -> Result<url::Url> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), token);
    url::Url::parse(&raw).with_context(|| format!("Invalid webhook URL: {}", base))
}

/// Serve the webhook router until the listener fails
pub async fn start_webhook_server(host: &str, port: u16, app: Router) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    tracing::info!(addr = %addr, "Starting Telegram webhook server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind webhook server to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn receive_update(
    State(state): State<Arc<WebhookState>>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> StatusCode {
    if token != state.token {
        tracing::warn!(platform = "telegram", "Webhook request with unknown token path");
        return StatusCode::NOT_FOUND;
    }
    state.router.route(update);
    StatusCode::OK
}
