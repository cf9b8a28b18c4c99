// ABOUTME: HTTP client for the participant directory service
// ABOUTME: Any upstream failure degrades to an empty participant set

use crate::metrics;
use crate::traits::{ChatId, ParticipantDirectory, Participants, UserId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Why a directory lookup produced no participants
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request timed out")]
    Timeout,

    #[error("directory transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("directory returned HTTP {0}")]
    Status(u16),

    #[error("directory response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

impl DirectoryError {
    /// Short label used for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            DirectoryError::Timeout => "timeout",
            DirectoryError::Transport(_) => "transport",
            DirectoryError::Status(_) => "status",
            DirectoryError::Decode(_) => "decode",
        }
    }
}

#[derive(Clone)]
pub struct DirectoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl DirectoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build directory HTTP client: {}", e))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Look up the participants of `chat_id`, surfacing why a lookup failed.
    ///
    /// Only HTTP 200 is a success. Keys that are not the canonical decimal
    /// form of a user id (`"11"`, not `"011"` or `" 11"`) are skipped, so
    /// two spellings of one id can never merge.
    pub async fn lookup(&self, chat_id: ChatId) -> Result<Participants, DirectoryError> {
        let url = format!("{}/get", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("chat_id", chat_id.0)])
            .send()
            .await
            .map_err(classify)?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(DirectoryError::Status(response.status().as_u16()));
        }

        let raw: BTreeMap<String, String> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Timeout
            } else {
                DirectoryError::Decode(e)
            }
        })?;

        let mut participants = Participants::new();
        for (key, name) in raw {
            match key.parse::<i64>() {
                Ok(id) if id.to_string() == key => {
                    participants.insert(UserId(id), name);
                }
                Ok(_) => {
                    tracing::debug!(chat_id = %chat_id, key = %key, "Skipping non-canonical participant id");
                }
                Err(_) => {
                    tracing::debug!(chat_id = %chat_id, key = %key, "Skipping non-numeric participant id");
                }
            }
        }
        Ok(participants)
    }
}

fn classify(e: reqwest::Error) -> DirectoryError {
    if e.is_timeout() {
        DirectoryError::Timeout
    } else {
        DirectoryError::Transport(e)
    }
}

#[async_trait]
impl ParticipantDirectory for DirectoryClient {
    async fn fetch(&self, chat_id: ChatId) -> Participants {
        match self.lookup(chat_id).await {
            Ok(participants) => {
                metrics::record_directory_lookup("ok");
                tracing::debug!(
                    chat_id = %chat_id,
                    count = participants.len(),
                    "Fetched chat participants"
                );
                participants
            }
            Err(e) => {
                metrics::record_directory_lookup(e.reason());
                tracing::warn!(
                    chat_id = %chat_id,
                    reason = e.reason(),
                    error = %e,
                    "Participant directory lookup failed, treating chat as empty"
                );
                Participants::new()
            }
        }
    }
}
