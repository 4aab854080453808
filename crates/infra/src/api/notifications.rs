//! Notification commands
//!
//! Notifications ride on the same API client (and session cookies) as the
//! account endpoints but sit outside the auth core.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use opencircle_domain::Result;
use serde::Deserialize;
use serde_with::{serde_as, BoolFromInt};
use tracing::instrument;

use super::client::ApiClient;

const NOTIFICATIONS_PATH: &str = "/notification/";

/// A notification delivered to the current account
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    pub link: Option<String>,
    #[serde_as(as = "BoolFromInt")]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// High-level command interface for notification operations
pub struct NotificationCommands {
    client: Arc<ApiClient>,
}

impl NotificationCommands {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List notifications for the current session
    ///
    /// # Errors
    /// Returns error if the request fails
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Notification>> {
        self.client.get_json(NOTIFICATIONS_PATH).await
    }

    /// Mark a notification as read
    ///
    /// # Errors
    /// Returns error if the request fails
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: i64) -> Result<()> {
        self.client.put_empty(&format!("/notification/{id}/read")).await
    }
}
