//! Notifications addressed to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use storedesk_core::{NotificationId, NotificationType, UserId};

use super::{Populated, UserRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: NotificationId,
    pub user: Populated<UserRef>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub metadata: Option<Json<serde_json::Value>>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub user: Option<UserId>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub is_read: Option<bool>,
}

impl Validate for NotificationPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("user", self.user.as_ref());
        v.required("type", self.kind.as_ref());
        v.required_text("title", self.title.as_deref(), 1, 255);
        v.required_text("message", self.message.as_deref(), 1, 2000);
        v.object("metadata", self.metadata.as_ref());
        v.finish()
    }
}

/// Number of notifications changed by a bulk mark-as-read.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub modified_count: u64,
}
