//! Audit trail of changes made through the API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;

use storedesk_core::{ActivityAction, ActivityLogId, UserId};

use super::{Populated, UserRef};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    #[serde(rename = "_id")]
    pub id: ActivityLogId,
    pub user: Populated<UserRef>,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: Option<i32>,
    pub description: Option<String>,
    pub metadata: Option<Json<serde_json::Value>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new audit entry.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user: Option<UserId>,
    pub action: ActivityAction,
    pub entity_type: &'static str,
    pub entity_id: Option<i32>,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
