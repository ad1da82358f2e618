//! Recording activity-log entries for API mutations and logins.

use sqlx::PgPool;

use storedesk_core::{ActivityAction, UserId};

use crate::db::activity_logs;
use crate::models::activity_log::NewActivity;

/// Where a request came from, as logged with each entry.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Build an entry for `action` on one record.
    #[must_use]
    pub fn entry(
        &self,
        user: Option<UserId>,
        action: ActivityAction,
        entity_type: &'static str,
        entity_id: Option<i32>,
    ) -> NewActivity {
        NewActivity {
            user,
            action,
            entity_type,
            entity_id,
            description: describe(action, entity_type, entity_id),
            metadata: None,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Human-readable summary, e.g. `created category #4`.
#[must_use]
pub fn describe(action: ActivityAction, entity_type: &str, entity_id: Option<i32>) -> String {
    let verb = match action {
        ActivityAction::Create => "created",
        ActivityAction::Update => "updated",
        ActivityAction::Delete => "deleted",
        ActivityAction::Login => "logged in as",
    };
    match entity_id {
        Some(id) => format!("{verb} {entity_type} #{id}"),
        None => format!("{verb} {entity_type}"),
    }
}

/// Insert an entry. Failures are logged and swallowed.
pub async fn record(pool: &PgPool, entry: NewActivity) {
    let action = entry.action;
    let entity_type = entry.entity_type;
    let entity_id = entry.entity_id;
    if let Err(e) = activity_logs::insert(pool, entry).await {
        tracing::warn!(
            error = %e,
            %action,
            entity_type,
            ?entity_id,
            "Failed to record activity"
        );
    }
}
