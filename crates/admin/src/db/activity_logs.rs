//! Activity log: read-only over HTTP, written by the API itself.

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::ActivityLogId;

use super::RepositoryError;
use super::resource::{Filter, FilterKind, Resource};
use crate::models::activity_log::{ActivityLog, NewActivity};

pub struct ActivityLogs;

impl Resource for ActivityLogs {
    type Id = ActivityLogId;
    type Record = ActivityLog;

    const NAME: &'static str = "activity log";
    const COLLECTION: &'static str = "activityLogs";
    const TABLE: &'static str = "shop.activity_logs";
    const ALIAS: &'static str = "al";
    const SELECT: &'static str = r#"SELECT al.id,
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        al.action, al.entity_type, al.entity_id, al.description, al.metadata,
        al.ip_address, al.user_agent, al.created_at, al.updated_at
        FROM shop.activity_logs al
        LEFT JOIN shop.users u ON u.id = al.user_id"#;
    const SEARCH: Option<&'static str> = Some("al.description");
    const SORTABLE: &'static [(&'static str, &'static str)] =
        &[("action", "al.action"), ("entityType", "al.entity_type")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("action", "al.action", FilterKind::Enum),
        Filter::new("entityType", "al.entity_type", FilterKind::Equals),
        Filter::new("entityId", "al.entity_id", FilterKind::Id),
        Filter::new("user", "al.user_id", FilterKind::Id),
    ];

    fn id(record: &ActivityLog) -> ActivityLogId {
        record.id
    }
}

/// Append an entry.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(pool: &PgPool, entry: NewActivity) -> Result<ActivityLogId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO shop.activity_logs
            (user_id, action, entity_type, entity_id, description, metadata, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        ",
    )
    .bind(entry.user)
    .bind(entry.action)
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.description)
    .bind(entry.metadata.map(Json))
    .bind(entry.ip_address)
    .bind(entry.user_agent)
    .fetch_one(pool)
    .await?;
    Ok(ActivityLogId::new(id))
}
