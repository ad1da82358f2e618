//! User notifications.

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::{NotificationId, UserId};

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::notification::{Notification, NotificationPayload};

pub struct Notifications;

impl Resource for Notifications {
    type Id = NotificationId;
    type Record = Notification;

    const NAME: &'static str = "notification";
    const COLLECTION: &'static str = "notifications";
    const TABLE: &'static str = "shop.notifications";
    const ALIAS: &'static str = "n";
    const SELECT: &'static str = r#"SELECT n.id,
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        n.type AS kind, n.title, n.message, n.metadata, n.is_read, n.created_at, n.updated_at
        FROM shop.notifications n
        LEFT JOIN shop.users u ON u.id = n.user_id"#;
    const SEARCH: Option<&'static str> = Some("n.title");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[("title", "n.title")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("title", "n.title", FilterKind::Contains),
        Filter::new("type", "n.type", FilterKind::Enum),
        Filter::new("isRead", "n.is_read", FilterKind::Bool),
        Filter::new("user", "n.user_id", FilterKind::Id),
    ];

    fn id(record: &Notification) -> NotificationId {
        record.id
    }
}

impl Writable for Notifications {
    type Payload = NotificationPayload;

    fn unique_keys(_payload: &NotificationPayload) -> Vec<UniqueKey> {
        Vec::new()
    }

    async fn insert(
        pool: &PgPool,
        payload: NotificationPayload,
    ) -> Result<NotificationId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.notifications (user_id, type, title, message, metadata, is_read)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(payload.user)
        .bind(payload.kind)
        .bind(payload.title)
        .bind(payload.message)
        .bind(payload.metadata.map(Json))
        .bind(payload.is_read.unwrap_or(false))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "notification"))?;

        Ok(NotificationId::new(id))
    }

    async fn update(
        pool: &PgPool,
        id: NotificationId,
        payload: NotificationPayload,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.notifications SET
                user_id = COALESCE($2, user_id),
                type = COALESCE($3, type),
                title = COALESCE($4, title),
                message = COALESCE($5, message),
                metadata = COALESCE($6, metadata),
                is_read = COALESCE($7, is_read)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.user)
        .bind(payload.kind)
        .bind(payload.title)
        .bind(payload.message)
        .bind(payload.metadata.map(Json))
        .bind(payload.is_read)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "notification"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Mark one notification read.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if there is no such notification.
pub async fn mark_read(pool: &PgPool, id: NotificationId) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE shop.notifications SET is_read = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Mark all unread notifications of a user read, returning how many changed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn mark_all_read(pool: &PgPool, user: UserId) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
    )
    .bind(user)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
