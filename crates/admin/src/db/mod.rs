//! Database operations for the back-office `PostgreSQL` schema.
//!
//! # Schema: `shop`
//!
//! One table per entity (`users`, `categories`, `brands`, `vendors`,
//! `products`, `product_attributes`, `product_variants`, `locations`,
//! `product_inventories`, `addresses`, `carts`, `orders`, `payments`,
//! `payment_methods`, `coupons`, `notifications`, `activity_logs`).
//! Embedded documents (line items, addresses, metadata) are `JSONB`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p storedesk-cli -- migrate
//! ```

pub mod activity_logs;
pub mod addresses;
pub mod brands;
pub mod carts;
pub mod categories;
pub mod coupons;
pub mod inventories;
pub mod locations;
pub mod notifications;
pub mod orders;
pub mod payment_methods;
pub mod payments;
pub mod product_attributes;
pub mod product_variants;
pub mod products;
pub mod resource;
pub mod users;
pub mod vendors;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::validation::ValidationErrors;

pub use resource::{Filter, FilterKind, ListQuery, Resource, Writable};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The merged record breaks a business rule.
    #[error("invalid record: {0}")]
    Invalid(ValidationErrors),

    /// A password could not be hashed before storing it.
    #[error("password hashing failed")]
    PasswordHash,
}

impl From<ValidationErrors> for RepositoryError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// Map a failed write to a repository error.
///
/// Unique violations become [`RepositoryError::Conflict`] and foreign-key
/// violations become [`RepositoryError::Invalid`] naming the missing
/// reference.
pub(crate) fn map_write_error(err: sqlx::Error, entity: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            if db_err.constraint().is_some_and(|c| c.ends_with("_default_key")) {
                return RepositoryError::Conflict(format!(
                    "another default {entity} was set at the same time"
                ));
            }
            return RepositoryError::Conflict(format!("{entity} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            let field = db_err
                .constraint()
                .and_then(reference_field)
                .unwrap_or("reference");
            return RepositoryError::Invalid(ValidationErrors::single(
                field,
                format!("{field} does not exist"),
            ));
        }
        if db_err.is_check_violation() {
            return RepositoryError::Invalid(ValidationErrors::single(
                entity,
                format!("{entity} violates constraint {}", db_err.constraint().unwrap_or("check")),
            ));
        }
    }
    RepositoryError::Database(err)
}

/// Map a failed delete to a repository error.
///
/// A foreign-key violation means other records still point at this one.
pub(crate) fn map_delete_error(err: sqlx::Error, entity: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(format!("{entity} is still referenced by other records"));
    }
    RepositoryError::Database(err)
}

/// Payload field name for a foreign-key constraint.
///
/// Constraints are named `<table>_<column>_fkey` by `PostgreSQL`; the
/// payload field is the column without its `_id` suffix, in camelCase.
fn reference_field(constraint: &str) -> Option<&'static str> {
    const FIELDS: &[(&str, &str)] = &[
        ("_user_id_fkey", "user"),
        ("_category_id_fkey", "category"),
        ("_brand_id_fkey", "brand"),
        ("_vendor_id_fkey", "vendor"),
        ("_product_id_fkey", "product"),
        ("_variant_id_fkey", "variant"),
        ("_location_id_fkey", "location"),
        ("_order_id_fkey", "order"),
    ];
    FIELDS
        .iter()
        .find(|(suffix, _)| constraint.ends_with(suffix))
        .map(|(_, field)| *field)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_field() {
        assert_eq!(reference_field("products_category_id_fkey"), Some("category"));
        assert_eq!(
            reference_field("product_inventories_variant_id_fkey"),
            Some("variant")
        );
        assert_eq!(reference_field("carts_user_id_key"), None);
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_write_error(sqlx::Error::RowNotFound, "brand");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }
}
