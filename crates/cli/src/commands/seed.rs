//! Seed reference data from a YAML file.
//!
//! ```yaml
//! categories:
//!   - category_name: Tea
//!     level: 1
//! brands:
//!   - brand_name: Leaf & Co
//! locations:
//!   - name: Main warehouse
//!     city: Da Nang
//!     country: VN
//! coupons:
//!   - code: WELCOME10
//!     type: percentage
//!     value: 10
//!     startDate: 2026-01-01T00:00:00Z
//!     endDate: 2026-12-31T23:59:59Z
//! ```
//!
//! Entries use the same field names as the REST API. Entries whose unique
//! name (or coupon code) already exists are skipped, so the command can be
//! re-run safely.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use storedesk_admin::db::brands::Brands;
use storedesk_admin::db::categories::Categories;
use storedesk_admin::db::coupons::Coupons;
use storedesk_admin::db::locations::Locations;
use storedesk_admin::db::resource::{self, Writable};
use storedesk_admin::db::RepositoryError;
use storedesk_admin::models::brand::BrandPayload;
use storedesk_admin::models::category::CategoryPayload;
use storedesk_admin::models::coupon::CouponPayload;
use storedesk_admin::models::location::LocationPayload;
use storedesk_admin::validation::{Mode, Validate, ValidationErrors};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid {entity} #{index}: {errors}")]
    Invalid {
        entity: &'static str,
        index: usize,
        errors: ValidationErrors,
    },

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Contents of a seed file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedFile {
    pub categories: Vec<CategoryPayload>,
    pub brands: Vec<BrandPayload>,
    pub locations: Vec<LocationPayload>,
    pub coupons: Vec<CouponPayload>,
}

impl SeedFile {
    /// Parse and validate every entry before anything is written.
    pub fn parse(content: &str) -> Result<Self, SeedError> {
        let file: Self = serde_yaml::from_str(content)?;
        check_all("category", &file.categories)?;
        check_all("brand", &file.brands)?;
        check_all("location", &file.locations)?;
        check_all("coupon", &file.coupons)?;
        Ok(file)
    }

    const fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.brands.is_empty()
            && self.locations.is_empty()
            && self.coupons.is_empty()
    }
}

fn check_all<P: Validate>(entity: &'static str, payloads: &[P]) -> Result<(), SeedError> {
    for (index, payload) in payloads.iter().enumerate() {
        payload
            .validate(Mode::Create)
            .map_err(|errors| SeedError::Invalid {
                entity,
                index: index + 1,
                errors,
            })?;
    }
    Ok(())
}

/// Outcome of seeding one section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedCount {
    pub inserted: usize,
    pub skipped: usize,
}

async fn seed_section<R: Writable>(
    pool: &sqlx::PgPool,
    payloads: Vec<R::Payload>,
) -> Result<SeedCount, SeedError> {
    let mut count = SeedCount::default();

    'entries: for payload in payloads {
        for key in R::unique_keys(&payload) {
            match resource::ensure_unique(pool, R::TABLE, &key, None).await {
                Ok(()) => {}
                Err(RepositoryError::Conflict(reason)) => {
                    info!(entity = R::NAME, %reason, "Skipping existing record");
                    count.skipped += 1;
                    continue 'entries;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let id = R::insert(pool, payload).await?;
        info!(entity = R::NAME, id = %id, "Inserted");
        count.inserted += 1;
    }

    Ok(count)
}

/// Seed the database from `path`.
pub async fn run(path: &Path) -> Result<(), SeedError> {
    if !path.exists() {
        return Err(SeedError::NotFound(path.display().to_string()));
    }

    info!(path = %path.display(), "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let file = SeedFile::parse(&content)?;

    if file.is_empty() {
        info!("Seed file has no entries, nothing to do");
        return Ok(());
    }

    let pool = connect().await?;

    // Categories first so products created later can reference them.
    let categories = seed_section::<Categories>(&pool, file.categories).await?;
    let brands = seed_section::<Brands>(&pool, file.brands).await?;
    let locations = seed_section::<Locations>(&pool, file.locations).await?;
    let coupons = seed_section::<Coupons>(&pool, file.coupons).await?;

    info!("Seeding complete!");
    for (entity, count) in [
        ("categories", categories),
        ("brands", brands),
        ("locations", locations),
        ("coupons", coupons),
    ] {
        info!(
            entity,
            inserted = count.inserted,
            skipped = count.skipped,
            "Summary"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_file() {
        let file = SeedFile::parse(
            r"
categories:
  - category_name: Tea
    level: 1
brands:
  - brand_name: Leaf & Co
coupons:
  - code: WELCOME10
    type: percentage
    value: 10
    startDate: 2026-01-01T00:00:00Z
    endDate: 2026-12-31T23:59:59Z
",
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(file.categories.len(), 1);
        assert_eq!(file.brands.len(), 1);
        assert!(file.locations.is_empty());
        assert_eq!(file.coupons.first().and_then(|c| c.code.as_deref()), Some("WELCOME10"));
    }

    #[test]
    fn test_parse_reports_invalid_entry() {
        let err = SeedFile::parse("brands:\n  - brand_name: Ok\n  - description: missing name\n")
            .unwrap_err();
        match err {
            SeedError::Invalid { entity, index, .. } => {
                assert_eq!(entity, "brand");
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(matches!(
            SeedFile::parse("products:\n  - name: Oolong\n"),
            Err(SeedError::Yaml(_))
        ));
    }

    #[test]
    fn test_empty_file() {
        let file = SeedFile::parse("{}").unwrap_or_else(|e| panic!("{e}"));
        assert!(file.is_empty());
    }
}
