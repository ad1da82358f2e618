//! Shared CRUD machinery for back-office entities.
//!
//! Each entity implements [`Resource`] (read side: table, projection,
//! sortable columns, filters) and usually [`Writable`] (validated inserts and
//! partial updates). The list/get/delete queries here are written once and
//! reused by every entity.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use storedesk_core::InvalidId;
use storedesk_core::{Page, PageRequest, SortDirection};

use super::{RepositoryError, map_delete_error};
use crate::validation::{Validate, ValidationErrors};

/// Keyword search bounds, in characters.
const KEYWORD_MIN: usize = 3;
const KEYWORD_MAX: usize = 50;

/// How a query-string filter is matched against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    Contains,
    /// Exact text match.
    Equals,
    /// Enum column compared by its text value.
    Enum,
    /// `true`/`false`.
    Bool,
    /// Referenced record id.
    Id,
}

/// A query-string parameter that narrows a list.
#[derive(Debug, Clone, Copy)]
pub struct Filter {
    /// Query-string parameter name.
    pub param: &'static str,
    /// Qualified column (`alias.column`).
    pub column: &'static str,
    pub kind: FilterKind,
}

impl Filter {
    #[must_use]
    pub const fn new(param: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self {
            param,
            column,
            kind,
        }
    }
}

/// Read side of an entity.
pub trait Resource: Send + Sync + 'static {
    /// Typed primary key.
    type Id: Copy + Into<i32> + FromStr<Err = InvalidId> + Display + Send + Sync;

    /// Row returned to clients, with references populated.
    type Record: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static;

    /// Singular name used in messages and the activity log (`category`).
    const NAME: &'static str;
    /// Key of the list in list responses (`categories`).
    const COLLECTION: &'static str;
    /// Table, schema-qualified (`shop.categories`).
    const TABLE: &'static str;
    /// Alias of the table inside [`Self::SELECT`].
    const ALIAS: &'static str;
    /// Projection with joins, without a `WHERE` clause.
    const SELECT: &'static str;
    /// Column matched by `keyword`, if the entity supports search.
    const SEARCH: Option<&'static str>;
    /// `sort_by` values besides `createdAt`/`updatedAt`, mapped to columns.
    const SORTABLE: &'static [(&'static str, &'static str)];
    /// Query-string filters.
    const FILTERS: &'static [Filter];

    /// Primary key of a record.
    fn id(record: &Self::Record) -> Self::Id;

    /// Fill in fields derived after loading.
    fn present(record: Self::Record) -> Self::Record {
        record
    }
}

/// A value that must be unique across the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    /// Column holding the value.
    pub column: &'static str,
    /// Payload field name, for the error message.
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    #[must_use]
    pub fn new(column: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            field,
            value: value.into(),
        }
    }
}

/// Write side of an entity.
pub trait Writable: Resource {
    /// Body of `POST` and `PUT` requests.
    type Payload: DeserializeOwned + Validate + Send + 'static;

    /// Values in the payload that must not collide with another record.
    fn unique_keys(payload: &Self::Payload) -> Vec<UniqueKey>;

    /// Insert a new record, returning its id.
    fn insert(
        pool: &PgPool,
        payload: Self::Payload,
    ) -> impl Future<Output = Result<Self::Id, RepositoryError>> + Send;

    /// Apply a partial update. Absent fields keep their stored value.
    fn update(
        pool: &PgPool,
        id: Self::Id,
        payload: Self::Payload,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Parsed value of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterValue {
    Pattern(String),
    Text(String),
    Enum(String),
    Bool(bool),
    Id(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    column: &'static str,
    value: FilterValue,
}

/// Validated list parameters: paging, sorting, keyword and filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    page: PageRequest,
    sort_column: String,
    direction: SortDirection,
    conditions: Vec<Condition>,
}

impl ListQuery {
    /// Parse list parameters for resource `R` from the raw query string map.
    ///
    /// Empty values are ignored. Unknown parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns field errors for malformed `page`/`limit`, an unknown
    /// `sort_by`, a bad `sort_type`, an out-of-range `keyword`, or a filter
    /// value of the wrong type.
    pub fn parse<R: Resource>(params: &HashMap<String, String>) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();
        let param = |name: &str| {
            params
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let page = parse_number(param("page"), "page", &mut errors);
        let limit = parse_number(param("limit"), "limit", &mut errors);
        let page = match PageRequest::new(page, limit) {
            Ok(page) => page,
            Err(e) => {
                let field = if matches!(e, storedesk_core::PaginationError::InvalidPage) {
                    "page"
                } else {
                    "limit"
                };
                errors.push(field_error(field, e.to_string()));
                PageRequest::default()
            }
        };

        let sort_by = param("sort_by").unwrap_or("createdAt");
        let sort_column = sort_column::<R>(sort_by).unwrap_or_else(|| {
            errors.push(field_error(
                "sort_by",
                format!("sort_by must be one of: {}", sortable_names::<R>().join(", ")),
            ));
            format!("{}.created_at", R::ALIAS)
        });

        let direction = match param("sort_type").map(str::parse::<SortDirection>) {
            None => SortDirection::default(),
            Some(Ok(direction)) => direction,
            Some(Err(e)) => {
                errors.push(field_error("sort_type", e.to_string()));
                SortDirection::default()
            }
        };

        let mut conditions = Vec::new();

        if let Some(keyword) = param("keyword") {
            let len = keyword.chars().count();
            match R::SEARCH {
                None => errors.push(field_error(
                    "keyword",
                    format!("{} does not support keyword search", R::COLLECTION),
                )),
                Some(_) if !(KEYWORD_MIN..=KEYWORD_MAX).contains(&len) => {
                    errors.push(field_error(
                        "keyword",
                        format!(
                            "keyword must be between {KEYWORD_MIN} and {KEYWORD_MAX} characters"
                        ),
                    ));
                }
                Some(column) => conditions.push(Condition {
                    column,
                    value: FilterValue::Pattern(like_pattern(keyword)),
                }),
            }
        }

        for filter in R::FILTERS {
            let Some(raw) = param(filter.param) else {
                continue;
            };
            let value = match filter.kind {
                FilterKind::Contains => Some(FilterValue::Pattern(like_pattern(raw))),
                FilterKind::Equals => Some(FilterValue::Text(raw.to_owned())),
                FilterKind::Enum => Some(FilterValue::Enum(raw.to_owned())),
                FilterKind::Bool => match raw {
                    "true" | "1" => Some(FilterValue::Bool(true)),
                    "false" | "0" => Some(FilterValue::Bool(false)),
                    _ => {
                        errors.push(field_error(
                            filter.param,
                            format!("{} must be true or false", filter.param),
                        ));
                        None
                    }
                },
                FilterKind::Id => match raw.parse::<i32>() {
                    Ok(id) if id > 0 => Some(FilterValue::Id(id)),
                    _ => {
                        errors.push(field_error(
                            filter.param,
                            format!("{} must be a valid id", filter.param),
                        ));
                        None
                    }
                },
            };
            if let Some(value) = value {
                conditions.push(Condition {
                    column: filter.column,
                    value,
                });
            }
        }

        if !errors.is_empty() {
            return Err(ValidationErrors { errors });
        }

        Ok(Self {
            page,
            sort_column,
            direction,
            conditions,
        })
    }

    /// Requested page.
    #[must_use]
    pub const fn page(&self) -> PageRequest {
        self.page
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(condition.column);
            match &condition.value {
                FilterValue::Pattern(pattern) => {
                    qb.push(" ILIKE ").push_bind(pattern.clone());
                }
                FilterValue::Text(text) => {
                    qb.push(" = ").push_bind(text.clone());
                }
                FilterValue::Enum(text) => {
                    qb.push("::text = ").push_bind(text.clone());
                }
                FilterValue::Bool(flag) => {
                    qb.push(" = ").push_bind(*flag);
                }
                FilterValue::Id(id) => {
                    qb.push(" = ").push_bind(*id);
                }
            }
        }
    }
}

fn field_error(field: &str, message: String) -> crate::validation::FieldError {
    crate::validation::FieldError {
        field: field.to_owned(),
        message,
    }
}

fn parse_number(
    raw: Option<&str>,
    field: &str,
    errors: &mut Vec<crate::validation::FieldError>,
) -> Option<u32> {
    let raw = raw?;
    raw.parse::<u32>().map_or_else(
        |_| {
            errors.push(field_error(field, format!("{field} must be a positive integer")));
            None
        },
        Some,
    )
}

/// Column for a `sort_by` value.
fn sort_column<R: Resource>(sort_by: &str) -> Option<String> {
    match sort_by {
        "createdAt" => Some(format!("{}.created_at", R::ALIAS)),
        "updatedAt" => Some(format!("{}.updated_at", R::ALIAS)),
        other => R::SORTABLE
            .iter()
            .find(|(name, _)| *name == other)
            .map(|(_, column)| (*column).to_owned()),
    }
}

fn sortable_names<R: Resource>() -> Vec<&'static str> {
    let mut names = vec!["createdAt", "updatedAt"];
    names.extend(R::SORTABLE.iter().map(|(name, _)| *name));
    names
}

/// Wrap user input in `%...%`, escaping `LIKE` metacharacters.
fn like_pattern(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len() + 2);
    pattern.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Queries
// =============================================================================

/// Fetch one page of records matching `query`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn fetch_page<R: Resource>(
    pool: &PgPool,
    query: &ListQuery,
) -> Result<Page<R::Record>, RepositoryError> {
    let mut count = QueryBuilder::<Postgres>::new(format!(
        "SELECT COUNT(*) FROM {} {}",
        R::TABLE,
        R::ALIAS
    ));
    query.push_where(&mut count);
    let total_record: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(R::SELECT);
    query.push_where(&mut select);
    select
        .push(" ORDER BY ")
        .push(&query.sort_column)
        .push(" ")
        .push(query.direction.as_sql())
        .push(format_args!(", {}.id DESC", R::ALIAS))
        .push(" LIMIT ")
        .push_bind(i64::from(query.page.limit()))
        .push(" OFFSET ")
        .push_bind(query.page.offset());

    let items = select
        .build_query_as::<R::Record>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(R::present)
        .collect();

    Ok(Page {
        items,
        pagination: query.page.paginate(total_record),
    })
}

/// Fetch one record by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find<R: Resource>(pool: &PgPool, id: R::Id) -> Result<Option<R::Record>, RepositoryError> {
    let sql = format!("{} WHERE {}.id = $1", R::SELECT, R::ALIAS);
    let record = sqlx::query_as::<_, R::Record>(&sql)
        .bind(id.into())
        .fetch_optional(pool)
        .await?;
    Ok(record.map(R::present))
}

/// Fetch one record by id, failing if it does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if there is no such record.
pub async fn get<R: Resource>(pool: &PgPool, id: R::Id) -> Result<R::Record, RepositoryError> {
    find::<R>(pool, id).await?.ok_or(RepositoryError::NotFound)
}

/// Delete a record and return it as it was before deletion.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if there is no such record and
/// `RepositoryError::Conflict` if other records still reference it.
pub async fn delete<R: Resource>(pool: &PgPool, id: R::Id) -> Result<R::Record, RepositoryError> {
    let record = get::<R>(pool, id).await?;

    let sql = format!("DELETE FROM {} WHERE id = $1", R::TABLE);
    let result = sqlx::query(&sql)
        .bind(id.into())
        .execute(pool)
        .await
        .map_err(|e| map_delete_error(e, R::NAME))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(record)
}

/// Fail with `Conflict` if another record already holds `key.value`.
///
/// Comparison is case-insensitive. `exclude` skips the record being updated.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on a duplicate.
pub async fn ensure_unique(
    pool: &PgPool,
    table: &str,
    key: &UniqueKey,
    exclude: Option<i32>,
) -> Result<(), RepositoryError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE lower({}) = lower($1) AND ($2::int IS NULL OR id <> $2))",
        key.column
    );
    let taken: bool = sqlx::query_scalar(&sql)
        .bind(&key.value)
        .bind(exclude)
        .fetch_one(pool)
        .await?;

    if taken {
        return Err(RepositoryError::Conflict(format!(
            "{} '{}' already exists",
            key.field, key.value
        )));
    }
    Ok(())
}

/// Fail with `NotFound` unless a row with `id` exists in `table`.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if there is no such row.
pub async fn ensure_exists(pool: &PgPool, table: &str, id: i32) -> Result<(), RepositoryError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
    let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
    if exists {
        Ok(())
    } else {
        Err(RepositoryError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use storedesk_core::CategoryId;

    #[derive(Debug, Serialize, sqlx::FromRow)]
    struct Row {
        id: CategoryId,
    }

    struct Things;

    impl Resource for Things {
        type Id = CategoryId;
        type Record = Row;

        const NAME: &'static str = "thing";
        const COLLECTION: &'static str = "things";
        const TABLE: &'static str = "shop.things";
        const ALIAS: &'static str = "t";
        const SELECT: &'static str = "SELECT t.id FROM shop.things t";
        const SEARCH: Option<&'static str> = Some("t.name");
        const SORTABLE: &'static [(&'static str, &'static str)] = &[("name", "t.name")];
        const FILTERS: &'static [Filter] = &[
            Filter::new("name", "t.name", FilterKind::Contains),
            Filter::new("status", "t.status", FilterKind::Enum),
            Filter::new("isActive", "t.is_active", FilterKind::Bool),
            Filter::new("user", "t.user_id", FilterKind::Id),
        ];

        fn id(record: &Row) -> CategoryId {
            record.id
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::parse::<Things>(&HashMap::new()).unwrap();
        assert_eq!(query.page(), PageRequest::default());
        assert_eq!(query.sort_column, "t.created_at");
        assert_eq!(query.direction, SortDirection::Desc);
        assert!(query.conditions.is_empty());
    }

    #[test]
    fn test_sort_and_filters() {
        let query = ListQuery::parse::<Things>(&params(&[
            ("page", "2"),
            ("limit", "25"),
            ("sort_by", "name"),
            ("sort_type", "asc"),
            ("name", "50%_off"),
            ("status", "active"),
            ("isActive", "false"),
            ("user", "7"),
            ("unrelated", "ignored"),
        ]))
        .unwrap();

        assert_eq!(query.page().offset(), 25);
        assert_eq!(query.sort_column, "t.name");
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(
            query.conditions,
            vec![
                Condition {
                    column: "t.name",
                    value: FilterValue::Pattern("%50\\%\\_off%".to_owned()),
                },
                Condition {
                    column: "t.status",
                    value: FilterValue::Enum("active".to_owned()),
                },
                Condition {
                    column: "t.is_active",
                    value: FilterValue::Bool(false),
                },
                Condition {
                    column: "t.user_id",
                    value: FilterValue::Id(7),
                },
            ]
        );
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let query = ListQuery::parse::<Things>(&params(&[("name", ""), ("keyword", "  ")])).unwrap();
        assert!(query.conditions.is_empty());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let errors = ListQuery::parse::<Things>(&params(&[
            ("page", "zero"),
            ("limit", "500"),
            ("sort_by", "password"),
            ("sort_type", "sideways"),
            ("keyword", "ab"),
            ("isActive", "maybe"),
            ("user", "abc"),
        ]))
        .unwrap_err();

        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["page", "limit", "sort_by", "sort_type", "keyword", "isActive", "user"]
        );
        assert_eq!(
            errors.errors[2].message,
            "sort_by must be one of: createdAt, updatedAt, name"
        );
    }

    #[test]
    fn test_keyword_bounds() {
        assert!(ListQuery::parse::<Things>(&params(&[("keyword", "abc")])).is_ok());
        assert!(ListQuery::parse::<Things>(&params(&[("keyword", &"a".repeat(50))])).is_ok());
        assert!(ListQuery::parse::<Things>(&params(&[("keyword", &"a".repeat(51))])).is_err());
    }

    #[test]
    fn test_push_where_renders_placeholders() {
        let query = ListQuery::parse::<Things>(&params(&[("status", "active"), ("user", "3")])).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM shop.things t");
        query.push_where(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM shop.things t WHERE t.status::text = $1 AND t.user_id = $2"
        );
    }
}
