//! User accounts: CRUD plus the lookups used by authentication.

use sqlx::PgPool;

use storedesk_core::{Email, UserId, UserRole};

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::user::{User, UserPayload};
use crate::services::auth::hash_password;

const COLUMNS: &str = "u.id, u.user_name, u.full_name, u.email, u.role, u.status, \
                       u.avatar_url, u.last_login, u.created_at, u.updated_at";

/// Marker for the `users` resource.
pub struct Users;

impl Resource for Users {
    type Id = UserId;
    type Record = User;

    const NAME: &'static str = "user";
    const COLLECTION: &'static str = "users";
    const TABLE: &'static str = "shop.users";
    const ALIAS: &'static str = "u";
    const SELECT: &'static str = "SELECT u.id, u.user_name, u.full_name, u.email, u.role, u.status, \
                                  u.avatar_url, u.last_login, u.created_at, u.updated_at \
                                  FROM shop.users u";
    const SEARCH: Option<&'static str> = Some("u.user_name");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("userName", "u.user_name"),
        ("fullName", "u.full_name"),
        ("email", "u.email"),
        ("lastLogin", "u.last_login"),
    ];
    const FILTERS: &'static [Filter] = &[
        Filter::new("userName", "u.user_name", FilterKind::Contains),
        Filter::new("fullName", "u.full_name", FilterKind::Contains),
        Filter::new("email", "u.email", FilterKind::Contains),
        Filter::new("roles", "u.role", FilterKind::Enum),
        Filter::new("status", "u.status", FilterKind::Enum),
    ];

    fn id(record: &User) -> UserId {
        record.id
    }
}

/// Lower-cased, validated email.
fn normalize_email(raw: &str) -> Result<String, RepositoryError> {
    Email::parse(raw).map(Email::into_inner).map_err(|e| {
        RepositoryError::Invalid(crate::validation::ValidationErrors::single(
            "email",
            e.to_string(),
        ))
    })
}

fn hash(password: &str) -> Result<String, RepositoryError> {
    hash_password(password).map_err(|_| RepositoryError::PasswordHash)
}

impl Writable for Users {
    type Payload = UserPayload;

    fn unique_keys(payload: &UserPayload) -> Vec<UniqueKey> {
        payload
            .email
            .iter()
            .map(|email| UniqueKey::new("email", "email", email.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: UserPayload) -> Result<UserId, RepositoryError> {
        let email = normalize_email(payload.email.as_deref().unwrap_or_default())?;
        let password_hash = hash(payload.password.as_deref().unwrap_or_default())?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.users
                (user_name, full_name, email, password_hash, role, status, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(payload.user_name.as_deref().map(str::trim))
        .bind(payload.full_name.as_deref().map(str::trim))
        .bind(email)
        .bind(password_hash)
        .bind(payload.role.unwrap_or_default())
        .bind(payload.status.unwrap_or_default())
        .bind(payload.avatar_url)
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        Ok(UserId::new(id))
    }

    async fn update(pool: &PgPool, id: UserId, payload: UserPayload) -> Result<(), RepositoryError> {
        let email = payload.email.as_deref().map(normalize_email).transpose()?;
        let password_hash = payload.password.as_deref().map(hash).transpose()?;

        let result = sqlx::query(
            r"
            UPDATE shop.users SET
                user_name = COALESCE($2, user_name),
                full_name = COALESCE($3, full_name),
                email = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                role = COALESCE($6, role),
                status = COALESCE($7, status),
                avatar_url = COALESCE($8, avatar_url)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.user_name.as_deref().map(str::trim))
        .bind(payload.full_name.as_deref().map(str::trim))
        .bind(email)
        .bind(password_hash)
        .bind(payload.role)
        .bind(payload.status)
        .bind(payload.avatar_url)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// A user together with the stored password hash.
#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// A user created outside the HTTP API (CLI, seeding).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub full_name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: UserRole,
}

/// Repository for the lookups authentication needs.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        super::resource::find::<Users>(self.pool, id).await
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS}, u.password_hash FROM shop.users u WHERE lower(u.email) = lower($1)"
        );
        let row = sqlx::query_as::<_, UserCredentials>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_last_login(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Insert a user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            WITH u AS (
                INSERT INTO shop.users (user_name, full_name, email, password_hash, role)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {COLUMNS} FROM u
            "
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.user_name)
            .bind(&user.full_name)
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_write_error(e, "user"))?;
        Ok(created)
    }
}
