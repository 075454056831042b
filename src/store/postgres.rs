//! PostgreSQL-backed user store
//!
//! Expects a `users` table with unique constraints on `username` and
//! `email`; the database resolves concurrent write races, unique
//! violations surface as `Conflict`.
//!
//! ```sql
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     username      VARCHAR(50)  NOT NULL,
//!     email         VARCHAR(255) NOT NULL,
//!     password_hash VARCHAR(255) NOT NULL,
//!     role          VARCHAR(16)  NOT NULL DEFAULT 'user',
//!     permissions   JSONB        NOT NULL DEFAULT '[]',
//!     disabled      BOOLEAN      NOT NULL DEFAULT FALSE,
//!     CONSTRAINT users_username_key UNIQUE (username),
//!     CONSTRAINT users_email_key    UNIQUE (email)
//! );
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::UserStore;
use crate::rbac::{Permission, Role};
use crate::user::User;
use crate::{AuthError, AuthResult};

/// User store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    permissions: Json<BTreeSet<Permission>>,
    disabled: bool,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: String| AuthError::database_error(e))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            permissions: row.permissions.0,
            disabled: row.disabled,
        })
    }
}

const SELECT_USER: &str = "SELECT id, username, email, password_hash, role, permissions, disabled \
                           FROM users";

impl PostgresUserStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, clause: &str, bind: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE {clause} = $1"))
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        self.fetch_one_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        self.fetch_one_by("email", email).await
    }

    async fn insert(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, permissions, disabled) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(Json(&user.permissions))
        .bind(user.disabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, role = $5, \
             permissions = $6, disabled = $7 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(Json(&user.permissions))
        .bind(user.disabled)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, skip: u64, limit: u64) -> AuthResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} ORDER BY username OFFSET $1 LIMIT $2"
        ))
        .bind(skip as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn count_enabled_admins(&self) -> AuthResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin' AND NOT disabled")
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }
}
