//! Credential store: persistence seam for user records
//!
//! The service talks to storage only through [`UserStore`]. The store
//! owns the uniqueness constraints on username and email; a concurrent
//! registration race resolves to a constraint violation surfaced as
//! `Conflict`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::user::User;
use crate::AuthResult;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

/// Persistence operations on user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by id
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Insert a new record. Fails with `Conflict` when the username
    /// or email is already taken.
    async fn insert(&self, user: &User) -> AuthResult<()>;

    /// Write back a full record by id. Fails with `NotFound` when the
    /// record does not exist and `Conflict` on a uniqueness violation.
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Delete a record by id. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> AuthResult<bool>;

    /// List records with pagination, ordered by username
    async fn list(&self, skip: u64, limit: u64) -> AuthResult<Vec<User>>;

    /// Number of enabled admin accounts, for last-admin protection
    async fn count_enabled_admins(&self) -> AuthResult<u64>;
}
