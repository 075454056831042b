//! # authgate: user accounts, JWT authentication and RBAC
//!
//! Core of a user-account management service: password hashing and
//! verification, access/refresh token issuance and validation, a
//! role-to-permission model with per-user overrides, and the flow
//! controller that orchestrates login, refresh and permission-gated
//! user mutation. HTTP routing and database setup are left to the
//! embedding application.

pub mod config;
pub mod error;
pub mod hash;
pub mod middleware;
pub mod rbac;
pub mod service;
pub mod store;
pub mod token;
pub mod user;

// Prelude-style re-exports for core functionality

// Error handling
pub use error::AuthError;

// Configuration
pub use config::{AuthConfig, AuthRateLimitConfig, CookieConfig, JwtConfig, PasswordConfig};

// RBAC
pub use rbac::{Permission, RbacEngine, Role, RolePermissions};

// Tokens
pub use token::{Claims, JwtProvider, TokenType};

// Users and storage
pub use store::{InMemoryUserStore, PostgresUserStore, UserStore};
pub use user::{NewUser, User, UserUpdate};

// Flow controller
pub use service::{AccessToken, AuthService, LoginResponse};

/// Authentication result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
