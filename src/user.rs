//! User identity and authorization record

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rbac::{Permission, Role};

/// A user account: identity, credential hash, role and per-user
/// permission overrides. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password_hash: String,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
    pub disabled: bool,
}

impl User {
    /// Create a new user record with a fresh id
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        role: Role,
        permissions: BTreeSet<Permission>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role,
            permissions,
            disabled: false,
        }
    }

    /// Add a permission to the override set. Granting an
    /// already-present permission is a no-op.
    pub fn grant(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    /// Remove a permission from the override set. Revoking an absent
    /// permission is a no-op.
    pub fn revoke(&mut self, permission: Permission) -> bool {
        self.permissions.remove(&permission)
    }

    /// Whether this record counts toward the last-admin invariant
    pub fn is_enabled_admin(&self) -> bool {
        self.role == Role::Admin && !self.disabled
    }
}

/// Registration input
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Partial update of a user's own fields. Role, status and
/// permissions have dedicated operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "$argon2id$stub".to_string(),
            Role::User,
            BTreeSet::new(),
        )
    }

    #[test]
    fn test_grant_and_revoke_are_idempotent() {
        let mut user = sample_user();

        assert!(user.grant(Permission::ViewMetrics));
        assert!(!user.grant(Permission::ViewMetrics)); // already present
        assert!(user.permissions.contains(&Permission::ViewMetrics));

        assert!(user.revoke(Permission::ViewMetrics));
        assert!(!user.revoke(Permission::ViewMetrics)); // already absent
        assert!(user.permissions.is_empty());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = sample_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_enabled_admin() {
        let mut user = sample_user();
        assert!(!user.is_enabled_admin());

        user.role = Role::Admin;
        assert!(user.is_enabled_admin());

        user.disabled = true;
        assert!(!user.is_enabled_admin());
    }
}
