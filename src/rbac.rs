//! Role-Based Access Control (RBAC)
//!
//! Closed role and permission sets, the static role-to-permission
//! table, and the authorization engine that answers access queries
//! against a user's role plus per-user permission overrides.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::user::User;
use uuid::Uuid;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    /// Stable wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Permissions gating user-management operations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Permission {
    #[serde(rename = "create:user")]
    CreateUser,
    #[serde(rename = "read:user")]
    ReadUser,
    #[serde(rename = "update:user")]
    UpdateUser,
    #[serde(rename = "delete:user")]
    DeleteUser,
    #[serde(rename = "manage:roles")]
    ManageRoles,
    #[serde(rename = "view:metrics")]
    ViewMetrics,
}

impl Permission {
    /// Stable wire name of the permission
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateUser => "create:user",
            Permission::ReadUser => "read:user",
            Permission::UpdateUser => "update:user",
            Permission::DeleteUser => "delete:user",
            Permission::ManageRoles => "manage:roles",
            Permission::ViewMetrics => "view:metrics",
        }
    }

    /// All permissions in the closed set
    pub fn all() -> BTreeSet<Permission> {
        [
            Permission::CreateUser,
            Permission::ReadUser,
            Permission::UpdateUser,
            Permission::DeleteUser,
            Permission::ManageRoles,
            Permission::ViewMetrics,
        ]
        .into_iter()
        .collect()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable role-to-permission table, constructed once at process
/// start and injected into the engine.
#[derive(Debug, Clone)]
pub struct RolePermissions {
    table: HashMap<Role, BTreeSet<Permission>>,
}

impl RolePermissions {
    /// Build the standard table: admin gets everything, manager can
    /// view users and metrics, plain users get nothing.
    pub fn standard() -> Self {
        let mut table = HashMap::new();
        table.insert(Role::Admin, Permission::all());
        table.insert(
            Role::Manager,
            [Permission::ReadUser, Permission::ViewMetrics]
                .into_iter()
                .collect(),
        );
        table.insert(Role::User, BTreeSet::new());
        Self { table }
    }

    /// Permissions granted by a role. An unmapped role yields the
    /// empty set, never an error.
    pub fn permissions_for_role(&self, role: Role) -> BTreeSet<Permission> {
        self.table.get(&role).cloned().unwrap_or_default()
    }
}

impl Default for RolePermissions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Authorization engine answering access queries
#[derive(Debug, Clone, Default)]
pub struct RbacEngine {
    roles: RolePermissions,
}

impl RbacEngine {
    /// Create an engine over an injected role table
    pub fn new(roles: RolePermissions) -> Self {
        Self { roles }
    }

    /// Permissions granted by a role
    pub fn permissions_for_role(&self, role: Role) -> BTreeSet<Permission> {
        self.roles.permissions_for_role(role)
    }

    /// True iff the permission is in the union of the user's role
    /// permissions and the per-user override set. A disabled user is
    /// never authorized for anything.
    pub fn authorize(&self, user: &User, required: Permission) -> bool {
        if user.disabled {
            return false;
        }
        user.permissions.contains(&required)
            || self.roles.permissions_for_role(user.role).contains(&required)
    }

    /// Self-or-permission rule: a user may always act on their own
    /// record; acting on another user's record requires the given
    /// permission.
    pub fn can_modify(&self, actor: &User, target_id: Uuid, required: Permission) -> bool {
        if actor.disabled {
            return false;
        }
        actor.id == target_id || self.authorize(actor, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: Role) -> User {
        User::new(
            "someone".to_string(),
            "someone@example.com".to_string(),
            "$argon2id$stub".to_string(),
            role,
            RolePermissions::standard().permissions_for_role(role),
        )
    }

    #[test]
    fn test_role_table() {
        let table = RolePermissions::standard();

        assert_eq!(table.permissions_for_role(Role::Admin), Permission::all());
        assert_eq!(
            table.permissions_for_role(Role::Manager),
            [Permission::ReadUser, Permission::ViewMetrics]
                .into_iter()
                .collect()
        );
        assert!(table.permissions_for_role(Role::User).is_empty());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("superuser".parse::<Role>().is_err());

        assert_eq!(
            serde_json::to_string(&Permission::ManageRoles).unwrap(),
            "\"manage:roles\""
        );
        let parsed: Permission = serde_json::from_str("\"view:metrics\"").unwrap();
        assert_eq!(parsed, Permission::ViewMetrics);
    }

    #[test]
    fn test_authorize_by_role() {
        let engine = RbacEngine::default();

        let manager = user_with_role(Role::Manager);
        assert!(engine.authorize(&manager, Permission::ViewMetrics));
        assert!(engine.authorize(&manager, Permission::ReadUser));
        assert!(!engine.authorize(&manager, Permission::DeleteUser));

        let admin = user_with_role(Role::Admin);
        assert!(engine.authorize(&admin, Permission::ManageRoles));
    }

    #[test]
    fn test_authorize_with_override() {
        let engine = RbacEngine::default();
        let mut user = user_with_role(Role::User);

        assert!(!engine.authorize(&user, Permission::ViewMetrics));

        user.grant(Permission::ViewMetrics);
        assert!(engine.authorize(&user, Permission::ViewMetrics));

        user.revoke(Permission::ViewMetrics);
        assert!(!engine.authorize(&user, Permission::ViewMetrics));
    }

    #[test]
    fn test_disabled_user_never_authorized() {
        let engine = RbacEngine::default();
        let mut admin = user_with_role(Role::Admin);
        admin.disabled = true;

        assert!(!engine.authorize(&admin, Permission::ReadUser));
        assert!(!engine.can_modify(&admin, admin.id, Permission::UpdateUser));
    }

    #[test]
    fn test_self_or_permission() {
        let engine = RbacEngine::default();
        let user = user_with_role(Role::User);
        let other = user_with_role(Role::User);

        // Own record: always allowed.
        assert!(engine.can_modify(&user, user.id, Permission::UpdateUser));
        // Someone else's record: needs update:user.
        assert!(!engine.can_modify(&user, other.id, Permission::UpdateUser));

        let admin = user_with_role(Role::Admin);
        assert!(engine.can_modify(&admin, other.id, Permission::UpdateUser));
    }
}
