//! Auth flow orchestration
//!
//! [`AuthService`] wires the credential store, password hasher, token
//! provider and RBAC engine together behind explicit dependency
//! injection. Every operation is a single unit of work against the
//! store; the only cross-request state is the read-only role table and
//! configuration established at construction.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::hash::{validate_password_policy, PasswordHasher, PasswordHasherFactory};
use crate::middleware::{BearerConfig, RefreshCookie};
use crate::rbac::{Permission, RbacEngine, Role, RolePermissions};
use crate::store::UserStore;
use crate::token::{JwtProvider, TokenType};
use crate::user::{NewUser, User, UserUpdate};
use crate::{AuthError, AuthResult};

/// Access token response body. The refresh token never appears here.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

impl AccessToken {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// Successful login: the access token for the response body plus the
/// `Set-Cookie` value carrying the refresh token.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: AccessToken,
    pub refresh_cookie: String,
}

/// Orchestrates login, refresh and permission-gated user mutation
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Box<dyn PasswordHasher>,
    tokens: JwtProvider,
    rbac: RbacEngine,
    bearer: BearerConfig,
    cookie: RefreshCookie,
    config: AuthConfig,
}

impl AuthService {
    /// Build the service from configuration and an injected store.
    /// Configuration problems (bad secret, unknown hash algorithm) are
    /// fatal here, never per-request errors.
    pub fn new(store: Arc<dyn UserStore>, config: AuthConfig) -> AuthResult<Self> {
        config
            .validate()
            .map_err(AuthError::config_error)?;

        let hasher = PasswordHasherFactory::from_config(&config.password)?;
        let tokens = JwtProvider::new(&config.jwt)?;
        let cookie = RefreshCookie::new(config.cookie.clone());

        Ok(Self {
            store,
            hasher,
            tokens,
            rbac: RbacEngine::new(RolePermissions::standard()),
            bearer: BearerConfig::default(),
            cookie,
            config,
        })
    }

    /// The authorization engine, for callers gating their own routes
    pub fn rbac(&self) -> &RbacEngine {
        &self.rbac
    }

    // ---- registration ----------------------------------------------------

    /// Register a new user. The role defaults to `user`; the permission
    /// set is seeded from the role table.
    pub async fn register(&self, new_user: NewUser) -> AuthResult<User> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(AuthError::validation("Username must not be empty"));
        }
        let email = new_user.email.trim().to_string();
        if !email.contains('@') {
            return Err(AuthError::validation("Invalid email address"));
        }
        validate_password_policy(&new_user.password, &self.config.password)?;

        if self.store.find_by_username(&username).await?.is_some() {
            return Err(AuthError::conflict("username"));
        }
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::conflict("email"));
        }

        let password_hash = self.hasher.hash_password(&new_user.password)?;
        let permissions = self.rbac.permissions_for_role(new_user.role);
        let user = User::new(username, email, password_hash, new_user.role, permissions);

        // The store's uniqueness constraint settles any registration
        // race the pre-checks missed.
        self.store.insert(&user).await?;

        info!(username = %user.username, role = %user.role, "registered user");
        Ok(user)
    }

    // ---- login / refresh ---------------------------------------------------

    /// Verify credentials and issue a token pair. Unknown username,
    /// wrong password and disabled account all fail identically.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginResponse> {
        let user = match self.store.find_by_username(username).await? {
            Some(user) => user,
            None => {
                debug!(%username, "login rejected: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify_password(password, &user.password_hash)? {
            debug!(%username, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if user.disabled {
            debug!(%username, "login rejected: account disabled");
            return Err(AuthError::InvalidCredentials);
        }

        let access = self.tokens.issue_access(&user.username)?;
        let refresh = self.tokens.issue_refresh(&user.username)?;
        let refresh_cookie = self
            .cookie
            .header_value(&refresh, Some(self.config.jwt.refresh_token_expiry as i64));

        info!(username = %user.username, "login succeeded");
        Ok(LoginResponse {
            token: AccessToken::bearer(access),
            refresh_cookie,
        })
    }

    /// Mint a new access token from the refresh cookie. The refresh
    /// token itself is not rotated.
    pub async fn refresh(&self, cookie_header: Option<&str>) -> AuthResult<AccessToken> {
        let refresh_token = self
            .cookie
            .extract(cookie_header)
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.validate(&refresh_token, TokenType::Refresh)?;

        let user = self
            .store
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::NotFound)?;

        let access = self.tokens.issue_access(&user.username)?;
        debug!(username = %user.username, "access token refreshed");
        Ok(AccessToken::bearer(access))
    }

    /// Resolve the acting user from an `Authorization` header. The
    /// token must be access-typed; disabled accounts are rejected.
    pub async fn authenticate(&self, auth_header: Option<&str>) -> AuthResult<User> {
        let token = self
            .bearer
            .extract_token(auth_header)?
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.validate(&token, TokenType::Access)?;

        let user = self
            .store
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::invalid_token("subject no longer exists"))?;

        if user.disabled {
            return Err(AuthError::forbidden("account is disabled"));
        }

        Ok(user)
    }

    // ---- user queries ------------------------------------------------------

    /// Fetch a user record: one's own freely, anyone else's with
    /// `read:user`. A disabled actor cannot read anything, their own
    /// record included.
    pub async fn get_user(&self, actor: &User, target_id: Uuid) -> AuthResult<User> {
        if !self.rbac.can_modify(actor, target_id, Permission::ReadUser) {
            return Err(AuthError::forbidden("read:user required"));
        }
        self.store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// List users with pagination; requires `read:user`
    pub async fn list_users(&self, actor: &User, skip: u64, limit: u64) -> AuthResult<Vec<User>> {
        if !self.rbac.authorize(actor, Permission::ReadUser) {
            return Err(AuthError::forbidden("read:user required"));
        }
        self.store.list(skip, limit).await
    }

    // ---- user mutation -----------------------------------------------------

    /// Patch a user's own fields. Updating one's own record needs no
    /// permission; another user's record requires `update:user`.
    pub async fn update_user(
        &self,
        actor: &User,
        target_id: Uuid,
        patch: UserUpdate,
    ) -> AuthResult<User> {
        if !self.rbac.can_modify(actor, target_id, Permission::UpdateUser) {
            return Err(AuthError::forbidden("update:user required"));
        }

        let mut user = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if patch.is_empty() {
            return Ok(user);
        }

        if let Some(username) = patch.username {
            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(AuthError::validation("Username must not be empty"));
            }
            match self.store.find_by_username(&username).await? {
                Some(existing) if existing.id != user.id => {
                    return Err(AuthError::conflict("username"));
                }
                _ => user.username = username,
            }
        }

        if let Some(email) = patch.email {
            let email = email.trim().to_string();
            if !email.contains('@') {
                return Err(AuthError::validation("Invalid email address"));
            }
            match self.store.find_by_email(&email).await? {
                Some(existing) if existing.id != user.id => {
                    return Err(AuthError::conflict("email"));
                }
                _ => user.email = email,
            }
        }

        if let Some(password) = patch.password {
            validate_password_policy(&password, &self.config.password)?;
            user.password_hash = self.hasher.hash_password(&password)?;
        }

        self.store.update(&user).await?;
        info!(username = %user.username, "user record updated");
        Ok(user)
    }

    /// Change a user's role; requires `manage:roles`. The permission
    /// set is re-seeded from the new role's defaults.
    pub async fn change_role(&self, actor: &User, target_id: Uuid, role: Role) -> AuthResult<User> {
        if !self.rbac.authorize(actor, Permission::ManageRoles) {
            return Err(AuthError::forbidden("manage:roles required"));
        }

        let mut user = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.is_enabled_admin()
            && role != Role::Admin
            && self.store.count_enabled_admins().await? <= 1
        {
            warn!(username = %user.username, "refused role change: last enabled admin");
            return Err(AuthError::LastAdminProtected);
        }

        user.role = role;
        user.permissions = self.rbac.permissions_for_role(role);
        self.store.update(&user).await?;

        info!(username = %user.username, role = %role, "role changed");
        Ok(user)
    }

    /// Enable or disable an account; requires `manage:roles`.
    /// Disabling the last enabled admin is refused.
    pub async fn set_status(&self, actor: &User, target_id: Uuid, disabled: bool) -> AuthResult<User> {
        if !self.rbac.authorize(actor, Permission::ManageRoles) {
            return Err(AuthError::forbidden("manage:roles required"));
        }

        let mut user = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if disabled && user.is_enabled_admin() && self.store.count_enabled_admins().await? <= 1 {
            warn!(username = %user.username, "refused disable: last enabled admin");
            return Err(AuthError::LastAdminProtected);
        }

        user.disabled = disabled;
        self.store.update(&user).await?;

        info!(username = %user.username, disabled, "account status changed");
        Ok(user)
    }

    /// Grant a permission override; requires `manage:roles`. Granting
    /// an already-present permission is a no-op.
    pub async fn add_permission(
        &self,
        actor: &User,
        target_id: Uuid,
        permission: Permission,
    ) -> AuthResult<User> {
        if !self.rbac.authorize(actor, Permission::ManageRoles) {
            return Err(AuthError::forbidden("manage:roles required"));
        }

        let mut user = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.grant(permission) {
            self.store.update(&user).await?;
            info!(username = %user.username, %permission, "permission granted");
        }
        Ok(user)
    }

    /// Revoke a permission override; requires `manage:roles`. Revoking
    /// an absent permission is a no-op.
    pub async fn remove_permission(
        &self,
        actor: &User,
        target_id: Uuid,
        permission: Permission,
    ) -> AuthResult<User> {
        if !self.rbac.authorize(actor, Permission::ManageRoles) {
            return Err(AuthError::forbidden("manage:roles required"));
        }

        let mut user = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.revoke(permission) {
            self.store.update(&user).await?;
            info!(username = %user.username, %permission, "permission revoked");
        }
        Ok(user)
    }

    /// Delete a user; requires `delete:user`. Deleting the sole
    /// enabled admin is refused.
    pub async fn delete_user(&self, actor: &User, target_id: Uuid) -> AuthResult<bool> {
        if !self.rbac.authorize(actor, Permission::DeleteUser) {
            return Err(AuthError::forbidden("delete:user required"));
        }

        let user = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.is_enabled_admin() && self.store.count_enabled_admins().await? <= 1 {
            warn!(username = %user.username, "refused delete: last enabled admin");
            return Err(AuthError::LastAdminProtected);
        }

        let deleted = self.store.delete(target_id).await?;
        if deleted {
            info!(username = %user.username, "user deleted");
        }
        Ok(deleted)
    }
}
