//! Authentication configuration types and utilities

use serde::{Deserialize, Serialize};

/// Main authentication configuration, established once at startup and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Password policy configuration
    pub password: PasswordConfig,

    /// Refresh cookie configuration
    pub cookie: CookieConfig,

    /// Rate limiting for authentication attempts (configuration only;
    /// enforcement lives in the outer HTTP layer)
    pub rate_limit: AuthRateLimitConfig,
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing (symmetric, HS256-family)
    pub secret: String,

    /// JWT signing algorithm (HS256, HS384, HS512)
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    /// Access token expiration time in seconds
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: u64,

    /// Refresh token expiration time in seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: u64,

    /// JWT issuer
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
}

/// Password policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Minimum password length
    #[serde(default = "default_min_password_length")]
    pub min_length: usize,

    /// Maximum password length
    #[serde(default = "default_max_password_length")]
    pub max_length: usize,

    /// Require uppercase letters
    #[serde(default = "default_false")]
    pub require_uppercase: bool,

    /// Require lowercase letters
    #[serde(default = "default_false")]
    pub require_lowercase: bool,

    /// Require numbers
    #[serde(default = "default_false")]
    pub require_numbers: bool,

    /// Password hashing algorithm (argon2, bcrypt)
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,

    /// Bcrypt cost factor (if using bcrypt)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Argon2 memory cost in KB (if using argon2)
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory: u32,

    /// Argon2 time cost (iterations)
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism factor
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

/// Refresh cookie configuration. The refresh token travels only on
/// this channel, never in a response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie name carrying the refresh token
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// Cookie domain
    pub domain: Option<String>,

    /// Cookie path
    #[serde(default = "default_cookie_path")]
    pub path: String,

    /// Secure flag (HTTPS only)
    #[serde(default = "default_true")]
    pub secure: bool,

    /// HTTP-only flag
    #[serde(default = "default_true")]
    pub http_only: bool,

    /// SameSite attribute
    #[serde(default = "default_cookie_same_site")]
    pub same_site: CookieSameSite,
}

/// Cookie SameSite attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookieSameSite {
    Strict,
    Lax,
    None,
}

impl std::fmt::Display for CookieSameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CookieSameSite::Strict => write!(f, "Strict"),
            CookieSameSite::Lax => write!(f, "Lax"),
            CookieSameSite::None => write!(f, "None"),
        }
    }
}

/// Authentication rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRateLimitConfig {
    /// Maximum requests per window for anonymous clients
    #[serde(default = "default_anon_requests")]
    pub anon_requests: u32,

    /// Maximum requests per window for authenticated clients
    #[serde(default = "default_auth_requests")]
    pub auth_requests: u32,

    /// Time window for rate limiting in seconds
    #[serde(default = "default_rate_limit_window")]
    pub window_seconds: u64,
}

// Default value functions
fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}
fn default_access_token_expiry() -> u64 {
    60 * 60
} // 60 minutes
fn default_refresh_token_expiry() -> u64 {
    7 * 24 * 60 * 60
} // 7 days
fn default_jwt_issuer() -> String {
    "authgate".to_string()
}
fn default_min_password_length() -> usize {
    8
}
fn default_max_password_length() -> usize {
    128
}
fn default_hash_algorithm() -> String {
    "argon2".to_string()
}
fn default_bcrypt_cost() -> u32 {
    12
}
fn default_argon2_memory() -> u32 {
    65536
} // 64MB
fn default_argon2_iterations() -> u32 {
    3
}
fn default_argon2_parallelism() -> u32 {
    4
}
fn default_cookie_name() -> String {
    "refresh_token".to_string()
}
fn default_cookie_path() -> String {
    "/".to_string()
}
fn default_cookie_same_site() -> CookieSameSite {
    CookieSameSite::Strict
}
fn default_anon_requests() -> u32 {
    30
}
fn default_auth_requests() -> u32 {
    100
}
fn default_rate_limit_window() -> u64 {
    60
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "default-secret-key-change-in-production-32-chars-long".to_string(),
            algorithm: default_jwt_algorithm(),
            access_token_expiry: default_access_token_expiry(),
            refresh_token_expiry: default_refresh_token_expiry(),
            issuer: default_jwt_issuer(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_password_length(),
            max_length: default_max_password_length(),
            require_uppercase: default_false(),
            require_lowercase: default_false(),
            require_numbers: default_false(),
            hash_algorithm: default_hash_algorithm(),
            bcrypt_cost: default_bcrypt_cost(),
            argon2_memory: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            domain: None,
            path: default_cookie_path(),
            secure: default_true(),
            http_only: default_true(),
            same_site: default_cookie_same_site(),
        }
    }
}

impl Default for AuthRateLimitConfig {
    fn default() -> Self {
        Self {
            anon_requests: default_anon_requests(),
            auth_requests: default_auth_requests(),
            window_seconds: default_rate_limit_window(),
        }
    }
}

impl AuthConfig {
    /// Create a development configuration with relaxed security
    pub fn development() -> Self {
        let mut config = Self::default();
        config.jwt.secret = "dev-secret-key-change-in-production-32-chars!!".to_string();
        config.cookie.secure = false; // Allow HTTP in development
        config.password.argon2_memory = 4096;
        config.password.argon2_iterations = 2;
        config.password.argon2_parallelism = 2;
        config
    }

    /// Create a production configuration with strict security
    pub fn production() -> Self {
        let mut config = Self::default();
        config.cookie.secure = true;
        config.cookie.same_site = CookieSameSite::Strict;
        config.password.min_length = 12;
        config.password.require_uppercase = true;
        config.password.require_lowercase = true;
        config.password.require_numbers = true;
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt.secret.len() < 32 {
            return Err("JWT secret must be at least 32 characters".to_string());
        }

        if !["HS256", "HS384", "HS512"].contains(&self.jwt.algorithm.as_str()) {
            return Err("Invalid JWT algorithm".to_string());
        }

        if self.jwt.access_token_expiry == 0 || self.jwt.refresh_token_expiry == 0 {
            return Err("Token expiry must be non-zero".to_string());
        }

        if self.password.min_length > self.password.max_length {
            return Err("Password min_length cannot be greater than max_length".to_string());
        }

        if self.password.min_length < 1 {
            return Err("Password min_length must be at least 1".to_string());
        }

        if !["argon2", "bcrypt"].contains(&self.password.hash_algorithm.as_str()) {
            return Err("Invalid password hashing algorithm".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt.algorithm, "HS256");
        assert_eq!(config.password.hash_algorithm, "argon2");
        assert_eq!(config.cookie.name, "refresh_token");
        assert!(config.cookie.http_only);
    }

    #[test]
    fn test_development_config() {
        let config = AuthConfig::development();
        assert!(!config.cookie.secure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_config() {
        let config = AuthConfig::production();
        assert!(config.cookie.secure);
        assert_eq!(config.cookie.same_site, CookieSameSite::Strict);
        assert_eq!(config.password.min_length, 12);
        assert!(config.password.require_numbers);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AuthConfig::default();
        assert!(config.validate().is_ok());

        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = "long-enough-secret-key-for-validation".to_string();
        config.jwt.algorithm = "RS256".to_string();
        assert!(config.validate().is_err());

        config.jwt.algorithm = "HS256".to_string();
        config.password.hash_algorithm = "md5".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt.access_token_expiry, 60 * 60); // 60 minutes
        assert_eq!(config.jwt.refresh_token_expiry, 7 * 24 * 60 * 60); // 7 days
    }
}
