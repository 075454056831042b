//! HTTP plumbing helpers
//!
//! Header-level extraction and construction the outer routing layer
//! plugs into: bearer access tokens from the `Authorization` header,
//! and the refresh-token cookie channel (parse from `Cookie`, build a
//! `Set-Cookie` value).

use crate::config::CookieConfig;
use crate::{AuthError, AuthResult};

const DEFAULT_TOKEN_PREFIX: &str = "Bearer ";
const DEFAULT_SKIP_PATHS: &[&str] = &["/health", "/metrics"];

/// Bearer token extraction configuration
#[derive(Debug, Clone)]
pub struct BearerConfig {
    /// Token prefix (e.g., "Bearer ")
    pub token_prefix: String,

    /// Paths that skip authentication
    pub skip_paths: Vec<String>,
}

impl Default for BearerConfig {
    fn default() -> Self {
        Self {
            token_prefix: DEFAULT_TOKEN_PREFIX.to_string(),
            skip_paths: DEFAULT_SKIP_PATHS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BearerConfig {
    /// Check if a path should skip authentication
    pub fn should_skip_path(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|skip| path.starts_with(skip))
    }

    /// Extract the raw token from an `Authorization` header value.
    /// `Ok(None)` means no token was submitted; a header with the
    /// wrong scheme is an error.
    pub fn extract_token(&self, auth_header: Option<&str>) -> AuthResult<Option<String>> {
        match auth_header {
            Some(header_value) => {
                let token = header_value
                    .strip_prefix(&self.token_prefix)
                    .ok_or_else(|| {
                        AuthError::invalid_token(format!(
                            "Token must start with '{}'",
                            self.token_prefix
                        ))
                    })?
                    .trim();

                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            None => Ok(None),
        }
    }
}

/// Refresh-token cookie channel
#[derive(Debug, Clone, Default)]
pub struct RefreshCookie {
    config: CookieConfig,
}

impl RefreshCookie {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    /// Extract the refresh token from a `Cookie` header value
    pub fn extract(&self, cookie_header: Option<&str>) -> Option<String> {
        let header = cookie_header?;
        for cookie in header.split(';') {
            let cookie = cookie.trim();
            if let Some(value) = cookie.strip_prefix(&format!("{}=", self.config.name)) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        None
    }

    /// Build the `Set-Cookie` header value delivering a refresh token
    pub fn header_value(&self, token: &str, max_age: Option<i64>) -> String {
        let mut cookie = format!("{}={}", self.config.name, token);

        if let Some(domain) = &self.config.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }

        cookie.push_str(&format!("; Path={}", self.config.path));

        if self.config.http_only {
            cookie.push_str("; HttpOnly");
        }

        if self.config.secure {
            cookie.push_str("; Secure");
        }

        cookie.push_str(&format!("; SameSite={}", self.config.same_site));

        if let Some(max_age) = max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CookieSameSite;

    #[test]
    fn test_token_extraction() {
        let config = BearerConfig::default();

        let result = config.extract_token(Some("Bearer eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9"));
        assert_eq!(
            result.unwrap(),
            Some("eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9".to_string())
        );

        // No header
        assert_eq!(config.extract_token(None).unwrap(), None);

        // Empty token
        assert_eq!(config.extract_token(Some("Bearer ")).unwrap(), None);

        // Wrong scheme
        assert!(config.extract_token(Some("Basic credentials")).is_err());
    }

    #[test]
    fn test_path_skipping() {
        let config = BearerConfig::default();
        assert!(config.should_skip_path("/health"));
        assert!(config.should_skip_path("/health/check"));
        assert!(config.should_skip_path("/metrics"));
        assert!(!config.should_skip_path("/users"));
    }

    #[test]
    fn test_cookie_extraction() {
        let cookie = RefreshCookie::new(CookieConfig::default());

        assert_eq!(
            cookie.extract(Some("refresh_token=abc.def.ghi")),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(
            cookie.extract(Some("first=1; refresh_token=tok; last=2")),
            Some("tok".to_string())
        );
        assert_eq!(cookie.extract(Some("session_id=xyz")), None);
        assert_eq!(cookie.extract(Some("refresh_token=")), None);
        assert_eq!(cookie.extract(None), None);
    }

    #[test]
    fn test_cookie_header_value() {
        let mut config = CookieConfig::default();
        config.secure = true;
        config.http_only = true;
        config.same_site = CookieSameSite::Strict;
        let cookie = RefreshCookie::new(config);

        let header = cookie.header_value("tok", Some(604800));
        assert!(header.starts_with("refresh_token=tok"));
        assert!(header.contains("; HttpOnly"));
        assert!(header.contains("; Secure"));
        assert!(header.contains("; SameSite=Strict"));
        assert!(header.contains("; Max-Age=604800"));
        assert!(header.contains("; Path=/"));
    }
}
