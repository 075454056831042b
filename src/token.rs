//! JWT issuance and validation
//!
//! Tokens are signed, self-contained credentials carrying the subject,
//! the absolute expiry, and the token type. The type is embedded in
//! the signed payload: it is the only defense against a refresh token
//! being replayed where an access token is required, so validation
//! always checks it.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::{AuthError, AuthResult};

/// Token type discriminator, part of the signed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed claim set. The subject claim is always `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Absolute expiry, seconds since the epoch
    pub exp: i64,

    /// Issued-at, seconds since the epoch
    pub iat: i64,

    /// Issuer
    pub iss: String,

    /// Access or refresh
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Issues and validates signed, expiring tokens from a symmetric
/// secret held in process-wide configuration.
#[derive(Clone)]
pub struct JwtProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtProvider {
    /// Create a provider from JWT configuration
    pub fn new(config: &JwtConfig) -> AuthResult<Self> {
        if config.secret.len() < 32 {
            return Err(AuthError::config_error(
                "JWT secret must be at least 32 characters",
            ));
        }

        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(AuthError::config_error(format!(
                    "Unsupported JWT algorithm: {other}"
                )))
            }
        };

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm,
            issuer: config.issuer.clone(),
            access_ttl: Duration::seconds(config.access_token_expiry as i64),
            refresh_ttl: Duration::seconds(config.refresh_token_expiry as i64),
        })
    }

    /// Issue a short-lived access token for the subject
    pub fn issue_access(&self, subject: &str) -> AuthResult<String> {
        self.issue(subject, TokenType::Access, self.access_ttl)
    }

    /// Issue a long-lived refresh token for the subject
    pub fn issue_refresh(&self, subject: &str) -> AuthResult<String> {
        self.issue(subject, TokenType::Refresh, self.refresh_ttl)
    }

    /// Issue a token of the given type with an explicit TTL
    pub fn issue(&self, subject: &str, token_type: TokenType, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            token_type,
        };

        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and check its embedded type. Fails with
    /// `ExpiredToken` past the expiry, `InvalidToken` on a bad
    /// signature or malformed token, and `TokenTypeMismatch` when the
    /// embedded type is not the expected one.
    pub fn validate(&self, token: &str, expected_type: TokenType) -> AuthResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        // A token is expired the moment `exp` passes; no clock leeway.
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)?;
        let claims = data.claims;

        if claims.token_type != expected_type {
            return Err(AuthError::type_mismatch(
                expected_type.as_str(),
                claims.token_type.as_str(),
            ));
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for JwtProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtProvider")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
