//! Password hashing and policy validation

use crate::config::PasswordConfig;
use crate::{AuthError, AuthResult};
use rand::thread_rng;

#[cfg(feature = "argon2")]
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

#[cfg(feature = "bcrypt")]
use bcrypt::{hash, verify, DEFAULT_COST};

/// Password hasher trait for different hashing algorithms
pub trait PasswordHasher: Send + Sync {
    /// Hash a password. A per-call random salt is embedded in the
    /// output, so repeated calls on the same input differ.
    fn hash_password(&self, password: &str) -> AuthResult<String>;

    /// Verify a password against its hash. A malformed hash verifies
    /// as false, it is not an error.
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool>;

    /// Get the hasher name
    fn hasher_name(&self) -> &str;
}

/// Argon2id password hasher
#[cfg(feature = "argon2")]
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

#[cfg(feature = "argon2")]
impl Argon2Hasher {
    /// Create a new Argon2 hasher with custom parameters
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Create an Argon2 hasher with default parameters
    pub fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,       // 3 iterations
            parallelism: 4,     // 4 threads
        }
    }

    /// Create an Argon2 hasher optimized for development (faster)
    pub fn development() -> Self {
        Self {
            memory_cost: 4096, // 4 MB
            time_cost: 2,      // 2 iterations
            parallelism: 2,    // 2 threads
        }
    }

    fn instance(&self) -> AuthResult<Argon2<'static>> {
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            argon2::Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
                .map_err(|e| AuthError::crypto_error(e.to_string()))?,
        ))
    }
}

#[cfg(feature = "argon2")]
impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut thread_rng());
        let password_hash = self
            .instance()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::crypto_error(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        // A hash that does not parse cannot match any password.
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(false),
        };

        match self
            .instance()?
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn hasher_name(&self) -> &str {
        "argon2"
    }
}

/// bcrypt password hasher
#[cfg(feature = "bcrypt")]
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

#[cfg(feature = "bcrypt")]
impl BcryptHasher {
    /// Create a new bcrypt hasher with custom cost
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Create a bcrypt hasher with default cost
    pub fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }

    /// Create a bcrypt hasher optimized for development (faster)
    pub fn development() -> Self {
        Self { cost: 4 }
    }
}

#[cfg(feature = "bcrypt")]
impl PasswordHasher for BcryptHasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        hash(password, self.cost).map_err(AuthError::from)
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        // Any parse failure means the hash is malformed, and no
        // password matches a malformed hash.
        Ok(verify(password, hash).unwrap_or(false))
    }

    fn hasher_name(&self) -> &str {
        "bcrypt"
    }
}

/// Builds the configured hasher. An unknown algorithm is a fatal
/// configuration error, not a per-request condition.
pub struct PasswordHasherFactory;

impl PasswordHasherFactory {
    /// Create a password hasher from the password configuration
    pub fn from_config(config: &PasswordConfig) -> AuthResult<Box<dyn PasswordHasher>> {
        match config.hash_algorithm.as_str() {
            #[cfg(feature = "argon2")]
            "argon2" => Ok(Box::new(Argon2Hasher::new(
                config.argon2_memory,
                config.argon2_iterations,
                config.argon2_parallelism,
            ))),
            #[cfg(feature = "bcrypt")]
            "bcrypt" => Ok(Box::new(BcryptHasher::new(config.bcrypt_cost))),
            other => Err(AuthError::config_error(format!(
                "Unknown password hashing algorithm: {} (or feature not enabled)",
                other
            ))),
        }
    }
}

/// Validate a plaintext password against the configured policy
pub fn validate_password_policy(password: &str, config: &PasswordConfig) -> AuthResult<()> {
    if password.len() < config.min_length {
        return Err(AuthError::validation(format!(
            "Password must be at least {} characters long",
            config.min_length
        )));
    }

    if password.len() > config.max_length {
        return Err(AuthError::validation(format!(
            "Password must be at most {} characters long",
            config.max_length
        )));
    }

    if config.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        return Err(AuthError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }

    if config.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        return Err(AuthError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }

    if config.require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::validation(
            "Password must contain at least one number",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "argon2")]
    #[test]
    fn test_argon2_hasher() {
        let hasher = Argon2Hasher::development(); // Use low cost for tests
        let password = "test_password_123";

        let hash = hasher.hash_password(password).unwrap();
        assert!(!hash.is_empty());
        assert_ne!(hash, password);

        assert!(hasher.verify_password(password, &hash).unwrap());
        assert!(!hasher.verify_password("wrong_password", &hash).unwrap());
    }

    #[cfg(feature = "argon2")]
    #[test]
    fn test_argon2_salted_hashes_differ() {
        let hasher = Argon2Hasher::development();
        let first = hasher.hash_password("same input").unwrap();
        let second = hasher.hash_password("same input").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify_password("same input", &first).unwrap());
        assert!(hasher.verify_password("same input", &second).unwrap());
    }

    #[cfg(feature = "argon2")]
    #[test]
    fn test_malformed_hash_verifies_false() {
        let hasher = Argon2Hasher::development();
        assert!(!hasher.verify_password("anything", "not-a-hash").unwrap());
        assert!(!hasher.verify_password("anything", "").unwrap());
    }

    #[cfg(feature = "bcrypt")]
    #[test]
    fn test_bcrypt_hasher() {
        let hasher = BcryptHasher::development();
        let password = "test_password_123";

        let hash = hasher.hash_password(password).unwrap();
        assert!(hasher.verify_password(password, &hash).unwrap());
        assert!(!hasher.verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hasher_factory() {
        let mut config = PasswordConfig::default();

        #[cfg(feature = "argon2")]
        {
            config.hash_algorithm = "argon2".to_string();
            let hasher = PasswordHasherFactory::from_config(&config).unwrap();
            assert_eq!(hasher.hasher_name(), "argon2");
        }

        #[cfg(feature = "bcrypt")]
        {
            config.hash_algorithm = "bcrypt".to_string();
            let hasher = PasswordHasherFactory::from_config(&config).unwrap();
            assert_eq!(hasher.hasher_name(), "bcrypt");
        }

        config.hash_algorithm = "md5".to_string();
        assert!(PasswordHasherFactory::from_config(&config).is_err());
    }

    #[test]
    fn test_password_policy() {
        let mut config = PasswordConfig::default();
        config.min_length = 8;
        config.require_numbers = true;

        assert!(validate_password_policy("longenough1", &config).is_ok());
        assert!(validate_password_policy("short1", &config).is_err());
        assert!(validate_password_policy("nonumbershere", &config).is_err());
    }
}
