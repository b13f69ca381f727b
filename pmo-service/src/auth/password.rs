//! Password hashing using Argon2id
//!
//! Follows OWASP recommendations; Argon2id is the recommended algorithm for
//! password storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use pmo_service::auth::{PasswordConfig, PasswordHasher};
//!
//! let hasher = PasswordHasher::new(PasswordConfig::default())?;
//!
//! let hash = hasher.hash("my_secure_password")?;
//! assert!(hasher.verify("my_secure_password", &hash)?);
//! assert!(!hasher.verify("wrong_password", &hash)?);
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::auth::config::PasswordConfig;
use crate::error::Error;

/// Password hasher using Argon2id
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}

impl PasswordHasher {
    /// Create a password hasher from configuration
    ///
    /// Fails when the Argon2 parameters are out of range.
    pub fn new(config: PasswordConfig) -> Result<Self, Error> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None, // Use default output length
        )
        .map_err(|e| Error::Internal(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            params,
            min_password_length: config.min_password_length,
        })
    }

    /// Hash a password
    ///
    /// Returns a self-describing PHC string (algorithm, parameters, salt and
    /// hash). Passwords shorter than `min_password_length` are rejected with
    /// [`Error::ValidationError`].
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        if password.chars().count() < self.min_password_length {
            return Err(Error::ValidationError(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    ///
    /// Uses constant-time comparison. A hash that cannot be parsed is a
    /// storage integrity problem and is reported as [`Error::Auth`], not as a
    /// mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Auth(format!("Invalid password hash format: {}", e)))?;

        // Parameters are read from the hash
        let argon2 = Argon2::default();

        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Auth(format!("Password verification failed: {}", e))),
        }
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    ///
    /// Argon2 is deliberately slow; running it inline would stall the async
    /// worker for the duration of the hash.
    pub async fn verify_blocking(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let hasher = self.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))?
    }

    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn hash_blocking(&self, password: &str) -> Result<String, Error> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// Check if a hash was produced with different parameters
    ///
    /// Lets stored hashes be upgraded on the next successful login.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return true;
        };

        if parsed_hash.algorithm != argon2::Algorithm::Argon2id.ident() {
            return true;
        }

        // Version 0x13 = 19
        if parsed_hash.version != Some(19) {
            return true;
        }

        let param = |name: &str| {
            parsed_hash
                .params
                .iter()
                .find(|(k, _)| k.as_str() == name)
                .and_then(|(_, v)| v.decimal().ok())
        };

        param("m") != Some(self.params.m_cost())
            || param("t") != Some(self.params.t_cost())
            || param("p") != Some(self.params.p_cost())
    }

    /// Get the minimum password length requirement
    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }
}
