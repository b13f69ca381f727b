//! Authentication configuration structures
//!
//! Configuration for password hashing and session token issuance.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Password hashing configuration following OWASP guidelines
///
/// Default values are based on OWASP recommendations for Argon2id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    #[serde(default = "default_memory_cost")]
    pub memory_cost_kib: u32,

    /// Time cost / iterations (default: 3)
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,

    /// Parallelism degree (default: 4)
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,

    /// Minimum password length accepted at registration (default: 8)
    #[serde(default = "default_min_length")]
    pub min_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: default_memory_cost(),
            time_cost: default_time_cost(),
            parallelism: default_parallelism(),
            min_password_length: default_min_length(),
        }
    }
}

/// Session token configuration
///
/// Exactly one of `secret` (HMAC algorithms) or `key_path` (RSA/EC PEM) is
/// used, depending on `algorithm`.
///
/// # Example (config.toml)
///
/// ```toml
/// [tokens]
/// algorithm = "HS256"
/// secret = "change-me"
/// issuer = "company-pmo"
/// lifetime_secs = 604800
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// JWT algorithm (RS256, RS384, RS512, ES256, ES384, HS256, HS384, HS512)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Shared secret for HS* algorithms
    #[serde(default)]
    pub secret: Option<String>,

    /// Path to a PEM private key for RS*/ES* algorithms
    #[serde(default)]
    pub key_path: Option<PathBuf>,

    /// Path to the matching PEM public key for RS*/ES* algorithms
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,

    /// Issuer claim
    #[serde(default)]
    pub issuer: Option<String>,

    /// Audience claim
    #[serde(default)]
    pub audience: Option<String>,

    /// Token lifetime in seconds (default: 604800 = 7 days)
    #[serde(default = "default_lifetime")]
    pub lifetime_secs: u64,

    /// Name of the cookie carrying the token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the cookie `Secure` (default: true)
    #[serde(default = "default_true")]
    pub secure_cookie: bool,

    /// Role allowed to look up other employees (default: "supervisor")
    #[serde(default = "default_supervisor_role")]
    pub supervisor_role: String,
}

impl TokenConfig {
    /// Validate the configuration, returning an error message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.lifetime_secs == 0 {
            return Err("lifetime_secs must be greater than 0".to_string());
        }
        if i64::try_from(self.lifetime_secs).is_err() {
            return Err("lifetime_secs is out of range".to_string());
        }
        if self.cookie_name.is_empty() {
            return Err("cookie_name must not be empty".to_string());
        }
        if self.algorithm.to_uppercase().starts_with("HS") {
            match self.secret.as_deref() {
                Some(secret) if !secret.is_empty() => {}
                _ => return Err(format!("secret is required for {}", self.algorithm)),
            }
        } else if self.key_path.is_none() {
            return Err(format!("key_path is required for {}", self.algorithm));
        } else if self.public_key_path.is_none() {
            return Err(format!("public_key_path is required for {}", self.algorithm));
        }
        Ok(())
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            secret: None,
            key_path: None,
            public_key_path: None,
            issuer: None,
            audience: None,
            lifetime_secs: default_lifetime(),
            cookie_name: default_cookie_name(),
            secure_cookie: true,
            supervisor_role: default_supervisor_role(),
        }
    }
}

// Default value functions

fn default_memory_cost() -> u32 {
    65536 // 64 MiB
}

fn default_time_cost() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

fn default_min_length() -> usize {
    8
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_lifetime() -> u64 {
    604800 // 7 days
}

fn default_cookie_name() -> String {
    "JwtToken".to_string()
}

fn default_true() -> bool {
    true
}

fn default_supervisor_role() -> String {
    "supervisor".to_string()
}
