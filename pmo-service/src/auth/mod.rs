//! Credential handling: password hashing and session tokens
//!
//! # Example
//!
//! ```rust,ignore
//! use pmo_service::auth::{JwtIssuer, PasswordConfig, PasswordHasher, SessionIssuer};
//!
//! let hasher = PasswordHasher::new(PasswordConfig::default())?;
//! let hash = hasher.hash("my_secure_password")?;
//! assert!(hasher.verify("my_secure_password", &hash)?);
//!
//! let issuer = JwtIssuer::new(&config.tokens)?;
//! let token = issuer.issue(&identity)?;
//! ```

// Configuration
pub mod config;

// Password hashing (Argon2id)
pub mod password;

// Session token issuance
pub mod tokens;

pub use config::{PasswordConfig, TokenConfig};
pub use password::PasswordHasher;
pub use tokens::{JwtIssuer, SessionClaims, SessionIssuer};
