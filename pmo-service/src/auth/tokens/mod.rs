//! Session token issuance and validation
//!
//! The login handler turns an authenticated [`EmployeeIdentity`] into a
//! signed token through a [`SessionIssuer`], and protected handlers turn the
//! token back into [`SessionClaims`]. The only shipped issuer is
//! [`JwtIssuer`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pmo_service::auth::{JwtIssuer, SessionIssuer, TokenConfig};
//!
//! let issuer = JwtIssuer::new(&token_config)?;
//! let token = issuer.issue(&identity)?;
//! let claims = issuer.validate(&token)?;
//! assert!(claims.has_role("employee"));
//! ```

pub mod jwt;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::repository::EmployeeIdentity;

pub use jwt::JwtIssuer;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject, `employee:{id}`
    pub sub: String,

    /// Login name
    pub username: String,

    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token ID
    pub jti: String,

    /// Issuer (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl SessionClaims {
    /// Claims for an employee, valid from `iat` for `lifetime`
    pub fn for_identity(identity: &EmployeeIdentity, iat: i64, lifetime: Duration) -> Self {
        let lifetime_secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: format!("employee:{}", identity.id),
            username: identity.username.clone(),
            roles: vec![identity.role.clone()],
            exp: iat.saturating_add(lifetime_secs),
            iat,
            jti: uuid::Uuid::new_v4().to_string(),
            iss: None,
            aud: None,
        }
    }

    /// Employee id parsed back out of the subject
    pub fn employee_id(&self) -> Option<i64> {
        self.sub.strip_prefix("employee:")?.parse().ok()
    }

    /// Whether the token carries `role`, compared case-insensitively
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Issues and validates session tokens
pub trait SessionIssuer: Send + Sync + 'static {
    /// Sign a token for `identity` with the default lifetime
    fn issue(&self, identity: &EmployeeIdentity) -> Result<String, Error>;

    /// Check a token's signature and expiry and return its claims
    ///
    /// Any rejection is [`Error::Unauthorized`].
    fn validate(&self, token: &str) -> Result<SessionClaims, Error>;

    /// Lifetime of issued tokens
    fn lifetime(&self) -> Duration;
}
