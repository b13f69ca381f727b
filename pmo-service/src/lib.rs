//! # pmo-service
//!
//! Employee authentication for the CompanyPMO project-management backend.
//!
//! ## Features
//!
//! - **Login with account lockout**: failed-attempt counter, timed lock window,
//!   lazy unlock on expiry, owner notification on lock
//! - **Atomic attempts**: each attempt holds the account's row lock from
//!   lookup to commit, so concurrent attempts cannot skip the threshold
//! - **Credential storage**: Argon2id password hashing
//! - **Sessions**: signed JWT delivered as an `HttpOnly` cookie
//! - **Account stores**: PostgreSQL (`database` feature) or in-memory
//! - **Health checks**: Liveness and readiness probes
//! - **Graceful shutdown**: Proper signal handling (SIGTERM, SIGINT)
//!
//! ## Example
//!
//! ```rust,no_run
//! use pmo_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::builder()
//!         .config(config.clone())
//!         .notification(Arc::new(TracingNotifier))
//!         .build()
//!         .await?;
//!
//!     Server::new(config).serve(router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod employees;
pub mod error;
pub mod handlers;
pub mod health;
pub mod lockout;
pub mod observability;
pub mod repository;
pub mod server;
pub mod state;

#[cfg(feature = "database")]
pub mod database;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{
        JwtIssuer, PasswordConfig, PasswordHasher, SessionClaims, SessionIssuer, TokenConfig,
    };
    pub use crate::config::{Config, DatabaseConfig, ServiceConfig};
    pub use crate::employees::{register, EmployeeRegistration};
    pub use crate::error::{Error, ErrorResponse, Result};
    pub use crate::handlers::router;
    pub use crate::health::{health, readiness};
    pub use crate::lockout::{
        AuthOutcome, AuthResult, Authenticator, LockoutConfig, LockoutEnforcement, LockoutEvent,
        LockoutNotification, TracingNotifier, UnlockReason,
    };
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        Account, AccountGuard, AccountStore, EmployeeIdentity, MemoryAccountStore, NewAccount,
        Notification, RepositoryError, RepositoryErrorKind,
    };
    pub use crate::server::Server;
    pub use crate::state::{AppState, AppStateBuilder};

    #[cfg(feature = "database")]
    pub use crate::database::create_pool;
    #[cfg(feature = "database")]
    pub use crate::repository::PgAccountStore;

    pub use std::sync::Arc;
    pub use tracing::{debug, error, info, warn};
}
