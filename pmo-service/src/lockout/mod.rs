//! Login authentication with account lockout
//!
//! Verifies credentials against the account store while tracking failed
//! attempts per employee. Once the failures reach the threshold the account
//! is locked for a fixed window; the lock is cleared lazily by the first
//! attempt after it expires.
//!
//! # Architecture
//!
//! - **Policy**: [`LockoutPolicy`] holds the pure state transitions
//! - **Authenticator**: [`Authenticator`] runs one attempt under the
//!   account's exclusive lock and commits the result atomically
//! - **Notifications**: Register [`LockoutNotification`] handlers for events
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pmo_service::lockout::{Authenticator, AuthOutcome, TracingNotifier};
//!
//! let authenticator = Authenticator::new(store, hasher, &config.lockout)
//!     .with_notification(Arc::new(TracingNotifier));
//!
//! // In your login handler:
//! let result = authenticator.authenticate(&form.username, &form.password).await?;
//! if result.result == AuthOutcome::Blocked { /* return 423 */ }
//! ```

pub mod authenticator;
pub mod config;
pub mod notification;
pub mod policy;

pub use authenticator::{normalize_username, AuthOutcome, AuthResult, Authenticator};
pub use config::{LockoutConfig, LockoutEnforcement};
pub use notification::{LockoutEvent, LockoutNotification, TracingNotifier, UnlockReason};
pub use policy::{Evaluation, FailureOutcome, LockoutPolicy};
