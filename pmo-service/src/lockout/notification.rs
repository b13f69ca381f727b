//! Lockout notification hooks
//!
//! Handlers receive lockout lifecycle events after the attempt that caused
//! them has committed. Dispatch goes through `tokio::spawn`, so a slow
//! handler never delays the login response.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Events emitted during the lockout lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LockoutEvent {
    /// A login attempt failed on a wrong password
    FailedAttempt {
        /// Login name of the account
        identity: String,
        /// Failed attempts so far, including this one
        attempt_count: u32,
        /// Failed attempts that trigger a lock
        max_attempts: u32,
    },
    /// The account has been locked
    AccountLocked {
        /// Login name of the account
        identity: String,
        /// Account id
        employee_id: i64,
        /// Lock expiry
        locked_until: DateTime<Utc>,
        /// How long the account is locked (seconds)
        lockout_duration_secs: u64,
    },
    /// The account has been unlocked
    AccountUnlocked {
        /// Login name of the account
        identity: String,
        /// Why the account was unlocked
        reason: UnlockReason,
    },
}

/// Reason an account was unlocked
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnlockReason {
    /// The lock window passed and the next attempt cleared it
    Expired,
    /// An administrator cleared the lock
    AdminAction,
}

impl std::fmt::Display for UnlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::AdminAction => write!(f, "admin_action"),
        }
    }
}

/// Trait for receiving lockout lifecycle notifications
///
/// # Example
///
/// ```rust,ignore
/// use pmo_service::lockout::{LockoutEvent, LockoutNotification};
///
/// struct EmailNotifier { /* ... */ }
///
/// #[async_trait]
/// impl LockoutNotification for EmailNotifier {
///     async fn on_event(&self, event: LockoutEvent) {
///         if let LockoutEvent::AccountLocked { identity, .. } = event {
///             // send_lockout_email(&identity).await;
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait LockoutNotification: Send + Sync + 'static {
    /// Called when a lockout lifecycle event occurs
    ///
    /// Invoked inside `tokio::spawn`; implementations handle their own
    /// errors (log and continue).
    async fn on_event(&self, event: LockoutEvent);
}

/// Writes lock and unlock events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl LockoutNotification for TracingNotifier {
    async fn on_event(&self, event: LockoutEvent) {
        match event {
            LockoutEvent::AccountLocked {
                identity,
                employee_id,
                locked_until,
                lockout_duration_secs,
            } => {
                tracing::warn!(
                    identity = %identity,
                    employee_id,
                    locked_until = %locked_until,
                    lockout_duration_secs,
                    "Account locked after repeated login failures"
                );
            }
            LockoutEvent::AccountUnlocked { identity, reason } => {
                tracing::info!(identity = %identity, reason = %reason, "Account unlocked");
            }
            LockoutEvent::FailedAttempt { .. } => {}
        }
    }
}
