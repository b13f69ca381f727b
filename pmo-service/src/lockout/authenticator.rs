//! Login authenticator
//!
//! Answers "may this username/password pair sign in, and what state is the
//! account in now?". Each attempt holds the account's exclusive lock from
//! lookup to commit, so concurrent attempts on one account see each other's
//! counters.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::LockoutConfig;
use super::notification::{LockoutEvent, LockoutNotification, UnlockReason};
use super::policy::{self, Evaluation, FailureOutcome, LockoutPolicy};
use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::repository::{AccountGuard, AccountStore, EmployeeIdentity, Notification};

/// Outcome of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthOutcome {
    /// Password matched on an unlocked account
    Authenticated,
    /// The account is locked; the password was not checked
    Blocked,
    /// No account has this username
    DoesNotExist,
    /// Password did not match
    WrongCredentials,
    /// Username or password missing
    InvalidRequest,
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => write!(f, "authenticated"),
            Self::Blocked => write!(f, "blocked"),
            Self::DoesNotExist => write!(f, "does_not_exist"),
            Self::WrongCredentials => write!(f, "wrong_credentials"),
            Self::InvalidRequest => write!(f, "invalid_request"),
        }
    }
}

/// Result of [`Authenticator::authenticate`]
///
/// Serializes as `{ "result", "message", "employee" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResult {
    /// Outcome of the attempt
    pub result: AuthOutcome,
    /// Human-readable message
    pub message: String,
    /// Public identity, present only when authenticated
    pub employee: Option<EmployeeIdentity>,
    /// Seconds until the lock expires, at least 1; set on every blocked result
    #[serde(skip)]
    pub retry_after_secs: Option<u64>,
}

impl AuthResult {
    fn new(result: AuthOutcome, message: impl Into<String>) -> Self {
        Self {
            result,
            message: message.into(),
            employee: None,
            retry_after_secs: None,
        }
    }

    fn authenticated(identity: EmployeeIdentity) -> Self {
        Self {
            message: format!("Welcome, {}", identity.username),
            employee: Some(identity),
            ..Self::new(AuthOutcome::Authenticated, "")
        }
    }

    fn blocked(remaining_minutes: i64, locked_until: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let secs = (locked_until - now).num_seconds().max(1);
        Self {
            retry_after_secs: Some(secs.unsigned_abs()),
            ..Self::new(
                AuthOutcome::Blocked,
                format!("Your account has been blocked for {remaining_minutes} minutes."),
            )
        }
    }

    fn does_not_exist() -> Self {
        Self::new(
            AuthOutcome::DoesNotExist,
            "Apparently, this user does not exist.",
        )
    }

    fn invalid_request() -> Self {
        Self::new(
            AuthOutcome::InvalidRequest,
            "Username and password are required.",
        )
    }

    /// Whether the attempt was authenticated
    pub fn is_authenticated(&self) -> bool {
        self.result == AuthOutcome::Authenticated
    }
}

/// Login authenticator
///
/// Construct once at startup and share through `AppState`.
///
/// # Example
///
/// ```rust,ignore
/// let authenticator = Authenticator::new(store, hasher, &config.lockout)
///     .with_notification(Arc::new(TracingNotifier));
///
/// let result = authenticator.authenticate("jdoe", "hunter2").await?;
/// match result.result {
///     AuthOutcome::Authenticated => { /* issue a session */ }
///     AuthOutcome::Blocked => { /* 423 */ }
///     _ => { /* 401 / 400 */ }
/// }
/// ```
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    policy: LockoutPolicy,
    lockout_duration_secs: u64,
    notifications: Vec<Arc<dyn LockoutNotification>>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("policy", &self.policy)
            .field("notifications", &self.notifications.len())
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator over an account store
    pub fn new(store: Arc<dyn AccountStore>, hasher: PasswordHasher, config: &LockoutConfig) -> Self {
        Self {
            store,
            hasher,
            policy: LockoutPolicy::new(config),
            lockout_duration_secs: config.lockout_duration_secs,
            notifications: Vec::new(),
        }
    }

    /// Register a notification handler for lockout events
    ///
    /// Multiple handlers can be registered. Events are dispatched
    /// via `tokio::spawn` (fire-and-forget) after the attempt commits.
    pub fn with_notification(mut self, handler: Arc<dyn LockoutNotification>) -> Self {
        self.notifications.push(handler);
        self
    }

    /// The lockout policy in force
    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Authenticate a login attempt at the current time
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthResult> {
        self.authenticate_at(username, password, Utc::now()).await
    }

    /// Authenticate a login attempt as of `now`
    ///
    /// Only storage and credential-integrity failures are errors; every
    /// other outcome is an [`AuthResult`].
    pub async fn authenticate_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthResult> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            debug!("Login rejected: missing username or password");
            return Ok(AuthResult::invalid_request());
        }

        let Some(mut guard) = self.store.lock_account(&username).await? else {
            debug!(identity = %username, "Login rejected: unknown account");
            return Ok(AuthResult::does_not_exist());
        };

        let mut account = guard.account().clone();
        let mut events = Vec::new();

        let evaluation = self.policy.evaluate(&mut account, now);
        match evaluation {
            Evaluation::LockedNow { locked_until, .. } => {
                guard.save(&account);
                guard.notify(Notification::account_locked(account.id, now));
                events.push(self.locked_event(&account.username, account.id, locked_until));
            }
            Evaluation::Expired => {
                guard.save(&account);
                events.push(LockoutEvent::AccountUnlocked {
                    identity: account.username.clone(),
                    reason: UnlockReason::Expired,
                });
            }
            Evaluation::Unchanged | Evaluation::StillLocked { .. } => {}
        }

        if let Some((locked_until, remaining_minutes)) = evaluation.lock_window() {
            self.finish(guard, events).await?;
            if matches!(evaluation, Evaluation::LockedNow { .. }) {
                warn!(
                    identity = %account.username,
                    employee_id = account.id,
                    lockout_duration_secs = self.lockout_duration_secs,
                    "Account locked due to repeated login failures"
                );
            }
            debug!(
                identity = %account.username,
                remaining_minutes,
                "Login rejected: account locked"
            );
            return Ok(AuthResult::blocked(remaining_minutes, locked_until, now));
        }

        let matched = self
            .hasher
            .verify_blocking(password, &account.password_hash)
            .await?;

        if matched {
            let mut changed = self.policy.record_success(&mut account);
            if self.hasher.needs_rehash(&account.password_hash) {
                match self.hasher.hash_blocking(password).await {
                    Ok(hash) => {
                        account.password_hash = hash;
                        changed = true;
                        debug!(identity = %account.username, "Password hash upgraded");
                    }
                    Err(e) => {
                        warn!(identity = %account.username, error = %e, "Password hash upgrade skipped");
                    }
                }
            }
            if changed {
                guard.save(&account);
            }
            self.finish(guard, events).await?;
            info!(identity = %account.username, employee_id = account.id, "Login succeeded");
            return Ok(AuthResult::authenticated(account.identity()));
        }

        let failure = self.policy.record_failure(&mut account, now);
        guard.save(&account);
        events.push(LockoutEvent::FailedAttempt {
            identity: account.username.clone(),
            attempt_count: failure.attempts(),
            max_attempts: self.policy.max_attempts(),
        });

        let mut message = format!("Wrong credentials. You have tried {} times", failure.attempts());
        if let FailureOutcome::Locked {
            locked_until,
            remaining_minutes,
            ..
        } = failure
        {
            guard.notify(Notification::account_locked(account.id, now));
            events.push(self.locked_event(&account.username, account.id, locked_until));
            message.push_str(&format!(
                ". Your account has been blocked for {remaining_minutes} minutes."
            ));
        }

        self.finish(guard, events).await?;

        debug!(
            identity = %account.username,
            attempt_count = failure.attempts(),
            max_attempts = self.policy.max_attempts(),
            "Login failure recorded"
        );
        if matches!(failure, FailureOutcome::Locked { .. }) {
            warn!(
                identity = %account.username,
                employee_id = account.id,
                lockout_duration_secs = self.lockout_duration_secs,
                "Account locked due to repeated login failures"
            );
        }

        Ok(AuthResult::new(AuthOutcome::WrongCredentials, message))
    }

    /// Manually unlock an account (admin action)
    ///
    /// Clears the lock and resets the counter. Returns whether the account
    /// was locked.
    pub async fn unlock(&self, username: &str) -> Result<bool> {
        let username = normalize_username(username);
        let Some(mut guard) = self.store.lock_account(&username).await? else {
            return Err(Error::NotFound(format!("Employee '{}' not found", username)));
        };

        let mut account = guard.account().clone();
        let was_locked = account.lock_enabled || account.locked_until.is_some();
        if !was_locked && account.failed_attempts == 0 {
            return Ok(false);
        }

        policy::clear(&mut account);
        guard.save(&account);

        let mut events = Vec::new();
        if was_locked {
            events.push(LockoutEvent::AccountUnlocked {
                identity: account.username.clone(),
                reason: UnlockReason::AdminAction,
            });
        }
        self.finish(guard, events).await?;

        info!(identity = %account.username, "Account manually unlocked (admin)");
        Ok(was_locked)
    }

    fn locked_event(
        &self,
        identity: &str,
        employee_id: i64,
        locked_until: DateTime<Utc>,
    ) -> LockoutEvent {
        LockoutEvent::AccountLocked {
            identity: identity.to_string(),
            employee_id,
            locked_until,
            lockout_duration_secs: self.lockout_duration_secs,
        }
    }

    /// Commit staged writes, then dispatch events
    async fn finish(&self, guard: Box<dyn AccountGuard>, events: Vec<LockoutEvent>) -> Result<()> {
        if guard.is_dirty() {
            guard.commit().await?;
        }
        for event in events {
            self.notify(event);
        }
        Ok(())
    }

    /// Dispatch a notification event to all registered handlers
    fn notify(&self, event: LockoutEvent) {
        for handler in &self.notifications {
            let handler = Arc::clone(handler);
            let event = event.clone();
            tokio::spawn(async move {
                handler.on_event(event).await;
            });
        }
    }
}

/// Usernames are stored lower-cased and matched case-insensitively
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}
