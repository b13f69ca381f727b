//! Account store trait definitions
//!
//! - [`AccountStore`]: lookup, registration and locked read-modify-write access
//! - [`AccountGuard`]: a unit of work over one account, holding its exclusive lock
//!
//! A login attempt reads the account through [`AccountStore::lock_account`],
//! stages its changes on the guard, and applies them with
//! [`AccountGuard::commit`]. Concurrent attempts on the same account wait on
//! the lock, so each attempt sees the previous attempt's committed counter.
//!
//! ```rust,ignore
//! let Some(mut guard) = store.lock_account("jdoe").await? else {
//!     return Ok(None);
//! };
//! let mut account = guard.account().clone();
//! account.failed_attempts += 1;
//! guard.save(&account);
//! guard.commit().await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::RepositoryError;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Subject line of the notification persisted when an account is locked
pub const LOCKOUT_NOTIFICATION_NAME: &str = "System notification";

/// Body of the notification persisted when an account is locked
pub const LOCKOUT_NOTIFICATION_CONTENT: &str =
    "Your account was temporary blocked because of multiple failed login attempts.";

/// Credential and lockout state of one employee account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Database generated identifier
    pub id: i64,
    /// Lower-cased login name
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Consecutive failed attempts while unlocked
    pub failed_attempts: u32,
    /// Lock expiry, set only while locked
    pub locked_until: Option<DateTime<Utc>>,
    /// Mirrors `locked_until.is_some()` as of the last evaluation
    pub lock_enabled: bool,
    /// Public profile picture URL
    pub profile_picture: Option<String>,
    /// Role name carried into session claims
    pub role: String,
}

impl Account {
    /// Public identity of this account
    pub fn identity(&self) -> EmployeeIdentity {
        EmployeeIdentity {
            id: self.id,
            username: self.username.clone(),
            profile_picture: self.profile_picture.clone(),
            role: self.role.clone(),
        }
    }
}

/// Identity returned to callers after authentication or registration
///
/// Never carries credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeIdentity {
    /// Employee id
    pub id: i64,
    /// Login name
    pub username: String,
    /// Public profile picture URL
    pub profile_picture: Option<String>,
    /// Role name
    pub role: String,
}

/// Data required to create an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Lower-cased login name
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Contact email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Gender as entered at registration
    pub gender: String,
    /// Contact phone number
    pub phone_number: String,
    /// Role name
    pub role: String,
    /// Owning company
    pub company_id: Option<i64>,
    /// Pay or seniority tier
    pub tier_id: Option<i64>,
    /// Reporting line
    pub supervisor_id: Option<i64>,
    /// Public profile picture URL
    pub profile_picture: Option<String>,
}

/// Owner-facing notification row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short subject
    pub name: String,
    /// Message body
    pub content: String,
    /// Account that receives the notification
    pub receiver_id: i64,
    /// Creation time
    pub created: DateTime<Utc>,
}

impl Notification {
    /// The notification persisted alongside a lock transition
    pub fn account_locked(receiver_id: i64, created: DateTime<Utc>) -> Self {
        Self {
            name: LOCKOUT_NOTIFICATION_NAME.to_string(),
            content: LOCKOUT_NOTIFICATION_CONTENT.to_string(),
            receiver_id,
            created,
        }
    }
}

/// Exclusive unit of work over one account
///
/// The account lock is held for the guard's lifetime. Writes staged with
/// [`save`](Self::save) and [`notify`](Self::notify) are applied together by
/// [`commit`](Self::commit); dropping the guard without committing discards
/// them and releases the lock.
#[async_trait]
pub trait AccountGuard: Send {
    /// The account as read under the lock, with any staged save applied
    fn account(&self) -> &Account;

    /// Stage the new state of the account
    fn save(&mut self, account: &Account);

    /// Stage a notification row
    fn notify(&mut self, notification: Notification);

    /// Whether any write is staged
    fn is_dirty(&self) -> bool;

    /// Apply all staged writes atomically and release the lock
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;
}

/// Persistent store of employee accounts
///
/// Usernames are matched exactly; callers lower-case them first.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Read an account and take its exclusive lock
    ///
    /// Returns `Ok(None)` when no account has this username.
    async fn lock_account(&self, username: &str) -> RepositoryResult<Option<Box<dyn AccountGuard>>>;

    /// Read an account without locking it
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>>;

    /// Read an account by id without locking it
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Account>>;

    /// Create an account with a zero counter and no lock
    ///
    /// Fails with [`RepositoryErrorKind::AlreadyExists`](super::RepositoryErrorKind::AlreadyExists)
    /// when the username is taken.
    async fn create(&self, account: NewAccount) -> RepositoryResult<Account>;

    /// Notifications persisted for an account, oldest first
    async fn notifications_for(&self, receiver_id: i64) -> RepositoryResult<Vec<Notification>>;

    /// Check that the backing storage is reachable
    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_omits_hash() {
        let account = Account {
            id: 7,
            username: "jdoe".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            failed_attempts: 2,
            locked_until: None,
            lock_enabled: false,
            profile_picture: Some("https://img.example/jdoe.png".to_string()),
            role: "employee".to_string(),
        };
        let identity = account.identity();
        assert_eq!(identity.id, 7);
        assert_eq!(identity.role, "employee");

        let json = serde_json::to_string(&identity).unwrap();
        assert!(json.contains("profilePicture"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_lock_notification_text() {
        let now = Utc::now();
        let notification = Notification::account_locked(3, now);
        assert_eq!(notification.name, "System notification");
        assert_eq!(
            notification.content,
            "Your account was temporary blocked because of multiple failed login attempts."
        );
        assert_eq!(notification.receiver_id, 3);
        assert_eq!(notification.created, now);
    }
}
