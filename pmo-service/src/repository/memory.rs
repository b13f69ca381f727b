//! In-process account store
//!
//! Accounts live in a [`DashMap`] keyed by username. Each account sits
//! behind its own `tokio` mutex, and a guard owns the mutex guard for as long
//! as the attempt runs, which serializes concurrent attempts per account
//! while leaving other accounts untouched.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::traits::{
    Account, AccountGuard, AccountStore, NewAccount, Notification, RepositoryResult,
};

/// Account store backed by process memory
///
/// Used by tests and by local runs without a configured database.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<String, Arc<Mutex<Account>>>,
    usernames_by_id: DashMap<i64, String>,
    notifications: Arc<DashMap<i64, Vec<Notification>>>,
    next_id: AtomicI64,
}

impl MemoryAccountStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed account, replacing any account with the same username
    ///
    /// Lets callers seed lockout state directly, which `create` never does.
    pub fn insert(&self, account: Account) {
        self.next_id.fetch_max(account.id, Ordering::SeqCst);
        self.usernames_by_id
            .retain(|_, username| *username != account.username);
        self.usernames_by_id
            .insert(account.id, account.username.clone());
        self.accounts
            .insert(account.username.clone(), Arc::new(Mutex::new(account)));
    }

    fn cell(&self, username: &str) -> Option<Arc<Mutex<Account>>> {
        self.accounts.get(username).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn lock_account(&self, username: &str) -> RepositoryResult<Option<Box<dyn AccountGuard>>> {
        let Some(cell) = self.cell(username) else {
            return Ok(None);
        };
        let current = cell.lock_owned().await;
        Ok(Some(Box::new(MemoryAccountGuard {
            current,
            staged: None,
            pending_notifications: Vec::new(),
            notifications: Arc::clone(&self.notifications),
        })))
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>> {
        let Some(cell) = self.cell(username) else {
            return Ok(None);
        };
        let account = cell.lock().await.clone();
        Ok(Some(account))
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Account>> {
        let username = match self.usernames_by_id.get(&id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        self.find_by_username(&username).await
    }

    async fn create(&self, new: NewAccount) -> RepositoryResult<Account> {
        if let Some(supervisor_id) = new.supervisor_id {
            if !self.usernames_by_id.contains_key(&supervisor_id) {
                return Err(RepositoryError::new(
                    RepositoryOperation::Create,
                    RepositoryErrorKind::ConstraintViolation,
                    "supervisor_id references a missing employee",
                )
                .with_entity("Employee", supervisor_id.to_string()));
            }
        }

        match self.accounts.entry(new.username.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::already_exists("Employee", new.username)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let account = Account {
                    id,
                    username: new.username,
                    password_hash: new.password_hash,
                    failed_attempts: 0,
                    locked_until: None,
                    lock_enabled: false,
                    profile_picture: new.profile_picture,
                    role: new.role,
                };
                self.usernames_by_id.insert(id, account.username.clone());
                slot.insert(Arc::new(Mutex::new(account.clone())));
                Ok(account)
            }
        }
    }

    async fn notifications_for(&self, receiver_id: i64) -> RepositoryResult<Vec<Notification>> {
        Ok(self
            .notifications
            .get(&receiver_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

struct MemoryAccountGuard {
    current: OwnedMutexGuard<Account>,
    staged: Option<Account>,
    pending_notifications: Vec<Notification>,
    notifications: Arc<DashMap<i64, Vec<Notification>>>,
}

#[async_trait]
impl AccountGuard for MemoryAccountGuard {
    fn account(&self) -> &Account {
        self.staged.as_ref().unwrap_or(&*self.current)
    }

    fn save(&mut self, account: &Account) {
        self.staged = Some(account.clone());
    }

    fn notify(&mut self, notification: Notification) {
        self.pending_notifications.push(notification);
    }

    fn is_dirty(&self) -> bool {
        self.staged.is_some() || !self.pending_notifications.is_empty()
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let MemoryAccountGuard {
            mut current,
            staged,
            pending_notifications,
            notifications,
        } = *self;

        if let Some(account) = staged {
            if account.id != current.id {
                return Err(RepositoryError::database_error(
                    RepositoryOperation::Update,
                    "staged account does not match the locked row",
                )
                .with_entity("Employee", current.id.to_string()));
            }
            *current = account;
        }
        for notification in pending_notifications {
            notifications
                .entry(notification.receiver_id)
                .or_default()
                .push(notification);
        }
        Ok(())
    }
}
