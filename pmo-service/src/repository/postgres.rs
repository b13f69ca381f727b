//! PostgreSQL account store
//!
//! [`AccountStore::lock_account`] opens a transaction and reads the row with
//! `SELECT ... FOR UPDATE`; the row lock is held until the guard commits or
//! is dropped, at which point sqlx rolls the transaction back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{
    Account, AccountGuard, AccountStore, NewAccount, Notification, RepositoryResult,
};

const ACCOUNT_COLUMNS: &str = "employee_id, username, password, login_attempts, locked_until, \
     lock_enabled, profile_picture, role";

/// Account store backed by the `employees` and `notifications` tables
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Wrap an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    let attempts: i32 = row.try_get("login_attempts")?;
    Ok(Account {
        id: row.try_get("employee_id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password")?,
        failed_attempts: u32::try_from(attempts).unwrap_or(0),
        locked_until: row.try_get::<Option<DateTime<Utc>>, _>("locked_until")?,
        lock_enabled: row.try_get("lock_enabled")?,
        profile_picture: row.try_get("profile_picture")?,
        role: row.try_get("role")?,
    })
}

fn notification_from_row(row: &PgRow) -> Result<Notification, sqlx::Error> {
    Ok(Notification {
        name: row.try_get("name")?,
        content: row.try_get("content")?,
        receiver_id: row.try_get("receiver_id")?,
        created: row.try_get("created")?,
    })
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn lock_account(&self, username: &str) -> RepositoryResult<Option<Box<dyn AccountGuard>>> {
        let op = RepositoryOperation::LockAccount;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(op))?;

        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM employees WHERE username = $1 FOR UPDATE"
        ))
        .bind(username)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(op))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let account = account_from_row(&row).map_err(|e| {
            RepositoryError::from(e)
                .with_operation(op)
                .with_entity("Employee", username)
        })?;

        Ok(Some(Box::new(PgAccountGuard {
            tx,
            account,
            dirty: false,
            pending_notifications: Vec::new(),
        })))
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>> {
        let op = RepositoryOperation::FindByUsername;
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM employees WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(op))?;

        row.as_ref()
            .map(account_from_row)
            .transpose()
            .map_err(|e| RepositoryError::from(e).with_operation(op))
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Account>> {
        let op = RepositoryOperation::FindById;
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM employees WHERE employee_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(op))?;

        row.as_ref()
            .map(account_from_row)
            .transpose()
            .map_err(|e| RepositoryError::from(e).with_operation(op))
    }

    async fn create(&self, new: NewAccount) -> RepositoryResult<Account> {
        let op = RepositoryOperation::Create;
        let row = sqlx::query(&format!(
            "INSERT INTO employees \
                 (username, password, email, first_name, last_name, gender, phone_number, role, \
                  company_id, tier_id, supervisor_id, profile_picture, login_attempts, \
                  locked_until, lock_enabled, created) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, NULL, FALSE, NOW()) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.gender)
        .bind(&new.phone_number)
        .bind(&new.role)
        .bind(new.company_id)
        .bind(new.tier_id)
        .bind(new.supervisor_id)
        .bind(&new.profile_picture)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = RepositoryError::from(e).with_operation(op);
            if err.kind == super::RepositoryErrorKind::AlreadyExists {
                RepositoryError::already_exists("Employee", new.username.clone())
            } else {
                err
            }
        })?;

        account_from_row(&row).map_err(|e| RepositoryError::from(e).with_operation(op))
    }

    async fn notifications_for(&self, receiver_id: i64) -> RepositoryResult<Vec<Notification>> {
        let op = RepositoryOperation::FindById;
        let rows = sqlx::query(
            "SELECT name, content, receiver_id, created FROM notifications \
             WHERE receiver_id = $1 ORDER BY created, notification_id",
        )
        .bind(receiver_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(op))?;

        rows.iter()
            .map(notification_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::from(e).with_operation(op))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(RepositoryError::from)
    }
}

struct PgAccountGuard {
    tx: Transaction<'static, Postgres>,
    account: Account,
    dirty: bool,
    pending_notifications: Vec<Notification>,
}

#[async_trait]
impl AccountGuard for PgAccountGuard {
    fn account(&self) -> &Account {
        &self.account
    }

    fn save(&mut self, account: &Account) {
        self.account = account.clone();
        self.dirty = true;
    }

    fn notify(&mut self, notification: Notification) {
        self.pending_notifications.push(notification);
    }

    fn is_dirty(&self) -> bool {
        self.dirty || !self.pending_notifications.is_empty()
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let PgAccountGuard {
            mut tx,
            account,
            dirty,
            pending_notifications,
        } = *self;

        if dirty {
            let attempts = i32::try_from(account.failed_attempts).unwrap_or(i32::MAX);
            sqlx::query(
                "UPDATE employees \
                 SET login_attempts = $1, locked_until = $2, lock_enabled = $3, password = $4 \
                 WHERE employee_id = $5",
            )
            .bind(attempts)
            .bind(account.locked_until)
            .bind(account.lock_enabled)
            .bind(&account.password_hash)
            .bind(account.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                RepositoryError::from(e)
                    .with_operation(RepositoryOperation::Update)
                    .with_entity("Employee", account.id.to_string())
            })?;
        }

        for notification in &pending_notifications {
            sqlx::query(
                "INSERT INTO notifications (name, content, receiver_id, created) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&notification.name)
            .bind(&notification.content)
            .bind(notification.receiver_id)
            .bind(notification.created)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                RepositoryError::from(e)
                    .with_operation(RepositoryOperation::Notify)
                    .with_entity("Employee", notification.receiver_id.to_string())
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Commit))
    }
}
