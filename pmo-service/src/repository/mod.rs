//! Employee account persistence
//!
//! The [`AccountStore`] trait is the only way the rest of the crate reads or
//! writes credential and lockout state. Two implementations ship with the
//! crate:
//!
//! - [`MemoryAccountStore`]: per-account async mutexes in a `DashMap`
//! - [`PgAccountStore`]: PostgreSQL rows locked with `SELECT ... FOR UPDATE`
//!   (requires the `database` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use pmo_service::repository::{AccountStore, MemoryAccountStore};
//!
//! let store = MemoryAccountStore::new();
//! if let Some(mut guard) = store.lock_account("jdoe").await? {
//!     let mut account = guard.account().clone();
//!     account.failed_attempts = 0;
//!     guard.save(&account);
//!     guard.commit().await?;
//! }
//! ```

mod error;
mod memory;
#[cfg(feature = "database")]
mod postgres;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::MemoryAccountStore;
#[cfg(feature = "database")]
pub use postgres::PgAccountStore;
pub use traits::{
    Account, AccountGuard, AccountStore, EmployeeIdentity, NewAccount, Notification,
    RepositoryResult, LOCKOUT_NOTIFICATION_CONTENT, LOCKOUT_NOTIFICATION_NAME,
};
