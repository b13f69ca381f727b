//! Lockout state machine
//!
//! Pure transition logic over an [`Account`]. Nothing here touches storage or
//! the clock; callers pass `now` and persist the mutated account.
//!
//! An account is either unlocked (counting failures) or locked until a fixed
//! instant. The threshold check runs when an attempt is evaluated, before the
//! password is looked at, so in [`LockoutEnforcement::Deferred`] mode the
//! failure that reaches the threshold is recorded and the lock lands on the
//! following attempt.

use chrono::{DateTime, Duration, Utc};

use super::config::{LockoutConfig, LockoutEnforcement};
use crate::repository::Account;

/// Result of evaluating an account before its password is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Unlocked and below the threshold; nothing changed
    Unchanged,
    /// The accumulated failures reached the threshold and the account was locked now
    LockedNow {
        /// Lock expiry
        locked_until: DateTime<Utc>,
        /// Whole minutes until expiry, rounded up
        remaining_minutes: i64,
    },
    /// A previous lock had expired and was cleared
    Expired,
    /// A previous lock is still in force
    StillLocked {
        /// Lock expiry
        locked_until: DateTime<Utc>,
        /// Whole minutes until expiry, rounded up
        remaining_minutes: i64,
    },
}

impl Evaluation {
    /// Lock expiry and remaining minutes when the attempt must be rejected
    /// without checking the password
    pub fn lock_window(&self) -> Option<(DateTime<Utc>, i64)> {
        match *self {
            Self::LockedNow {
                locked_until,
                remaining_minutes,
            }
            | Self::StillLocked {
                locked_until,
                remaining_minutes,
            } => Some((locked_until, remaining_minutes)),
            Self::Unchanged | Self::Expired => None,
        }
    }
}

/// Result of recording a wrong password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The failure was counted and the account stays unlocked
    Counted {
        /// Failed attempts including this one
        attempts: u32,
    },
    /// The failure reached the threshold and locked the account in the same attempt
    Locked {
        /// Failed attempts including this one
        attempts: u32,
        /// Lock expiry
        locked_until: DateTime<Utc>,
        /// Whole minutes until expiry, rounded up
        remaining_minutes: i64,
    },
}

impl FailureOutcome {
    /// Failed attempts including the one just recorded
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Counted { attempts } | Self::Locked { attempts, .. } => *attempts,
        }
    }
}

/// Lockout transitions parameterised by [`LockoutConfig`]
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    enabled: bool,
    max_attempts: u32,
    duration: Duration,
    enforcement: LockoutEnforcement,
}

impl LockoutPolicy {
    /// Build a policy from configuration
    pub fn new(config: &LockoutConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_attempts: config.max_attempts,
            duration: config.lockout_duration(),
            enforcement: config.enforcement,
        }
    }

    /// Failed attempts that trigger a lock
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// How long a lock lasts
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Configured enforcement mode
    pub fn enforcement(&self) -> LockoutEnforcement {
        self.enforcement
    }

    /// Apply any pending transition and report the account's state at `now`
    ///
    /// A second call with no intervening attempt returns `Unchanged` or
    /// `StillLocked` and leaves the account as it was.
    pub fn evaluate(&self, account: &mut Account, now: DateTime<Utc>) -> Evaluation {
        if self.enabled && account.failed_attempts >= self.max_attempts {
            let locked_until = self.lock(account, now);
            return Evaluation::LockedNow {
                locked_until,
                remaining_minutes: remaining_minutes(locked_until, now),
            };
        }

        if !account.lock_enabled && account.locked_until.is_none() {
            return Evaluation::Unchanged;
        }

        match account.locked_until {
            Some(locked_until) if now <= locked_until => Evaluation::StillLocked {
                locked_until,
                remaining_minutes: remaining_minutes(locked_until, now),
            },
            // Expired, or a flag left set without an expiry
            _ => {
                clear(account);
                Evaluation::Expired
            }
        }
    }

    /// Count a wrong password against an unlocked account
    ///
    /// In [`LockoutEnforcement::Immediate`] mode the failure that reaches the
    /// threshold also locks the account.
    pub fn record_failure(&self, account: &mut Account, now: DateTime<Utc>) -> FailureOutcome {
        account.failed_attempts = account.failed_attempts.saturating_add(1);
        let attempts = account.failed_attempts;

        if self.enabled
            && self.enforcement == LockoutEnforcement::Immediate
            && attempts >= self.max_attempts
        {
            let locked_until = self.lock(account, now);
            return FailureOutcome::Locked {
                attempts,
                locked_until,
                remaining_minutes: remaining_minutes(locked_until, now),
            };
        }

        FailureOutcome::Counted { attempts }
    }

    /// Reset the failure counter after a correct password
    ///
    /// Returns whether the account changed.
    pub fn record_success(&self, account: &mut Account) -> bool {
        if account.failed_attempts == 0 {
            return false;
        }
        account.failed_attempts = 0;
        true
    }

    fn lock(&self, account: &mut Account, now: DateTime<Utc>) -> DateTime<Utc> {
        let locked_until = now
            .checked_add_signed(self.duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        account.locked_until = Some(locked_until);
        account.lock_enabled = true;
        account.failed_attempts = 0;
        locked_until
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(&LockoutConfig::default())
    }
}

/// Clear a lock and its counter
pub(crate) fn clear(account: &mut Account) {
    account.locked_until = None;
    account.lock_enabled = false;
    account.failed_attempts = 0;
}

/// Whole minutes from `now` until `locked_until`, rounded up and never below 1
pub fn remaining_minutes(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (locked_until - now).num_milliseconds();
    let minutes = millis.saturating_add(59_999).div_euclid(60_000);
    minutes.max(1)
}
