//! Login lockout configuration
//!
//! Configures the failed-attempt threshold and the lock window applied to
//! employee accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// When the lock transition is applied relative to the failing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockoutEnforcement {
    /// The threshold-reaching failure is only recorded; the lock is applied
    /// when the next attempt is evaluated.
    #[default]
    Deferred,
    /// The lock is applied by the same attempt whose failure reaches the
    /// threshold.
    Immediate,
}

impl fmt::Display for LockoutEnforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deferred => write!(f, "deferred"),
            Self::Immediate => write!(f, "immediate"),
        }
    }
}

/// Login lockout configuration
///
/// # Example (config.toml)
///
/// ```toml
/// [lockout]
/// enabled = true
/// max_attempts = 5
/// lockout_duration_secs = 300
/// enforcement = "deferred"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct LockoutConfig {
    /// Whether lockout enforcement is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Failed attempts that put an account into the locked state
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Duration in seconds that an account remains locked
    #[serde(default = "default_lockout_duration_secs")]
    pub lockout_duration_secs: u64,

    /// When the lock is applied once the threshold is reached
    #[serde(default)]
    pub enforcement: LockoutEnforcement,
}

impl LockoutConfig {
    /// Validate the configuration, returning an error message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.lockout_duration_secs == 0 {
            return Err("lockout_duration_secs must be greater than 0".to_string());
        }
        if i64::try_from(self.lockout_duration_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .is_none()
        {
            return Err("lockout_duration_secs is out of range".to_string());
        }
        Ok(())
    }

    /// Builder-style setter for the enforcement mode
    pub fn with_enforcement(mut self, enforcement: LockoutEnforcement) -> Self {
        self.enforcement = enforcement;
        self
    }

    /// Builder-style setter for the threshold
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Builder-style setter for the lock duration
    pub fn with_lockout_duration_secs(mut self, secs: u64) -> Self {
        self.lockout_duration_secs = secs;
        self
    }

    /// Lock window as a chrono duration
    pub fn lockout_duration(&self) -> chrono::Duration {
        i64::try_from(self.lockout_duration_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            lockout_duration_secs: default_lockout_duration_secs(),
            enforcement: LockoutEnforcement::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout_duration_secs() -> u64 {
    300 // 5 minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LockoutConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.lockout_duration_secs, 300);
        assert_eq!(config.enforcement, LockoutEnforcement::Deferred);
        assert_eq!(config.lockout_duration(), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = LockoutConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_attempts() {
        let config = LockoutConfig::default().with_max_attempts(0);
        assert_eq!(
            config.validate(),
            Err("max_attempts must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_validate_zero_lockout_duration() {
        let config = LockoutConfig::default().with_lockout_duration_secs(0);
        assert_eq!(
            config.validate(),
            Err("lockout_duration_secs must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_validate_huge_lockout_duration() {
        let config = LockoutConfig::default().with_lockout_duration_secs(u64::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: LockoutConfig =
            serde_json::from_str(r#"{"enforcement":"immediate"}"#).unwrap();
        assert_eq!(config.enforcement, LockoutEnforcement::Immediate);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.lockout_duration_secs, 300);
        assert!(config.enabled);
    }

    #[test]
    fn test_enforcement_display() {
        assert_eq!(LockoutEnforcement::Deferred.to_string(), "deferred");
        assert_eq!(LockoutEnforcement::Immediate.to_string(), "immediate");
    }
}
