//! Employee registration
//!
//! Creates accounts that the authenticator can later sign in. New accounts
//! start unlocked with a zero failure counter.

use serde::Deserialize;

use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::lockout::normalize_username;
use crate::repository::{AccountStore, EmployeeIdentity, NewAccount, RepositoryErrorKind};

const MISSING_PROFILE_FIELDS: &str =
    "Email, first name, last name, gender, phone number and role cannot be null";

const UNKNOWN_REFERENCE: &str = "Supervisor does not exist";

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRegistration {
    /// Login name, stored lower-cased
    #[serde(default)]
    pub username: String,
    /// Cleartext password, hashed before storage
    #[serde(default)]
    pub password: String,
    /// Contact email
    pub email: Option<String>,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Gender
    pub gender: Option<String>,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Role name
    pub role: Option<String>,
    /// Owning company
    pub company_id: Option<i64>,
    /// Pay or seniority tier
    pub tier_id: Option<i64>,
    /// Reporting line
    pub supervisor_id: Option<i64>,
    /// Public profile picture URL
    pub profile_picture: Option<String>,
}

/// Take a required text field, treating blank as missing
fn required(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Register a new employee account
///
/// Fails with [`Error::ValidationError`] when a required field is missing, the
/// password is too short, or a referenced supervisor does not exist, and with
/// [`Error::Conflict`] when the username is taken.
pub async fn register(
    store: &dyn AccountStore,
    hasher: &PasswordHasher,
    registration: EmployeeRegistration,
) -> Result<EmployeeIdentity> {
    let username = normalize_username(&registration.username);
    if username.is_empty() || registration.password.is_empty() {
        return Err(Error::ValidationError(
            "Username and password are required.".to_string(),
        ));
    }

    let (Some(email), Some(first_name), Some(last_name), Some(gender), Some(phone_number), Some(role)) = (
        required(registration.email),
        required(registration.first_name),
        required(registration.last_name),
        required(registration.gender),
        required(registration.phone_number),
        required(registration.role),
    ) else {
        return Err(Error::ValidationError(MISSING_PROFILE_FIELDS.to_string()));
    };

    if store.find_by_username(&username).await?.is_some() {
        return Err(Error::Conflict("Username already registered".to_string()));
    }

    let password_hash = hasher.hash_blocking(&registration.password).await?;

    let account = store
        .create(NewAccount {
            username,
            password_hash,
            email,
            first_name,
            last_name,
            gender,
            phone_number,
            role,
            company_id: registration.company_id,
            tier_id: registration.tier_id,
            supervisor_id: registration.supervisor_id,
            profile_picture: required(registration.profile_picture),
        })
        .await
        .map_err(|e| match e.kind {
            RepositoryErrorKind::AlreadyExists => {
                Error::Conflict("Username already registered".to_string())
            }
            RepositoryErrorKind::ConstraintViolation => {
                tracing::debug!(error = %e, "Registration rejected by a constraint");
                Error::ValidationError(UNKNOWN_REFERENCE.to_string())
            }
            _ => Error::Storage(e),
        })?;

    tracing::info!(
        employee_id = account.id,
        identity = %account.username,
        role = %account.role,
        "Employee registered"
    );

    Ok(account.identity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordConfig;
    use crate::lockout::{AuthOutcome, Authenticator, LockoutConfig};
    use crate::repository::MemoryAccountStore;
    use std::sync::Arc;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
            min_password_length: 8,
        })
        .unwrap()
    }

    fn registration(username: &str) -> EmployeeRegistration {
        EmployeeRegistration {
            username: username.to_string(),
            password: "correct horse".to_string(),
            email: Some("jdoe@example.com".to_string()),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            gender: Some("F".to_string()),
            phone_number: Some("555-0100".to_string()),
            role: Some("employee".to_string()),
            company_id: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_lowercases_and_hashes() {
        let store = MemoryAccountStore::new();
        let hasher = hasher();

        let identity = register(&store, &hasher, registration("JDoe")).await.unwrap();
        assert_eq!(identity.username, "jdoe");
        assert_eq!(identity.role, "employee");

        let account = store.find_by_username("jdoe").await.unwrap().unwrap();
        assert_eq!(account.failed_attempts, 0);
        assert!(!account.lock_enabled);
        assert_ne!(account.password_hash, "correct horse");
        assert!(hasher.verify("correct horse", &account.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let store = MemoryAccountStore::new();
        let hasher = hasher();
        register(&store, &hasher, registration("jdoe")).await.unwrap();

        let err = register(&store, &hasher, registration("JDOE")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(ref msg) if msg == "Username already registered"));
    }

    #[tokio::test]
    async fn test_register_missing_profile_fields() {
        let store = MemoryAccountStore::new();
        let mut input = registration("jdoe");
        input.phone_number = Some("  ".to_string());

        let err = register(&store, &hasher(), input).await.unwrap_err();
        assert!(matches!(err, Error::ValidationError(ref msg) if msg == MISSING_PROFILE_FIELDS));
        assert!(store.find_by_username("jdoe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let store = MemoryAccountStore::new();
        let mut input = registration("jdoe");
        input.password = "short".to_string();

        let err = register(&store, &hasher(), input).await.unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_register_missing_credentials() {
        let store = MemoryAccountStore::new();
        let mut input = registration(" ");
        input.password = String::new();

        let err = register(&store, &hasher(), input).await.unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_register_whitespace_password_then_login() {
        let store = Arc::new(MemoryAccountStore::new());
        let hasher = hasher();
        let mut input = registration("spacey");
        input.password = " ".repeat(10);
        register(store.as_ref(), &hasher, input).await.unwrap();

        let auth = Authenticator::new(store, hasher, &LockoutConfig::default());
        let result = auth.authenticate("spacey", &" ".repeat(10)).await.unwrap();
        assert_eq!(result.result, AuthOutcome::Authenticated);
    }

    #[tokio::test]
    async fn test_register_unknown_supervisor() {
        let store = MemoryAccountStore::new();
        let mut input = registration("jdoe");
        input.supervisor_id = Some(99);

        let err = register(&store, &hasher(), input).await.unwrap_err();
        assert!(matches!(err, Error::ValidationError(ref msg) if msg == UNKNOWN_REFERENCE));
        assert!(store.find_by_username("jdoe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_with_existing_supervisor() {
        let store = MemoryAccountStore::new();
        let hasher = hasher();
        let boss = register(&store, &hasher, registration("boss")).await.unwrap();

        let mut input = registration("jdoe");
        input.supervisor_id = Some(boss.id);
        register(&store, &hasher, input).await.unwrap();
    }
}
