//! Application state management

use std::sync::Arc;

use crate::{
    auth::{JwtIssuer, PasswordHasher, SessionIssuer},
    config::Config,
    error::{Error, Result},
    lockout::{Authenticator, LockoutNotification},
    repository::{AccountStore, MemoryAccountStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn AccountStore>,
    authenticator: Arc<Authenticator>,
    hasher: PasswordHasher,
    issuer: Arc<dyn SessionIssuer>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.config.service.name)
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create a new builder for AppState
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the account store
    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Get the login authenticator
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Get the password hasher
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Get the session token issuer
    pub fn issuer(&self) -> &Arc<dyn SessionIssuer> {
        &self.issuer
    }
}

/// Builder for AppState
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<Config>,
    store: Option<Arc<dyn AccountStore>>,
    issuer: Option<Arc<dyn SessionIssuer>>,
    notifications: Vec<Arc<dyn LockoutNotification>>,
}

impl AppStateBuilder {
    /// Create a new builder
    ///
    /// By default:
    /// - Config is `Config::default()` if not provided
    /// - The account store is PostgreSQL when `database` is configured,
    ///   otherwise an in-memory store
    /// - The session issuer is a [`JwtIssuer`] built from `tokens`
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an explicit account store
    pub fn store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an explicit session issuer
    pub fn issuer(mut self, issuer: Arc<dyn SessionIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Register a lockout notification handler
    pub fn notification(mut self, handler: Arc<dyn LockoutNotification>) -> Self {
        self.notifications.push(handler);
        self
    }

    /// Build the AppState, connecting to the database as needed
    pub async fn build(self) -> Result<AppState> {
        let config = self.config.unwrap_or_default();

        config
            .lockout
            .validate()
            .map_err(|e| Error::Config(Box::new(figment::Error::from(format!("lockout: {}", e)))))?;

        let store = match self.store {
            Some(store) => store,
            None => Self::default_store(&config).await?,
        };

        let issuer: Arc<dyn SessionIssuer> = match self.issuer {
            Some(issuer) => issuer,
            None => Arc::new(JwtIssuer::new(&config.tokens)?),
        };

        let hasher = PasswordHasher::new(config.password.clone())?;

        let authenticator = self.notifications.into_iter().fold(
            Authenticator::new(Arc::clone(&store), hasher.clone(), &config.lockout),
            Authenticator::with_notification,
        );

        tracing::info!(
            max_attempts = config.lockout.max_attempts,
            lockout_duration_secs = config.lockout.lockout_duration_secs,
            enforcement = %config.lockout.enforcement,
            "Authenticator ready"
        );

        Ok(AppState {
            config: Arc::new(config),
            store,
            authenticator: Arc::new(authenticator),
            hasher,
            issuer,
        })
    }

    #[cfg(feature = "database")]
    async fn default_store(config: &Config) -> Result<Arc<dyn AccountStore>> {
        match config.database {
            Some(ref db) => {
                let pool = crate::database::create_pool(db).await?;
                Ok(Arc::new(crate::repository::PgAccountStore::new(pool)))
            }
            None => Ok(Self::memory_store()),
        }
    }

    #[cfg(not(feature = "database"))]
    async fn default_store(config: &Config) -> Result<Arc<dyn AccountStore>> {
        if config.database.is_some() {
            return Err(Error::Config(Box::new(figment::Error::from(
                "database is configured but the `database` feature is disabled".to_string(),
            ))));
        }
        Ok(Self::memory_store())
    }

    fn memory_store() -> Arc<dyn AccountStore> {
        tracing::warn!("No database configured; accounts are kept in memory and lost on restart");
        Arc::new(MemoryAccountStore::new())
    }
}
