//! Employee authentication server
//!
//! Configuration comes from `config.toml` files and `PMO_` environment
//! variables; see [`pmo_service::config`].

use anyhow::Context;
use pmo_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config).context("failed to initialize tracing")?;

    info!(
        service = %config.service.name,
        environment = %config.service.environment,
        database = config.database.is_some(),
        "Starting employee authentication service"
    );

    let state = AppState::builder()
        .config(config.clone())
        .notification(Arc::new(TracingNotifier))
        .build()
        .await
        .context("failed to build application state")?;

    Server::new(config)
        .serve(router(state))
        .await
        .context("server terminated with an error")?;

    Ok(())
}
