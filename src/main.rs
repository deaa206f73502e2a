use anyhow::Result;
use electrocars::api::{AuthClient, FleetClient};
use electrocars::config::Config;
use electrocars::coordinator::FleetCoordinator;
use electrocars::credentials::{CredentialSink, FileCredentialStore};
use electrocars::logging::{get_logger, init_logging};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    init_logging(&config.logging)?;

    let logger = get_logger("main");
    logger.info(&format!(
        "Electro Cars {} starting up",
        env!("CARGO_PKG_VERSION")
    ));

    let store = Arc::new(FileCredentialStore::new(&config.credentials_file));
    let stored = store.load().unwrap_or_else(|e| {
        logger.warn(&format!(
            "Ignoring unreadable credential file {}: {}",
            store.path().display(),
            e
        ));
        Default::default()
    });

    let sink: Arc<dyn CredentialSink> = store;
    let auth = Arc::new(AuthClient::new(config.api.clone()).with_credential_sink(sink.clone()));
    auth.restore(&stored);
    match auth.initialize().await {
        Ok(true) => logger.info("Session restored from stored refresh token"),
        Ok(false) => logger.warn("Not authenticated; complete the SMS login via the web API"),
        Err(e) => logger.error(&format!("Initial token refresh failed: {}", e)),
    }

    let fleet = Arc::new(FleetClient::new(auth.clone(), &config.api));
    let coordinator = Arc::new(FleetCoordinator::new(fleet, config.polling.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poll_task = tokio::spawn(coordinator.clone().run(shutdown_rx));

    #[cfg(feature = "web")]
    let web_task = if config.web.enabled {
        let state = electrocars::web::AppState {
            coordinator: coordinator.clone(),
            auth: auth.clone(),
            credentials: sink,
            config: Arc::new(config.clone()),
        };
        let web_logger = logger.clone();
        Some(tokio::spawn(async move {
            if let Err(e) =
                electrocars::web::serve(state, &config.web.host, config.web.port).await
            {
                web_logger.error(&format!("Web server error: {}", e));
            }
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    logger.info("Shutdown requested");

    let _ = shutdown_tx.send(true);
    #[cfg(feature = "web")]
    if let Some(task) = web_task {
        task.abort();
    }
    if let Err(e) = poll_task.await {
        logger.error(&format!("Polling task ended abnormally: {}", e));
    }

    logger.info("Shutdown complete");
    Ok(())
}
