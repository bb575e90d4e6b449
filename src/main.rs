use clap::Parser;
use log::{info, warn};
use tokio::signal;

use tally::api::{AppState, TallyApi};
use tally::conf::Config;
use tally::core::{CliArgs, setup_logging};
use tally::store::{
    DocumentQueryService, KeyValueStore, MemoryCollection, MemoryStore, MongoCollection,
    RedisStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    setup_logging(config.log_level_filter()?);
    let use_memory = args.memory;
    info!(args = args; "Tally starting");

    let state = if use_memory {
        info!("Using in-memory stores");
        AppState::new(
            KeyValueStore::new(MemoryStore::new()),
            DocumentQueryService::new(MemoryCollection::new()),
            config.server.request_timeout,
        )
    } else {
        AppState::new(
            KeyValueStore::new(RedisStore::connect(&config.redis).await?),
            DocumentQueryService::new(MongoCollection::connect(&config.mongo).await?),
            config.server.request_timeout,
        )
    };

    TallyApi::new(state)
        .run(
            &config.server.addr(),
            shutdown_signal(),
            config.server.shutdown_timeout,
        )
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("Shutdown signal received");
}
