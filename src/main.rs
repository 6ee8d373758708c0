// region:    --- Imports
use seafood_market::broadcast::{FanOut, KafkaBroadcaster, SocketHub};
use seafood_market::config::Config;
use seafood_market::database::DatabaseManager;
use seafood_market::routes::routes;
use seafood_market::scheduler::AuctionScheduler;
use seafood_market::state::AppState;
use seafood_market::store::{InMemoryStore, MarketStore, PostgresStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
// endregion: --- Imports

// Buffered events per WebSocket client before it starts skipping
const SOCKET_BUFFER: usize = 1024;

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::load()?;

    // storage
    let store: Arc<dyn MarketStore> = match &config.database_url {
        Some(database_url) => {
            let db_manager = Arc::new(DatabaseManager::connect(database_url, &config).await?);
            if let Err(e) = db_manager.initialize_database().await {
                error!("{:<12} --> Database initialization failed: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> Database initialized", "Main");
            Arc::new(PostgresStore::new(db_manager))
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL not set, using the in-memory store",
                "Main"
            );
            Arc::new(InMemoryStore::new())
        }
    };

    // broadcast sinks
    let hub = SocketHub::new(SOCKET_BUFFER);
    let mut fan_out = FanOut::new().with(Arc::new(hub.clone()));
    if let Some(brokers) = &config.kafka_brokers {
        let kafka = KafkaBroadcaster::new(brokers, &config.kafka_topic)?;
        if let Err(e) = kafka.create_topic(5, 1).await {
            error!("{:<12} --> Kafka initialization failed: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> Kafka publishing to {}", "Main", config.kafka_topic);
        fan_out = fan_out.with(Arc::new(kafka));
    }

    let state = AppState::new(store, Arc::new(fan_out), hub);

    // auction close sweep
    let sweeper = AuctionScheduler::new(
        Arc::clone(&state.store),
        Arc::clone(&state.broadcaster),
        config.sweep_interval,
    )
    .start();

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    sweeper.abort();
    info!("{:<12} --> Shut down", "Main");
    Ok(())
}
// endregion: --- Main

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("{:<12} --> Failed to listen for Ctrl+C: {}", "Main", e);
            std::future::pending::<()>().await;
        }
        info!("{:<12} --> Received Ctrl+C, shutting down", "Main");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("{:<12} --> Received terminate signal, shutting down", "Main");
            }
            Err(e) => {
                error!("{:<12} --> Failed to install signal handler: {}", "Main", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
