use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use chronocap_api::{build_router, telemetry, ApiConfig, AppState, Repositories, StorageBackend};
use chronocap_db::Database;
use chronocap_identity::CognitoIdentityProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = telemetry::init_logging();

    let config = ApiConfig::from_env();

    let repos = match config.storage {
        StorageBackend::Postgres => {
            // No connection is opened until the first query.
            let db = Database::connect_lazy_with_config(&config.database_url, config.pool_config())?;
            if config.run_migrations {
                info!("Running database migrations");
                db.migrate().await?;
            }
            Repositories::postgres(&db)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Repositories::memory()
        }
    };

    let identity = CognitoIdentityProvider::from_env()?;
    info!(
        region = %identity.config().region,
        endpoint = %identity.config().endpoint,
        "Identity provider configured"
    );

    let state = AppState::new(repos, Arc::new(identity), config.cookie_secure);
    let app = build_router(state, config.allowed_origins.clone());

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
