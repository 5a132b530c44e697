mod api;
mod events;
mod middleware;
mod resolver;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};
use crate::events::EventBus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(storefind_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = storefind_db::PoolConfig::from_app_config(&config);
    let pool = storefind_db::connect_pool(&config.database_url, pool_config).await?;
    storefind_db::run_migrations(&pool).await?;

    let geocoder = storefind_nominatim::NominatimClient::with_base_url(
        config.geocoder_timeout_secs,
        &config.nominatim_url,
    )?;

    let events = EventBus::default();
    events::spawn_logging_listener(&events);

    let app = build_app(
        AppState {
            pool,
            geocoder: Arc::new(geocoder),
            config: Arc::clone(&config),
            events,
        },
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
