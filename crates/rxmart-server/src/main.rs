mod api;
mod middleware;

use std::sync::Arc;

use rxmart_catalog::{CatalogService, LocalImageStore};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::GatewayAuth,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(rxmart_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = rxmart_db::PoolConfig::from_app_config(&config);
    let pool = rxmart_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = rxmart_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    tokio::fs::create_dir_all(&config.image_dir).await?;
    let images = LocalImageStore::from_app_config(&config);
    let state = AppState::new(
        CatalogService::new(pool, images),
        config.image_dir.clone(),
        config.image_base_url.clone(),
        config.image_max_bytes,
    );

    let auth = GatewayAuth::from_env(matches!(config.env, rxmart_core::Environment::Development))?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "rxmart-server listening");
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
