use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crud_service::{
    auth::JwtService,
    build_router,
    config::Config,
    database::{init_db, run_migrations},
    repositories::PgFileRepository,
    seed_admin,
    state::AppState,
    storage::{init_storage, StorageService},
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = init_db(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to db")?;
    run_migrations(&pool).await.context("Failed to run migrations")?;

    let backend = init_storage(&config).await.context("Failed to initialize storage")?;
    let storage = StorageService::new(
        backend,
        Arc::new(PgFileRepository::new(pool.clone())),
        config.max_file_size,
    );
    let jwt = JwtService::new(&config.jwt_secret, &config.jwt_expires_in)?;

    let app_state = AppState {
        pool,
        storage,
        jwt,
        config,
    };

    match std::env::args().nth(1).as_deref() {
        Some("--seed") => {
            seed_admin(&app_state).await?;
            return Ok(());
        }
        Some("--reconcile") => {
            let report = app_state.storage.reconcile().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        Some(other) => anyhow::bail!("Unknown argument: {}", other),
        None => {}
    }

    let addr = app_state.config.bind_address();
    let pool = app_state.pool.clone();
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Database connection closed, server exited");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}
