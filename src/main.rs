use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info};

use social_rest_api::{
    config::Config,
    db::Database,
    handlers::create_router,
    middleware::{create_middleware_stack, init_tracing},
};

#[tokio::main]
async fn main() {
    // Configuration decides the log format, so it loads first
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.environment) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }
    info!("Configuration loaded successfully (store backend: {})", config.store.name());

    let database = match Database::open(&config.store).await {
        Ok(db) => {
            info!("Record store ready");
            Arc::new(db)
        }
        Err(e) => {
            error!("Failed to open record store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = database.seed_member_types().await {
        error!("Failed to seed member types: {}", e);
        std::process::exit(1);
    }

    let app = create_router(database).layer(create_middleware_stack(config.request_timeout));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
