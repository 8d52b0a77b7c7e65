use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

mod cli;
mod error;
mod logging;
mod model;
mod routes;
mod service;
mod views;

use cli::CommandLineArgs;
use model::Store;
use routes::{create_router, AppState};
use service::TodoService;
use views::Views;

fn find_default_database_file() -> Option<PathBuf> {
    let base_dirs = ProjectDirs::from("com", "gozque", "todo-web")?;
    let root_dir = base_dirs.data_dir();
    if !root_dir.exists() {
        std::fs::create_dir_all(root_dir).ok()?;
    }
    Some(root_dir.join("todo.db"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Get the command-line arguments.
    let CommandLineArgs {
        database_file,
        host,
        port,
        log_dir,
    } = CommandLineArgs::from_args();

    logging::init(&log_dir)?;
    let result = serve(database_file, &host, port).await;
    if let Err(e) = &result {
        tracing::error!("Server stopped with an error: {:#}", e);
    }
    logging::archive(&log_dir);
    result
}

async fn serve(database_file: Option<PathBuf>, host: &str, port: u16) -> anyhow::Result<()> {
    // Unpack the database file.
    let database_file = database_file
        .or_else(find_default_database_file)
        .ok_or(anyhow!("Failed to find database file."))?;

    let store = Arc::new(
        Store::open(&database_file)
            .with_context(|| format!("Failed to open {}.", database_file.display()))?,
    );
    tracing::info!("Using database {}", database_file.display());

    let state = AppState {
        service: TodoService::new(store.clone()),
        views: Arc::new(Views::new().context("Failed to load templates.")?),
    };

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}.", host, port))?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to listen on {}.", addr))?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed.")?;
    tracing::info!("Server shut down");

    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => tracing::warn!("Database still in use at shutdown, leaving it to drop."),
    }
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
