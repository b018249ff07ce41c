use std::num::NonZeroU16;
use std::path::PathBuf;

use clap::{Parser, ValueHint};
use log::LevelFilter;
use tokio::signal;

use crate::routes::AppState;
use crate::store::{MemoryStore, SqliteStore};

mod controller;
mod routes;
mod store;

/// Passing this as the database opens a private in-memory SQLite database.
const SQLITE_IN_MEMORY: &str = ":memory:";

#[tokio::main(flavor = "current_thread")] // store calls run on the blocking pool
async fn main() -> std::io::Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .filter(Some("tower_http"), LevelFilter::Debug)
        .filter(Some("command_api_server"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    let CliArgs {
        host,
        port,
        database,
    } = CliArgs::parse();

    log::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_version = command_api::api::VERSION;
        "Initializing server"
    );

    let state = match database {
        None => {
            log::info!("using in-memory store, commands are lost on shutdown");
            AppState::new(MemoryStore::new())
        }
        Some(path) if path.as_os_str() == SQLITE_IN_MEMORY => {
            log::info!("using in-memory sqlite store");
            AppState::new(SqliteStore::open_in_memory().map_err(std::io::Error::other)?)
        }
        Some(path) => {
            log::info!(path:debug; "using sqlite store");
            AppState::new(SqliteStore::open(&path).map_err(std::io::Error::other)?)
        }
    };

    let router = routes::app(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        addr:display = host,
        port = port.get();
        "listening to TCP"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[derive(Parser)]
struct CliArgs {
    /// The host address for the command api server.
    #[arg(
        long,
        value_name = "URI",
        value_hint = ValueHint::Hostname,
        default_value = "0.0.0.0",
        env = "COMMAND_API_HOST",
    )]
    host: String,
    /// The host port for the command api server.
    #[arg(
        short,
        long,
        value_name = "PORT",
        value_hint = ValueHint::Other,
        default_value = "5000",
        env = "COMMAND_API_PORT",
    )]
    port: NonZeroU16,
    /// SQLite database file holding the commands, `:memory:` for a throwaway database.
    ///
    /// Without a database the commands are kept in process memory.
    #[arg(
        short,
        long,
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        env = "COMMAND_API_DATABASE",
    )]
    database: Option<PathBuf>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT (ctrl+c) handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => log::info!("received SIGINT (ctrl+c), shutting down"),
        () = terminate => log::info!("received SIGTERM, shutting down"),
    }
}
