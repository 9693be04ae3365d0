use std::process;
use std::sync::Arc;

use clap::Parser;
use smartpix::config::{self, CliArgs, Config};
use smartpix::{create_app, db, editor, run_migrations, AppState};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sets up console logging and, when `log_dir` is set, a daily rolling JSON file
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
fn init_logging(config: &Config, debug: bool) -> Option<WorkerGuard> {
    let default_level = if debug { "smartpix=debug,tower_http=debug" } else { "smartpix=info,tower_http=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "smartpix.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, finishing in-flight requests");
}

async fn run(config: Config) -> anyhow::Result<()> {
    let pool = Arc::new(db::init_pool(&config.database_url)?);
    {
        let mut conn = pool.get()?;
        run_migrations(&mut conn)?;
    }

    let editor = editor::build_editor(&config)?;
    let bind_address = config.bind_address();
    let state = AppState::new(pool, config, editor)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("SmartPix listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load variables from a local .env file, if there is one
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let debug = args.debug;

    let config = match config::get_config(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {}", err);
            process::exit(2);
        }
    };

    let _guard = init_logging(&config, debug);

    if let Err(err) = run(config).await {
        error!("Server error: {:#}", err);
        process::exit(1);
    }
}
