//! Book catalog API entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use book_catalog::api::{create_router, AppState, RouterOptions};
use book_catalog::config::{resolve_log_filter, Config};
use book_catalog::metrics;
use book_catalog::store;
use book_catalog::utils::shutdown_signal;
use book_catalog::AppError;

/// Book catalog REST API.
#[derive(Parser, Debug)]
#[command(name = "book-catalog")]
#[command(about = "REST API for managing a collection of books")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Connect to the configured store and ping it.
    PingStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // .env may carry RUST_LOG, so read it before the filter is built
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("book_catalog=debug,tower_http=debug,info")
    } else {
        EnvFilter::new(resolve_log_filter(std::env::var("RUST_LOG").ok()))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::PingStore) => cmd_ping_store().await,
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration, logging failures.
fn load_config(port_override: Option<u16>) -> Result<Config, AppError> {
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        AppError::from(e)
    })?;

    if let Some(port) = port_override {
        config.port = port;
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        AppError::InvalidConfig(e)
    })?;

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("BOOK CATALOG - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Store: {}", config.book_store);
    println!(
        "  Mongo URL: {}",
        config.redacted_mongo_url().unwrap_or_else(|| "(not set)".to_string())
    );
    println!("  Database: {}", config.mongo_database);
    println!("  Collection: {}", config.mongo_collection);
    println!("  Log filter: {}", resolve_log_filter(Some(config.rust_log.clone())));
    println!("  CORS: {}", if config.cors_permissive { "Permissive" } else { "Disabled" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Connect to the store and ping it.
async fn cmd_ping_store() -> anyhow::Result<()> {
    let config = load_config(None)?;

    let timer = metrics::timer_store_op("connect");
    let store = store::connect(&config).await.map_err(|e| {
        error!("Store connection failed: {}", e);
        e
    })?;

    info!(
        "Store {} reachable in {:.1}ms",
        store.backend(),
        timer.elapsed_ms()
    );
    Ok(())
}

/// Connect to the store, then serve the API until shutdown.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    let config = load_config(port_override)?;
    info!("Configuration loaded successfully");
    info!("Store backend: {}", config.book_store);
    if let Some(url) = config.redacted_mongo_url() {
        info!("Mongo URL: {}", url);
    }

    // The listener must not bind until the store is reachable.
    let store = match store::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to connect to the document store: {}", e);
            return Err(AppError::from(e).into());
        }
    };
    info!("App connected to the {} store", store.backend());

    let mut app_state = AppState::new(store);
    match metrics::install_recorder() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Prometheus exporter unavailable: {}", e),
    }

    let router = create_router(
        app_state,
        RouterOptions {
            cors_permissive: config.cors_permissive,
            swagger: true,
        },
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(AppError::from)?;
    info!("Server is running on http://localhost:{}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::from)?;

    info!("Server stopped");
    Ok(())
}
