//! CodeHarness server - HTTP front end for the code-execution coordinator.

use clap::Parser;
use codeharness::config::ConfigFile;
use codeharness::coordinator::{CoordinatorRuntime, RuntimeSettings};
use codeharness::engine::ProcessEngine;
use codeharness::service;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "codeharness-server")]
#[command(about = "Serial code-execution coordinator with an HTTP API", long_about = None)]
#[command(version = codeharness::VERSION)]
struct Args {
    /// Config file path (default: ~/.codeharness/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address override, e.g. 0.0.0.0:8712
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Engine command override as one string, e.g. "Rscript --vanilla -"
    #[arg(long)]
    engine: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigFile::load_from(path),
        None => ConfigFile::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        process::exit(1);
    });

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(engine) = &args.engine {
        let mut parts = engine.split_whitespace().map(str::to_string);
        match parts.next() {
            Some(program) => {
                config.engine.program = program;
                config.engine.args = parts.collect();
            }
            None => {
                eprintln!("Error: --engine must name an executable");
                process::exit(1);
            }
        }
    }

    let _logging_guard =
        match codeharness::logging::init_logging(&config.logging.directory, &config.logging.file) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Error initializing logging: {}", e);
                process::exit(1);
            }
        };
    codeharness::panic::init();

    info!(version = codeharness::VERSION, "codeharness server starting");

    let mut engine = ProcessEngine::new(&config.engine.program, config.engine.args.clone());
    if let Err(e) = engine.initialize() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    info!(program = %config.engine.program, "execution engine ready");

    let settings = RuntimeSettings {
        poll_interval: config.executor.poll_interval,
    };
    let runtime = match CoordinatorRuntime::start(engine, settings) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting coordinator: {}", e);
            process::exit(1);
        }
    };

    let app = service::router(runtime.coordinator());
    let listener = match tokio::net::TcpListener::bind(config.server.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error binding {}: {}", config.server.bind, e);
            process::exit(1);
        }
    };
    info!(bind = %config.server.bind, "listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }

    runtime.shutdown().await;
    info!("codeharness server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error listening for shutdown signal: {}", e);
        return;
    }
    info!("shutdown signal received");
}
