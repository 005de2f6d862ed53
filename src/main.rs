//! # Launch Digest
//!
//! Scans a roster of African tech-news sites for articles announcing new
//! products, services and market entries, and mails a daily digest of the
//! launches not delivered before.
//!
//! ## Usage
//!
//! ```sh
//! launch_digest --mode once --output-dir ./digests
//! launch_digest --mode cloud --port 8080
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: download each source's front page
//! 2. **Extraction**: pull title, link, description and date from article blocks
//! 3. **Classification**: keep articles whose text carries a launch signal
//! 4. **Deduplication**: drop URLs already recorded in the SQLite store
//! 5. **Delivery**: mail (or write) the digest, then record what went out

use clap::Parser;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classifier;
mod cli;
mod config;
mod context;
mod digest;
mod error;
mod fetcher;
mod logs;
mod models;
mod outputs;
mod pipeline;
mod scheduler;
mod scrapers;
mod store;
mod utils;

use cli::{Cli, Mode};
use config::Settings;
use context::AppContext;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init: stdout plus a daily log file for /logs ---
    let appender = logs::file_appender(&args.log_dir)?;
    let (file_writer, _log_guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_timer(UtcTime::rfc_3339()),
        )
        .init();

    info!("launch_digest starting up");
    debug!(
        mode = ?args.mode,
        config = ?args.config,
        output_dir = ?args.output_dir,
        log_dir = %args.log_dir,
        "Parsed CLI arguments"
    );

    let mut settings = Settings::load(args.config.as_deref())?;
    settings.apply_cli(&args);

    // Early check: a dry-run directory must be writable before any scanning
    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let ctx = AppContext::build(&settings, args.output_dir.as_deref(), &args.log_dir).await?;
    let ctx = Arc::new(ctx);

    match args.mode {
        Mode::Once => {
            let found = ctx.run_once().await?;
            info!(found, "Run complete");
        }
        Mode::Local => {
            info!(at = %ctx.schedule_at, "Scheduled to run daily; press Ctrl+C to stop");
            info!("Running initial scrape");
            if let Err(e) = ctx.run_once().await {
                error!(error = %e, "Initial run failed");
            }
            tokio::select! {
                _ = scheduler::run_daily(Arc::clone(&ctx)) => {}
                res = tokio::signal::ctrl_c() => {
                    res?;
                    info!("Scheduler stopped by user");
                }
            }
        }
        Mode::Cloud => {
            tokio::spawn(scheduler::run_daily(Arc::clone(&ctx)));

            let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "Serving control endpoints");
            axum::serve(listener, api::router(Arc::clone(&ctx)))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Shutting down");
                })
                .await?;
        }
    }

    ctx.pipeline.store().close().await;
    Ok(())
}
