// src/main.rs

//! codeclub-proxy
//!
//! Entry point for the Code Club proxy service and CLI.
//!
//! The binary fronts third-party code execution and quiz services for the
//! club's browser front-end. All real work lives in `runner` (CLI commands)
//! and `runtime` (HTTP service).
//!
//! Responsibilities of this file:
//! - Load `.env`
//! - Initialise logging
//! - Parse CLI arguments and hand off to the runner

mod auth;
mod cli;
mod config;
mod engine;
mod error;
mod execution;
mod questions;
mod request_id;
mod runner;
mod runtime;
mod sinks;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout is reserved for CLI JSON output.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("codeclub_proxy=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    runner::run(cli).await
}
