// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Code execution and aptitude question proxy for the Code Club platform.
///
/// `proxy.yaml` is optional; environment variables (and `.env`) override it.
#[derive(Parser, Debug)]
#[command(
    name = "codeclub-proxy",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Path to config file
    ///
    /// Defaults to ./proxy.yaml when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// All supported CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Listen address, overrides config and PORT
        ///
        /// Example:
        /// --addr 127.0.0.1:8080
        #[arg(long)]
        addr: Option<String>,
    },

    /// Run one source file through the execution providers.
    ///
    /// Prints the JSON result on stdout and exits non-zero when the
    /// request is rejected or every provider fails.
    Execute {
        /// Source file to run
        source: PathBuf,

        /// Language alias (python, js, c++, ...)
        #[arg(short, long)]
        language: String,

        /// File whose contents are passed as stdin
        #[arg(long)]
        stdin: Option<PathBuf>,

        /// Also print the provider attempt log
        #[arg(long)]
        attempts: bool,
    },

    /// Fetch a batch of aptitude questions.
    Questions {
        /// Number of questions (capped by questions.max_amount)
        #[arg(short, long)]
        amount: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        difficulty: Option<String>,

        /// Skip upstream providers and generate locally
        #[arg(long)]
        offline: bool,

        /// Seed for shuffles and generated questions
        #[arg(long)]
        seed: Option<u64>,

        /// Also print the provider attempt log
        #[arg(long)]
        attempts: bool,
    },

    /// List supported language aliases.
    Languages,
}
