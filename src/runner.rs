// src/runner.rs

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::engine::events::AttemptEvent;
use crate::execution::{ExecutionProxy, ExecutionRequest, Language};
use crate::questions::{QuestionProxy, QuestionQuery};
use crate::request_id::RequestId;
use crate::runtime;
use crate::sinks::collecting::CollectingEventSink;
use crate::util::read_to_string;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Entry point from `main.rs`.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Languages => {
            print_languages();
            Ok(())
        }

        Command::Serve { addr } => {
            let mut cfg = Config::resolve(cli.config.as_deref())?;
            if let Some(addr) = addr {
                cfg.server.addr = addr;
            }
            runtime::serve(cfg, http_client()?).await
        }

        Command::Execute {
            source,
            language,
            stdin,
            attempts,
        } => {
            let cfg = Config::resolve(cli.config.as_deref())?;
            run_execute(cfg, source, language, stdin, attempts).await
        }

        Command::Questions {
            amount,
            category,
            difficulty,
            offline,
            seed,
            attempts,
        } => {
            let cfg = Config::resolve(cli.config.as_deref())?;
            let query = QuestionQuery {
                amount,
                category,
                difficulty,
            };
            run_questions(cfg, query, offline, seed, attempts).await
        }
    }
}

/// One client for every provider; per-call timeouts come from config.
fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("codeclub-proxy/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/* ---------------- execute ---------------- */

async fn run_execute(
    cfg: Config,
    source: PathBuf,
    language: String,
    stdin: Option<PathBuf>,
    attempts: bool,
) -> Result<()> {
    let code = read_to_string(&source)?;
    let stdin = stdin.as_deref().map(read_to_string).transpose()?;

    let proxy = ExecutionProxy::from_config(&cfg.execution, http_client()?);
    let request_id = RequestId::new();
    let mut sink = CollectingEventSink::new();

    let result = proxy
        .execute(
            ExecutionRequest {
                code,
                language,
                stdin,
            },
            &request_id,
            &mut sink,
        )
        .await;

    if attempts {
        print_attempts(sink.events())?;
    }

    match result {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => bail!(e),
    }
}

/* ---------------- questions ---------------- */

async fn run_questions(
    cfg: Config,
    query: QuestionQuery,
    offline: bool,
    seed: Option<u64>,
    attempts: bool,
) -> Result<()> {
    let q = &cfg.questions;
    let proxy = if offline {
        QuestionProxy::offline(q.default_amount, q.max_amount)
    } else {
        QuestionProxy::from_config(q, http_client()?)
    }
    .with_seed(seed);

    let req = proxy.request_from_query(&query);
    let request_id = RequestId::new();
    let mut sink = CollectingEventSink::new();

    let batch = proxy.get_questions(&req, &request_id, &mut sink).await;

    if attempts {
        print_attempts(sink.events())?;
    }
    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}

/* ---------------- output ---------------- */

fn print_languages() {
    for (alias, canonical) in Language::alias_table() {
        println!("{:<12} {}", alias, canonical);
    }
}

/// Attempt log goes to stderr so stdout stays a single JSON document.
fn print_attempts(events: &[AttemptEvent]) -> Result<()> {
    for event in events {
        eprintln!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
