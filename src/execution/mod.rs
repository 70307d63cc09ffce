// src/execution/mod.rs

//! Execution proxy.
//!
//! Accepts a source snippet, a language and optional stdin, and tries the
//! configured remote execution services one after another until one gives
//! a usable answer. Every provider's answer is normalised into the same
//! `{output}` / `{error}` contract.

pub mod codex;
pub mod judge0;
pub mod language;
pub mod piston;

use serde::{Deserialize, Serialize};

use crate::config::ExecutionConfig;
use crate::engine::{run_chain, sink::EventSink, BoxedProvider};
use crate::error::ProxyError;
use crate::request_id::RequestId;

pub use language::Language;

/// Returned as `output` when a run succeeds without printing anything.
pub const NO_OUTPUT_SENTINEL: &str = "Code executed successfully (no output)";

/// Inbound request as sent by the editor. Missing fields deserialize to
/// empty strings and are rejected by validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionRequest {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub stdin: Option<String>,
}

/// A validated request with its language resolved.
#[derive(Debug, Clone)]
pub struct ResolvedExecution {
    pub code: String,
    pub stdin: String,
    pub language: Language,
}

/// Exactly one of `output` / `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExecutionOutcome {
    Output { output: String },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    #[serde(flatten)]
    pub outcome: ExecutionOutcome,

    /// Name of the provider that produced the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ExecutionResult {
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::Output {
                output: text.into(),
            },
            source: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::Error { error: text.into() },
            source: None,
        }
    }

    /// Output text, or the sentinel when the program printed nothing.
    pub fn output_or_sentinel(text: &str) -> Self {
        if text.is_empty() {
            Self::output(NO_OUTPUT_SENTINEL)
        } else {
            Self::output(text)
        }
    }

    pub fn compilation_error(text: &str) -> Self {
        Self::error(format!("Compilation Error: {}", text))
    }
}

pub type ExecutionProvider = BoxedProvider<ResolvedExecution, ExecutionResult>;

pub struct ExecutionProxy {
    providers: Vec<ExecutionProvider>,
}

impl ExecutionProxy {
    /// Piston, then CodeX, then Judge0 (only when a RapidAPI key is configured).
    pub fn from_config(cfg: &ExecutionConfig, client: reqwest::Client) -> Self {
        let mut providers: Vec<ExecutionProvider> = vec![
            Box::new(piston::Piston::new(client.clone(), &cfg.piston)),
            Box::new(codex::Codex::new(client.clone(), &cfg.codex)),
        ];

        match cfg.judge0.usable_credential() {
            Some(key) => providers.push(Box::new(judge0::Judge0::new(client, &cfg.judge0, key))),
            None => tracing::debug!("judge0 disabled: no RapidAPI key configured"),
        }

        Self::with_providers(providers)
    }

    pub fn with_providers(providers: Vec<ExecutionProvider>) -> Self {
        Self { providers }
    }

    /// Validate, resolve the language, then walk the provider chain.
    ///
    /// Nothing is sent upstream unless validation and language resolution
    /// both pass.
    pub async fn execute(
        &self,
        req: ExecutionRequest,
        request_id: &RequestId,
        sink: &mut dyn EventSink,
    ) -> Result<ExecutionResult, ProxyError> {
        let resolved = resolve(req)?;

        tracing::info!(
            request_id = %request_id,
            language = resolved.language.canonical(),
            code_bytes = resolved.code.len(),
            "executing code"
        );

        // Execution normalisers never draw from the random source.
        let mut rng = fastrand::Rng::with_seed(0);

        match run_chain(&self.providers, &resolved, &mut rng, request_id, sink).await {
            Some((mut result, source)) => {
                result.source = Some(source.to_string());
                Ok(result)
            }
            None => {
                tracing::error!(request_id = %request_id, "all code execution providers failed");
                Err(ProxyError::AllProvidersUnavailable)
            }
        }
    }
}

fn resolve(req: ExecutionRequest) -> Result<ResolvedExecution, ProxyError> {
    if req.code.is_empty() || req.language.trim().is_empty() {
        return Err(ProxyError::InvalidRequest(
            "Code and language are required".to_string(),
        ));
    }

    let language = Language::resolve(&req.language).ok_or_else(|| {
        ProxyError::UnsupportedLanguage {
            language: req.language.clone(),
            supported: Language::supported_aliases(),
        }
    })?;

    Ok(ResolvedExecution {
        code: req.code,
        stdin: req.stdin.unwrap_or_default(),
        language,
    })
}
