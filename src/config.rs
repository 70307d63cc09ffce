// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::util::usable_credential;

/// Root configuration, optionally loaded from `proxy.yaml`.
///
/// Every field has a working default, so the service runs without a file.
/// Environment variables (after `.env` is loaded) override the file; see
/// [`Config::apply_env`].
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub questions: QuestionsConfig,
}

/// HTTP server section.
///
/// server:
///   addr: 0.0.0.0:5000
///   allowed_origins: [http://localhost:3000]
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Empty means any origin is allowed.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Bearer key guarding the proxy routes. Only ever taken from the
    /// environment (`PROXY_API_KEY`).
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            allowed_origins: Vec::new(),
            api_key: None,
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0:5000".to_string()
}

/// One upstream provider endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct Endpoint {
    pub url: String,

    pub timeout_ms: u64,

    /// Credential for keyed providers. Prefer the environment variable;
    /// a value here is accepted for local use only.
    #[serde(default)]
    pub credential: Option<String>,
}

impl Endpoint {
    fn new(url: &str, timeout_ms: u64) -> Self {
        Self {
            url: url.to_string(),
            timeout_ms,
            credential: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Credential, unless absent or a placeholder.
    pub fn usable_credential(&self) -> Option<String> {
        usable_credential(self.credential.as_deref())
    }
}

/// Code execution providers, in fallback order.
#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionConfig {
    #[serde(default = "default_piston")]
    pub piston: Endpoint,

    #[serde(default = "default_codex")]
    pub codex: Endpoint,

    #[serde(default = "default_judge0")]
    pub judge0: Endpoint,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            piston: default_piston(),
            codex: default_codex(),
            judge0: default_judge0(),
        }
    }
}

fn default_piston() -> Endpoint {
    Endpoint::new("https://emkc.org/api/v2/piston/execute", 20_000)
}

fn default_codex() -> Endpoint {
    Endpoint::new("https://api.codex.jaagrav.in", 15_000)
}

fn default_judge0() -> Endpoint {
    Endpoint::new("https://judge0-ce.p.rapidapi.com/submissions", 15_000)
}

/// Question providers, in fallback order, plus batch size limits.
#[derive(Debug, Deserialize, Clone)]
pub struct QuestionsConfig {
    #[serde(default = "default_quizapi")]
    pub quizapi: Endpoint,

    #[serde(default = "default_aptitude_api")]
    pub aptitude_api: Endpoint,

    #[serde(default = "default_opentdb")]
    pub opentdb: Endpoint,

    #[serde(default = "default_amount")]
    pub default_amount: u32,

    #[serde(default = "default_max_amount")]
    pub max_amount: u32,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            quizapi: default_quizapi(),
            aptitude_api: default_aptitude_api(),
            opentdb: default_opentdb(),
            default_amount: default_amount(),
            max_amount: default_max_amount(),
        }
    }
}

fn default_quizapi() -> Endpoint {
    Endpoint::new("https://quizapi.io/api/v1/questions", 8_000)
}

fn default_aptitude_api() -> Endpoint {
    Endpoint::new("https://aptitude-api.vercel.app/", 8_000)
}

fn default_opentdb() -> Endpoint {
    Endpoint::new("https://opentdb.com/api.php", 6_000)
}

fn default_amount() -> u32 {
    10
}

fn default_max_amount() -> u32 {
    50
}

/// Snapshot of the environment variables the service reads.
///
/// Kept separate from `std::env` so overrides can be tested without
/// touching process state.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub port: Option<String>,
    pub rapidapi_key: Option<String>,
    pub quizapi_key: Option<String>,
    pub proxy_api_key: Option<String>,
    pub frontend_url: Option<String>,
}

impl EnvOverrides {
    pub fn from_process_env() -> Self {
        let get = |k: &str| std::env::var(k).ok();
        Self {
            port: get("PORT"),
            rapidapi_key: get("RAPIDAPI_KEY"),
            quizapi_key: get("QUIZAPI_KEY"),
            proxy_api_key: get("PROXY_API_KEY"),
            frontend_url: get("FRONTEND_URL"),
        }
    }
}

impl Config {
    /// Load and parse a YAML config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let cfg: Config = serde_yaml::from_str(&raw).context("Failed to parse YAML config")?;

        Ok(cfg)
    }

    /// Resolve the effective configuration.
    ///
    /// - explicit path: must exist
    /// - no path: `proxy.yaml` in the working directory if present, else defaults
    ///
    /// Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::load(p)?,
            None => {
                let fallback = Path::new("proxy.yaml");
                if fallback.exists() {
                    Self::load(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        cfg.warn_on_file_credentials();
        cfg.apply_env(&EnvOverrides::from_process_env());
        Ok(cfg)
    }

    /// Environment wins over the file.
    pub fn apply_env(&mut self, env: &EnvOverrides) {
        if let Some(port) = env.port.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            self.server.addr = format!("0.0.0.0:{}", port);
        }
        if env.rapidapi_key.is_some() {
            self.execution.judge0.credential = env.rapidapi_key.clone();
        }
        if env.quizapi_key.is_some() {
            self.questions.quizapi.credential = env.quizapi_key.clone();
        }
        self.server.api_key = usable_credential(env.proxy_api_key.as_deref());
        if let Some(origin) = env.frontend_url.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            if !self.server.allowed_origins.iter().any(|o| o == origin) {
                self.server.allowed_origins.push(origin.to_string());
            }
        }
    }

    fn warn_on_file_credentials(&self) {
        for (name, endpoint) in [
            ("execution.judge0", &self.execution.judge0),
            ("questions.quizapi", &self.questions.quizapi),
        ] {
            if endpoint.usable_credential().is_some() {
                tracing::warn!(
                    section = name,
                    "credential read from config file; prefer the environment variable"
                );
            }
        }
    }
}
