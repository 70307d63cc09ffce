// src/execution/piston.rs

//! Piston: primary execution service. No credential, any language,
//! separate compile and run streams.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::Endpoint;
use crate::engine::{http::send_json, Provider};
use crate::error::ProviderError;
use crate::execution::{ExecutionResult, ResolvedExecution};

pub struct Piston {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Piston {
    pub fn new(client: reqwest::Client, endpoint: &Endpoint) -> Self {
        Self {
            client,
            url: endpoint.url.clone(),
            timeout: endpoint.timeout(),
        }
    }
}

impl Piston {
    /// Latest runtime version, one file, no extra arguments.
    fn request(&self, req: &ResolvedExecution) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "language": req.language.piston_token(),
            "version": "*",
            "files": [{ "content": req.code }],
            "stdin": req.stdin,
            "args": [],
        });

        self.client.post(&self.url).json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct PistonResponse {
    run: Option<Stage>,
    compile: Option<Stage>,
}

#[derive(Debug, Default, Deserialize)]
struct Stage {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
}

#[async_trait]
impl Provider for Piston {
    type Request = ResolvedExecution;
    type Output = ExecutionResult;

    fn name(&self) -> &'static str {
        "piston"
    }

    async fn fetch(&self, req: &ResolvedExecution) -> Result<Option<Value>, ProviderError> {
        send_json(self.request(req), self.timeout).await.map(Some)
    }

    fn normalize(
        &self,
        raw: Value,
        _req: &ResolvedExecution,
        _rng: &mut fastrand::Rng,
    ) -> Result<Option<ExecutionResult>, ProviderError> {
        let parsed: PistonResponse = serde_json::from_value(raw)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let run = parsed
            .run
            .ok_or_else(|| ProviderError::Malformed("response has no run stage".into()))?;

        let compile_stderr = parsed
            .compile
            .and_then(|c| c.stderr)
            .unwrap_or_default();
        if !compile_stderr.is_empty() {
            return Ok(Some(ExecutionResult::compilation_error(&compile_stderr)));
        }

        let stdout = run.stdout.unwrap_or_default();
        let stderr = run.stderr.unwrap_or_default();

        if !stderr.is_empty() && stdout.is_empty() {
            return Ok(Some(ExecutionResult::error(stderr)));
        }

        Ok(Some(ExecutionResult::output_or_sentinel(&stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::execution::{ExecutionOutcome, Language, NO_OUTPUT_SENTINEL};
    use serde_json::json;

    fn normalize(raw: Value) -> Result<Option<ExecutionResult>, ProviderError> {
        let p = Piston::new(reqwest::Client::new(), &ExecutionConfig::default().piston);
        let req = ResolvedExecution {
            code: "int main(){}".into(),
            stdin: String::new(),
            language: Language::resolve("c").unwrap(),
        };
        p.normalize(raw, &req, &mut fastrand::Rng::with_seed(0))
    }

    fn outcome(raw: Value) -> ExecutionOutcome {
        normalize(raw).unwrap().unwrap().outcome
    }

    #[test]
    fn request_body_carries_source_and_stdin() {
        let p = Piston::new(reqwest::Client::new(), &ExecutionConfig::default().piston);
        let req = ResolvedExecution {
            code: "print(input())".into(),
            stdin: "7".into(),
            language: Language::resolve("python3").unwrap(),
        };
        let built = p.request(&req).build().unwrap();

        assert_eq!(built.method(), &reqwest::Method::POST);
        assert_eq!(built.url().as_str(), "https://emkc.org/api/v2/piston/execute");

        let body: Value = serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "language": "python",
                "version": "*",
                "files": [{ "content": "print(input())" }],
                "stdin": "7",
                "args": [],
            })
        );
    }

    #[test]
    fn compile_errors_take_precedence() {
        let raw = json!({
            "compile": { "stdout": "", "stderr": "main.c:1: error" },
            "run": { "stdout": "", "stderr": "" }
        });
        assert_eq!(
            outcome(raw),
            ExecutionOutcome::Error {
                error: "Compilation Error: main.c:1: error".into()
            }
        );
    }

    #[test]
    fn runtime_error_only_when_stdout_is_empty() {
        let crashed = json!({ "run": { "stdout": "", "stderr": "Traceback" } });
        assert_eq!(
            outcome(crashed),
            ExecutionOutcome::Error { error: "Traceback".into() }
        );

        let noisy = json!({ "run": { "stdout": "1\n", "stderr": "warning" } });
        assert_eq!(outcome(noisy), ExecutionOutcome::Output { output: "1\n".into() });
    }

    #[test]
    fn silent_run_yields_the_sentinel() {
        let raw = json!({ "run": { "stdout": "", "stderr": "", "code": 0 } });
        assert_eq!(
            outcome(raw),
            ExecutionOutcome::Output { output: NO_OUTPUT_SENTINEL.into() }
        );
    }

    #[test]
    fn missing_run_stage_is_malformed() {
        let raw = json!({ "message": "runtime is unknown" });
        assert!(matches!(normalize(raw), Err(ProviderError::Malformed(_))));
    }
}
