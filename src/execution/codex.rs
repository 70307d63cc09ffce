// src/execution/codex.rs

//! CodeX: secondary execution service with a single output/error pair.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::Endpoint;
use crate::engine::{http::send_json, Provider};
use crate::error::ProviderError;
use crate::execution::{ExecutionResult, ResolvedExecution};

pub struct Codex {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Codex {
    pub fn new(client: reqwest::Client, endpoint: &Endpoint) -> Self {
        Self {
            client,
            url: endpoint.url.clone(),
            timeout: endpoint.timeout(),
        }
    }

    fn request(&self, req: &ResolvedExecution) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "code": req.code,
            "language": req.language.codex_token(),
            "input": req.stdin,
        });

        self.client.post(&self.url).json(&body)
    }
}

#[async_trait]
impl Provider for Codex {
    type Request = ResolvedExecution;
    type Output = ExecutionResult;

    fn name(&self) -> &'static str {
        "codex"
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
        let output = raw
            .get("output")
            .ok_or_else(|| ProviderError::Malformed("response has no output field".into()))?;

        let error = raw.get("error").and_then(Value::as_str).unwrap_or_default();
        if !error.is_empty() {
            return Ok(Some(ExecutionResult::error(error)));
        }

        let output = output.as_str().unwrap_or_default();
        Ok(Some(ExecutionResult::output_or_sentinel(output)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::execution::{ExecutionOutcome, Language};
    use serde_json::json;

    fn normalize(raw: Value) -> Result<Option<ExecutionResult>, ProviderError> {
        let p = Codex::new(reqwest::Client::new(), &ExecutionConfig::default().codex);
        let req = ResolvedExecution {
            code: "console.log(1)".into(),
            stdin: String::new(),
            language: Language::resolve("js").unwrap(),
        };
        p.normalize(raw, &req, &mut fastrand::Rng::with_seed(0))
    }

    #[test]
    fn request_uses_the_codex_runtime_name() {
        let p = Codex::new(reqwest::Client::new(), &ExecutionConfig::default().codex);
        let req = ResolvedExecution {
            code: "console.log(1)".into(),
            stdin: "x".into(),
            language: Language::resolve("javascript").unwrap(),
        };
        let built = p.request(&req).build().unwrap();

        let body: Value = serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({ "code": "console.log(1)", "language": "nodejs", "input": "x" })
        );
    }

    #[test]
    fn error_field_wins_over_output() {
        let raw = json!({ "output": "", "error": "ReferenceError: x is not defined" });
        assert_eq!(
            normalize(raw).unwrap().unwrap().outcome,
            ExecutionOutcome::Error {
                error: "ReferenceError: x is not defined".into()
            }
        );
    }

    #[test]
    fn output_is_passed_through() {
        let raw = json!({ "output": "1\n", "error": "" });
        assert_eq!(
            normalize(raw).unwrap().unwrap().outcome,
            ExecutionOutcome::Output { output: "1\n".into() }
        );
    }

    #[test]
    fn missing_output_field_is_malformed() {
        let raw = json!({ "status": "queued" });
        assert!(matches!(normalize(raw), Err(ProviderError::Malformed(_))));
    }
}
