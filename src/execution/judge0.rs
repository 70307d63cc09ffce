// src/execution/judge0.rs

//! Judge0 (via RapidAPI): last-resort execution service.
//!
//! Only built when a RapidAPI key is configured, and only applies to the
//! handful of languages with a known numeric id. Submissions are made with
//! `wait=true`, so the call blocks until the run has finished.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::Endpoint;
use crate::engine::{http::send_json, Provider};
use crate::error::ProviderError;
use crate::execution::{ExecutionResult, ResolvedExecution};

/// Judge0 status id for a run that finished normally.
const STATUS_ACCEPTED: u64 = 3;

pub struct Judge0 {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    api_key: String,
}

impl Judge0 {
    pub fn new(client: reqwest::Client, endpoint: &Endpoint, api_key: String) -> Self {
        Self {
            client,
            url: endpoint.url.clone(),
            timeout: endpoint.timeout(),
            api_key,
        }
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let host = reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| ProviderError::Rejected(format!("invalid judge0 url: {}", self.url)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-rapidapi-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| ProviderError::Rejected("RapidAPI key is not a valid header value".into()))?,
        );
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(&host)
                .map_err(|_| ProviderError::Rejected("judge0 host is not a valid header value".into()))?,
        );
        Ok(headers)
    }

    /// Synchronous submission: plain-text fields, wait for the verdict.
    fn request(
        &self,
        req: &ResolvedExecution,
        language_id: u32,
    ) -> Result<reqwest::RequestBuilder, ProviderError> {
        let body = serde_json::json!({
            "source_code": req.code,
            "language_id": language_id,
            "stdin": req.stdin,
        });

        Ok(self
            .client
            .post(&self.url)
            .headers(self.headers()?)
            .query(&[
                ("base64_encoded", "false"),
                ("wait", "true"),
                ("fields", "stdout,stderr,compile_output,status"),
            ])
            .json(&body))
    }
}

#[derive(Debug, Deserialize)]
struct Submission {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
    #[serde(default)]
    status: Option<SubmissionStatus>,
}

#[derive(Debug, Deserialize)]
struct SubmissionStatus {
    id: u64,
    #[serde(default)]
    description: String,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}

#[async_trait]
impl Provider for Judge0 {
    type Request = ResolvedExecution;
    type Output = ExecutionResult;

    fn name(&self) -> &'static str {
        "judge0"
    }

    async fn fetch(&self, req: &ResolvedExecution) -> Result<Option<Value>, ProviderError> {
        let Some(language_id) = req.language.judge0_id() else {
            return Ok(None);
        };

        send_json(self.request(req, language_id)?, self.timeout)
            .await
            .map(Some)
    }

    fn normalize(
        &self,
        raw: Value,
        _req: &ResolvedExecution,
        _rng: &mut fastrand::Rng,
    ) -> Result<Option<ExecutionResult>, ProviderError> {
        let sub: Submission =
            serde_json::from_value(raw).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if let Some(stdout) = non_empty(sub.stdout) {
            return Ok(Some(ExecutionResult::output(stdout)));
        }
        if let Some(stderr) = non_empty(sub.stderr) {
            return Ok(Some(ExecutionResult::error(stderr)));
        }
        if let Some(compile) = non_empty(sub.compile_output) {
            return Ok(Some(ExecutionResult::compilation_error(&compile)));
        }

        match sub.status {
            Some(status) if status.id == STATUS_ACCEPTED => {
                Ok(Some(ExecutionResult::output_or_sentinel("")))
            }
            Some(status) => Err(ProviderError::Malformed(format!(
                "no output, status {} ({})",
                status.id, status.description
            ))),
            None => Err(ProviderError::Malformed("no output and no status".into())),
        }
    }
}
