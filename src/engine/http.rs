// src/engine/http.rs

//! Outbound JSON calls shared by all provider adapters.

use reqwest::RequestBuilder;
use serde_json::Value;
use std::time::Duration;

use crate::error::ProviderError;

/// Upper bound on how much of an error body is carried into logs.
const MAX_ERROR_BODY: usize = 512;

/// Send a prepared request with a per-call timeout and decode a JSON body.
///
/// - transport errors and timeouts ⇒ `ProviderError::Transport`
/// - non-2xx ⇒ `ProviderError::Status` (body kept for diagnosis)
/// - undecodable body ⇒ `ProviderError::Malformed`
pub async fn send_json(request: RequestBuilder, timeout: Duration) -> Result<Value, ProviderError> {
    let resp = request.timeout(timeout).send().await?;

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: truncate(&text),
        });
    }

    serde_json::from_str(&text)
        .map_err(|e| ProviderError::Malformed(format!("invalid JSON ({}): {}", e, truncate(&text))))
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies_and_respects_char_boundaries() {
        assert_eq!(truncate("short"), "short");

        let long = "é".repeat(400);
        let cut = truncate(&long);
        assert!(cut.ends_with('…'));
        assert!(cut.len() <= MAX_ERROR_BODY + '…'.len_utf8());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let client = reqwest::Client::new();
        // Port 9 on loopback (discard) is not expected to speak HTTP.
        let req = client.get("http://127.0.0.1:9/");
        let err = send_json(req, Duration::from_millis(500)).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
