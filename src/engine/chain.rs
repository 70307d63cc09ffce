use crate::engine::events::{attempt, AttemptOutcome};
use crate::engine::provider::BoxedProvider;
use crate::engine::sink::EventSink;
use crate::error::ProviderError;
use crate::request_id::RequestId;

/// Attempt providers strictly in order and return the first usable output
/// together with the name of the provider that produced it.
///
/// Every provider error is logged and recorded, never returned. `None` means
/// the chain was exhausted.
pub async fn run_chain<Req, Out>(
    providers: &[BoxedProvider<Req, Out>],
    req: &Req,
    rng: &mut fastrand::Rng,
    request_id: &RequestId,
    sink: &mut dyn EventSink,
) -> Option<(Out, &'static str)>
where
    Req: Sync,
    Out: Send,
{
    for provider in providers {
        let name = provider.name();

        let raw = match provider.fetch(req).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(provider = name, request_id = %request_id, "provider skipped");
                sink.emit(attempt(request_id, name, AttemptOutcome::Skipped));
                continue;
            }
            Err(e) => {
                record_failure(name, request_id, e, sink);
                continue;
            }
        };

        match provider.normalize(raw, req, rng) {
            Ok(Some(out)) => {
                tracing::info!(provider = name, request_id = %request_id, "provider succeeded");
                sink.emit(attempt(request_id, name, AttemptOutcome::Succeeded));
                return Some((out, name));
            }
            Ok(None) => {
                tracing::info!(provider = name, request_id = %request_id, "provider returned no usable data");
                sink.emit(attempt(request_id, name, AttemptOutcome::Empty));
            }
            Err(e) => record_failure(name, request_id, e, sink),
        }
    }

    None
}

fn record_failure(
    name: &'static str,
    request_id: &RequestId,
    error: ProviderError,
    sink: &mut dyn EventSink,
) {
    let outcome = match &error {
        ProviderError::QuotaExhausted(reason) => {
            tracing::warn!(
                provider = name,
                request_id = %request_id,
                reason = %reason,
                "provider rate limit/quota exceeded, using fallback"
            );
            AttemptOutcome::QuotaExhausted {
                reason: reason.clone(),
            }
        }
        other => {
            tracing::warn!(
                provider = name,
                request_id = %request_id,
                error = %other,
                "provider failed, trying next"
            );
            AttemptOutcome::Failed {
                reason: other.to_string(),
            }
        }
    };

    sink.emit(attempt(request_id, name, outcome));
}
