use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

/// One external service in a fallback chain.
///
/// A provider is attempted in two steps so that the network part and the
/// shape-normalising part can be exercised independently:
/// - `fetch` performs the outbound call. `Ok(None)` means the provider does
///   not apply to this request (missing credential, unmapped language) and
///   was not called at all.
/// - `normalize` turns the raw upstream payload into the canonical output.
///   `Ok(None)` means the upstream answered but nothing in it was usable.
#[async_trait]
pub trait Provider: Send + Sync {
    type Request: Sync;
    type Output: Send;

    /// Stable name, also used as the `source` tag of a successful result.
    fn name(&self) -> &'static str;

    async fn fetch(&self, req: &Self::Request) -> Result<Option<Value>, ProviderError>;

    fn normalize(
        &self,
        raw: Value,
        req: &Self::Request,
        rng: &mut fastrand::Rng,
    ) -> Result<Option<Self::Output>, ProviderError>;
}

pub type BoxedProvider<Req, Out> = Box<dyn Provider<Request = Req, Output = Out>>;
