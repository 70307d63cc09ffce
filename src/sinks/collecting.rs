use crate::engine::events::{AttemptEvent, AttemptOutcome};
use crate::engine::sink::EventSink;

/// An in-memory sink collecting the provider attempts of a single call.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Vec<AttemptEvent>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Borrow all collected events.
    pub fn events(&self) -> &[AttemptEvent] {
        &self.events
    }

    /// Consume the sink and return the collected events.
    #[allow(dead_code)]
    pub fn into_events(self) -> Vec<AttemptEvent> {
        self.events
    }

    /// Compact `provider=outcome` summary, used for the per-request log line.
    pub fn summary(&self) -> String {
        self.events
            .iter()
            .map(|e| {
                let outcome = match &e.outcome {
                    AttemptOutcome::Skipped => "skipped",
                    AttemptOutcome::Empty => "empty",
                    AttemptOutcome::Failed { .. } => "failed",
                    AttemptOutcome::QuotaExhausted { .. } => "quota",
                    AttemptOutcome::Succeeded => "ok",
                };
                format!("{}={}", e.provider, outcome)
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&mut self, event: AttemptEvent) {
        self.events.push(event);
    }
}
