use crate::engine::events::AttemptEvent;

pub trait EventSink: Send {
    fn emit(&mut self, event: AttemptEvent);
}
