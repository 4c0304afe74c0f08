use std::cell::RefCell;
use std::rc::Rc;

use crate::metrics::Metrics;

/// One recorded module event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position in the bus, starting at 0.
    pub sequence: u64,
    pub source: String,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_sequence: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, source: &str, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            sequence: self.next_sequence,
            source: source.to_string(),
            kind,
            message: message.into(),
        });
        self.next_sequence += 1;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the recorded events. Sequence numbers keep counting.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

/// Shared inspection handle injected into modules at construction.
///
/// Cloning yields another handle to the same bus and metrics, so a host can
/// keep one clone for its debug console while modules write through theirs.
/// Everything runs on one thread; the handle is deliberately `!Send`.
#[derive(Debug, Clone, Default)]
pub struct DebugSink {
    bus: Rc<RefCell<EventBus>>,
    metrics: Rc<RefCell<Metrics>>,
}

impl DebugSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, source: &str, kind: &'static str, message: impl Into<String>) {
        self.bus.borrow_mut().emit(source, kind, message);
    }

    pub fn count(&self, source: &str, name: &'static str, by: u64) {
        self.metrics.borrow_mut().inc_counter(source, name, by);
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.bus.borrow().events().to_vec()
    }

    pub fn drain_events(&self) -> Vec<Event> {
        self.bus.borrow_mut().drain()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.borrow().clone()
    }
}
