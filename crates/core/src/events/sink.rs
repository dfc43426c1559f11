//! Where parsed real-time events go.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{EventKind, RealtimeEvent};

/// Receiver of recognized real-time events, called from the transport's
/// read loop. Implementations apply the event in place and return; a
/// rejected event is logged by the implementation, never surfaced to the
/// connection.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: RealtimeEvent);
}

/// Drops every event. Used when a transport runs without stores attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl EventSink for DiscardSink {
    fn dispatch(&self, _event: RealtimeEvent) {}
}

/// Keeps every dispatched event in arrival order. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    received: Arc<Mutex<Vec<RealtimeEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RealtimeEvent> {
        self.buffer().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.buffer().iter().map(|e| e.kind.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<RealtimeEvent>> {
        self.received.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for RecordingSink {
    fn dispatch(&self, event: RealtimeEvent) {
        self.buffer().push(event);
    }
}
