//! Real-time events module.
//!
//! Provides the event types delivered by the real-time transport and the
//! sink trait through which they reach the merge stores. The transport crate
//! parses frames into [`RealtimeEvent`]s; the store side implements the sink.

mod realtime_event;
mod sink;

pub use realtime_event::*;
pub use sink::*;
