//! HR Desk Realtime - websocket push channel for leave and attendance events.
//!
//! [`RealtimeTransport`] keeps one authenticated connection open, reconnecting
//! after a fixed delay whenever it closes, and delivers parsed events to an
//! [`hrdesk_core::events::EventSink`] (normally a `FeedRouter`).

mod error;
mod frames;
mod transport;

pub use error::{Result, TransportError};
pub use frames::{parse_frame, InboundFrame, OutboundFrame};
pub use transport::{
    ConnectionState, RealtimeTransport, TransportConfig, TransportStats, DEFAULT_GREETING,
    DEFAULT_RECONNECT_DELAY, DEFAULT_WS_URL,
};
