//! Wire frames exchanged over the real-time socket.

use hrdesk_core::events::{EventKind, RealtimeEvent};
use hrdesk_core::records::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TransportError};

/// Inbound frame: `{ "type": string, "data"?: object }`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl InboundFrame {
    pub fn into_event(self) -> Result<RealtimeEvent> {
        let kind = EventKind::parse(&self.kind);
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                Record::from_value(value)
                    .map_err(|e| TransportError::MalformedFrame(format!("{} data: {}", kind, e)))?,
            ),
        };
        Ok(RealtimeEvent::new(kind, data))
    }
}

/// Outbound frames. The greeting is sent once per opened connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Greeting { content: String },
}

impl OutboundFrame {
    pub fn greeting(content: impl Into<String>) -> Self {
        Self::Greeting {
            content: content.into(),
        }
    }

    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parses one text frame into an event.
pub fn parse_frame(text: &str) -> Result<RealtimeEvent> {
    let frame: InboundFrame = serde_json::from_str(text)?;
    frame.into_event()
}
