//! Turn-level streaming events.
//!
//! `TurnEvent` is what a front end sees while a turn runs. Provider chunks
//! are filtered before they become events, so `Text` never carries the
//! data-request marker.

use serde::{Deserialize, Serialize};

/// Events emitted by the orchestrator during a turn:
/// - `text`: answer text, safe to display
/// - `fetching_data`: the model asked for the listings table
/// - `restart`: text shown so far is superseded by a second answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Text { content: String },

    FetchingData,

    Restart,
}

impl TurnEvent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_event_serialization() {
        let json = serde_json::to_string(&TurnEvent::text("Olá")).unwrap();
        assert!(json.contains(r#""type":"text""#));
        assert!(json.contains(r#""content":"Olá""#));
    }

    #[test]
    fn unit_events_serialize_as_tag_only() {
        let json = serde_json::to_string(&TurnEvent::Restart).unwrap();
        assert_eq!(json, r#"{"type":"restart"}"#);

        let back: TurnEvent = serde_json::from_str(r#"{"type":"fetching_data"}"#).unwrap();
        assert_eq!(back, TurnEvent::FetchingData);
    }
}
