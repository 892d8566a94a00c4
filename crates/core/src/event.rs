//! Stream event system — the injectable observability sink.
//!
//! The coordinator publishes events for everything it observes but does not
//! act on: tool-use notices, contained transport failures, session outcomes.
//! Subscribers (metrics, audit logs, dashboards) react without coupling to
//! the coordinator itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All events published by a streaming session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamEvent {
    /// The anchor message was created for a session
    PlaceholderCreated {
        session_id: String,
        anchor: String,
        timestamp: DateTime<Utc>,
    },

    /// The transport rejected anchor creation — the session stays anchor-less
    PlaceholderFailed {
        session_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The generation source invoked a tool (observational only)
    ToolUseObserved {
        session_id: String,
        tool_name: String,
        input: serde_json::Value,
        timestamp: DateTime<Utc>,
    },

    /// A transport edit failed and was contained
    EditFailed {
        session_id: String,
        anchor: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The session reached its terminal outcome successfully
    SessionCompleted {
        session_id: String,
        chars_streamed: usize,
        deltas: usize,
        timestamp: DateTime<Utc>,
    },

    /// The session ended in failure
    SessionFailed {
        session_id: String,
        error_message: String,
        /// Whether the failure was written to a visible anchor
        visible: bool,
        timestamp: DateTime<Utc>,
    },

    /// The idle watchdog forced the session into failure
    SessionTimedOut {
        session_id: String,
        idle_secs: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for stream events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Components can subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<StreamEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: StreamEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StreamEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(StreamEvent::ToolUseObserved {
            session_id: "s1".into(),
            tool_name: "web_search".into(),
            input: serde_json::json!({"query": "weather"}),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            StreamEvent::ToolUseObserved { tool_name, .. } => {
                assert_eq!(tool_name, "web_search");
            }
            _ => panic!("Expected ToolUseObserved event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        // Publishing with no subscribers should not panic
        bus.publish(StreamEvent::EditFailed {
            session_id: "s1".into(),
            anchor: "msg-1".into(),
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = StreamEvent::SessionCompleted {
            session_id: "s1".into(),
            chars_streamed: 120,
            deltas: 7,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("SessionCompleted"));
        let back: StreamEvent = serde_json::from_str(&json).unwrap();
        match back {
            StreamEvent::SessionCompleted { chars_streamed, .. } => {
                assert_eq!(chars_streamed, 120);
            }
            _ => panic!("Wrong variant"),
        }
    }
}
