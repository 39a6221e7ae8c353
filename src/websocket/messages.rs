//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! dashboard clients and the server.

use serde::{Deserialize, Serialize};

use crate::dashboard::DashboardEvent;
use crate::series::ChartStyle;

/// Topic prefix shared by all dashboard topics
pub const DASHBOARD_PREFIX: &str = "dashboard";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics (e.g., "dashboard.series", "dashboard.*")
    Subscribe { topics: Vec<String> },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Country directory (re)loaded
    DirectoryLoaded { countries: usize },
    /// Selected countries changed
    SelectionChanged { countries: Vec<String> },
    /// A country's timeline was merged; clients should refetch charts
    SeriesUpdated {
        version: u64,
        country: String,
        case_dates: usize,
        death_dates: usize,
    },
    /// A fetch failed
    FetchFailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        country: Option<String>,
        message: String,
    },
    /// Default chart style changed
    ChartStyleChanged { style: ChartStyle },
    /// Subscription confirmed
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
    /// Connection established
    Connected { connection_id: String },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "dashboard.series")
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

fn topic(name: &str) -> String {
    format!("{}.{}", DASHBOARD_PREFIX, name)
}

impl From<DashboardEvent> for WsEvent {
    fn from(event: DashboardEvent) -> Self {
        match event {
            DashboardEvent::DirectoryLoaded { countries } => Self {
                topic: topic("directory"),
                message: ServerMessage::DirectoryLoaded { countries },
            },
            DashboardEvent::SelectionChanged { countries } => Self {
                topic: topic("selection"),
                message: ServerMessage::SelectionChanged { countries },
            },
            DashboardEvent::SeriesUpdated {
                version,
                country,
                case_dates,
                death_dates,
            } => Self {
                topic: topic("series"),
                message: ServerMessage::SeriesUpdated {
                    version,
                    country,
                    case_dates,
                    death_dates,
                },
            },
            DashboardEvent::FetchFailed { country, message } => Self {
                topic: topic("errors"),
                message: ServerMessage::FetchFailed { country, message },
            },
            DashboardEvent::ChartStyleChanged { style } => Self {
                topic: topic("style"),
                message: ServerMessage::ChartStyleChanged { style },
            },
        }
    }
}

impl WsEvent {
    /// Create a system event
    pub fn system(message: &str) -> Self {
        Self {
            topic: "system".to_string(),
            message: ServerMessage::Error {
                message: message.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "topics": ["dashboard.series", "dashboard.errors"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => {
                assert_eq!(topics.len(), 2);
                assert_eq!(topics[0], "dashboard.series");
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_server_message_serialize_series_updated() {
        let msg = ServerMessage::SeriesUpdated {
            version: 4,
            country: "Italy".to_string(),
            case_dates: 30,
            death_dates: 20,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"series_updated\""));
        assert!(json.contains("\"country\":\"Italy\""));
    }

    #[test]
    fn test_fetch_failed_without_country() {
        let msg = ServerMessage::FetchFailed {
            country: None,
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("country"));
    }

    #[test]
    fn test_event_topics() {
        let event: WsEvent = DashboardEvent::SelectionChanged {
            countries: vec!["Italy".to_string()],
        }
        .into();
        assert_eq!(event.topic, "dashboard.selection");

        let event: WsEvent = DashboardEvent::FetchFailed {
            country: Some("Italy".to_string()),
            message: "timeout".to_string(),
        }
        .into();
        assert_eq!(event.topic, "dashboard.errors");

        let event: WsEvent = DashboardEvent::ChartStyleChanged {
            style: ChartStyle::Bar,
        }
        .into();
        assert_eq!(
            event.message,
            ServerMessage::ChartStyleChanged {
                style: ChartStyle::Bar
            }
        );
    }
}
