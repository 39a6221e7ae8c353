//! WebSocket Connection Hub
//!
//! Tracks connected dashboard clients and the topics each one follows.
//! Events are fanned out to direct and wildcard (`dashboard.*`) subscribers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, DASHBOARD_PREFIX};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Concrete topics a client may follow
const DASHBOARD_TOPICS: [&str; 5] = ["directory", "selection", "series", "errors", "style"];

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

struct ConnectionHandle {
    sender: mpsc::UnboundedSender<ServerMessage>,
    topics: HashSet<String>,
}

#[derive(Default)]
struct Registry {
    /// ConnectionId → handle
    connections: HashMap<ConnectionId, ConnectionHandle>,
    /// Topic → subscribed connections
    subscribers: HashMap<String, HashSet<ConnectionId>>,
}

impl Registry {
    fn detach(&mut self, id: &str, topic: &str) {
        if let Some(ids) = self.subscribers.get_mut(topic) {
            ids.remove(id);
            if ids.is_empty() {
                self.subscribers.remove(topic);
            }
        }
    }

    fn deliver(&self, event: &WsEvent) -> usize {
        let wildcard = event
            .topic
            .split('.')
            .next()
            .map(|prefix| format!("{}.*", prefix));

        let mut targets: HashSet<&ConnectionId> = HashSet::new();
        if let Some(ids) = self.subscribers.get(&event.topic) {
            targets.extend(ids);
        }
        if let Some(ids) = wildcard.and_then(|w| self.subscribers.get(&w)) {
            targets.extend(ids);
        }

        targets
            .into_iter()
            .filter_map(|id| self.connections.get(id))
            .filter(|handle| handle.sender.send(event.message.clone()).is_ok())
            .count()
    }
}

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    registry: Arc<RwLock<Registry>>,
    config: HubConfig,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            config,
        }
    }

    /// Register a new connection, failing once the limit is reached
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut registry = self.registry.write().await;
        if registry.connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        registry.connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                topics: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and drop its subscriptions
    pub async fn unregister(&self, id: &str) {
        let mut registry = self.registry.write().await;
        if let Some(handle) = registry.connections.remove(id) {
            for topic in &handle.topics {
                registry.detach(id, topic);
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics; unknown topics are skipped
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut registry = self.registry.write().await;
        if !registry.connections.contains_key(id) {
            return Err(HubError::ConnectionNotFound);
        }

        let mut subscribed = Vec::new();
        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }
            registry
                .subscribers
                .entry(topic.clone())
                .or_default()
                .insert(id.to_string());
            if let Some(handle) = registry.connections.get_mut(id) {
                handle.topics.insert(topic.clone());
            }
            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics it follows
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut registry = self.registry.write().await;
        let handle = registry
            .connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let removed: Vec<String> = topics
            .into_iter()
            .filter(|topic| handle.topics.remove(topic))
            .collect();
        for topic in &removed {
            registry.detach(id, topic);
        }

        tracing::debug!(connection_id = %id, topics = ?removed, "Unsubscribed from topics");
        Ok(removed)
    }

    /// Deliver an event to every subscriber of its topic
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        let sent = self.registry.read().await.deliver(event);
        if sent > 0 {
            tracing::trace!(topic = %event.topic, subscribers = sent, "Broadcast event");
        }
        sent
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let registry = self.registry.read().await;
        let handle = registry
            .connections
            .get(id)
            .ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }

    /// Get subscription count for a topic
    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.registry
            .read()
            .await
            .subscribers
            .get(topic)
            .map_or(0, HashSet::len)
    }
}

/// `dashboard.<name>`, `dashboard.*` or `system`
fn is_valid_topic(topic: &str) -> bool {
    if topic == "system" {
        return true;
    }
    match topic.split_once('.') {
        Some((prefix, rest)) if prefix == DASHBOARD_PREFIX => {
            rest == "*" || DASHBOARD_TOPICS.contains(&rest)
        }
        _ => false,
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardEvent;

    fn series_event(country: &str) -> WsEvent {
        DashboardEvent::SeriesUpdated {
            version: 1,
            country: country.to_string(),
            case_dates: 3,
            death_dates: 2,
        }
        .into()
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("dashboard.series"));
        assert!(is_valid_topic("dashboard.errors"));
        assert!(is_valid_topic("dashboard.*"));
        assert!(is_valid_topic("system"));

        assert!(!is_valid_topic("dashboard"));
        assert!(!is_valid_topic("dashboard.unknown"));
        assert!(!is_valid_topic(""));
        assert!(!is_valid_topic("metrics.mood"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        let subscribed = hub
            .subscribe(
                &id,
                vec!["dashboard.series".to_string(), "bogus".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["dashboard.series"]);
        assert_eq!(hub.subscription_count("dashboard.series").await, 1);

        let unsubscribed = hub
            .unsubscribe(&id, vec!["dashboard.series".to_string()])
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec!["dashboard.series"]);
        assert_eq!(hub.subscription_count("dashboard.series").await, 0);
    }

    #[tokio::test]
    async fn test_unregister_clears_subscriptions() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["dashboard.*".to_string()])
            .await
            .unwrap();

        hub.unregister(&id).await;
        assert_eq!(hub.subscription_count("dashboard.*").await, 0);
        assert!(matches!(
            hub.subscribe(&id, vec!["system".to_string()]).await,
            Err(HubError::ConnectionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig { max_connections: 2 });

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        hub.register(tx1).await.unwrap();
        hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));
    }

    #[tokio::test]
    async fn test_broadcast_to_subscribers() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();

        hub.subscribe(&id1, vec!["dashboard.series".to_string()])
            .await
            .unwrap();
        hub.subscribe(&id2, vec!["dashboard.errors".to_string()])
            .await
            .unwrap();

        assert_eq!(hub.broadcast(&series_event("Italy")).await, 1);
        assert!(matches!(
            rx1.try_recv(),
            Ok(ServerMessage::SeriesUpdated { .. })
        ));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_subscription_receives_once() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        hub.subscribe(
            &id,
            vec!["dashboard.*".to_string(), "dashboard.series".to_string()],
        )
        .await
        .unwrap();

        hub.broadcast(&series_event("Spain")).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
