//! Pushes controller events out to subscribed WebSocket clients.

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::hub::ConnectionHub;
use super::messages::WsEvent;
use crate::dashboard::DashboardEvent;

/// Relay dashboard events into the hub until the controller goes away.
pub fn spawn_event_forwarder(
    mut events: broadcast::Receiver<DashboardEvent>,
    hub: Arc<ConnectionHub>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    hub.broadcast(&WsEvent::from(event)).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket forwarder lagged behind dashboard events");
                    let notice = format!("missed {} dashboard events; refetch state", skipped);
                    hub.broadcast(&WsEvent::system(&notice)).await;
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Dashboard event stream closed");
                    break;
                }
            }
        }
    })
}
