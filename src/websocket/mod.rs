//! WebSocket Push
//!
//! Streams dashboard changes to connected clients so they know when to
//! refetch chart data.
//!
//! Clients connect to `/api/v1/ws` and subscribe to topics:
//! - `dashboard.*` - Everything below
//! - `dashboard.directory` - Country list (re)loaded
//! - `dashboard.selection` - Selected countries changed
//! - `dashboard.series` - A country's timeline was merged
//! - `dashboard.errors` - Fetch failures
//! - `dashboard.style` - Default chart style changed
//! - `system` - Server notices
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8082/api/v1/ws');
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['dashboard.*']}));
//! };
//! ```

mod forwarder;
mod handler;
mod hub;
mod messages;

pub use forwarder::spawn_event_forwarder;
pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, WsEvent};
