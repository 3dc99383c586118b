use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use chrono::Utc;
use futures::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppState;

/// Messages pushed to event-stream subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// First event on every stream
    Connection {
        #[serde(rename = "connectionId")]
        connection_id: String,
        message: String,
    },
    /// Capability summary sent right after `Connection`
    ServerInfo {
        name: String,
        version: String,
        tools: Vec<String>,
        resources: Vec<String>,
    },
    /// Heartbeat, milliseconds since the Unix epoch
    Ping { timestamp: i64 },
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Connection { .. } => "connection",
            StreamEvent::ServerInfo { .. } => "server-info",
            StreamEvent::Ping { .. } => "ping",
        }
    }

    fn into_event(self) -> Event {
        let name = self.name();
        Event::default().event(name).json_data(&self).unwrap_or_else(|e| {
            tracing::warn!("Failed to encode {} event: {}", name, e);
            Event::default().event(name).data("{}")
        })
    }
}

/// Counts the stream as open until dropped, then logs the disconnect
struct ConnectionGuard {
    id: Uuid,
    open_streams: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn open(id: Uuid, open_streams: Arc<AtomicUsize>) -> Self {
        let open = open_streams.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!("Event stream opened: {} ({} open)", id, open);
        Self { id, open_streams }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let open = self.open_streams.fetch_sub(1, Ordering::Relaxed) - 1;
        tracing::info!("Event stream closed: {} ({} open)", self.id, open);
    }
}

/// `GET /sse`: push connection and server info, then heartbeats until the
/// client goes away or the server shuts down
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let connection_id = Uuid::new_v4();
    let guard = ConnectionGuard::open(connection_id, state.open_streams.clone());

    let dispatcher = &state.dispatcher;
    let info = StreamEvent::ServerInfo {
        name: dispatcher.server_info().name.clone(),
        version: dispatcher.server_info().version.clone(),
        tools: dispatcher.tool_names(),
        resources: dispatcher.resource_uris(),
    };
    let shutdown = state.shutdown.clone();
    let period = state.heartbeat_interval;

    let stream = async_stream::stream! {
        let _guard = guard;

        yield Ok(StreamEvent::Connection {
            connection_id: connection_id.to_string(),
            message: "Connected to the hot-search MCP server".to_string(),
        }
        .into_event());
        yield Ok(info.into_event());

        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            let beat = tokio::select! {
                _ = shutdown.cancelled() => false,
                _ = heartbeat.tick() => true,
            };
            if !beat {
                break;
            }
            yield Ok(StreamEvent::Ping { timestamp: Utc::now().timestamp_millis() }.into_event());
        }
    };

    Sse::new(stream)
}
