//! WebSocket handler for real-time dashboard updates.

use crate::error::{HealthError, Result};
use crate::health::evaluator::Assessment;
use crate::metrics::{data::HealthRecord, traits::MetricSampler};
use crate::web::charts::DashboardFigures;
use crate::web::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Capacity of the update channel. Slow clients skip missed updates.
const CHANNEL_CAPACITY: usize = 16;

/// Everything the dashboard needs to redraw after one evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardUpdate {
    pub sampled_at: DateTime<Utc>,
    pub record: HealthRecord,
    pub assessment: Assessment,
    pub figures: DashboardFigures,
}

#[derive(Debug)]
struct Client {
    id: String,
    connected_at: std::time::SystemTime,
}

/// Fan-out of dashboard updates to connected WebSocket clients.
#[derive(Debug, Clone)]
pub struct Hub {
    tx: broadcast::Sender<DashboardUpdate>,
    clients: Arc<RwLock<HashMap<String, Client>>>,
    max_connections: usize,
}

impl Hub {
    /// Create a hub admitting at most `max_connections` clients.
    pub fn new(max_connections: usize) -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            clients: Arc::new(RwLock::new(HashMap::new())),
            max_connections,
        }
    }

    /// Subscribe to updates.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardUpdate> {
        self.tx.subscribe()
    }

    /// Send an update to every subscriber. Returns how many received it.
    pub fn broadcast(&self, update: DashboardUpdate) -> Result<usize> {
        if self.tx.receiver_count() == 0 {
            return Ok(0);
        }

        match self.tx.send(update) {
            Ok(receiver_count) => {
                debug!("Broadcasted update to {} receivers", receiver_count);
                Ok(receiver_count)
            }
            Err(e) => {
                warn!("Failed to broadcast update: {}", e);
                Err(HealthError::web_server_error(format!(
                    "Failed to broadcast update: {}",
                    e
                )))
            }
        }
    }

    /// Get the number of connected WebSocket clients.
    pub async fn connected_client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get information about connected WebSocket clients.
    pub async fn connected_clients(&self) -> Vec<serde_json::Value> {
        let clients = self.clients.read().await;

        clients
            .values()
            .map(|client| {
                serde_json::json!({
                    "id": client.id,
                    "connected_at": client.connected_at
                        .duration_since(std::time::UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_secs(),
                    "connected_duration_seconds": client.connected_at.elapsed().unwrap_or_default().as_secs()
                })
            })
            .collect()
    }

    /// Register a client if there is room. Returns its id.
    async fn admit(&self) -> Option<String> {
        let mut clients = self.clients.write().await;
        if clients.len() >= self.max_connections {
            return None;
        }

        let id = uuid::Uuid::new_v4().to_string();
        clients.insert(
            id.clone(),
            Client {
                id: id.clone(),
                connected_at: std::time::SystemTime::now(),
            },
        );
        Some(id)
    }

    async fn release(&self, id: &str) {
        self.clients.write().await.remove(id);
    }
}

/// WebSocket upgrade handler.
pub async fn websocket_handler<S>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> Response
where
    S: MetricSampler + 'static,
{
    let hub = state.hub.clone();
    let Some(client_id) = hub.admit().await else {
        warn!("Rejecting WebSocket client: connection limit reached");
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many WebSocket connections").into_response();
    };

    let failed_hub = hub.clone();
    let failed_id = client_id.clone();
    ws.on_failed_upgrade(move |e| {
        warn!("WebSocket upgrade failed for {}: {}", failed_id, e);
        tokio::spawn(async move { failed_hub.release(&failed_id).await });
    })
    .on_upgrade(move |socket| handle_websocket(socket, hub, client_id))
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, hub: Hub, client_id: String) {
    info!("WebSocket client connected: {}", client_id);

    let (mut sender, mut receiver) = socket.split();
    let mut rx = hub.subscribe();

    let client_id_recv = client_id.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    info!("WebSocket client {} disconnected", client_id_recv);
                    break;
                }
                Ok(_) => {
                    debug!("Ignoring message from {}", client_id_recv);
                }
                Err(e) => {
                    warn!("WebSocket error for client {}: {}", client_id_recv, e);
                    break;
                }
            }
        }
    });

    let client_id_send = client_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let update = match rx.recv().await {
                Ok(update) => update,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Client {} lagged, skipped {} updates", client_id_send, skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let json_string = match serde_json::to_string(&update) {
                Ok(json_string) => json_string,
                Err(e) => {
                    warn!("Failed to serialize update for client {}: {}", client_id_send, e);
                    continue;
                }
            };

            if let Err(e) = sender.send(Message::Text(json_string)).await {
                warn!("Failed to send message to client {}: {}", client_id_send, e);
                break;
            }
        }
    });

    tokio::select! {
        _ = recv_task => {
            debug!("Receive task completed for client {}", client_id);
        }
        _ = send_task => {
            debug!("Send task completed for client {}", client_id);
        }
    }

    hub.release(&client_id).await;
    info!("WebSocket client disconnected: {}", client_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{classify, ThresholdConfig};

    fn update() -> DashboardUpdate {
        let record = HealthRecord::new(10.0, 20.0, 30.0, 40);
        let thresholds = ThresholdConfig::default();
        DashboardUpdate {
            sampled_at: Utc::now(),
            record,
            assessment: classify(&record, &thresholds),
            figures: DashboardFigures::from_record(&record, &thresholds),
        }
    }

    #[tokio::test]
    async fn test_broadcast_no_clients() {
        let hub = Hub::new(4);
        assert_eq!(hub.broadcast(update()).unwrap(), 0);
        assert_eq!(hub.connected_client_count().await, 0);
        assert!(hub.connected_clients().await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let hub = Hub::new(4);
        let mut rx = hub.subscribe();
        assert_eq!(hub.broadcast(update()).unwrap(), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.record, HealthRecord::new(10.0, 20.0, 30.0, 40));
    }

    #[tokio::test]
    async fn test_admit_respects_limit() {
        let hub = Hub::new(1);
        let first = hub.admit().await.unwrap();
        assert!(hub.admit().await.is_none());
        assert_eq!(hub.connected_client_count().await, 1);

        hub.release(&first).await;
        assert!(hub.admit().await.is_some());
    }
}
