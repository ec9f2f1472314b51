//! WebSocket-based block source.
//!
//! Subscribes to `newHeads` over the chain's WebSocket RPC and yields a block
//! number for every new head, so receipts are checked as soon as a block lands
//! instead of on a fixed timer.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::BlockSource;
use crate::common::error::{DappError, Result};
use crate::common::logging;
use crate::rpc::parse_quantity;

/// WebSocket block source
///
/// Connects lazily on first use and reconnects after the stream drops.
pub struct WebSocketSource {
    /// WebSocket URL (ws:// or wss://)
    ws_url: String,
    /// Reconnection delay in seconds
    reconnect_delay_secs: u64,
    /// Internal state
    state: WebSocketState,
}

enum WebSocketState {
    Disconnected,
    Connected {
        #[allow(dead_code)] // Kept for a future eth_unsubscribe
        subscription_id: String,
        receiver: tokio::sync::mpsc::UnboundedReceiver<u64>,
    },
}

#[derive(Debug, Deserialize)]
struct HeadNotification {
    params: NotificationParams,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: HeadResult,
}

#[derive(Debug, Deserialize)]
struct HeadResult {
    number: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    id: u64,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

const SUBSCRIBE_ID: u64 = 1;

impl WebSocketSource {
    /// Creates a new WebSocket source
    ///
    /// # Arguments
    ///
    /// * `ws_url` - WebSocket URL (e.g., "ws://127.0.0.1:8546")
    /// * `reconnect_delay_secs` - Delay between reconnection attempts
    pub fn new(ws_url: impl Into<String>, reconnect_delay_secs: u64) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnect_delay_secs,
            state: WebSocketState::Disconnected,
        }
    }

    async fn connect(&mut self) -> Result<()> {
        logging::log(
            logging::LogLevel::Info,
            &format!("Connecting to WebSocket: {}", self.ws_url),
        );

        let (ws_stream, _) = connect_async(&self.ws_url)
            .await
            .map_err(|e| DappError::RpcError(format!("WebSocket connection failed: {e}")))?;

        let (mut write, mut read) = ws_stream.split();

        let subscribe_request = json!({
            "jsonrpc": "2.0",
            "id": SUBSCRIBE_ID,
            "method": "eth_subscribe",
            "params": ["newHeads"]
        });

        write
            .send(Message::Text(subscribe_request.to_string()))
            .await
            .map_err(|e| DappError::RpcError(format!("Failed to send subscription: {e}")))?;

        let subscription_id = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => {
                    let Ok(response) = serde_json::from_str::<SubscriptionResponse>(&text) else {
                        continue;
                    };
                    if response.id != SUBSCRIBE_ID {
                        continue;
                    }
                    match (response.result, response.error) {
                        (Some(id), _) => break id,
                        (None, error) => {
                            return Err(DappError::RpcError(format!(
                                "eth_subscribe rejected: {}",
                                error.unwrap_or_default()
                            )));
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(DappError::RpcError(format!(
                        "WebSocket error before subscription: {e}"
                    )));
                }
                None => {
                    return Err(DappError::RpcError(
                        "WebSocket closed before subscription was confirmed".to_string(),
                    ));
                }
            }
        };

        logging::log(
            logging::LogLevel::Success,
            &format!("Subscribed to newHeads (ID: {subscription_id})"),
        );

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            // Keep the sink alive for as long as the stream is read.
            let _write = write;
            while let Some(Ok(message)) = read.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let Ok(notification) = serde_json::from_str::<HeadNotification>(&text) else {
                    continue;
                };
                if let Ok(number) = parse_quantity(&notification.params.result.number) {
                    if tx.send(number).is_err() {
                        break;
                    }
                }
            }
        });

        self.state = WebSocketState::Connected {
            subscription_id,
            receiver: rx,
        };

        Ok(())
    }

    /// Ensures the subscription is live, reconnecting if the stream dropped.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        match &self.state {
            WebSocketState::Disconnected => {
                self.connect().await?;
            }
            WebSocketState::Connected { receiver, .. } => {
                if receiver.is_closed() {
                    logging::log(
                        logging::LogLevel::Warning,
                        "WebSocket disconnected, reconnecting...",
                    );
                    sleep(Duration::from_secs(self.reconnect_delay_secs)).await;
                    self.state = WebSocketState::Disconnected;
                    self.connect().await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlockSource for WebSocketSource {
    async fn next_block(&mut self) -> Result<Option<u64>> {
        self.ensure_connected().await?;

        match &mut self.state {
            WebSocketState::Connected { receiver, .. } => match receiver.recv().await {
                Some(number) => {
                    // Several heads may have queued up; only the newest matters.
                    let mut latest = number;
                    while let Ok(next) = receiver.try_recv() {
                        latest = latest.max(next);
                    }
                    Ok(Some(latest))
                }
                // Stream dropped. The closed receiver makes the next
                // `ensure_connected` wait out the reconnect delay.
                None => Ok(None),
            },
            WebSocketState::Disconnected => Err(DappError::InternalError(
                "WebSocket not connected".to_string(),
            )),
        }
    }

    fn source_name(&self) -> &'static str {
        "WebSocket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    #[test]
    fn test_websocket_source_creation() {
        let ws_url = "ws://127.0.0.1:8546";
        let source = WebSocketSource::new(ws_url, 5);

        assert_eq!(source.ws_url, ws_url);
        assert_eq!(source.reconnect_delay_secs, 5);
        assert!(matches!(source.state, WebSocketState::Disconnected));
        assert_eq!(source.source_name(), "WebSocket");
    }

    #[test]
    fn test_head_notification_parsing() {
        let text = r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0x9ce59a13059e417087c02d3236a0b1cc","result":{"number":"0x1b4","hash":"0xdc0818cf"}}}"#;
        let notification: HeadNotification = serde_json::from_str(text).unwrap();
        assert_eq!(parse_quantity(&notification.params.result.number).unwrap(), 436);
    }

    /// Accepts connections, confirms the `newHeads` subscription and then
    /// closes. Returns the endpoint and a connection counter.
    async fn spawn_dropping_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                    let _subscribe = ws.next().await;
                    let reply = json!({ "jsonrpc": "2.0", "id": 1, "result": "0x9ce59a13" });
                    ws.send(Message::Text(reply.to_string())).await.unwrap();
                    let _ = ws.close(None).await;
                });
            }
        });

        (url, connections)
    }

    #[tokio::test]
    async fn test_reconnect_waits_after_stream_drop() {
        let (url, connections) = spawn_dropping_server().await;
        let mut source = WebSocketSource::new(url, 1);
        let start = Instant::now();

        assert_eq!(source.next_block().await.unwrap(), None);
        assert_eq!(connections.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));

        assert_eq!(source.next_block().await.unwrap(), None);
        assert_eq!(connections.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let mut source = WebSocketSource::new("ws://127.0.0.1:1", 0);
        let result = source.ensure_connected().await;
        assert!(matches!(result, Err(DappError::RpcError(_))));
    }
}
