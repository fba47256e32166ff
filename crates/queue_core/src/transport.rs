//! Websocket push channel for a single queue.

use anyhow::{anyhow, bail, Context, Result};
use futures::{SinkExt, StreamExt};
use shared::{
    domain::QueueId,
    protocol::{QueueAction, QueueEvent},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use url::Url;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMessage {
    Event(QueueEvent),
    /// A frame that could not be decoded. The connection stays open.
    Error(String),
    Closed,
}

pub struct PushConnection {
    messages: mpsc::Receiver<TransportMessage>,
    actions: mpsc::Sender<QueueAction>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl PushConnection {
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        self.messages.recv().await
    }

    pub async fn send(&self, action: QueueAction) -> Result<()> {
        self.actions
            .send(action)
            .await
            .map_err(|_| anyhow!("push connection is closed"))
    }
}

impl Drop for PushConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// `http(s)://host/base` becomes `ws(s)://host/base/cable?queue_id=<id>`.
pub fn cable_url(server_url: &str, queue_id: QueueId) -> Result<Url> {
    let mut url =
        Url::parse(server_url).with_context(|| format!("invalid server_url: {server_url}"))?;
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => bail!("server_url must start with http:// or https://"),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow!("cannot derive websocket url from {server_url}"))?;
    let path = format!("{}/cable", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("queue_id", &queue_id.0.to_string());
    Ok(url)
}

pub async fn connect(server_url: &str, queue_id: QueueId) -> Result<PushConnection> {
    let ws_url = cable_url(server_url, queue_id)?;
    let (ws_stream, _) = connect_async(ws_url.as_str())
        .await
        .with_context(|| format!("failed to connect websocket: {ws_url}"))?;
    info!(queue_id = queue_id.0, "transport: connected");
    let (mut ws_writer, mut ws_reader) = ws_stream.split();

    let (message_tx, messages) = mpsc::channel(CHANNEL_CAPACITY);
    let (actions, mut action_rx) = mpsc::channel::<QueueAction>(CHANNEL_CAPACITY);

    let reader = tokio::spawn(async move {
        while let Some(msg) = ws_reader.next().await {
            let forwarded = match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<QueueEvent>(&text) {
                    Ok(event) => TransportMessage::Event(event),
                    Err(err) => {
                        warn!(error = %err, "transport: invalid queue event");
                        TransportMessage::Error(format!("invalid queue event: {err}"))
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(err) => {
                    warn!(error = %err, "transport: websocket receive failed");
                    break;
                }
            };
            if message_tx.send(forwarded).await.is_err() {
                return;
            }
        }
        info!("transport: connection closed");
        let _ = message_tx.send(TransportMessage::Closed).await;
    });

    let writer = tokio::spawn(async move {
        while let Some(action) = action_rx.recv().await {
            let payload = match serde_json::to_string(&action) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "transport: failed to encode action");
                    continue;
                }
            };
            if let Err(err) = ws_writer.send(Message::Text(payload)).await {
                warn!(error = %err, "transport: websocket send failed");
                break;
            }
        }
    });

    Ok(PushConnection {
        messages,
        actions,
        reader,
        writer,
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
