//! Glue between the push connection and the engine. Losing the connection
//! never ends the session; the page keeps showing what was loaded and stdin
//! commands keep working.

use anyhow::anyhow;
use queue_core::{transport, PushConnection, ReconciliationEngine, SyncError, TransportMessage};
use shared::{domain::QueueId, protocol::QueueAction};
use tracing::warn;

pub const LIVE_UPDATES: &str = "Live updates";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Disconnected,
}

/// Connects the push channel. On failure the reason is shown on the page and
/// the session carries on without live updates.
pub async fn connect_or_degrade(
    engine: &mut ReconciliationEngine,
    server_url: &str,
    queue_id: QueueId,
) -> Result<Option<PushConnection>, SyncError> {
    match transport::connect(server_url, queue_id).await {
        Ok(connection) => Ok(Some(connection)),
        Err(err) => {
            warn!(error = %err, "queue_watch: live updates unavailable");
            engine.show_message(
                LIVE_UPDATES,
                &format!("Could not connect ({err:#}); live updates are off. Restart to try again."),
            )?;
            Ok(None)
        }
    }
}

pub fn apply_message(
    engine: &mut ReconciliationEngine,
    message: Option<TransportMessage>,
) -> Result<Flow, SyncError> {
    match message {
        Some(TransportMessage::Event(event)) => {
            engine.dispatch(event)?;
            Ok(Flow::Continue)
        }
        Some(TransportMessage::Error(err)) => {
            engine.show_message(LIVE_UPDATES, &err)?;
            Ok(Flow::Continue)
        }
        Some(TransportMessage::Closed) | None => {
            engine.show_message(
                LIVE_UPDATES,
                "Connection closed; live updates are off. Restart to reconnect.",
            )?;
            Ok(Flow::Disconnected)
        }
    }
}

/// Sends `action` upstream and returns whether it went out. A failed or
/// impossible send is reported on the page, which is re-enabled since no echo
/// event will arrive.
pub async fn send_action(
    engine: &mut ReconciliationEngine,
    connection: Option<&PushConnection>,
    action: QueueAction,
) -> Result<bool, SyncError> {
    let sent = match connection {
        Some(connection) => connection.send(action).await,
        None => Err(anyhow!("live updates are off")),
    };
    if let Err(err) = sent {
        warn!(error = %err, "queue_watch: failed to send action");
        engine.show_message("Action failed", &err.to_string())?;
        engine.refresh()?;
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
#[path = "tests/live_tests.rs"]
mod tests;
