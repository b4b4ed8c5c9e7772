use crate::error::{BridgeError, Result};
use crate::protocol::{BridgeEnvelope, message_envelope};
use serde::Serialize;
use std::sync::mpsc::SyncSender;

pub const HTTP_REQUEST_CHANNEL: &str = "httpClient.request";
pub const VIEW_UPDATE_CHANNEL: &str = "beagleView.update";
pub const OPERATION_CHANNEL: &str = "operation";
pub const ACTION_CHANNEL: &str = "action";
pub const LOG_CHANNEL: &str = "log";

/// Sending half of the queue drained by the writer thread.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: SyncSender<BridgeEnvelope>,
}

impl Outbound {
    pub fn new(tx: SyncSender<BridgeEnvelope>) -> Self {
        Self { tx }
    }

    pub fn send(&self, envelope: BridgeEnvelope) -> Result<()> {
        self.tx.send(envelope).map_err(|_| BridgeError::ChannelClosed)
    }

    /// Sends `payload` as a JSON string on `channel`.
    pub fn send_message<T: Serialize + ?Sized>(&self, channel: &str, payload: &T) -> Result<()> {
        let payload = serde_json::to_string(payload)?;
        self.send(message_envelope(channel, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::mpsc;

    #[test]
    fn messages_carry_json_strings() {
        let (tx, rx) = mpsc::sync_channel(4);
        let outbound = Outbound::new(tx);

        outbound
            .send_message(OPERATION_CHANNEL, &json!({ "operation": "sum", "params": [1, 2] }))
            .expect("send message");

        match rx.try_recv().expect("queued envelope") {
            BridgeEnvelope::Message { channel, payload } => {
                assert_eq!(channel, "operation");
                let payload: Value = serde_json::from_str(&payload).expect("payload json");
                assert_eq!(payload["params"][1], 2);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn closed_queue_is_reported() {
        let (tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        let outbound = Outbound::new(tx);

        let err = outbound
            .send_message(LOG_CHANNEL, "lost")
            .expect_err("receiver dropped");
        assert!(matches!(err, BridgeError::ChannelClosed));
    }
}
