use crate::outbound::{LOG_CHANNEL, Outbound};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "BEAGLE_BRIDGE_LOG";

/// Installs the process-wide subscriber. Logs go to stderr: stdout carries
/// protocol frames.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    level: LogLevel,
    message: &'a str,
}

/// Log function handed to the UI library. Entries reach the host on the
/// `log` channel and are mirrored to `tracing`.
#[derive(Debug, Clone)]
pub struct HostLogger {
    outbound: Outbound,
}

impl HostLogger {
    pub fn new(outbound: Outbound) -> Self {
        Self { outbound }
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "ui_library", "{message}"),
            LogLevel::Info => tracing::info!(target: "ui_library", "{message}"),
            LogLevel::Warning => tracing::warn!(target: "ui_library", "{message}"),
            LogLevel::Error => tracing::error!(target: "ui_library", "{message}"),
        }

        if let Err(err) = self
            .outbound
            .send_message(LOG_CHANNEL, &LogEntry { level, message })
        {
            tracing::warn!("failed to forward log entry to host: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::BridgeEnvelope;
    use serde_json::{Value, json};
    use std::sync::mpsc;

    #[test]
    fn entries_are_sent_on_the_log_channel() {
        let (tx, rx) = mpsc::sync_channel(2);
        let logger = HostLogger::new(Outbound::new(tx));

        logger.log(LogLevel::Warning, "slow render");

        match rx.try_recv().expect("log message") {
            BridgeEnvelope::Message { channel, payload } => {
                assert_eq!(channel, LOG_CHANNEL);
                let payload: Value = serde_json::from_str(&payload).expect("payload json");
                assert_eq!(payload, json!({ "level": "warning", "message": "slow render" }));
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        HostLogger::new(Outbound::new(tx)).log(LogLevel::Error, "dropped");
    }
}
