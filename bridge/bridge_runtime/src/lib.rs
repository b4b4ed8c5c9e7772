pub mod action;
pub mod bridge;
pub mod element;
pub mod error;
pub mod function;
pub mod http_client;
pub mod logger;
pub mod operation;
pub mod outbound;
pub mod policy;
pub mod promise;
pub mod protocol;
pub mod service;
pub mod styles;
pub mod tree;
pub mod view;

use crate::protocol::{error_envelope, reader_loop, ready_envelope, writer_loop};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub use crate::bridge::Bridge;
pub use crate::element::{Element, Flex, FlexDirection, Size, Style, UnitType, UnitValue};
pub use crate::error::{BridgeError, Result};
pub use crate::outbound::Outbound;
pub use crate::policy::ExpansionPolicy;
pub use crate::protocol::{BRIDGE_TO_HOST_CAP, BridgeEnvelope, HOST_TO_BRIDGE_CAP, HostEnvelope};
pub use crate::service::{
    ChangeListener, DataContext, ServiceConfig, SnapshotHook, UiLibrary, UiView,
};
pub use crate::styles::manage_styles;
pub use indexmap;
pub use serde_json;

pub const OUTBOUND_QUEUE_CAP_ENV: &str = "BEAGLE_BRIDGE_OUTBOUND_QUEUE_CAP";
const DEFAULT_OUTBOUND_QUEUE_CAP: usize = 256;
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serves host commands from stdin until EOF, answering on stdout.
///
/// Commands run one at a time on the calling thread. A dedicated thread
/// drains the outbound queue so library callbacks never write to stdout
/// themselves.
pub fn run<L: UiLibrary>() -> std::result::Result<(), Box<dyn std::error::Error>> {
    logger::init_tracing();

    let queue_cap = parse_outbound_queue_capacity(std::env::var(OUTBOUND_QUEUE_CAP_ENV).ok());
    let (tx, rx) = mpsc::sync_channel(queue_cap);
    let outbound = Outbound::new(tx);

    let writer_handle = thread::spawn(move || writer_loop(rx));

    outbound
        .send(ready_envelope())
        .map_err(|_| "failed to queue ready envelope")?;
    info!(queue_cap, "bridge ready");

    let mut bridge = Bridge::<L>::new(outbound.clone());
    let read_result = reader_loop(
        |envelope| {
            let reply = bridge.dispatch(envelope);
            if outbound.send(reply).is_err() {
                warn!("dropping reply: writer is gone");
            }
        },
        |err| {
            warn!("failed to decode host frame: {err}");
            let err = BridgeError::from(err);
            if outbound
                .send(error_envelope(None, err.code(), err.to_string()))
                .is_err()
            {
                warn!("dropping decode error: writer is gone");
            }
        },
    );

    if let Err(err) = &read_result {
        error!(code = err.code(), "reader loop terminated with error: {err}");
    }

    // Every sender lives in the bridge, so dropping it lets the writer drain
    // the queue and stop.
    drop(bridge);
    drop(outbound);

    let deadline = Instant::now() + WRITER_DRAIN_TIMEOUT;
    while !writer_handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    if writer_handle.is_finished() {
        match writer_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!("writer thread returned error: {err}"),
            Err(err) => error!("writer thread join failed: {err:?}"),
        }
    } else {
        // A sender leaked by the library keeps the writer alive.
        warn!("writer thread still active after {WRITER_DRAIN_TIMEOUT:?}; skipping join");
    }

    read_result.map_err(Into::into)
}

fn parse_outbound_queue_capacity(raw: Option<String>) -> usize {
    raw.and_then(|raw| raw.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_OUTBOUND_QUEUE_CAP)
}

/// Generates `main` for a bridge binary serving `$library`.
#[macro_export]
macro_rules! bridge_main {
    ($library:ty) => {
        fn main() {
            if let Err(err) = $crate::run::<$library>() {
                eprintln!("beagle bridge fatal error: {err}");
                std::process::exit(1);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_capacity_falls_back_to_default() {
        assert_eq!(parse_outbound_queue_capacity(None), DEFAULT_OUTBOUND_QUEUE_CAP);
        assert_eq!(
            parse_outbound_queue_capacity(Some("0".to_string())),
            DEFAULT_OUTBOUND_QUEUE_CAP
        );
        assert_eq!(
            parse_outbound_queue_capacity(Some("lots".to_string())),
            DEFAULT_OUTBOUND_QUEUE_CAP
        );
        assert_eq!(parse_outbound_queue_capacity(Some("32".to_string())), 32);
    }
}
