use crate::error::Result;
use crate::outbound::{ACTION_CHANNEL, Outbound};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An action dispatched by the UI library that only the host can perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCall {
    pub action: Value,
    pub element_id: String,
    pub view_id: String,
}

pub type ActionHandler = Arc<dyn Fn(ActionCall) -> Result<()> + Send + Sync>;

/// One handler per action key, each forwarding the action to the host.
///
/// Callbacks inside `action` must already be replaced by ids from the
/// function registry; the host answers them with `call`.
pub fn create_custom_action_map(
    action_keys: &[String],
    outbound: &Outbound,
) -> HashMap<String, ActionHandler> {
    action_keys
        .iter()
        .map(|key| {
            let outbound = outbound.clone();
            let handler: ActionHandler =
                Arc::new(move |call: ActionCall| outbound.send_message(ACTION_CHANNEL, &call));
            (key.clone(), handler)
        })
        .collect()
}
