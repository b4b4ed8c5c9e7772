use crate::error::Result;
use crate::outbound::{OPERATION_CHANNEL, Outbound};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Custom operation the UI library may call while evaluating expressions.
pub type OperationHandler = Arc<dyn Fn(&[Value]) -> Result<()> + Send + Sync>;

#[derive(Debug, Serialize)]
struct OperationCall<'a> {
    operation: &'a str,
    params: &'a [Value],
}

fn forward_operation(operation_name: String, outbound: Outbound) -> OperationHandler {
    Arc::new(move |params: &[Value]| {
        outbound.send_message(
            OPERATION_CHANNEL,
            &OperationCall {
                operation: &operation_name,
                params,
            },
        )
    })
}

/// One handler per name, each forwarding its calls to the host.
pub fn create_custom_operation_map(
    operations: &[String],
    outbound: &Outbound,
) -> HashMap<String, OperationHandler> {
    operations
        .iter()
        .map(|name| (name.clone(), forward_operation(name.clone(), outbound.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::BridgeEnvelope;
    use serde_json::json;
    use std::sync::mpsc;

    #[test]
    fn operations_are_forwarded_with_their_params() {
        let (tx, rx) = mpsc::sync_channel(4);
        let operations = create_custom_operation_map(
            &["sum".to_string(), "isValidCpf".to_string()],
            &Outbound::new(tx),
        );
        assert_eq!(operations.len(), 2);

        operations["sum"](&[json!(1), json!(2)]).expect("forward operation");

        match rx.try_recv().expect("operation message") {
            BridgeEnvelope::Message { channel, payload } => {
                assert_eq!(channel, OPERATION_CHANNEL);
                let payload: Value = serde_json::from_str(&payload).expect("payload json");
                assert_eq!(payload, json!({ "operation": "sum", "params": [1, 2] }));
            }
            other => panic!("expected message, got {other:?}"),
        }
    }
}
