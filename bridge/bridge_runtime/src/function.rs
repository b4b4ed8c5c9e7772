//! Callbacks the UI library hands to the host by id.

use crate::error::{BridgeError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

pub type Function = Box<dyn FnMut(Option<Value>) + Send>;

/// `None` while the function is running.
type Slot = Option<Function>;

#[derive(Default)]
pub struct FunctionRegistry {
    functions: Mutex<HashMap<String, Slot>>,
    next_id: AtomicU64,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, function: F) -> String
    where
        F: FnMut(Option<Value>) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        self.lock().insert(id.clone(), Some(Box::new(function)));
        id
    }

    /// Runs the function registered under `id`. The registry is not locked
    /// while the function runs, so it may register or unregister functions,
    /// itself included. A function that is already running is not re-entered.
    pub fn call(&self, id: &str, arguments: Option<Value>) -> Result<()> {
        let mut function = {
            let mut functions = self.lock();
            let slot = functions
                .get_mut(id)
                .ok_or_else(|| BridgeError::UnknownFunction(id.to_string()))?;
            match slot.take() {
                Some(function) => function,
                None => {
                    warn!("function {id} is already running");
                    return Ok(());
                }
            }
        };

        function(arguments);

        // unregistered while running: the entry is gone and the function drops
        if let Some(slot) = self.lock().get_mut(id) {
            *slot = Some(function);
        }
        Ok(())
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.functions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, mpsc};

    #[test]
    fn functions_can_be_called_repeatedly() {
        let registry = FunctionRegistry::new();
        let (tx, rx) = mpsc::channel();

        let id = registry.register(move |arguments| {
            tx.send(arguments).expect("deliver arguments");
        });

        registry.call(&id, Some(json!({ "value": 1 }))).expect("first call");
        registry.call(&id, None).expect("second call");

        assert_eq!(rx.try_recv().expect("first"), Some(json!({ "value": 1 })));
        assert_eq!(rx.try_recv().expect("second"), None);
    }

    #[test]
    fn function_may_unregister_itself() {
        let registry = Arc::new(FunctionRegistry::new());
        let inner = registry.clone();
        let (tx, rx) = mpsc::channel();

        let id = registry.register(move |arguments| {
            let id = arguments
                .as_ref()
                .and_then(Value::as_str)
                .expect("own id")
                .to_string();
            tx.send(inner.unregister(&id)).expect("deliver");
        });

        registry.call(&id, Some(json!(id))).expect("call");

        assert!(rx.try_recv().expect("unregistered"));
        assert!(registry.is_empty());
        let err = registry.call(&id, None).expect_err("gone after the first call");
        assert!(matches!(err, BridgeError::UnknownFunction(missing) if missing == id));
    }

    #[test]
    fn running_function_is_not_re_entered() {
        let registry = Arc::new(FunctionRegistry::new());
        let inner = registry.clone();
        let (tx, rx) = mpsc::channel();

        let id = registry.register(move |arguments| {
            tx.send(()).expect("deliver");
            if let Some(id) = arguments.as_ref().and_then(Value::as_str) {
                inner.call(id, None).expect("nested call is skipped");
            }
        });

        registry.call(&id, Some(json!(id))).expect("call");

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(registry.len(), 1);
        registry.call(&id, None).expect("callable again");
    }

    #[test]
    fn unknown_function_is_an_error() {
        let registry = FunctionRegistry::new();
        let err = registry.call("42", None).expect_err("nothing registered");
        assert!(matches!(err, BridgeError::UnknownFunction(id) if id == "42"));
    }

    #[test]
    fn functions_may_register_more_functions() {
        let registry = Arc::new(FunctionRegistry::new());
        let inner = registry.clone();

        let id = registry.register(move |_| {
            inner.register(|_| {});
        });
        registry.call(&id, None).expect("call");

        assert_eq!(registry.len(), 2);
        assert!(registry.unregister(&id));
        assert!(!registry.unregister(&id));
    }
}
