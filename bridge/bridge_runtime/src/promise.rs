//! Pending results the host settles later, such as HTTP responses.

use crate::error::{BridgeError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

pub type Settle<T> = Box<dyn FnOnce(std::result::Result<T, Value>) + Send>;

pub struct PromiseRegistry<T> {
    pending: Mutex<HashMap<String, Settle<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for PromiseRegistry<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> PromiseRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `settle` until the host resolves or rejects the returned id.
    pub fn register<F>(&self, settle: F) -> String
    where
        F: FnOnce(std::result::Result<T, Value>) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        self.lock().insert(id.clone(), Box::new(settle));
        id
    }

    pub fn resolve(&self, id: &str, value: T) -> Result<()> {
        let settle = self.take(id)?;
        settle(Ok(value));
        Ok(())
    }

    pub fn reject(&self, id: &str, reason: Value) -> Result<()> {
        let settle = self.take(id)?;
        settle(Err(reason));
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn take(&self, id: &str) -> Result<Settle<T>> {
        self.lock()
            .remove(id)
            .ok_or_else(|| BridgeError::UnknownPromise(id.to_string()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Settle<T>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for PromiseRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseRegistry")
            .field("pending", &self.pending())
            .finish()
    }
}
