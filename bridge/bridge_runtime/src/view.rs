use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Prefix of the ids that stand in for functions in trees sent to the host.
pub const FUNCTION_PREFIX: &str = "__beagleFn:";

/// Id for the function found at `path` (`.onPress`, `[0].onPress`, …).
pub fn function_id(path: &str) -> String {
    format!("{FUNCTION_PREFIX}{path}")
}

/// Path of a function id, without the prefix and the dot that may follow it.
pub fn function_path(function_id: &str) -> String {
    let Some(start) = function_id.find(FUNCTION_PREFIX) else {
        return function_id.to_string();
    };

    let rest = &function_id[start + FUNCTION_PREFIX.len()..];
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    format!("{}{rest}", &function_id[..start])
}

#[derive(Debug)]
pub struct ViewHandle<V> {
    pub view: V,
    rendered: Arc<AtomicBool>,
}

impl<V> ViewHandle<V> {
    pub fn new(view: V, rendered: Arc<AtomicBool>) -> Self {
        Self { view, rendered }
    }

    /// Whether the view has emitted at least one tree.
    pub fn has_rendered(&self) -> bool {
        self.rendered.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct ViewRegistry<V> {
    views: HashMap<String, ViewHandle<V>>,
    next_view_id: u64,
}

impl<V> Default for ViewRegistry<V> {
    fn default() -> Self {
        Self {
            views: HashMap::new(),
            next_view_id: 0,
        }
    }
}

impl<V> ViewRegistry<V> {
    pub fn next_id(&mut self) -> String {
        let id = self.next_view_id.to_string();
        self.next_view_id += 1;
        id
    }

    pub fn insert(&mut self, id: String, handle: ViewHandle<V>) {
        self.views.insert(id, handle);
    }

    pub fn get(&self, id: &str) -> Option<&ViewHandle<V>> {
        let view = self.views.get(id);
        if view.is_none() {
            info!("No view with id {id} has been found.");
        }
        view
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ViewHandle<V>> {
        let view = self.views.get_mut(id);
        if view.is_none() {
            info!("No view with id {id} has been found.");
        }
        view
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
