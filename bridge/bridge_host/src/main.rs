//! Headless bridge host.
//!
//! Serves the bridge protocol with an in-memory UI library: views keep their
//! tree, run the snapshot hook on every render and report it to the host.
//! Useful to drive a native renderer without a script engine.

use beagle_bridge_runtime::function::FunctionRegistry;
use beagle_bridge_runtime::tree::find_by_id;
use beagle_bridge_runtime::{
    ChangeListener, DataContext, Element, ServiceConfig, SnapshotHook, UiLibrary, UiView,
    bridge_main,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const ROOT_ID: &str = "root";
const GLOBAL_CONTEXT_ID: &str = "global";

struct HeadlessLibrary {
    snapshot_hook: Option<SnapshotHook>,
    functions: Arc<FunctionRegistry>,
    global_context: Value,
}

impl UiLibrary for HeadlessLibrary {
    type View = HeadlessView;

    fn create_service(config: ServiceConfig) -> Result<Self, String> {
        debug!(base_url = %config.base_url, "starting headless library");

        Ok(Self {
            snapshot_hook: config.before_view_snapshot,
            functions: config.functions,
            global_context: config.other.get("globalContext").cloned().unwrap_or_default(),
        })
    }

    fn create_view(&mut self) -> Result<Self::View, String> {
        Ok(HeadlessView {
            tree: Element::container(ROOT_ID),
            listeners: Vec::new(),
            snapshot_hook: self.snapshot_hook.clone(),
            functions: self.functions.clone(),
        })
    }

    fn global_contexts(&self) -> Vec<DataContext> {
        vec![DataContext {
            id: GLOBAL_CONTEXT_ID.to_string(),
            value: self.global_context.clone(),
        }]
    }

    fn evaluate_contexts(
        &self,
        tree: &Element,
        global_contexts: &[DataContext],
    ) -> IndexMap<String, Vec<DataContext>> {
        let mut hierarchy = IndexMap::new();
        collect_contexts(tree, global_contexts.to_vec(), &mut hierarchy);
        hierarchy
    }

    /// Templates carry a `default` tree and no conditions.
    fn evaluate_template(
        &self,
        template_manager: &Value,
        _contexts: &[DataContext],
    ) -> Result<Option<Element>, String> {
        template_manager
            .get("default")
            .map(|template| serde_json::from_value(template.clone()))
            .transpose()
            .map_err(|err| format!("invalid default template: {err}"))
    }
}

/// Each element sees its own context first, then those of its ancestors.
fn collect_contexts(
    element: &Element,
    inherited: Vec<DataContext>,
    hierarchy: &mut IndexMap<String, Vec<DataContext>>,
) {
    let mut contexts = inherited;
    if let Some(own) = element
        .properties
        .get("context")
        .and_then(|raw| serde_json::from_value::<DataContext>(raw.clone()).ok())
    {
        contexts.insert(0, own);
    }

    hierarchy.insert(element.id.clone(), contexts.clone());
    for child in element.children() {
        collect_contexts(child, contexts.clone(), hierarchy);
    }
}

struct HeadlessView {
    tree: Element,
    listeners: Vec<ChangeListener>,
    snapshot_hook: Option<SnapshotHook>,
    functions: Arc<FunctionRegistry>,
}

impl HeadlessView {
    fn update(&mut self, tree: Element) {
        self.tree = match &self.snapshot_hook {
            Some(hook) => hook(tree),
            None => tree,
        };

        for listener in &mut self.listeners {
            listener(&self.tree);
        }
    }
}

impl UiView for HeadlessView {
    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    fn tree(&self) -> Option<&Element> {
        Some(&self.tree)
    }

    fn tree_mut(&mut self) -> Option<&mut Element> {
        Some(&mut self.tree)
    }

    fn do_full_render(&mut self, anchor: Element, anchor_id: &str) -> Result<(), String> {
        let mut tree = self.tree.clone();
        match find_by_id(&mut tree, anchor_id) {
            Some(node) => *node = anchor,
            None => return Err(format!("anchor {anchor_id} is not in the tree")),
        }

        self.update(tree);
        Ok(())
    }

    /// Functions live in the tree as ids of the function registry.
    fn execute_function(&mut self, path: &str, arguments: &Value) -> Result<bool, String> {
        let tree = serde_json::to_value(&self.tree).map_err(|err| err.to_string())?;
        let Some(function_id) = resolve_path(&tree, path).and_then(Value::as_str) else {
            return Ok(false);
        };

        self.functions
            .call(function_id, Some(arguments.clone()))
            .map(|()| true)
            .map_err(|err| err.to_string())
    }
}

/// Looks up a path such as `children[1].onPress` inside `value`.
fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| {
            let mut parts = segment.split('[');
            let key = parts.next().unwrap_or_default();
            let mut current = if key.is_empty() {
                current
            } else {
                current.get(key)?
            };

            for index in parts {
                let index = index.strip_suffix(']')?.parse::<usize>().ok()?;
                current = current.get(index)?;
            }
            Some(current)
        })
}

bridge_main!(HeadlessLibrary);
