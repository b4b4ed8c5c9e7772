//! Seam between the bridge and the server-driven UI library.

use crate::action::ActionHandler;
use crate::element::Element;
use crate::function::FunctionRegistry;
use crate::http_client::HttpClient;
use crate::logger::HostLogger;
use crate::operation::OperationHandler;
use crate::promise::PromiseRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Platform name reported to the UI library and to the host.
pub const PLATFORM: &str = "flutter";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContext {
    pub id: String,
    #[serde(default)]
    pub value: Value,
}

/// Runs on every tree right before a view hands it to its listeners.
pub type SnapshotHook = Arc<dyn Fn(Element) -> Element + Send + Sync>;

pub type ChangeListener = Box<dyn FnMut(&Element) + Send>;

/// Everything the bridge provides to the UI library when a session starts.
pub struct ServiceConfig {
    pub base_url: String,
    pub platform: &'static str,
    pub custom_actions: HashMap<String, ActionHandler>,
    pub custom_operations: HashMap<String, OperationHandler>,
    pub before_view_snapshot: Option<SnapshotHook>,
    pub http_client: HttpClient,
    pub promises: Arc<PromiseRegistry<Value>>,
    pub functions: Arc<FunctionRegistry>,
    pub logger: HostLogger,
    /// Start options the bridge does not interpret.
    pub other: Map<String, Value>,
}

pub trait UiLibrary: Sized {
    type View: UiView;

    fn create_service(config: ServiceConfig) -> Result<Self, String>;

    fn create_view(&mut self) -> Result<Self::View, String>;

    fn global_contexts(&self) -> Vec<DataContext>;

    /// Context hierarchy of every element of `tree`, keyed by element id, in
    /// tree order.
    fn evaluate_contexts(
        &self,
        tree: &Element,
        global_contexts: &[DataContext],
    ) -> IndexMap<String, Vec<DataContext>>;

    fn evaluate_template(
        &self,
        template_manager: &Value,
        contexts: &[DataContext],
    ) -> Result<Option<Element>, String>;

    /// Lowercase component kind mapped to the property that holds its
    /// children, for components that do not use `children`.
    fn children_properties(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

pub trait UiView {
    fn on_change(&mut self, listener: ChangeListener);

    fn tree(&self) -> Option<&Element>;

    fn tree_mut(&mut self) -> Option<&mut Element>;

    fn do_full_render(&mut self, anchor: Element, anchor_id: &str) -> Result<(), String>;

    /// Runs the function found at `path` in the current tree. Returns
    /// `Ok(false)` when nothing callable lives there.
    fn execute_function(&mut self, path: &str, arguments: &Value) -> Result<bool, String>;
}
