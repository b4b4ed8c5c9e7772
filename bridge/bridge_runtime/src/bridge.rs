//! Host command dispatch.
//!
//! `Bridge` is the API the native host drives: it starts the UI library,
//! creates views, routes HTTP responses and function calls, and runs the
//! render helpers. Results cross back to the host as strings.

use crate::action::create_custom_action_map;
use crate::element::Element;
use crate::error::{BridgeError, Result};
use crate::function::FunctionRegistry;
use crate::http_client::{HttpClient, HttpResponse};
use crate::logger::HostLogger;
use crate::operation::create_custom_operation_map;
use crate::outbound::{Outbound, VIEW_UPDATE_CHANNEL};
use crate::policy::ExpansionPolicy;
use crate::promise::PromiseRegistry;
use crate::protocol::{
    BridgeEnvelope, HostEnvelope, StartParams, error_envelope, result_envelope,
};
use crate::service::{DataContext, PLATFORM, ServiceConfig, SnapshotHook, UiLibrary, UiView};
use crate::styles::manage_styles;
use crate::tree::{TemplatePreProcessor, TreeInsertionMode, find_by_id, insert_children};
use crate::view::{ViewHandle, ViewRegistry, function_path};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct ViewUpdate<'a> {
    id: &'a str,
    tree: &'a Element,
}

pub struct Bridge<L: UiLibrary> {
    outbound: Outbound,
    service: Option<L>,
    views: ViewRegistry<L::View>,
    http_client: HttpClient,
    promises: Arc<PromiseRegistry<Value>>,
    functions: Arc<FunctionRegistry>,
    pre_processor: TemplatePreProcessor,
}

impl<L: UiLibrary> Bridge<L> {
    pub fn new(outbound: Outbound) -> Self {
        Self {
            http_client: HttpClient::new(outbound.clone()),
            outbound,
            service: None,
            views: ViewRegistry::default(),
            promises: Arc::new(PromiseRegistry::new()),
            functions: Arc::new(FunctionRegistry::new()),
            pre_processor: TemplatePreProcessor::default(),
        }
    }

    /// Runs one host command and builds the envelope answering it.
    pub fn dispatch(&mut self, envelope: HostEnvelope) -> BridgeEnvelope {
        let id = envelope.id();

        match self.handle(envelope) {
            Ok(value) => result_envelope(id, value),
            Err(err) => {
                warn!("command {id} failed: {err}");
                error_envelope(Some(id), err.code(), err.to_string())
            }
        }
    }

    /// Every command but `start` fails with `NotStarted` until the library
    /// has been started.
    pub fn handle(&mut self, envelope: HostEnvelope) -> Result<Option<String>> {
        if !matches!(envelope, HostEnvelope::Start { .. }) {
            self.service()?;
        }

        match envelope {
            HostEnvelope::Start { params, .. } => {
                self.start(params)?;
                Ok(None)
            }
            HostEnvelope::CreateView { .. } => self.create_view().map(Some),
            HostEnvelope::HttpRespond {
                request_id,
                response,
                ..
            } => self
                .respond_http_request(&request_id, response)
                .map(|ok| Some(ok.to_string())),
            HostEnvelope::Call {
                function_id,
                arguments,
                ..
            } => {
                self.call(&function_id, arguments)?;
                Ok(None)
            }
            HostEnvelope::CallViewFunction {
                view_id,
                function_id,
                arguments,
                ..
            } => {
                self.call_view_function(&view_id, &function_id, &arguments)?;
                Ok(None)
            }
            HostEnvelope::ResolvePromise {
                promise_id, value, ..
            } => {
                self.promises.resolve(&promise_id, value)?;
                Ok(None)
            }
            HostEnvelope::RejectPromise {
                promise_id, error, ..
            } => {
                self.promises.reject(&promise_id, error)?;
                Ok(None)
            }
            HostEnvelope::GetTreeContextHierarchy { view_id, .. } => {
                let hierarchy = self.tree_context_hierarchy(&view_id)?;
                Ok(Some(serde_json::to_string(&hierarchy)?))
            }
            HostEnvelope::GetContextEvaluatedTemplate {
                view_id,
                context,
                template_manager,
                ..
            } => {
                let template =
                    self.context_evaluated_template(&view_id, context, &template_manager)?;
                Ok(Some(serde_json::to_string(&template)?))
            }
            HostEnvelope::CloneTemplate { template, .. } => {
                Ok(Some(serde_json::to_string(&self.clone_template(&template))?))
            }
            HostEnvelope::PreProcessTemplateTree { tree, .. } => {
                let tree = self.pre_process_template_tree(tree)?;
                Ok(Some(serde_json::to_string(&tree)?))
            }
            HostEnvelope::DoTreeFullRender {
                view_id,
                anchor_id,
                children,
                mode,
                ..
            } => {
                self.do_tree_full_render(&view_id, &anchor_id, children, mode)?;
                Ok(None)
            }
        }
    }

    pub fn start(&mut self, params: StartParams) -> Result<()> {
        let StartParams {
            base_url,
            action_keys,
            custom_operations,
            enable_styling,
            expanded_components_map,
            other,
        } = params;

        let config = ServiceConfig {
            base_url,
            platform: PLATFORM,
            custom_actions: create_custom_action_map(&action_keys, &self.outbound),
            custom_operations: create_custom_operation_map(&custom_operations, &self.outbound),
            before_view_snapshot: enable_styling.then(|| styling_hook(expanded_components_map)),
            http_client: self.http_client.clone(),
            promises: self.promises.clone(),
            functions: self.functions.clone(),
            logger: HostLogger::new(self.outbound.clone()),
            other,
        };

        let service = L::create_service(config).map_err(BridgeError::Library)?;
        self.pre_processor = TemplatePreProcessor::new(service.children_properties());
        self.service = Some(service);
        info!(enable_styling, "ui library started");
        Ok(())
    }

    pub fn create_view(&mut self) -> Result<String> {
        let service = self.service.as_mut().ok_or(BridgeError::NotStarted)?;
        let mut view = service.create_view().map_err(BridgeError::Library)?;

        let view_id = self.views.next_id();
        let rendered = Arc::new(AtomicBool::new(false));
        let listener_id = view_id.clone();
        let listener_rendered = rendered.clone();
        let outbound = self.outbound.clone();

        view.on_change(Box::new(move |tree| {
            listener_rendered.store(true, Ordering::Release);
            let update = ViewUpdate {
                id: &listener_id,
                tree,
            };
            if let Err(err) = outbound.send_message(VIEW_UPDATE_CHANNEL, &update) {
                warn!("failed to send update for view {listener_id}: {err}");
            }
        }));

        self.views
            .insert(view_id.clone(), ViewHandle::new(view, rendered));
        debug!("created view {view_id}");
        Ok(view_id)
    }

    pub fn respond_http_request(
        &self,
        request_id: &str,
        response: HttpResponse,
    ) -> Result<&'static str> {
        self.http_client.respond(request_id, response)?;
        Ok("ok")
    }

    pub fn call(&self, function_id: &str, arguments: Option<Value>) -> Result<()> {
        debug!("called function with id {function_id} and arguments {arguments:?}");
        self.functions.call(function_id, arguments)
    }

    /// Unknown views and views that never rendered ignore the call.
    pub fn call_view_function(
        &mut self,
        view_id: &str,
        function_id: &str,
        arguments: &Value,
    ) -> Result<()> {
        let Some(handle) = self.views.get_mut(view_id) else {
            return Ok(());
        };

        if !handle.has_rendered() {
            return Ok(());
        }

        let path = function_path(function_id);
        let executed = handle
            .view
            .execute_function(&path, arguments)
            .map_err(BridgeError::Library)?;

        if !executed {
            info!("No function with path \"{path}\" for view with id \"{view_id}\" was found.");
        }
        Ok(())
    }

    /// Every context hierarchy of the view's tree, flattened in tree order.
    pub fn tree_context_hierarchy(&self, view_id: &str) -> Result<Vec<DataContext>> {
        let service = self.service()?;
        let handle = self
            .views
            .get(view_id)
            .ok_or_else(|| BridgeError::UnknownView(view_id.to_string()))?;

        let Some(tree) = handle.view.tree() else {
            return Ok(Vec::new());
        };

        let global_contexts = service.global_contexts();
        let hierarchy = service.evaluate_contexts(tree, &global_contexts);
        Ok(hierarchy.into_values().flatten().collect())
    }

    pub fn context_evaluated_template(
        &self,
        view_id: &str,
        context: Vec<DataContext>,
        template_manager: &Value,
    ) -> Result<Option<Element>> {
        let mut contexts = context;
        contexts.extend(self.tree_context_hierarchy(view_id)?);

        self.service()?
            .evaluate_template(template_manager, &contexts)
            .map_err(BridgeError::Library)
    }

    pub fn clone_template(&self, template: &Element) -> Element {
        template.clone()
    }

    pub fn pre_process_template_tree(&mut self, mut tree: Element) -> Result<Element> {
        self.service()?;
        self.pre_processor.process(&mut tree)?;
        Ok(tree)
    }

    /// Inserts `children` under the anchor and re-renders it. A missing
    /// anchor is not an error.
    pub fn do_tree_full_render(
        &mut self,
        view_id: &str,
        anchor_id: &str,
        children: Vec<Element>,
        mode: TreeInsertionMode,
    ) -> Result<()> {
        let handle = self
            .views
            .get_mut(view_id)
            .ok_or_else(|| BridgeError::UnknownView(view_id.to_string()))?;

        let Some(anchor) = handle
            .view
            .tree_mut()
            .and_then(|tree| find_by_id(tree, anchor_id))
        else {
            debug!("anchor {anchor_id} not found in view {view_id}");
            return Ok(());
        };

        insert_children(anchor, children, mode);
        let anchor = anchor.clone();

        handle
            .view
            .do_full_render(anchor, anchor_id)
            .map_err(BridgeError::Library)
    }

    pub fn service(&self) -> Result<&L> {
        self.service.as_ref().ok_or(BridgeError::NotStarted)
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    pub fn promises(&self) -> &Arc<PromiseRegistry<Value>> {
        &self.promises
    }
}

fn styling_hook(policy: ExpansionPolicy) -> SnapshotHook {
    Arc::new(move |tree| manage_styles(tree, &policy))
}
