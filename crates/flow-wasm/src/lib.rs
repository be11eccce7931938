//! WASM bridge for the flow canvas: exposes the store, coordinators and
//! geometry to a JavaScript rendering and gesture layer.
//!
//! Compiled via `wasm-pack build --target web`. Everything crosses the
//! boundary as JSON strings; read-side getters degrade to `"[]"` / `"null"`
//! when encoding fails.

use flow_core::changes::{edge_changes_from_json, node_changes_from_json};
use flow_core::{
    Edge, EdgeChange, EdgeId, HandleElement, HandleId, HandleType, MinimapProjection, Node,
    NodeChange, NodeId, Point, Rect, Size, Viewport, pattern_offset,
};
use flow_editor::{
    ConnectionCoordinator, ControlAction, ControlMap, Controls, Coordinator, EdgeCoordinator,
    FitViewOptions, FlowCallbacks, FlowConfig, FlowEvent, FlowSnapshot, FlowStore, GestureEvent,
    HandleHit, MinimapCoordinator, NodeDragCoordinator, StoreCommand, ViewportCoordinator,
    connection_state, edge_geometries, handle_connections, nodes_initialized, visible_edges,
    visible_nodes,
};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

type Pending<T> = Rc<RefCell<Vec<T>>>;

/// The main WASM-facing canvas controller.
///
/// Holds the store and one coordinator per live gesture. Change batches and
/// interaction events the store emits are queued until the host drains them.
#[wasm_bindgen]
pub struct FlowCanvas {
    store: FlowStore,
    controls: Controls,
    node_drags: HashMap<NodeId, NodeDragCoordinator>,
    connection: Option<ConnectionCoordinator>,
    pane: ViewportCoordinator,
    minimap: MinimapCoordinator,
    pending_nodes: Pending<NodeChange>,
    pending_edges: Pending<EdgeChange>,
    pending_events: Pending<FlowEvent>,
}

#[wasm_bindgen]
impl FlowCanvas {
    /// Create a canvas controller. `config_json` may be empty or a partial
    /// config object; an unreadable config falls back to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: &str) -> Self {
        console_error_panic_hook_setup();

        let mut config = if config_json.trim().is_empty() {
            FlowConfig::default()
        } else {
            FlowConfig::from_json(config_json).unwrap_or_else(|e| {
                log::warn!("{e}; using defaults");
                FlowConfig::default()
            })
        };
        config.container = Size::new(width, height);
        let controls = Controls {
            fit_view_options: config.fit_view_options.clone(),
            ..Controls::default()
        };

        let pending_nodes: Pending<NodeChange> = Rc::default();
        let pending_edges: Pending<EdgeChange> = Rc::default();
        let pending_events: Pending<FlowEvent> = Rc::default();
        let (nodes_sink, edges_sink) = (pending_nodes.clone(), pending_edges.clone());
        let node_event = |to_event: fn(NodeId) -> FlowEvent| {
            let sink = pending_events.clone();
            Some(Box::new(move |node: &Node| sink.borrow_mut().push(to_event(node.id)))
                as Box<dyn FnMut(&Node)>)
        };
        let (edge_sink, pane_sink) = (pending_events.clone(), pending_events.clone());
        let store = FlowStore::new(Vec::new(), Vec::new(), config).with_callbacks(FlowCallbacks {
            on_nodes_change: Some(Box::new(move |changes: &[NodeChange]| {
                nodes_sink.borrow_mut().extend_from_slice(changes)
            })),
            on_edges_change: Some(Box::new(move |changes: &[EdgeChange]| {
                edges_sink.borrow_mut().extend_from_slice(changes)
            })),
            on_connect: None,
            on_node_drag_start: node_event(|id| FlowEvent::NodeDragStart { id }),
            on_node_drag: node_event(|id| FlowEvent::NodeDrag { id }),
            on_node_drag_stop: node_event(|id| FlowEvent::NodeDragStop { id }),
            on_node_click: node_event(|id| FlowEvent::NodeClick { id }),
            on_edge_click: Some(Box::new(move |edge: &Edge| {
                edge_sink.borrow_mut().push(FlowEvent::EdgeClick { id: edge.id })
            })),
            on_pane_click: Some(Box::new(move |position: Point| {
                pane_sink.borrow_mut().push(FlowEvent::PaneClick { position })
            })),
        });

        Self {
            store,
            controls,
            node_drags: HashMap::new(),
            connection: None,
            pane: ViewportCoordinator::new(),
            minimap: MinimapCoordinator::new(Size::new(200.0, 150.0)),
            pending_nodes,
            pending_edges,
            pending_events,
        }
    }

    // ─── Data sync ───────────────────────────────────────────────────────

    /// Replace nodes, edges and viewport from a `{nodes, edges, viewport}`
    /// snapshot. Returns `false` if the JSON could not be decoded.
    pub fn set_flow(&mut self, json: &str) -> bool {
        match FlowSnapshot::from_json(json) {
            Ok(snapshot) => {
                self.store.set_nodes(snapshot.nodes);
                self.store.set_edges(snapshot.edges);
                self.store.set_viewport(snapshot.viewport);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    pub fn set_nodes_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Vec<Node>>(json) {
            Ok(nodes) => {
                self.store.set_nodes(nodes);
                true
            }
            Err(e) => {
                log::warn!("invalid nodes: {e}");
                false
            }
        }
    }

    pub fn set_edges_json(&mut self, json: &str) -> bool {
        match serde_json::from_str(json) {
            Ok(edges) => {
                self.store.set_edges(edges);
                true
            }
            Err(e) => {
                log::warn!("invalid edges: {e}");
                false
            }
        }
    }

    /// Fold a JSON change list into the nodes. Returns `false` on bad JSON.
    pub fn apply_node_changes(&mut self, json: &str) -> bool {
        match node_changes_from_json(json) {
            Ok(changes) => {
                self.store.on_nodes_change(changes);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    pub fn apply_edge_changes(&mut self, json: &str) -> bool {
        match edge_changes_from_json(json) {
            Ok(changes) => {
                self.store.on_edges_change(changes);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Snapshot of nodes, edges and viewport.
    pub fn to_object(&self) -> String {
        let snapshot = FlowSnapshot {
            nodes: self.store.nodes().to_vec(),
            edges: self.store.edges().to_vec(),
            viewport: *self.store.viewport(),
        };
        snapshot.to_json().unwrap_or_else(|_| "null".to_string())
    }

    // ─── Change queue ────────────────────────────────────────────────────

    pub fn has_pending_changes(&self) -> bool {
        !self.pending_nodes.borrow().is_empty() || !self.pending_edges.borrow().is_empty()
    }

    /// Drain queued node changes as a JSON array.
    pub fn take_node_changes(&mut self) -> String {
        let changes = std::mem::take(&mut *self.pending_nodes.borrow_mut());
        serde_json::to_string(&changes).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn take_edge_changes(&mut self) -> String {
        let changes = std::mem::take(&mut *self.pending_edges.borrow_mut());
        serde_json::to_string(&changes).unwrap_or_else(|_| "[]".to_string())
    }

    /// Drain queued interaction events (drags, clicks) as a JSON array of
    /// `{kind, ...}` objects.
    pub fn take_events(&mut self) -> String {
        let events = std::mem::take(&mut *self.pending_events.borrow_mut());
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Layout reports ──────────────────────────────────────────────────

    /// Resize the container.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.store.set_container_dimensions(Size::new(width, height));
    }

    pub fn report_node_dimensions(&mut self, node_id: &str, width: f64, height: f64) {
        self.store
            .update_node_dimensions(NodeId::intern(node_id), Size::new(width, height));
    }

    /// `json` is an array of handle layouts relative to the node.
    pub fn report_handle_bounds(&mut self, node_id: &str, json: &str) -> bool {
        match serde_json::from_str::<Vec<HandleElement>>(json) {
            Ok(handles) => {
                self.store.update_handle_bounds(NodeId::intern(node_id), handles);
                true
            }
            Err(e) => {
                log::warn!("invalid handle bounds for {node_id}: {e}");
                false
            }
        }
    }

    // ─── Gestures ────────────────────────────────────────────────────────
    //
    // Each returns true when the store changed or a redraw is needed.

    /// A gesture on a node body.
    pub fn node_gesture(&mut self, node_id: &str, event_json: &str) -> bool {
        let Some(event) = decode_event(event_json) else {
            return false;
        };
        let id = NodeId::intern(node_id);
        let drag = self
            .node_drags
            .entry(id)
            .or_insert_with(|| NodeDragCoordinator::new(id));
        let commands = drag.handle(&event, None, &self.store);
        if matches!(event, GestureEvent::PanEnd | GestureEvent::Tap { .. }) {
            self.node_drags.remove(&id);
        }
        self.apply(commands)
    }

    /// A gesture on a port. `port_json` is the handle under the gesture;
    /// `hit_json` is the `{nodeId, handle}` under the pointer, or empty.
    ///
    /// A tap is handled by the tapped port itself, so tapping a second port
    /// completes a draft opened elsewhere without disturbing its drag.
    pub fn handle_gesture(
        &mut self,
        node_id: &str,
        port_json: &str,
        event_json: &str,
        hit_json: &str,
    ) -> bool {
        let Some(event) = decode_event(event_json) else {
            return false;
        };
        let hit: Option<HandleHit> = if hit_json.trim().is_empty() {
            None
        } else {
            serde_json::from_str(hit_json).ok()
        };

        if matches!(event, GestureEvent::Tap { .. }) {
            let Some(port) = decode_port(node_id, port_json) else {
                return false;
            };
            let commands =
                ConnectionCoordinator::new(port).handle(&event, hit.as_ref(), &self.store);
            return self.apply(commands);
        }

        let mut coordinator = match self.connection.take() {
            Some(active) => active,
            None => {
                let Some(port) = decode_port(node_id, port_json) else {
                    return false;
                };
                ConnectionCoordinator::new(port)
            }
        };
        let commands = coordinator.handle(&event, hit.as_ref(), &self.store);
        if !matches!(event, GestureEvent::PanEnd) {
            self.connection = Some(coordinator);
        }
        self.apply(commands)
    }

    /// A gesture on an edge. Only taps do anything.
    pub fn edge_gesture(&mut self, edge_id: &str, event_json: &str) -> bool {
        let Some(event) = decode_event(event_json) else {
            return false;
        };
        let mut tap = EdgeCoordinator::new(EdgeId::intern(edge_id));
        let commands = tap.handle(&event, None, &self.store);
        self.apply(commands)
    }

    /// A gesture on the empty pane.
    pub fn pane_gesture(&mut self, event_json: &str) -> bool {
        let Some(event) = decode_event(event_json) else {
            return false;
        };
        let commands = self.pane.handle(&event, None, &self.store);
        let live = self.pane.live_viewport().is_some();
        self.apply(commands) || live
    }

    /// A gesture inside a minimap of `width`×`height` pixels.
    pub fn minimap_gesture(&mut self, width: f64, height: f64, event_json: &str) -> bool {
        let Some(event) = decode_event(event_json) else {
            return false;
        };
        self.minimap.set_size(Size::new(width, height));
        let commands = self.minimap.handle(&event, None, &self.store);
        self.apply(commands)
    }

    pub fn set_minimap_pannable(&mut self, pannable: bool) {
        self.minimap.pannable = pannable;
    }

    // ─── Viewport & controls ─────────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.store.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.store.zoom_out();
    }

    pub fn get_zoom(&self) -> f64 {
        self.store.zoom()
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.store.set_zoom(zoom);
    }

    pub fn set_viewport(&mut self, x: f64, y: f64, zoom: f64) {
        self.store.set_viewport(Viewport::new(x, y, zoom));
    }

    pub fn set_center(&mut self, x: f64, y: f64, zoom: Option<f64>) {
        self.store.set_center(x, y, zoom);
    }

    /// Frame nodes. `options_json` may be empty. Returns false when there
    /// was nothing to frame.
    pub fn fit_view(&mut self, options_json: &str) -> bool {
        let options = if options_json.trim().is_empty() {
            FitViewOptions::default()
        } else {
            match serde_json::from_str(options_json) {
                Ok(options) => options,
                Err(e) => {
                    log::warn!("invalid fit view options: {e}");
                    return false;
                }
            }
        };
        self.store.fit_view(&options)
    }

    /// The viewport to draw with: the live gesture transform if one is in
    /// flight, the store's otherwise.
    pub fn get_viewport(&self) -> String {
        let viewport = self
            .pane
            .live_viewport()
            .unwrap_or_else(|| *self.store.viewport());
        serde_json::to_string(&viewport).unwrap_or_else(|_| "null".to_string())
    }

    /// Handle a keyboard event. Returns `{"changed":bool,"action":"<name>"}`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let Some(action) = ControlMap::resolve(key, ctrl, shift, alt, meta) else {
            return r#"{"changed":false,"action":"none"}"#.to_string();
        };
        let changed = self.trigger(action);
        let name = action_to_name(action);
        format!(r#"{{"changed":{changed},"action":"{name}"}}"#)
    }

    /// Trigger a control panel button by name. Unknown names do nothing.
    pub fn control(&mut self, name: &str) -> bool {
        match name_to_action(name) {
            Some(action) => self.trigger(action),
            None => false,
        }
    }

    pub fn delete_elements(&mut self, node_ids_json: &str, edge_ids_json: &str) -> bool {
        let nodes: Vec<NodeId> = serde_json::from_str(node_ids_json).unwrap_or_default();
        let edges: Vec<EdgeId> = serde_json::from_str(edge_ids_json).unwrap_or_default();
        let before = (self.store.nodes().len(), self.store.edges().len());
        self.store.delete_elements(&nodes, &edges);
        before != (self.store.nodes().len(), self.store.edges().len())
    }

    pub fn select_node(&mut self, node_id: &str, additive: bool) {
        self.store.select_node(NodeId::intern(node_id), additive);
    }

    pub fn select_edge(&mut self, edge_id: &str, additive: bool) {
        self.store.select_edge(EdgeId::intern(edge_id), additive);
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    // ─── Read surface ────────────────────────────────────────────────────

    pub fn get_nodes(&self) -> String {
        serde_json::to_string(self.store.nodes()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_edges(&self) -> String {
        serde_json::to_string(self.store.edges()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_node(&self, node_id: &str) -> String {
        serde_json::to_string(&self.store.get_node(NodeId::intern(node_id)))
            .unwrap_or_else(|_| "null".to_string())
    }

    pub fn get_internal_node(&self, node_id: &str) -> String {
        serde_json::to_string(&self.store.internal(NodeId::intern(node_id)))
            .unwrap_or_else(|_| "null".to_string())
    }

    pub fn get_selected_ids(&self) -> String {
        let selection = serde_json::json!({
            "nodes": self.store.selected_nodes(),
            "edges": self.store.selected_edges(),
        });
        selection.to_string()
    }

    pub fn get_connection(&self) -> String {
        serde_json::to_string(&connection_state(&self.store)).unwrap_or_else(|_| "null".to_string())
    }

    pub fn nodes_initialized(&self) -> bool {
        nodes_initialized(&self.store)
    }

    /// Connections on a node's ports. `kind` is `"source"` or `"target"`;
    /// `handle_id` may be empty.
    pub fn handle_connections(&self, kind: &str, node_id: &str, handle_id: &str) -> String {
        let kind = if kind == "target" {
            HandleType::Target
        } else {
            HandleType::Source
        };
        let node = (!node_id.is_empty()).then(|| NodeId::intern(node_id));
        let handle = (!handle_id.is_empty()).then(|| HandleId::intern(handle_id));
        let connections = handle_connections(&self.store, kind, node, handle);
        serde_json::to_string(&connections).unwrap_or_else(|_| "[]".to_string())
    }

    /// Ids of nodes worth drawing in the current viewport.
    pub fn visible_node_ids(&self) -> String {
        let ids: Vec<NodeId> = visible_nodes(&self.store).iter().map(|n| n.id).collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn visible_edge_ids(&self) -> String {
        let ids: Vec<EdgeId> = visible_edges(&self.store).iter().map(|e| e.id).collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    /// Resolved anchors and SVG path data for every renderable edge.
    pub fn edge_paths(&self) -> String {
        serde_json::to_string(&edge_geometries(&self.store)).unwrap_or_else(|_| "[]".to_string())
    }

    /// Node and viewport rectangles for a minimap of `width`×`height`.
    pub fn minimap_layout(&self, width: f64, height: f64) -> String {
        let projection = MinimapProjection::new(
            self.store.nodes(),
            self.store.viewport(),
            self.store.container(),
            Size::new(width, height),
        );
        let layout = MinimapLayout {
            nodes: self
                .store
                .nodes()
                .iter()
                .filter(|n| !n.hidden)
                .map(|n| MinimapRect::new(Some(n.id), projection.node_rect(n)))
                .collect(),
            viewport: MinimapRect::new(None, projection.viewport_rect()),
        };
        serde_json::to_string(&layout).unwrap_or_else(|_| "null".to_string())
    }

    /// Background grid phase `{x, y}` for a pattern with world spacing `gap`.
    pub fn pattern_offset(&self, gap: f64) -> String {
        let offset = pattern_offset(self.store.viewport(), gap);
        serde_json::json!({ "x": offset.x, "y": offset.y }).to_string()
    }
}

impl FlowCanvas {
    fn apply(&mut self, commands: Vec<StoreCommand>) -> bool {
        let changed = !commands.is_empty();
        self.store.apply_commands(commands);
        changed
    }

    fn trigger(&mut self, action: ControlAction) -> bool {
        let before = (
            *self.store.viewport(),
            self.store.is_interactive(),
            self.store.nodes().len(),
            self.store.edges().len(),
            self.store.selected_nodes().len() + self.store.selected_edges().len(),
        );
        self.controls.trigger(action, &mut self.store);
        let after = (
            *self.store.viewport(),
            self.store.is_interactive(),
            self.store.nodes().len(),
            self.store.edges().len(),
            self.store.selected_nodes().len() + self.store.selected_edges().len(),
        );
        before != after
    }
}

// ─── Minimap layout ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct MinimapRect {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<NodeId>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl MinimapRect {
    fn new(id: Option<NodeId>, rect: Rect) -> Self {
        Self {
            id,
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

#[derive(Serialize)]
struct MinimapLayout {
    nodes: Vec<MinimapRect>,
    viewport: MinimapRect,
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn decode_event(json: &str) -> Option<GestureEvent> {
    match serde_json::from_str(json) {
        Ok(event) => Some(event),
        Err(e) => {
            log::warn!("invalid gesture event: {e}");
            None
        }
    }
}

fn decode_port(node_id: &str, port_json: &str) -> Option<HandleHit> {
    match serde_json::from_str::<HandleElement>(port_json) {
        Ok(handle) => Some(HandleHit {
            node_id: NodeId::intern(node_id),
            handle,
        }),
        Err(e) => {
            log::warn!("invalid port: {e}");
            None
        }
    }
}

fn action_to_name(action: ControlAction) -> &'static str {
    match action {
        ControlAction::ZoomIn => "zoomIn",
        ControlAction::ZoomOut => "zoomOut",
        ControlAction::FitView => "fitView",
        ControlAction::ToggleInteractive => "toggleInteractive",
        ControlAction::DeleteSelection => "deleteSelection",
        ControlAction::ClearSelection => "clearSelection",
    }
}

fn name_to_action(name: &str) -> Option<ControlAction> {
    match name {
        "zoomIn" => Some(ControlAction::ZoomIn),
        "zoomOut" => Some(ControlAction::ZoomOut),
        "fitView" => Some(ControlAction::FitView),
        "toggleInteractive" => Some(ControlAction::ToggleInteractive),
        "deleteSelection" => Some(ControlAction::DeleteSelection),
        "clearSelection" => Some(ControlAction::ClearSelection),
        _ => None,
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("flow WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Validate a `{nodes, edges, viewport}` snapshot. Returns JSON:
/// `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_flow(json: &str) -> String {
    match FlowSnapshot::from_json(json) {
        Ok(_) => r#"{"ok":true}"#.to_string(),
        Err(e) => serde_json::json!({ "ok": false, "error": e }).to_string(),
    }
}
