//! Graph state store: the single source of truth for one canvas.
//!
//! The store owns the node and edge collections, the viewport, the internals
//! table, both selection sets and the connection draft. Everything else
//! reads it through `&FlowStore` and requests changes through its actions
//! (or through `StoreCommand`s produced by the coordinators).
//!
//! - **Change protocol**: node/edge collections only change by folding
//!   change records (`on_nodes_change` / `on_edges_change`). Every batch is
//!   forwarded to the external change callbacks after it is applied.
//!   `set_nodes` / `set_edges` are the bulk-sync exception and stay silent.
//!
//! - **Internals**: entries are created lazily when a node reports its size
//!   or a port reports its layout, and are merged through
//!   `InternalNode::merge` only.
//!
//! - **Connections**: `Idle → Drafting → {Committed | Idle}`. The draft is
//!   cleared on every terminal path.

use crate::config::{FitViewOptions, FlowConfig, ZOOM_STEP};
use crate::input::HandleHit;
use flow_core::geometry::{centered_viewport, clamp_zoom, fit_viewport};
use flow_core::{
    Connection, Edge, EdgeChange, EdgeId, HandleElement, HandleType, InternalNode,
    InternalUpdate, Node, NodeChange, NodeId, NodeInternals, Point, Size, Vec2, Viewport,
    apply_edge_changes, apply_node_changes, nodes_bounds,
};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;

// ─── Callbacks ───────────────────────────────────────────────────────────

pub type NodesChangeFn = Box<dyn FnMut(&[NodeChange])>;
pub type EdgesChangeFn = Box<dyn FnMut(&[EdgeChange])>;
/// Receives a committed connection and returns the edge to append, if any.
pub type ConnectFn = Box<dyn FnMut(&Connection) -> Option<Edge>>;
pub type NodeEventFn = Box<dyn FnMut(&Node)>;
pub type EdgeEventFn = Box<dyn FnMut(&Edge)>;
/// Receives the tapped point in world coordinates.
pub type PaneClickFn = Box<dyn FnMut(Point)>;

/// Hooks through which an external owner observes the store.
#[derive(Default)]
pub struct FlowCallbacks {
    pub on_nodes_change: Option<NodesChangeFn>,
    pub on_edges_change: Option<EdgesChangeFn>,
    /// Without one, a committed connection appends `e<source>-<target>`.
    pub on_connect: Option<ConnectFn>,
    pub on_node_drag_start: Option<NodeEventFn>,
    pub on_node_drag: Option<NodeEventFn>,
    pub on_node_drag_stop: Option<NodeEventFn>,
    pub on_node_click: Option<NodeEventFn>,
    pub on_edge_click: Option<EdgeEventFn>,
    pub on_pane_click: Option<PaneClickFn>,
}

impl fmt::Debug for FlowCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowCallbacks")
            .field("on_nodes_change", &self.on_nodes_change.is_some())
            .field("on_edges_change", &self.on_edges_change.is_some())
            .field("on_connect", &self.on_connect.is_some())
            .field("on_node_drag_start", &self.on_node_drag_start.is_some())
            .field("on_node_drag", &self.on_node_drag.is_some())
            .field("on_node_drag_stop", &self.on_node_drag_stop.is_some())
            .field("on_node_click", &self.on_node_click.is_some())
            .field("on_edge_click", &self.on_edge_click.is_some())
            .field("on_pane_click", &self.on_pane_click.is_some())
            .finish()
    }
}

// ─── Connection draft ────────────────────────────────────────────────────

/// The in-progress state of a port drag. At most one exists at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDraft {
    pub start_handle: Option<HandleElement>,
    pub start_node_id: Option<NodeId>,
    pub is_connecting: bool,
    /// Pointer in world coordinates.
    pub pointer_position: Option<Point>,
}

/// How a connection draft ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionOutcome {
    Committed(Connection),
    /// Ended with no compatible target. The draft is cleared.
    Abandoned,
}

// ─── Events ──────────────────────────────────────────────────────────────

/// A user interaction reported to the event callbacks. Node and edge events
/// fire with the element as the store holds it after the gesture's commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FlowEvent {
    NodeDragStart { id: NodeId },
    NodeDrag { id: NodeId },
    NodeDragStop { id: NodeId },
    NodeClick { id: NodeId },
    EdgeClick { id: EdgeId },
    PaneClick { position: Point },
}

// ─── Commands ────────────────────────────────────────────────────────────

/// A store action requested by an interaction coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    UpdateNodePosition {
        id: NodeId,
        position: Point,
        dragging: bool,
    },
    SelectNode {
        id: NodeId,
        additive: bool,
    },
    SelectEdge {
        id: EdgeId,
        additive: bool,
    },
    ClearSelection,
    SetViewport(Viewport),
    TranslateViewport(Vec2),
    StartConnection {
        node_id: NodeId,
        handle: HandleElement,
    },
    UpdateConnection {
        pointer: Point,
    },
    EndConnection {
        target: Option<HandleHit>,
    },
    Notify(FlowEvent),
}

// ─── Store ───────────────────────────────────────────────────────────────

pub struct FlowStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    viewport: Viewport,
    internals: NodeInternals,
    connection: ConnectionDraft,
    selected_nodes: Vec<NodeId>,
    selected_edges: Vec<EdgeId>,
    container: Size,
    config: FlowConfig,
    callbacks: FlowCallbacks,
    has_initial_fit: bool,
}

impl fmt::Debug for FlowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowStore")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("viewport", &self.viewport)
            .field("internals", &self.internals.len())
            .field("connection", &self.connection)
            .field("selected_nodes", &self.selected_nodes)
            .field("selected_edges", &self.selected_edges)
            .field("container", &self.container)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl FlowStore {
    /// Seed a store. Nodes, edges and the configured default viewport are
    /// owned by the store from here on.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>, config: FlowConfig) -> Self {
        let viewport = config
            .default_viewport
            .with_zoom_clamped(config.min_zoom, config.max_zoom);
        Self {
            nodes,
            edges,
            viewport,
            internals: NodeInternals::new(),
            connection: ConnectionDraft::default(),
            selected_nodes: Vec::new(),
            selected_edges: Vec::new(),
            container: config.container,
            config,
            callbacks: FlowCallbacks::default(),
            has_initial_fit: false,
        }
    }

    pub fn with_callbacks(mut self, callbacks: FlowCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn set_callbacks(&mut self, callbacks: FlowCallbacks) {
        self.callbacks = callbacks;
    }

    // ─── Read surface ────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn internal(&self, id: NodeId) -> Option<&InternalNode> {
        self.internals.get(&id)
    }

    pub fn internals(&self) -> &NodeInternals {
        &self.internals
    }

    pub fn selected_nodes(&self) -> &[NodeId] {
        &self.selected_nodes
    }

    pub fn selected_edges(&self) -> &[EdgeId] {
        &self.selected_edges
    }

    pub fn connection(&self) -> &ConnectionDraft {
        &self.connection
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Dragging, connecting and selecting are all enabled.
    pub fn is_interactive(&self) -> bool {
        self.config.nodes_draggable && self.config.nodes_connectable && self.config.elements_selectable
    }

    // ─── Change protocol ─────────────────────────────────────────────────

    /// Fold a batch of node changes into the collection, then notify.
    pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) {
        if changes.is_empty() {
            return;
        }
        self.nodes = apply_node_changes(&changes, std::mem::take(&mut self.nodes));

        let live: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        self.internals.retain(|id, _| live.contains(id));
        self.selected_nodes.retain(|id| live.contains(id));

        // Keep the internals snapshots current for every touched node.
        for id in changes.iter().filter_map(NodeChange::id) {
            self.resync_internal(id);
        }

        if let Some(callback) = self.callbacks.on_nodes_change.as_mut() {
            callback(&changes);
        }
        self.maybe_initial_fit();
    }

    /// Fold a batch of edge changes into the collection, then notify.
    pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) {
        if changes.is_empty() {
            return;
        }
        self.edges = apply_edge_changes(&changes, std::mem::take(&mut self.edges));

        let live: HashSet<EdgeId> = self.edges.iter().map(|e| e.id).collect();
        self.selected_edges.retain(|id| live.contains(id));

        if let Some(callback) = self.callbacks.on_edges_change.as_mut() {
            callback(&changes);
        }
    }

    /// Replace the node collection wholesale (controlled mode). Silent.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        let live: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        self.internals.retain(|id, _| live.contains(id));
        self.selected_nodes.retain(|id| live.contains(id));
        let ids: Vec<NodeId> = self.internals.keys().copied().collect();
        for id in ids {
            self.resync_internal(id);
        }
        self.maybe_initial_fit();
    }

    /// Replace the edge collection wholesale (controlled mode). Silent.
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
        let live: HashSet<EdgeId> = self.edges.iter().map(|e| e.id).collect();
        self.selected_edges.retain(|id| live.contains(id));
    }

    // ─── Node actions ────────────────────────────────────────────────────

    pub fn update_node_position(&mut self, id: NodeId, position: Point, dragging: bool) {
        self.on_nodes_change(vec![NodeChange::position(id, position, dragging)]);
    }

    /// Record a node's laid-out size and refresh its internals entry.
    pub fn update_node_dimensions(&mut self, id: NodeId, size: Size) {
        self.on_nodes_change(vec![NodeChange::Dimensions {
            id,
            dimensions: size,
        }]);
        self.merge_internal(id, InternalUpdate::Measured(size));
    }

    /// Merge port layouts into the node's internals entry. Ports with a
    /// matching id are replaced in place; other ports are kept.
    pub fn update_handle_bounds(&mut self, id: NodeId, handles: Vec<HandleElement>) {
        self.merge_internal(id, InternalUpdate::Handles(handles));
    }

    pub fn add_nodes(&mut self, nodes: Vec<Node>) {
        self.on_nodes_change(nodes.into_iter().map(NodeChange::add).collect());
    }

    pub fn add_edges(&mut self, edges: Vec<Edge>) {
        self.on_edges_change(edges.into_iter().map(EdgeChange::add).collect());
    }

    /// Remove nodes and edges. Every edge touching a removed node goes too.
    pub fn delete_elements(&mut self, nodes: &[NodeId], edges: &[EdgeId]) {
        let doomed_nodes: HashSet<NodeId> = nodes
            .iter()
            .copied()
            .filter(|id| self.get_node(*id).is_some())
            .collect();

        let mut edge_removals: Vec<EdgeChange> = Vec::new();
        for edge in &self.edges {
            let cascades = doomed_nodes.contains(&edge.source) || doomed_nodes.contains(&edge.target);
            if cascades || edges.contains(&edge.id) {
                edge_removals.push(EdgeChange::Remove { id: edge.id });
            }
        }

        if !doomed_nodes.is_empty() {
            log::debug!(
                "delete {} node(s), cascading to {} edge(s)",
                doomed_nodes.len(),
                edge_removals.len()
            );
        }

        // Keep caller order for the node batch.
        let node_removals: Vec<NodeChange> = nodes
            .iter()
            .filter(|id| doomed_nodes.contains(id))
            .map(|id| NodeChange::Remove { id: *id })
            .collect();
        self.on_nodes_change(node_removals);
        self.on_edges_change(edge_removals);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node. Replace semantics deselect every other node and every
    /// edge; additive semantics keep both sets.
    pub fn select_node(&mut self, id: NodeId, additive: bool) {
        if self.get_node(id).is_none() {
            return;
        }
        let mut node_changes: Vec<NodeChange> = Vec::new();
        if additive {
            self.selected_nodes.retain(|n| *n != id);
        } else {
            for prev in self.selected_nodes.drain(..).filter(|n| *n != id) {
                node_changes.push(NodeChange::Select {
                    id: prev,
                    selected: false,
                });
            }
            let edge_changes = self.drain_edge_deselects();
            self.on_edges_change(edge_changes);
        }
        self.selected_nodes.push(id);
        node_changes.push(NodeChange::Select { id, selected: true });
        self.on_nodes_change(node_changes);
    }

    /// Select an edge. Mirror image of `select_node`.
    pub fn select_edge(&mut self, id: EdgeId, additive: bool) {
        if self.get_edge(id).is_none() {
            return;
        }
        let mut edge_changes: Vec<EdgeChange> = Vec::new();
        if additive {
            self.selected_edges.retain(|e| *e != id);
        } else {
            for prev in self.selected_edges.drain(..).filter(|e| *e != id) {
                edge_changes.push(EdgeChange::Select {
                    id: prev,
                    selected: false,
                });
            }
            let node_changes = self.drain_node_deselects();
            self.on_nodes_change(node_changes);
        }
        self.selected_edges.push(id);
        edge_changes.push(EdgeChange::Select { id, selected: true });
        self.on_edges_change(edge_changes);
    }

    /// Deselect everything, one batch per collection.
    pub fn clear_selection(&mut self) {
        let node_changes = self.drain_node_deselects();
        let edge_changes = self.drain_edge_deselects();
        self.on_nodes_change(node_changes);
        self.on_edges_change(edge_changes);
    }

    fn drain_node_deselects(&mut self) -> Vec<NodeChange> {
        self.selected_nodes
            .drain(..)
            .map(|id| NodeChange::Select {
                id,
                selected: false,
            })
            .collect()
    }

    fn drain_edge_deselects(&mut self) -> Vec<EdgeChange> {
        self.selected_edges
            .drain(..)
            .map(|id| EdgeChange::Select {
                id,
                selected: false,
            })
            .collect()
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn set_container_dimensions(&mut self, size: Size) {
        self.container = size;
        self.maybe_initial_fit();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom = (self.viewport.zoom + ZOOM_STEP).min(self.config.max_zoom);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom = (self.viewport.zoom - ZOOM_STEP).max(self.config.min_zoom);
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    /// Set the zoom, clamped to the configured limits.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.set_viewport(Viewport { zoom, ..self.viewport });
    }

    /// Set the viewport. The zoom is clamped to the configured limits.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        let (min, max) = (self.config.min_zoom, self.config.max_zoom);
        if !(min..=max).contains(&viewport.zoom) {
            log::warn!(
                "zoom {} outside [{min}, {max}]; clamping",
                viewport.zoom
            );
        }
        self.viewport = Viewport {
            zoom: clamp_zoom(viewport.zoom, min, max),
            ..viewport
        };
    }

    /// Shift the viewport translation by `delta` pixels.
    pub fn translate_viewport(&mut self, delta: Vec2) {
        self.viewport.x += delta.x;
        self.viewport.y += delta.y;
    }

    /// Put the world point `(x, y)` at the container center.
    pub fn set_center(&mut self, x: f64, y: f64, zoom: Option<f64>) {
        let zoom = zoom.unwrap_or(self.viewport.zoom);
        self.set_viewport(centered_viewport(Point::new(x, y), zoom, self.container));
    }

    /// Frame the selected node subset. Returns `false` (and changes nothing)
    /// when there is nothing to frame.
    pub fn fit_view(&mut self, options: &FitViewOptions) -> bool {
        let subset: Vec<&Node> = match &options.nodes {
            Some(ids) => self.nodes.iter().filter(|n| ids.contains(&n.id)).collect(),
            None => self
                .nodes
                .iter()
                .filter(|n| options.include_hidden_nodes || !n.hidden)
                .collect(),
        };
        if subset.is_empty() {
            return false;
        }

        let bounds = nodes_bounds(subset);
        let viewport = fit_viewport(
            bounds,
            self.container,
            options.padding,
            options.min_zoom.unwrap_or(self.config.min_zoom),
            options.max_zoom.unwrap_or(self.config.max_zoom),
        );
        log::debug!("fit view {bounds:?} -> {viewport:?}");
        self.viewport = viewport;
        true
    }

    fn maybe_initial_fit(&mut self) {
        if !self.config.fit_view_on_init || self.has_initial_fit || self.nodes.is_empty() {
            return;
        }
        let options = self.config.fit_view_options.clone();
        self.has_initial_fit = self.fit_view(&options);
    }

    // ─── Policy ──────────────────────────────────────────────────────────

    /// Toggle dragging, connecting and selecting together.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.config.nodes_draggable = interactive;
        self.config.nodes_connectable = interactive;
        self.config.elements_selectable = interactive;
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// `Idle → Drafting`. Ignored for unknown nodes.
    pub fn start_connection(&mut self, node_id: NodeId, handle: HandleElement) {
        if self.get_node(node_id).is_none() {
            return;
        }
        log::debug!("connection draft from {node_id}:{} ({:?})", handle.id, handle.kind);
        self.connection = ConnectionDraft {
            start_handle: Some(handle),
            start_node_id: Some(node_id),
            is_connecting: true,
            pointer_position: None,
        };
    }

    /// Move the draft's loose end (world coordinates).
    pub fn update_connection(&mut self, pointer: Point) {
        if self.connection.is_connecting {
            self.connection.pointer_position = Some(pointer);
        }
    }

    /// End the draft, committing when `target` is a port of the opposite
    /// kind. The draft is cleared either way.
    pub fn end_connection(&mut self, target: Option<HandleHit>) -> ConnectionOutcome {
        let draft = std::mem::take(&mut self.connection);
        let (Some(start), Some(start_node)) = (draft.start_handle, draft.start_node_id) else {
            return ConnectionOutcome::Abandoned;
        };
        let Some(target) = target.filter(|t| t.handle.kind != start.kind) else {
            log::debug!("connection draft from {start_node} abandoned");
            return ConnectionOutcome::Abandoned;
        };

        let connection = match start.kind {
            HandleType::Source => Connection {
                source: start_node,
                source_handle: Some(start.id),
                target: target.node_id,
                target_handle: Some(target.handle.id),
            },
            HandleType::Target => Connection {
                source: target.node_id,
                source_handle: Some(target.handle.id),
                target: start_node,
                target_handle: Some(start.id),
            },
        };
        log::debug!("connection committed {} -> {}", connection.source, connection.target);
        self.connect(connection);
        ConnectionOutcome::Committed(connection)
    }

    /// Hand a connection to `on_connect`, or append the default edge.
    pub fn connect(&mut self, connection: Connection) {
        let edge = match self.callbacks.on_connect.as_mut() {
            Some(callback) => callback(&connection),
            None => {
                let mut edge = Edge::from_connection(&connection);
                self.config.default_edge_options.apply(&mut edge);
                Some(edge)
            }
        };
        if let Some(edge) = edge {
            self.on_edges_change(vec![EdgeChange::add(edge)]);
        }
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Fire the callback for `event`. Events naming an unknown element are
    /// dropped.
    pub fn notify(&mut self, event: FlowEvent) {
        let Self {
            nodes,
            edges,
            callbacks,
            ..
        } = self;
        let nodes: &[Node] = nodes;
        let edges: &[Edge] = edges;
        let node = |id: NodeId| nodes.iter().find(|n| n.id == id);
        match event {
            FlowEvent::NodeDragStart { id } => {
                fire(callbacks.on_node_drag_start.as_mut(), node(id))
            }
            FlowEvent::NodeDrag { id } => fire(callbacks.on_node_drag.as_mut(), node(id)),
            FlowEvent::NodeDragStop { id } => {
                fire(callbacks.on_node_drag_stop.as_mut(), node(id))
            }
            FlowEvent::NodeClick { id } => fire(callbacks.on_node_click.as_mut(), node(id)),
            FlowEvent::EdgeClick { id } => fire(
                callbacks.on_edge_click.as_mut(),
                edges.iter().find(|e| e.id == id),
            ),
            FlowEvent::PaneClick { position } => {
                if let Some(callback) = callbacks.on_pane_click.as_mut() {
                    callback(position);
                }
            }
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Apply one coordinator command. Returns the outcome for
    /// `EndConnection`.
    pub fn apply_command(&mut self, command: StoreCommand) -> Option<ConnectionOutcome> {
        match command {
            StoreCommand::UpdateNodePosition {
                id,
                position,
                dragging,
            } => self.update_node_position(id, position, dragging),
            StoreCommand::SelectNode { id, additive } => self.select_node(id, additive),
            StoreCommand::SelectEdge { id, additive } => self.select_edge(id, additive),
            StoreCommand::ClearSelection => self.clear_selection(),
            StoreCommand::SetViewport(viewport) => self.set_viewport(viewport),
            StoreCommand::TranslateViewport(delta) => self.translate_viewport(delta),
            StoreCommand::StartConnection { node_id, handle } => {
                self.start_connection(node_id, handle)
            }
            StoreCommand::UpdateConnection { pointer } => self.update_connection(pointer),
            StoreCommand::EndConnection { target } => return Some(self.end_connection(target)),
            StoreCommand::Notify(event) => self.notify(event),
        }
        None
    }

    /// Apply commands in order, collecting connection outcomes.
    pub fn apply_commands(
        &mut self,
        commands: impl IntoIterator<Item = StoreCommand>,
    ) -> SmallVec<[ConnectionOutcome; 1]> {
        commands
            .into_iter()
            .filter_map(|c| self.apply_command(c))
            .collect()
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn merge_internal(&mut self, id: NodeId, update: InternalUpdate) {
        let Some(node) = self.nodes.iter().find(|n| n.id == id) else {
            return;
        };
        let merged = InternalNode::merge(self.internals.get(&id), node, update);
        self.internals.insert(id, merged);
    }

    /// Refresh an existing entry from the node's current state. Never
    /// creates one.
    fn resync_internal(&mut self, id: NodeId) {
        if self.internals.contains_key(&id) {
            self.merge_internal(id, InternalUpdate::Resync);
        }
    }
}

fn fire<T>(callback: Option<&mut Box<dyn FnMut(&T)>>, value: Option<&T>) {
    if let (Some(callback), Some(value)) = (callback, value) {
        callback(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{HandleId, Side};
    use pretty_assertions::assert_eq;

    fn store() -> FlowStore {
        let nodes = vec![
            Node::new(NodeId::intern("a"), Point::new(0.0, 0.0)),
            Node::new(NodeId::intern("b"), Point::new(300.0, 0.0)),
        ];
        let edges = vec![Edge::new(
            EdgeId::intern("ab"),
            NodeId::intern("a"),
            NodeId::intern("b"),
        )];
        FlowStore::new(nodes, edges, FlowConfig::default())
    }

    #[test]
    fn position_update_resyncs_existing_internal() {
        let mut s = store();
        let a = NodeId::intern("a");
        s.update_node_dimensions(a, Size::new(100.0, 40.0));
        s.update_node_position(a, Point::new(10.0, 20.0), true);

        let internal = s.internal(a).unwrap();
        assert_eq!(internal.position_absolute, Point::new(10.0, 20.0));
        assert!(internal.node.dragging);
        assert!(internal.is_measured());
    }

    #[test]
    fn position_update_does_not_create_internal() {
        let mut s = store();
        s.update_node_position(NodeId::intern("a"), Point::new(1.0, 1.0), false);
        assert!(s.internal(NodeId::intern("a")).is_none());
    }

    #[test]
    fn dimensions_for_unknown_node_are_ignored() {
        let mut s = store();
        s.update_node_dimensions(NodeId::intern("ghost"), Size::new(10.0, 10.0));
        assert!(s.internals().is_empty());
    }

    #[test]
    fn select_replace_then_additive() {
        let mut s = store();
        let (a, b) = (NodeId::intern("a"), NodeId::intern("b"));
        s.select_edge(EdgeId::intern("ab"), false);
        s.select_node(a, false);
        assert!(s.selected_edges().is_empty());
        assert!(!s.edges()[0].selected);

        s.select_node(b, true);
        assert_eq!(s.selected_nodes(), &[a, b]);

        s.select_node(b, false);
        assert_eq!(s.selected_nodes(), &[b]);
        assert!(!s.get_node(a).unwrap().selected);
    }

    #[test]
    fn end_without_draft_is_abandoned() {
        let mut s = store();
        assert_eq!(s.end_connection(None), ConnectionOutcome::Abandoned);
    }

    #[test]
    fn same_kind_target_abandons() {
        let mut s = store();
        let out = HandleElement::new(HandleId::intern("out"), HandleType::Source, Side::Bottom);
        s.start_connection(NodeId::intern("a"), out);
        let outcome = s.end_connection(Some(HandleHit {
            node_id: NodeId::intern("b"),
            handle: out,
        }));
        assert_eq!(outcome, ConnectionOutcome::Abandoned);
        assert_eq!(s.connection(), &ConnectionDraft::default());
        assert_eq!(s.edges().len(), 1);
    }

    #[test]
    fn notify_passes_the_current_node() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut s = store().with_callbacks(FlowCallbacks {
            on_node_click: Some(Box::new(move |n: &Node| sink.borrow_mut().push(n.position))),
            ..FlowCallbacks::default()
        });
        let a = NodeId::intern("a");
        s.update_node_position(a, Point::new(7.0, 8.0), false);
        s.notify(FlowEvent::NodeClick { id: a });
        s.notify(FlowEvent::NodeClick {
            id: NodeId::intern("ghost"),
        });
        assert_eq!(*seen.borrow(), vec![Point::new(7.0, 8.0)]);
    }

    #[test]
    fn initial_viewport_is_clamped() {
        let config = FlowConfig {
            default_viewport: Viewport::new(0.0, 0.0, 9.0),
            ..FlowConfig::default()
        };
        let s = FlowStore::new(Vec::new(), Vec::new(), config);
        assert_eq!(s.zoom(), 2.0);
    }
}
