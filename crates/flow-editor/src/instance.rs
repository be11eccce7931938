//! Imperative handle over a store, and the `{nodes, edges, viewport}`
//! snapshot it exports.

use crate::config::FitViewOptions;
use crate::store::FlowStore;
use flow_core::{Edge, EdgeId, Node, NodeId, Viewport};
use serde::{Deserialize, Serialize};

/// The exported shape of a canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
}

impl FlowSnapshot {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid flow snapshot: {e}"))
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("failed to encode snapshot: {e}"))
    }
}

/// Imperative control for code outside the canvas (toolbars, menus).
pub struct FlowInstance<'a> {
    store: &'a mut FlowStore,
}

impl<'a> FlowInstance<'a> {
    pub fn new(store: &'a mut FlowStore) -> Self {
        Self { store }
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    pub fn get_nodes(&self) -> Vec<Node> {
        self.store.nodes().to_vec()
    }

    pub fn get_node(&self, id: NodeId) -> Option<Node> {
        self.store.get_node(id).cloned()
    }

    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.store.set_nodes(nodes);
    }

    pub fn add_nodes(&mut self, nodes: Vec<Node>) {
        self.store.add_nodes(nodes);
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    pub fn get_edges(&self) -> Vec<Edge> {
        self.store.edges().to_vec()
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<Edge> {
        self.store.get_edge(id).cloned()
    }

    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.store.set_edges(edges);
    }

    pub fn add_edges(&mut self, edges: Vec<Edge>) {
        self.store.add_edges(edges);
    }

    pub fn delete_elements(&mut self, nodes: &[NodeId], edges: &[EdgeId]) {
        self.store.delete_elements(nodes, edges);
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.store.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.store.zoom_out();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.store.set_zoom(zoom);
    }

    pub fn get_zoom(&self) -> f64 {
        self.store.zoom()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.store.set_viewport(viewport);
    }

    pub fn get_viewport(&self) -> Viewport {
        *self.store.viewport()
    }

    /// Returns `false` when there were no nodes to frame.
    pub fn fit_view(&mut self, options: &FitViewOptions) -> bool {
        self.store.fit_view(options)
    }

    pub fn set_center(&mut self, x: f64, y: f64, zoom: Option<f64>) {
        self.store.set_center(x, y, zoom);
    }

    pub fn to_object(&self) -> FlowSnapshot {
        FlowSnapshot {
            nodes: self.get_nodes(),
            edges: self.get_edges(),
            viewport: self.get_viewport(),
        }
    }
}
