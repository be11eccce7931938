//! Canvas configuration: interaction policy, zoom limits and initial state.
//!
//! Every field has a default, so hosts can pass a partial JSON object.

use flow_core::{Edge, EdgeMarker, EdgeType, NodeId, Size, Viewport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Zoom step applied by zoom-in / zoom-out.
pub const ZOOM_STEP: f64 = 0.2;

/// Policy flags and seed values for one canvas instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub nodes_draggable: bool,
    pub nodes_connectable: bool,
    pub elements_selectable: bool,
    pub pan_on_drag: bool,
    pub zoom_on_pinch: bool,
    pub snap_to_grid: bool,
    pub snap_grid: [f64; 2],
    pub default_viewport: Viewport,
    /// Container size assumed until the host reports one.
    pub container: Size,
    /// Frame all nodes once, as soon as there are nodes to frame.
    pub fit_view_on_init: bool,
    pub fit_view_options: FitViewOptions,
    pub default_edge_options: DefaultEdgeOptions,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 2.0,
            nodes_draggable: true,
            nodes_connectable: true,
            elements_selectable: true,
            pan_on_drag: true,
            zoom_on_pinch: true,
            snap_to_grid: false,
            snap_grid: [15.0, 15.0],
            default_viewport: Viewport::default(),
            container: Size::new(800.0, 600.0),
            fit_view_on_init: false,
            fit_view_options: FitViewOptions::default(),
            default_edge_options: DefaultEdgeOptions::default(),
        }
    }
}

impl FlowConfig {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid flow config: {e}"))
    }
}

/// Options for framing nodes in the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitViewOptions {
    /// Fractional margin around the framed box.
    pub padding: f64,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    /// Frame only these nodes.
    pub nodes: Option<Vec<NodeId>>,
    /// When framing all nodes, also count hidden ones. On by default.
    pub include_hidden_nodes: bool,
}

impl Default for FitViewOptions {
    fn default() -> Self {
        Self {
            padding: flow_core::geometry::DEFAULT_FIT_PADDING,
            min_zoom: None,
            max_zoom: None,
            nodes: None,
            include_hidden_nodes: true,
        }
    }
}

/// Edge fields applied to edges the store creates from a connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultEdgeOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<EdgeMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
}

impl DefaultEdgeOptions {
    /// Overwrite the edge's fields with every option that is set.
    pub fn apply(&self, edge: &mut Edge) {
        if let Some(edge_type) = self.edge_type {
            edge.edge_type = edge_type;
        }
        if let Some(animated) = self.animated {
            edge.animated = animated;
        }
        if let Some(hidden) = self.hidden {
            edge.hidden = hidden;
        }
        if let Some(marker) = &self.marker_end {
            edge.marker_end = Some(marker.clone());
        }
        if let Some(style) = &self.style {
            edge.style = style.clone();
        }
        if let Some(z_index) = self.z_index {
            edge.z_index = z_index;
        }
    }
}
