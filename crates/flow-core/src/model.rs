//! Core data model for a node-flow canvas.
//!
//! Nodes are positioned, sized vertices carrying an opaque payload; edges are
//! directed connections between nodes, optionally pinned to specific ports
//! (handles). Everything here is plain data: the store owns the collections,
//! the geometry engine reads them.
//!
//! All coordinates are world (graph) coordinates unless a function says
//! otherwise. The `Viewport` maps world to container pixels as
//! `world * zoom + translation`.

use crate::id::{EdgeId, HandleId, NodeId};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Width used for nodes that have neither an explicit nor a measured width.
pub const FALLBACK_NODE_WIDTH: f64 = 150.0;
/// Height used for nodes that have neither an explicit nor a measured height.
pub const FALLBACK_NODE_HEIGHT: f64 = 50.0;

// ─── Sides & Ports ───────────────────────────────────────────────────────

/// The side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Fractional offset of the side's midpoint within the node rect.
    pub fn offset(self) -> Vec2 {
        match self {
            Side::Top => Vec2::new(0.5, 0.0),
            Side::Right => Vec2::new(1.0, 0.5),
            Side::Bottom => Vec2::new(0.5, 1.0),
            Side::Left => Vec2::new(0.0, 0.5),
        }
    }

    /// Unit vector pointing away from the node through this side.
    pub fn normal(self) -> Vec2 {
        match self {
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Right => Vec2::new(1.0, 0.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
            Side::Left => Vec2::new(-1.0, 0.0),
        }
    }

    /// `true` for the left and right sides.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Whether a port emits or receives connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleType {
    Source,
    Target,
}

impl HandleType {
    pub fn opposite(self) -> Self {
        match self {
            HandleType::Source => HandleType::Target,
            HandleType::Target => HandleType::Source,
        }
    }

    /// Id given to a port declared without an explicit one.
    pub fn default_id(self) -> HandleId {
        match self {
            HandleType::Source => HandleId::intern("source"),
            HandleType::Target => HandleId::intern("target"),
        }
    }
}

/// A port's layout rectangle, relative to its owning node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleElement {
    pub id: HandleId,
    #[serde(rename = "type")]
    pub kind: HandleType,
    pub position: Side,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl HandleElement {
    /// A port with an empty layout, before the presentation layer measured it.
    pub fn new(id: HandleId, kind: HandleType, position: Side) -> Self {
        Self {
            id,
            kind,
            position,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn with_layout(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    /// Layout rect relative to the node.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Per-kind port layouts discovered for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandleBounds {
    #[serde(default)]
    pub source: SmallVec<[HandleElement; 2]>,
    #[serde(default)]
    pub target: SmallVec<[HandleElement; 2]>,
}

impl HandleBounds {
    pub fn of_kind(&self, kind: HandleType) -> &[HandleElement] {
        match kind {
            HandleType::Source => &self.source,
            HandleType::Target => &self.target,
        }
    }

    /// Merge one port layout: replaces the entry with the same id in place,
    /// or appends it when the port is new. Other ports are preserved.
    pub fn merge(&mut self, handle: HandleElement) {
        let list = match handle.kind {
            HandleType::Source => &mut self.source,
            HandleType::Target => &mut self.target,
        };
        match list.iter_mut().find(|h| h.id == handle.id) {
            Some(existing) => *existing = handle,
            None => list.push(handle),
        }
    }

    /// Look up a port by id, or the first declared port of that kind when
    /// `id` is `None`.
    pub fn find(&self, kind: HandleType, id: Option<HandleId>) -> Option<&HandleElement> {
        let list = self.of_kind(kind);
        match id {
            Some(id) => list.iter().find(|h| h.id == id),
            None => list.first(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.target.is_empty()
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Width/height pair where either axis may still be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Dimensions {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Both axes known.
    pub fn is_complete(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}

impl From<Size> for Dimensions {
    fn from(size: Size) -> Self {
        Self {
            width: Some(size.width),
            height: Some(size.height),
        }
    }
}

/// Built-in node variants. Unknown tags decode to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Default,
    Input,
    Output,
    Custom,
}

impl NodeType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "input" => NodeType::Input,
            "output" => NodeType::Output,
            "custom" => NodeType::Custom,
            _ => NodeType::Default,
        }
    }

    /// Port kinds the built-in variant declares.
    pub fn handles(self) -> &'static [HandleType] {
        match self {
            NodeType::Input => &[HandleType::Source],
            NodeType::Output => &[HandleType::Target],
            NodeType::Default | NodeType::Custom => &[HandleType::Target, HandleType::Source],
        }
    }

    /// Input nodes only emit, output nodes only receive.
    pub fn declares(self, kind: HandleType) -> bool {
        !matches!(
            (self, kind),
            (NodeType::Input, HandleType::Target) | (NodeType::Output, HandleType::Source)
        )
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A positioned graph vertex with an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    /// Top-left corner in world coordinates.
    pub position: Point,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub data: Value,
    /// Authoritative width; wins over `measured` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Size observed from layout.
    #[serde(default, skip_serializing_if = "Dimensions::is_empty")]
    pub measured: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_position: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<Side>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub dragging: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectable: Option<bool>,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub hidden: bool,
}

impl Node {
    pub fn new(id: NodeId, position: Point) -> Self {
        Self {
            id,
            position,
            node_type: NodeType::Default,
            data: Value::Null,
            width: None,
            height: None,
            measured: Dimensions::default(),
            source_position: None,
            target_position: None,
            selected: false,
            dragging: false,
            draggable: None,
            selectable: None,
            connectable: None,
            z_index: 0,
            hidden: false,
        }
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Effective size: explicit, then measured, then the 150×50 placeholder.
    pub fn size(&self) -> Size {
        Size::new(
            self.width
                .or(self.measured.width)
                .unwrap_or(FALLBACK_NODE_WIDTH),
            self.height
                .or(self.measured.height)
                .unwrap_or(FALLBACK_NODE_HEIGHT),
        )
    }

    /// World-space rect using the effective size.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    /// Side outgoing edges leave from (default bottom).
    pub fn source_side(&self) -> Side {
        self.source_position.unwrap_or(Side::Bottom)
    }

    /// Side incoming edges arrive at (default top).
    pub fn target_side(&self) -> Side {
        self.target_position.unwrap_or(Side::Top)
    }

    pub fn side_for(&self, kind: HandleType) -> Side {
        match kind {
            HandleType::Source => self.source_side(),
            HandleType::Target => self.target_side(),
        }
    }

    pub fn is_draggable(&self, global: bool) -> bool {
        self.draggable.unwrap_or(global)
    }

    pub fn is_selectable(&self, global: bool) -> bool {
        self.selectable.unwrap_or(global)
    }

    pub fn is_connectable(&self, global: bool) -> bool {
        self.connectable.unwrap_or(global)
    }
}

/// A node augmented with geometry discovered while rendering.
///
/// Owned exclusively by the store's internals table; entries are produced
/// only through [`InternalNode::merge`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalNode {
    #[serde(flatten)]
    pub node: Node,
    /// World position. Equals `position` while nodes are not nested.
    pub position_absolute: Point,
    pub handle_bounds: HandleBounds,
}

/// The store-owned internals table.
pub type NodeInternals = HashMap<NodeId, InternalNode>;

/// A partial update to an internals entry.
#[derive(Debug, Clone, PartialEq)]
pub enum InternalUpdate {
    /// The node reported its laid-out size.
    Measured(Size),
    /// One or more ports reported their layout.
    Handles(Vec<HandleElement>),
    /// Refresh the node snapshot (position changed, flags changed).
    Resync,
}

impl InternalNode {
    /// Produce the new entry from the existing one (if any), the node's
    /// current state, and a partial update.
    pub fn merge(existing: Option<&InternalNode>, node: &Node, update: InternalUpdate) -> Self {
        let mut merged = InternalNode {
            node: node.clone(),
            position_absolute: node.position,
            handle_bounds: existing
                .map(|e| e.handle_bounds.clone())
                .unwrap_or_default(),
        };

        // A measurement recorded only on the internals entry survives resyncs.
        if let Some(prev) = existing
            && merged.node.measured.is_empty()
        {
            merged.node.measured = prev.node.measured;
        }

        match update {
            InternalUpdate::Measured(size) => merged.node.measured = Dimensions::from(size),
            InternalUpdate::Handles(handles) => {
                for handle in handles {
                    merged.handle_bounds.merge(handle);
                }
            }
            InternalUpdate::Resync => {}
        }
        merged
    }

    pub fn is_measured(&self) -> bool {
        self.node.measured.is_complete()
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Edge routing styles. Unknown tags decode to `Default` (bezier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    #[default]
    Default,
    Straight,
    Step,
    SmoothStep,
    Bezier,
}

impl EdgeType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "straight" => EdgeType::Straight,
            "step" => EdgeType::Step,
            "smoothstep" => EdgeType::SmoothStep,
            "bezier" => EdgeType::Bezier,
            _ => EdgeType::Default,
        }
    }
}

impl<'de> Deserialize<'de> for EdgeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
    Arrow,
    ArrowClosed,
}

/// Arrow head drawn at one end of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMarker {
    #[serde(rename = "type")]
    pub kind: MarkerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A directed connection between two nodes.
///
/// `source`/`target` need not exist: dangling edges stay in the data set but
/// are skipped by rendering consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// `None` means the first declared source port of the source node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<HandleId>,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<EdgeMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<EdgeMarker>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub style: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default)]
    pub z_index: i32,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            source_handle: None,
            target_handle: None,
            edge_type: EdgeType::Default,
            animated: false,
            selected: false,
            hidden: false,
            label: None,
            marker_start: None,
            marker_end: None,
            style: Value::Null,
            data: Value::Null,
            z_index: 0,
        }
    }

    /// The edge a committed connection produces by default (`e<source>-<target>`).
    pub fn from_connection(connection: &Connection) -> Self {
        let mut edge = Self::new(
            EdgeId::for_connection(connection.source, connection.target),
            connection.source,
            connection.target,
        );
        edge.source_handle = connection.source_handle;
        edge.target_handle = connection.target_handle;
        edge
    }

    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn with_handles(mut self, source: Option<HandleId>, target: Option<HandleId>) -> Self {
        self.source_handle = source;
        self.target_handle = target;
        self
    }

    /// Whether the edge starts or ends at the given node.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// A resolved source→target port pair, produced by a committed connection draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    #[serde(default)]
    pub source_handle: Option<HandleId>,
    pub target: NodeId,
    #[serde(default)]
    pub target_handle: Option<HandleId>,
}

impl From<&Edge> for Connection {
    fn from(edge: &Edge) -> Self {
        Self {
            source: edge.source,
            source_handle: edge.source_handle,
            target: edge.target,
            target_handle: edge.target_handle,
        }
    }
}

// ─── Viewport ────────────────────────────────────────────────────────────

/// World-to-container transform: translation in pixels plus uniform zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub const fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// World point → container pixels.
    pub fn project(&self, world: Point) -> Point {
        Point::new(world.x * self.zoom + self.x, world.y * self.zoom + self.y)
    }

    /// Container pixels → world point.
    pub fn unproject(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    /// World rect → container rect.
    pub fn project_rect(&self, world: Rect) -> Rect {
        Rect::from_points(self.project(world.origin()), self.project(Point::new(world.x1, world.y1)))
    }

    /// The part of the world currently visible in a container of `size`.
    pub fn visible_world_rect(&self, container: Size) -> Rect {
        Rect::from_origin_size(
            Point::new(-self.x / self.zoom, -self.y / self.zoom),
            Size::new(container.width / self.zoom, container.height / self.zoom),
        )
    }

    pub fn with_zoom_clamped(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.zoom = crate::geometry::clamp_zoom(self.zoom, min_zoom, max_zoom);
        self
    }
}
