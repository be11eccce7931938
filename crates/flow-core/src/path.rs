//! Edge path generators.
//!
//! Each generator takes the two anchors and the sides they leave from and
//! returns a `kurbo::BezPath`. Renderers either walk the path elements or
//! ask for the SVG `d` string.

use crate::geometry::{edge_center, handle_position};
use crate::id::{EdgeId, NodeId};
use crate::model::{Edge, EdgeType, HandleType, Node, NodeInternals, Side};
use kurbo::{BezPath, Point, Vec2};
use serde::Serialize;

/// Minimum length of a bezier control arm.
pub const MIN_CONTROL_DISTANCE: f64 = 50.0;
pub const DEFAULT_CURVATURE: f64 = 0.25;
/// Distance step and smoothstep routes keep from each anchor before bending.
pub const DEFAULT_STEP_OFFSET: f64 = 20.0;

/// Anchors and exit sides of one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePathParams {
    pub source: Point,
    pub source_side: Side,
    pub target: Point,
    pub target_side: Side,
}

impl EdgePathParams {
    /// Defaults sides to bottom → top.
    pub fn new(source: Point, target: Point) -> Self {
        Self {
            source,
            source_side: Side::Bottom,
            target,
            target_side: Side::Top,
        }
    }

    pub fn with_sides(mut self, source_side: Side, target_side: Side) -> Self {
        self.source_side = source_side;
        self.target_side = target_side;
        self
    }
}

/// A generated path plus the label anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    pub path: BezPath,
    /// Midpoint between the anchors (label position).
    pub center: Point,
    /// Half the anchor delta on each axis.
    pub offset: Vec2,
}

impl EdgePath {
    fn new(path: BezPath, params: &EdgePathParams) -> Self {
        let (center, offset) = edge_center(params.source, params.target);
        Self {
            path,
            center,
            offset,
        }
    }

    /// SVG path data.
    pub fn svg(&self) -> String {
        self.path.to_svg()
    }
}

/// Generator signature shared by every edge type.
pub type PathFn = fn(&EdgePathParams) -> EdgePath;

// ─── Generators ──────────────────────────────────────────────────────────

pub fn straight_path(params: &EdgePathParams) -> EdgePath {
    let mut path = BezPath::new();
    path.move_to(params.source);
    path.line_to(params.target);
    EdgePath::new(path, params)
}

pub fn bezier_path(params: &EdgePathParams) -> EdgePath {
    bezier_path_with(params, DEFAULT_CURVATURE)
}

/// Cubic curve whose control arms leave each anchor along its side.
pub fn bezier_path_with(params: &EdgePathParams, curvature: f64) -> EdgePath {
    let distance = Vec2::new(
        (params.target.x - params.source.x).abs(),
        (params.target.y - params.source.y).abs(),
    );
    let c1 = control_point(params.source, params.source_side, curvature, distance);
    let c2 = control_point(params.target, params.target_side, curvature, distance);

    let mut path = BezPath::new();
    path.move_to(params.source);
    path.curve_to(c1, c2, params.target);
    EdgePath::new(path, params)
}

/// Control point `anchor + normal(side) * max(max(dx, dy) * curvature, 50)`.
pub fn control_point(anchor: Point, side: Side, curvature: f64, distance: Vec2) -> Point {
    let arm = (distance.x.max(distance.y) * curvature).max(MIN_CONTROL_DISTANCE);
    anchor + side.normal() * arm
}

pub fn step_path(params: &EdgePathParams) -> EdgePath {
    step_path_with(params, DEFAULT_STEP_OFFSET)
}

/// Orthogonal route with a single bend line through the edge center.
pub fn step_path_with(params: &EdgePathParams, offset: f64) -> EdgePath {
    let (s, t) = (params.source, params.target);
    let (center, _) = edge_center(s, t);

    let mut path = BezPath::new();
    path.move_to(s);
    if params.source_side.is_horizontal() {
        let first_x = first_bend(s.x, center.x, offset, params.source_side == Side::Right);
        path.line_to((first_x, s.y));
        path.line_to((first_x, t.y));
    } else {
        let first_y = first_bend(s.y, center.y, offset, params.source_side == Side::Bottom);
        path.line_to((s.x, first_y));
        path.line_to((t.x, first_y));
    }
    path.line_to(t);
    EdgePath::new(path, params)
}

pub fn smooth_step_path(params: &EdgePathParams) -> EdgePath {
    smooth_step_path_with(params, DEFAULT_STEP_OFFSET)
}

/// Step topology with the corners replaced by quadratic curves through the
/// center.
pub fn smooth_step_path_with(params: &EdgePathParams, offset: f64) -> EdgePath {
    let (s, t) = (params.source, params.target);
    let (c, _) = edge_center(s, t);

    let mut path = BezPath::new();
    path.move_to(s);
    if params.source_side.is_horizontal() {
        let first_x = first_bend(s.x, c.x, offset, params.source_side == Side::Right);
        let last_x = last_bend(t.x, c.x, offset, params.target_side == Side::Left);
        path.line_to((first_x, s.y));
        path.quad_to(Point::new(c.x, s.y), c);
        path.quad_to((c.x, t.y), (last_x, t.y));
    } else {
        let first_y = first_bend(s.y, c.y, offset, params.source_side == Side::Bottom);
        let last_y = last_bend(t.y, c.y, offset, params.target_side == Side::Top);
        path.line_to((s.x, first_y));
        path.quad_to(Point::new(s.x, c.y), c);
        path.quad_to((t.x, c.y), (t.x, last_y));
    }
    path.line_to(t);
    EdgePath::new(path, params)
}

/// Bend coordinate after leaving the source: at least `offset` past the
/// anchor, never folding back over the center.
fn first_bend(anchor: f64, center: f64, offset: f64, forward: bool) -> f64 {
    if forward {
        (anchor + offset).max(center)
    } else {
        (anchor - offset).min(center)
    }
}

/// Bend coordinate before entering the target. `before` is true when the
/// target side faces the negative axis (top or left).
fn last_bend(anchor: f64, center: f64, offset: f64, before: bool) -> f64 {
    if before {
        (anchor - offset).min(center)
    } else {
        (anchor + offset).max(center)
    }
}

// ─── Registry ────────────────────────────────────────────────────────────

impl EdgeType {
    /// The generator for this edge type. `Default` routes as bezier.
    pub fn path_fn(self) -> PathFn {
        match self {
            EdgeType::Straight => straight_path,
            EdgeType::Step => step_path,
            EdgeType::SmoothStep => smooth_step_path,
            EdgeType::Default | EdgeType::Bezier => bezier_path,
        }
    }
}

pub fn edge_path(edge_type: EdgeType, params: &EdgePathParams) -> EdgePath {
    (edge_type.path_fn())(params)
}

// ─── Edge resolution ─────────────────────────────────────────────────────

/// Everything a renderer needs to draw one edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeGeometry {
    pub id: EdgeId,
    pub source: Point,
    pub source_side: Side,
    pub target: Point,
    pub target_side: Side,
    pub center: Point,
    /// SVG path data.
    pub path: String,
}

/// Resolve anchors and path for `edge` against the current nodes and
/// internals. `None` for hidden edges and edges with a missing endpoint.
pub fn resolve_edge_geometry(
    edge: &Edge,
    nodes: &[Node],
    internals: &NodeInternals,
) -> Option<EdgeGeometry> {
    if edge.hidden {
        return None;
    }
    let find = |id: NodeId| nodes.iter().find(|n| n.id == id);
    let source_node = find(edge.source)?;
    let target_node = find(edge.target)?;

    let source_side = source_node.source_side();
    let target_side = target_node.target_side();

    let source_handle = internals
        .get(&edge.source)
        .and_then(|i| i.handle_bounds.find(HandleType::Source, edge.source_handle));
    let target_handle = internals
        .get(&edge.target)
        .and_then(|i| i.handle_bounds.find(HandleType::Target, edge.target_handle));

    let params = EdgePathParams {
        source: handle_position(source_side, source_node.rect(), source_handle),
        source_side,
        target: handle_position(target_side, target_node.rect(), target_handle),
        target_side,
    };
    let path = edge_path(edge.edge_type, &params);

    Some(EdgeGeometry {
        id: edge.id,
        source: params.source,
        source_side,
        target: params.target,
        target_side,
        center: path.center,
        path: path.svg(),
    })
}
