//! Pure geometry over the data model: anchors, bounds, visibility, snapping
//! and viewport framing.
//!
//! Every function here is total over finite inputs. Zero-size nodes and
//! coincident endpoints produce degenerate but well-defined results.

use crate::model::{HandleElement, Node, Side, Viewport};
use kurbo::{Point, Rect, Size, Vec2};

/// Fractional margin used by fit-view when no padding is given.
pub const DEFAULT_FIT_PADDING: f64 = 0.1;

/// World-space margin around the node bounds shown by the minimap.
pub const MINIMAP_PADDING: f64 = 50.0;

/// World box the minimap frames when there are no nodes.
pub const MINIMAP_EMPTY_EXTENT: f64 = 500.0;

// ─── Anchors ─────────────────────────────────────────────────────────────

/// Anchor point of a port on `side` of `node_rect`.
///
/// With a known handle layout the anchor follows the handle's center along
/// the axis the side runs on; the other axis stays on the node's edge.
/// Without one, the anchor is the side midpoint.
pub fn handle_position(side: Side, node_rect: Rect, handle: Option<&HandleElement>) -> Point {
    let offset = side.offset();
    let edge_point = Point::new(
        node_rect.x0 + node_rect.width() * offset.x,
        node_rect.y0 + node_rect.height() * offset.y,
    );
    match handle {
        Some(h) if side.is_horizontal() => {
            Point::new(edge_point.x, node_rect.y0 + h.y + h.height / 2.0)
        }
        Some(h) => Point::new(node_rect.x0 + h.x + h.width / 2.0, edge_point.y),
        None => edge_point,
    }
}

/// Midpoint between two anchors plus the half-deltas on each axis.
///
/// The center is measured back from the target so callers can reuse the
/// returned offsets for curvature.
pub fn edge_center(source: Point, target: Point) -> (Point, Vec2) {
    let x_offset = (target.x - source.x).abs() / 2.0;
    let center_x = if target.x < source.x {
        target.x + x_offset
    } else {
        target.x - x_offset
    };

    let y_offset = (target.y - source.y).abs() / 2.0;
    let center_y = if target.y < source.y {
        target.y + y_offset
    } else {
        target.y - y_offset
    };

    (Point::new(center_x, center_y), Vec2::new(x_offset, y_offset))
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned box covering all nodes. Empty input yields `Rect::ZERO`.
pub fn nodes_bounds<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Rect {
    nodes
        .into_iter()
        .map(Node::rect)
        .reduce(|acc, r| acc.union(r))
        .unwrap_or(Rect::ZERO)
}

// ─── Visibility ──────────────────────────────────────────────────────────

/// Whether the box spanned by an edge's anchors touches the container.
pub fn is_edge_visible(source: Point, target: Point, viewport: &Viewport, container: Size) -> bool {
    let span = viewport.project_rect(Rect::from_points(source, target));
    touches_container(span, container)
}

/// Whether a node's rect touches the container under `viewport`.
pub fn is_node_visible(node: &Node, viewport: &Viewport, container: Size) -> bool {
    touches_container(viewport.project_rect(node.rect()), container)
}

fn touches_container(r: Rect, container: Size) -> bool {
    !(r.x1 < 0.0 || r.x0 > container.width || r.y1 < 0.0 || r.y0 > container.height)
}

// ─── Snapping ────────────────────────────────────────────────────────────

/// Round each axis to the nearest multiple of its grid spacing.
/// An axis with a zero (or non-finite) spacing is left alone.
pub fn snap_position(position: Point, grid: [f64; 2]) -> Point {
    Point::new(snap_axis(position.x, grid[0]), snap_axis(position.y, grid[1]))
}

fn snap_axis(value: f64, spacing: f64) -> f64 {
    if spacing == 0.0 || !spacing.is_finite() {
        return value;
    }
    (value / spacing).round() * spacing
}

// ─── Viewport framing ────────────────────────────────────────────────────

/// Clamp without panicking on an inverted range or NaN.
pub fn clamp_zoom(zoom: f64, min_zoom: f64, max_zoom: f64) -> f64 {
    zoom.max(min_zoom).min(max_zoom)
}

/// Viewport that frames `bounds` inside `container` with a fractional margin.
pub fn fit_viewport(
    bounds: Rect,
    container: Size,
    padding: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> Viewport {
    let x_zoom = container.width / (bounds.width() * (1.0 + 2.0 * padding));
    let y_zoom = container.height / (bounds.height() * (1.0 + 2.0 * padding));
    let zoom = clamp_zoom(x_zoom.min(y_zoom), min_zoom, max_zoom);
    centered_viewport(bounds.center(), zoom, container)
}

/// Viewport at `zoom` that puts the world point `center` in the middle of
/// the container.
pub fn centered_viewport(center: Point, zoom: f64, container: Size) -> Viewport {
    Viewport::new(
        container.width / 2.0 - center.x * zoom,
        container.height / 2.0 - center.y * zoom,
        zoom,
    )
}

// ─── Background ──────────────────────────────────────────────────────────

/// Phase of a repeating background pattern with world spacing `gap`.
pub fn pattern_offset(viewport: &Viewport, gap: f64) -> Vec2 {
    let scaled = gap * viewport.zoom;
    if scaled == 0.0 || !scaled.is_finite() {
        return Vec2::ZERO;
    }
    let phase = |v: f64| ((v % scaled) + scaled) % scaled;
    Vec2::new(phase(viewport.x), phase(viewport.y))
}

// ─── Minimap ─────────────────────────────────────────────────────────────

/// Maps world coordinates into a minimap of fixed pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapProjection {
    /// Padded world box shown by the minimap.
    pub world: Rect,
    pub scale: f64,
    viewport: Viewport,
    container: Size,
}

impl MinimapProjection {
    pub fn new(nodes: &[Node], viewport: &Viewport, container: Size, minimap: Size) -> Self {
        let bounds = if nodes.is_empty() {
            Rect::new(0.0, 0.0, MINIMAP_EMPTY_EXTENT, MINIMAP_EMPTY_EXTENT)
        } else {
            nodes_bounds(nodes)
        };
        let world = bounds.inflate(MINIMAP_PADDING, MINIMAP_PADDING);
        let scale = (minimap.width / world.width()).min(minimap.height / world.height());
        Self {
            world,
            scale,
            viewport: *viewport,
            container,
        }
    }

    /// World point → minimap pixels.
    pub fn project(&self, world: Point) -> Point {
        Point::new(
            (world.x - self.world.x0) * self.scale,
            (world.y - self.world.y0) * self.scale,
        )
    }

    /// A node's rect in minimap pixels.
    pub fn node_rect(&self, node: &Node) -> Rect {
        let size = node.size();
        Rect::from_origin_size(
            self.project(node.position),
            Size::new(size.width * self.scale, size.height * self.scale),
        )
    }

    /// The visible part of the canvas in minimap pixels.
    pub fn viewport_rect(&self) -> Rect {
        let visible = self.viewport.visible_world_rect(self.container);
        Rect::from_origin_size(
            self.project(visible.origin()),
            Size::new(visible.width() * self.scale, visible.height() * self.scale),
        )
    }

    /// Viewport translation delta for a minimap drag delta. Dragging the
    /// minimap right moves the canvas translation left.
    pub fn translation_for_drag(&self, delta: Vec2) -> Vec2 {
        -(delta / self.scale) * self.viewport.zoom
    }
}
