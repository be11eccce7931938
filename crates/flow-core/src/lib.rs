pub mod changes;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod model;
pub mod path;

pub use changes::{EdgeChange, NodeChange, apply_edge_changes, apply_node_changes};
pub use geometry::{
    MinimapProjection, edge_center, fit_viewport, handle_position, is_edge_visible,
    is_node_visible, nodes_bounds, pattern_offset, snap_position,
};
pub use graph::{add_edge, connected_edges, generate_id, incomers, outgoers, update_edge};
pub use id::{EdgeId, HandleId, NodeId};
pub use model::*;
pub use path::{EdgeGeometry, EdgePath, EdgePathParams, edge_path, resolve_edge_geometry};

// Re-export kurbo geometry types so downstream crates share one version.
pub use kurbo::{BezPath, Point, Rect, Size, Vec2};
