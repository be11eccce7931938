pub mod config;
pub mod controls;
pub mod input;
pub mod instance;
pub mod interaction;
pub mod store;
pub mod views;

pub use config::{DefaultEdgeOptions, FitViewOptions, FlowConfig, ZOOM_STEP};
pub use controls::{ControlAction, ControlMap, Controls};
pub use input::{GestureEvent, HandleHit};
pub use instance::{FlowInstance, FlowSnapshot};
pub use interaction::{
    ConnectionCoordinator, Coordinator, EdgeCoordinator, MinimapCoordinator,
    NodeDragCoordinator, ViewportCoordinator,
};
pub use store::{
    ConnectionDraft, ConnectionOutcome, FlowCallbacks, FlowEvent, FlowStore, StoreCommand,
};
pub use views::{
    ConnectionState, connection_state, edge_geometries, handle_connections, nodes_initialized,
    visible_edges, visible_nodes,
};
