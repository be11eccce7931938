//! Interaction coordinators.
//!
//! Each coordinator turns one gesture stream into `StoreCommand`s that the
//! host applies to the store. Coordinators only read the store; transient
//! per-frame state (drag start, live viewport during a pan) lives here and
//! is committed at the gesture's checkpoints.
//!
//! | Coordinator | Begin | Update | End |
//! |-------------|-------|--------|-----|
//! | Node drag   | select + commit start | commit each position | commit, dragging off |
//! | Connection  | open draft | move loose end | commit or abandon |
//! | Viewport    | snapshot | local only | commit once |
//! | Minimap     | reset | translate viewport | reset |
//!
//! Taps on a node, an edge or the pane select (or clear) and then report a
//! click event. Node drags report start, each move and stop.

use crate::input::{GestureEvent, HandleHit};
use crate::store::{FlowEvent, FlowStore, StoreCommand};
use flow_core::{EdgeId, MinimapProjection, NodeId, Point, Size, Vec2, Viewport, snap_position};
use flow_core::geometry::clamp_zoom;

/// Translates gesture events into store commands.
pub trait Coordinator {
    /// Handle one event. `hit` is the port under the pointer, when the host
    /// resolved one.
    fn handle(
        &mut self,
        event: &GestureEvent,
        hit: Option<&HandleHit>,
        store: &FlowStore,
    ) -> Vec<StoreCommand>;
}

fn drop_non_finite(event: &GestureEvent, who: &str) -> bool {
    if event.is_finite() {
        return false;
    }
    log::warn!("{who}: dropping non-finite gesture {event:?}");
    true
}

// ─── Node drag ───────────────────────────────────────────────────────────

/// Drags and taps on one node.
pub struct NodeDragCoordinator {
    node: NodeId,
    /// Position when the drag began. `Some` while dragging.
    start: Option<Point>,
    current: Point,
}

impl NodeDragCoordinator {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            start: None,
            current: Point::ZERO,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }
}

impl Coordinator for NodeDragCoordinator {
    fn handle(
        &mut self,
        event: &GestureEvent,
        _hit: Option<&HandleHit>,
        store: &FlowStore,
    ) -> Vec<StoreCommand> {
        if drop_non_finite(event, "node drag") {
            return vec![];
        }
        let config = store.config();

        match event {
            GestureEvent::PanBegin { .. } => {
                let Some(node) = store.get_node(self.node) else {
                    return vec![];
                };
                if !node.is_draggable(config.nodes_draggable) {
                    return vec![];
                }
                self.start = Some(node.position);
                self.current = node.position;

                let mut commands = Vec::with_capacity(3);
                if node.is_selectable(config.elements_selectable) {
                    commands.push(StoreCommand::SelectNode {
                        id: self.node,
                        additive: false,
                    });
                }
                commands.push(StoreCommand::UpdateNodePosition {
                    id: self.node,
                    position: node.position,
                    dragging: true,
                });
                commands.push(StoreCommand::Notify(FlowEvent::NodeDragStart { id: self.node }));
                commands
            }
            GestureEvent::PanUpdate { .. } => {
                let (Some(start), Some(translation)) = (self.start, event.translation()) else {
                    return vec![];
                };
                let mut position = start + translation / store.viewport().zoom;
                if config.snap_to_grid {
                    position = snap_position(position, config.snap_grid);
                }
                log::trace!("drag {} -> ({:.1}, {:.1})", self.node, position.x, position.y);
                self.current = position;
                vec![
                    StoreCommand::UpdateNodePosition {
                        id: self.node,
                        position,
                        dragging: true,
                    },
                    StoreCommand::Notify(FlowEvent::NodeDrag { id: self.node }),
                ]
            }
            GestureEvent::PanEnd => {
                if self.start.take().is_none() {
                    return vec![];
                }
                vec![
                    StoreCommand::UpdateNodePosition {
                        id: self.node,
                        position: self.current,
                        dragging: false,
                    },
                    StoreCommand::Notify(FlowEvent::NodeDragStop { id: self.node }),
                ]
            }
            GestureEvent::Tap { .. } => {
                let Some(node) = store.get_node(self.node) else {
                    return vec![];
                };
                let mut commands = Vec::with_capacity(2);
                if node.is_selectable(config.elements_selectable) {
                    commands.push(StoreCommand::SelectNode {
                        id: self.node,
                        additive: false,
                    });
                }
                commands.push(StoreCommand::Notify(FlowEvent::NodeClick { id: self.node }));
                commands
            }
            GestureEvent::PinchBegin | GestureEvent::PinchUpdate { .. } | GestureEvent::PinchEnd => {
                vec![]
            }
        }
    }
}

// ─── Connection ──────────────────────────────────────────────────────────

/// Drags and taps on one port.
pub struct ConnectionCoordinator {
    port: HandleHit,
    active: bool,
}

impl ConnectionCoordinator {
    pub fn new(port: HandleHit) -> Self {
        Self { port, active: false }
    }

    fn connectable(&self, store: &FlowStore) -> bool {
        store
            .get_node(self.port.node_id)
            .is_some_and(|n| n.is_connectable(store.config().nodes_connectable))
    }
}

impl Coordinator for ConnectionCoordinator {
    fn handle(
        &mut self,
        event: &GestureEvent,
        hit: Option<&HandleHit>,
        store: &FlowStore,
    ) -> Vec<StoreCommand> {
        match event {
            GestureEvent::PanBegin { .. } => {
                if !self.connectable(store) {
                    return vec![];
                }
                self.active = true;
                vec![StoreCommand::StartConnection {
                    node_id: self.port.node_id,
                    handle: self.port.handle,
                }]
            }
            GestureEvent::PanUpdate { .. } => {
                if !self.active || drop_non_finite(event, "connection") {
                    return vec![];
                }
                let Some(screen) = event.position() else {
                    return vec![];
                };
                let pointer = store.viewport().unproject(screen);
                log::trace!("connection pointer ({:.1}, {:.1})", pointer.x, pointer.y);
                vec![StoreCommand::UpdateConnection { pointer }]
            }
            GestureEvent::PanEnd => {
                if !std::mem::take(&mut self.active) {
                    return vec![];
                }
                vec![StoreCommand::EndConnection {
                    target: hit.copied(),
                }]
            }
            // Tapping a port while another port's draft is open ends it here.
            GestureEvent::Tap { .. } => {
                if !store.connection().is_connecting || !self.connectable(store) {
                    return vec![];
                }
                vec![StoreCommand::EndConnection {
                    target: Some(self.port),
                }]
            }
            GestureEvent::PinchBegin | GestureEvent::PinchUpdate { .. } | GestureEvent::PinchEnd => {
                vec![]
            }
        }
    }
}

// ─── Viewport ────────────────────────────────────────────────────────────

/// Pan, pinch and tap on the empty pane.
///
/// Pan and pinch share one live viewport so a pinch during a pan (or the
/// reverse) composes; each gesture commits it once when it ends.
#[derive(Default)]
pub struct ViewportCoordinator {
    live: Option<Viewport>,
    pan_start: Option<Vec2>,
    pinch_start: Option<f64>,
}

impl ViewportCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The transform to draw with while a gesture is in flight.
    pub fn live_viewport(&self) -> Option<Viewport> {
        self.live
    }

    fn commit(&mut self) -> Vec<StoreCommand> {
        let Some(viewport) = self.live else {
            return vec![];
        };
        if self.pan_start.is_none() && self.pinch_start.is_none() {
            self.live = None;
        }
        vec![StoreCommand::SetViewport(viewport)]
    }
}

impl Coordinator for ViewportCoordinator {
    fn handle(
        &mut self,
        event: &GestureEvent,
        _hit: Option<&HandleHit>,
        store: &FlowStore,
    ) -> Vec<StoreCommand> {
        if drop_non_finite(event, "viewport") {
            return vec![];
        }
        let config = store.config();

        match event {
            GestureEvent::PanBegin { .. } => {
                if config.pan_on_drag {
                    let base = *self.live.get_or_insert(*store.viewport());
                    self.pan_start = Some(base.translation());
                }
                vec![]
            }
            GestureEvent::PanUpdate { .. } => {
                if let (Some(start), Some(live), Some(t)) =
                    (self.pan_start, self.live.as_mut(), event.translation())
                {
                    live.x = start.x + t.x;
                    live.y = start.y + t.y;
                    log::trace!("pan ({:.1}, {:.1})", live.x, live.y);
                }
                vec![]
            }
            GestureEvent::PanEnd => {
                if self.pan_start.take().is_none() {
                    return vec![];
                }
                self.commit()
            }
            GestureEvent::PinchBegin => {
                if config.zoom_on_pinch {
                    let base = *self.live.get_or_insert(*store.viewport());
                    self.pinch_start = Some(base.zoom);
                }
                vec![]
            }
            GestureEvent::PinchUpdate { scale } => {
                if let (Some(start), Some(live)) = (self.pinch_start, self.live.as_mut()) {
                    live.zoom = clamp_zoom(start * scale, config.min_zoom, config.max_zoom);
                    log::trace!("pinch zoom {:.3}", live.zoom);
                }
                vec![]
            }
            GestureEvent::PinchEnd => {
                if self.pinch_start.take().is_none() {
                    return vec![];
                }
                self.commit()
            }
            GestureEvent::Tap { x, y } => {
                let position = store.viewport().unproject(Point::new(*x, *y));
                vec![
                    StoreCommand::ClearSelection,
                    StoreCommand::Notify(FlowEvent::PaneClick { position }),
                ]
            }
        }
    }
}

// ─── Edge ────────────────────────────────────────────────────────────────

/// Taps on one edge. Edges have no drag behavior.
pub struct EdgeCoordinator {
    edge: EdgeId,
}

impl EdgeCoordinator {
    pub fn new(edge: EdgeId) -> Self {
        Self { edge }
    }
}

impl Coordinator for EdgeCoordinator {
    fn handle(
        &mut self,
        event: &GestureEvent,
        _hit: Option<&HandleHit>,
        store: &FlowStore,
    ) -> Vec<StoreCommand> {
        if !matches!(event, GestureEvent::Tap { .. }) || store.get_edge(self.edge).is_none() {
            return vec![];
        }
        let mut commands = Vec::with_capacity(2);
        if store.config().elements_selectable {
            commands.push(StoreCommand::SelectEdge {
                id: self.edge,
                additive: false,
            });
        }
        commands.push(StoreCommand::Notify(FlowEvent::EdgeClick { id: self.edge }));
        commands
    }
}

// ─── Minimap ─────────────────────────────────────────────────────────────

/// Dragging inside the minimap pans the canvas.
pub struct MinimapCoordinator {
    size: Size,
    pub pannable: bool,
    last: Vec2,
}

impl MinimapCoordinator {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pannable: true,
            last: Vec2::ZERO,
        }
    }

    /// The host resized the minimap.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn projection(&self, store: &FlowStore) -> MinimapProjection {
        MinimapProjection::new(store.nodes(), store.viewport(), store.container(), self.size)
    }
}

impl Coordinator for MinimapCoordinator {
    fn handle(
        &mut self,
        event: &GestureEvent,
        _hit: Option<&HandleHit>,
        store: &FlowStore,
    ) -> Vec<StoreCommand> {
        if !self.pannable || drop_non_finite(event, "minimap") {
            return vec![];
        }
        match event {
            GestureEvent::PanBegin { .. } | GestureEvent::PanEnd => {
                self.last = Vec2::ZERO;
                vec![]
            }
            GestureEvent::PanUpdate { .. } => {
                let Some(translation) = event.translation() else {
                    return vec![];
                };
                let delta = translation - self.last;
                self.last = translation;
                let shift = self.projection(store).translation_for_drag(delta);
                vec![StoreCommand::TranslateViewport(shift)]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use flow_core::{HandleElement, HandleId, HandleType, Node, Side};
    use pretty_assertions::assert_eq;

    fn store_with(config: FlowConfig) -> FlowStore {
        let nodes = vec![Node::new(NodeId::intern("n"), Point::new(100.0, 100.0))];
        FlowStore::new(nodes, Vec::new(), config)
    }

    fn pan_update(tx: f64, ty: f64) -> GestureEvent {
        GestureEvent::PanUpdate {
            translation_x: tx,
            translation_y: ty,
            x: 0.0,
            y: 0.0,
        }
    }

    #[test]
    fn drag_is_divided_by_zoom() {
        let mut store = store_with(FlowConfig::default());
        store.set_zoom(2.0);
        let mut drag = NodeDragCoordinator::new(NodeId::intern("n"));
        drag.handle(&GestureEvent::PanBegin { x: 0.0, y: 0.0 }, None, &store);
        let commands = drag.handle(&pan_update(40.0, -20.0), None, &store);
        assert_eq!(
            commands,
            vec![
                StoreCommand::UpdateNodePosition {
                    id: NodeId::intern("n"),
                    position: Point::new(120.0, 90.0),
                    dragging: true,
                },
                StoreCommand::Notify(FlowEvent::NodeDrag {
                    id: NodeId::intern("n")
                }),
            ]
        );
    }

    #[test]
    fn drag_snaps_when_enabled() {
        let store = store_with(FlowConfig {
            snap_to_grid: true,
            ..FlowConfig::default()
        });
        let mut drag = NodeDragCoordinator::new(NodeId::intern("n"));
        drag.handle(&GestureEvent::PanBegin { x: 0.0, y: 0.0 }, None, &store);
        let commands = drag.handle(&pan_update(8.0, 4.0), None, &store);
        assert_eq!(
            commands[0],
            StoreCommand::UpdateNodePosition {
                id: NodeId::intern("n"),
                position: Point::new(105.0, 105.0),
                dragging: true,
            }
        );
    }

    #[test]
    fn disabled_drag_emits_nothing() {
        let store = store_with(FlowConfig {
            nodes_draggable: false,
            ..FlowConfig::default()
        });
        let mut drag = NodeDragCoordinator::new(NodeId::intern("n"));
        assert!(drag.handle(&GestureEvent::PanBegin { x: 0.0, y: 0.0 }, None, &store).is_empty());
        assert!(drag.handle(&pan_update(5.0, 5.0), None, &store).is_empty());
        assert!(drag.handle(&GestureEvent::PanEnd, None, &store).is_empty());
    }

    #[test]
    fn non_finite_update_is_dropped() {
        let store = store_with(FlowConfig::default());
        let mut drag = NodeDragCoordinator::new(NodeId::intern("n"));
        drag.handle(&GestureEvent::PanBegin { x: 0.0, y: 0.0 }, None, &store);
        assert!(drag.handle(&pan_update(f64::NAN, 1.0), None, &store).is_empty());
        assert!(drag.is_dragging());
    }

    #[test]
    fn pane_tap_reports_world_point() {
        let mut store = store_with(FlowConfig::default());
        store.set_viewport(Viewport::new(100.0, 0.0, 2.0));
        let mut vp = ViewportCoordinator::new();
        assert_eq!(
            vp.handle(&GestureEvent::Tap { x: 300.0, y: 50.0 }, None, &store),
            vec![
                StoreCommand::ClearSelection,
                StoreCommand::Notify(FlowEvent::PaneClick {
                    position: Point::new(100.0, 25.0)
                }),
            ]
        );
    }

    #[test]
    fn edge_ignores_everything_but_taps() {
        let store = store_with(FlowConfig::default());
        let mut edge = EdgeCoordinator::new(EdgeId::intern("missing"));
        assert!(edge.handle(&GestureEvent::Tap { x: 0.0, y: 0.0 }, None, &store).is_empty());
        assert!(edge.handle(&GestureEvent::PanBegin { x: 0.0, y: 0.0 }, None, &store).is_empty());
    }

    #[test]
    fn pinch_is_clamped_locally() {
        let store = store_with(FlowConfig::default());
        let mut vp = ViewportCoordinator::new();
        vp.handle(&GestureEvent::PinchBegin, None, &store);
        vp.handle(&GestureEvent::PinchUpdate { scale: 5.0 }, None, &store);
        assert_eq!(vp.live_viewport().map(|v| v.zoom), Some(2.0));
        assert_eq!(
            vp.handle(&GestureEvent::PinchEnd, None, &store),
            vec![StoreCommand::SetViewport(Viewport::new(0.0, 0.0, 2.0))]
        );
        assert!(vp.live_viewport().is_none());
    }

    #[test]
    fn connection_update_is_in_world_space() {
        let mut store = store_with(FlowConfig::default());
        store.set_viewport(Viewport::new(50.0, 0.0, 2.0));
        let port = HandleHit {
            node_id: NodeId::intern("n"),
            handle: HandleElement::new(HandleId::intern("out"), HandleType::Source, Side::Bottom),
        };
        let mut c = ConnectionCoordinator::new(port);
        c.handle(&GestureEvent::PanBegin { x: 0.0, y: 0.0 }, None, &store);
        let commands = c.handle(
            &GestureEvent::PanUpdate {
                translation_x: 0.0,
                translation_y: 0.0,
                x: 150.0,
                y: 80.0,
            },
            None,
            &store,
        );
        assert_eq!(
            commands,
            vec![StoreCommand::UpdateConnection {
                pointer: Point::new(50.0, 40.0)
            }]
        );
    }
}
