//! Integration tests: gesture streams → coordinators → store.
//!
//! Each test feeds a full begin/update/end sequence through a coordinator,
//! applies the emitted commands and checks what the store ends up holding.

use flow_core::*;
use flow_editor::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn pan_update(tx: f64, ty: f64) -> GestureEvent {
    GestureEvent::PanUpdate {
        translation_x: tx,
        translation_y: ty,
        x: tx,
        y: ty,
    }
}

fn begin() -> GestureEvent {
    GestureEvent::PanBegin { x: 0.0, y: 0.0 }
}

/// Feed events through a coordinator, applying commands after each one.
fn drive(
    coordinator: &mut impl Coordinator,
    store: &mut FlowStore,
    events: &[GestureEvent],
    hit: Option<&HandleHit>,
) -> Vec<StoreCommand> {
    let mut all = Vec::new();
    for event in events {
        let commands = coordinator.handle(event, hit, store);
        all.extend(commands.iter().cloned());
        store.apply_commands(commands);
    }
    all
}

fn store() -> FlowStore {
    FlowStore::new(
        vec![
            Node::new(NodeId::intern("A"), Point::new(0.0, 0.0)),
            Node::new(NodeId::intern("B"), Point::new(300.0, 200.0)),
        ],
        Vec::new(),
        FlowConfig::default(),
    )
}

// ─── Node drag ───────────────────────────────────────────────────────────

#[test]
fn drag_commits_every_update_in_order() {
    init_logger();
    let mut store = store();
    let a = NodeId::intern("A");
    let mut drag = NodeDragCoordinator::new(a);

    let commands = drive(
        &mut drag,
        &mut store,
        &[begin(), pan_update(10.0, 0.0), pan_update(30.0, 5.0)],
        None,
    );
    let positions: Vec<Point> = commands
        .iter()
        .filter_map(|c| match c {
            StoreCommand::UpdateNodePosition { position, .. } => Some(*position),
            _ => None,
        })
        .collect();
    assert_eq!(
        positions,
        vec![Point::ZERO, Point::new(10.0, 0.0), Point::new(30.0, 5.0)]
    );

    let node = store.get_node(a).unwrap();
    assert!(node.dragging);
    assert!(node.selected);
    assert_eq!(store.selected_nodes(), &[a]);

    drive(&mut drag, &mut store, &[GestureEvent::PanEnd], None);
    let node = store.get_node(a).unwrap();
    assert!(!node.dragging);
    assert_eq!(node.position, Point::new(30.0, 5.0));
}

#[test]
fn per_node_draggable_override_wins() {
    let mut store = store();
    let mut nodes = store.nodes().to_vec();
    nodes[0].draggable = Some(false);
    store.set_nodes(nodes);

    let mut drag = NodeDragCoordinator::new(NodeId::intern("A"));
    let commands = drive(
        &mut drag,
        &mut store,
        &[begin(), pan_update(50.0, 50.0), GestureEvent::PanEnd],
        None,
    );
    assert!(commands.is_empty());
    assert_eq!(store.get_node(NodeId::intern("A")).unwrap().position, Point::ZERO);
}

#[test]
fn drag_of_removed_node_is_harmless() {
    let mut store = store();
    let a = NodeId::intern("A");
    let mut drag = NodeDragCoordinator::new(a);
    drive(&mut drag, &mut store, &[begin()], None);

    store.delete_elements(&[a], &[]);
    drive(
        &mut drag,
        &mut store,
        &[pan_update(5.0, 5.0), GestureEvent::PanEnd],
        None,
    );
    assert!(store.get_node(a).is_none());
    assert_eq!(store.nodes().len(), 1);
}

#[test]
fn tapping_a_node_replaces_selection() {
    let mut store = store();
    store.select_node(NodeId::intern("B"), false);
    let mut drag = NodeDragCoordinator::new(NodeId::intern("A"));
    drive(&mut drag, &mut store, &[GestureEvent::Tap { x: 1.0, y: 1.0 }], None);
    assert_eq!(store.selected_nodes(), &[NodeId::intern("A")]);
    assert!(!store.get_node(NodeId::intern("B")).unwrap().selected);
}

// ─── Events ──────────────────────────────────────────────────────────────

type Log = Rc<RefCell<Vec<String>>>;

/// A store whose event callbacks append `"<event> <id> <x>,<y>"` to a log.
fn recording_store() -> (FlowStore, Log) {
    let log: Log = Rc::default();
    let node_event = |name: &'static str, log: &Log| {
        let log = log.clone();
        Some(Box::new(move |n: &Node| {
            log.borrow_mut()
                .push(format!("{name} {} {},{}", n.id, n.position.x, n.position.y))
        }) as Box<dyn FnMut(&Node)>)
    };
    let (edge_log, pane_log) = (log.clone(), log.clone());
    let store = store().with_callbacks(FlowCallbacks {
        on_node_drag_start: node_event("start", &log),
        on_node_drag: node_event("drag", &log),
        on_node_drag_stop: node_event("stop", &log),
        on_node_click: node_event("click", &log),
        on_edge_click: Some(Box::new(move |e: &Edge| {
            edge_log.borrow_mut().push(format!("edge {} {}", e.id, e.selected))
        })),
        on_pane_click: Some(Box::new(move |p: Point| {
            pane_log.borrow_mut().push(format!("pane {},{}", p.x, p.y))
        })),
        ..FlowCallbacks::default()
    });
    (store, log)
}

#[test]
fn drag_reports_start_moves_and_stop() {
    let (mut store, log) = recording_store();
    let mut drag = NodeDragCoordinator::new(NodeId::intern("A"));
    drive(
        &mut drag,
        &mut store,
        &[begin(), pan_update(10.0, 0.0), pan_update(30.0, 5.0), GestureEvent::PanEnd],
        None,
    );
    assert_eq!(
        *log.borrow(),
        vec!["start A 0,0", "drag A 10,0", "drag A 30,5", "stop A 30,5"]
    );
}

#[test]
fn undraggable_node_reports_no_drag() {
    let (mut store, log) = recording_store();
    store.set_interactive(false);
    let mut drag = NodeDragCoordinator::new(NodeId::intern("A"));
    drive(&mut drag, &mut store, &[begin(), GestureEvent::PanEnd], None);
    assert!(log.borrow().is_empty());
}

#[test]
fn node_tap_reports_click_even_when_not_selectable() {
    let (mut store, log) = recording_store();
    let mut nodes = store.nodes().to_vec();
    nodes[1].selectable = Some(false);
    store.set_nodes(nodes);

    let b = NodeId::intern("B");
    drive(
        &mut NodeDragCoordinator::new(b),
        &mut store,
        &[GestureEvent::Tap { x: 0.0, y: 0.0 }],
        None,
    );
    assert!(store.selected_nodes().is_empty());
    assert_eq!(*log.borrow(), vec!["click B 300,200"]);
}

#[test]
fn edge_tap_selects_then_reports() {
    let (mut store, log) = recording_store();
    store.add_edges(vec![Edge::new(
        EdgeId::intern("ab"),
        NodeId::intern("A"),
        NodeId::intern("B"),
    )]);
    store.select_node(NodeId::intern("A"), false);

    let mut tap = EdgeCoordinator::new(EdgeId::intern("ab"));
    drive(&mut tap, &mut store, &[GestureEvent::Tap { x: 5.0, y: 5.0 }], None);

    assert_eq!(store.selected_edges(), &[EdgeId::intern("ab")]);
    assert!(store.selected_nodes().is_empty());
    assert_eq!(*log.borrow(), vec!["edge ab true"]);
}

#[test]
fn pane_tap_reports_world_position() {
    let (mut store, log) = recording_store();
    store.set_viewport(Viewport::new(-100.0, 50.0, 2.0));
    let mut vp = ViewportCoordinator::new();
    drive(&mut vp, &mut store, &[GestureEvent::Tap { x: 100.0, y: 250.0 }], None);
    assert_eq!(*log.borrow(), vec!["pane 100,100"]);
}

// ─── Viewport ────────────────────────────────────────────────────────────

#[test]
fn pan_commits_once_at_end() {
    init_logger();
    let mut store = store();
    let mut pan = ViewportCoordinator::new();

    let during = drive(
        &mut pan,
        &mut store,
        &[begin(), pan_update(40.0, -10.0), pan_update(60.0, -20.0)],
        None,
    );
    assert!(during.is_empty());
    assert_eq!(*store.viewport(), Viewport::default());
    assert_eq!(pan.live_viewport(), Some(Viewport::new(60.0, -20.0, 1.0)));

    let end = drive(&mut pan, &mut store, &[GestureEvent::PanEnd], None);
    assert_eq!(end.len(), 1);
    assert_eq!(*store.viewport(), Viewport::new(60.0, -20.0, 1.0));

    // a second end (cancellation delivered twice) commits nothing
    assert!(drive(&mut pan, &mut store, &[GestureEvent::PanEnd], None).is_empty());
}

#[test]
fn pinch_during_pan_composes() {
    let mut store = store();
    let mut vp = ViewportCoordinator::new();
    drive(
        &mut vp,
        &mut store,
        &[
            begin(),
            pan_update(10.0, 10.0),
            GestureEvent::PinchBegin,
            GestureEvent::PinchUpdate { scale: 1.5 },
            GestureEvent::PinchEnd,
        ],
        None,
    );
    assert_eq!(*store.viewport(), Viewport::new(10.0, 10.0, 1.5));

    drive(&mut vp, &mut store, &[pan_update(20.0, 10.0), GestureEvent::PanEnd], None);
    assert_eq!(*store.viewport(), Viewport::new(20.0, 10.0, 1.5));
    assert!(vp.live_viewport().is_none());
}

#[test]
fn pinch_clamps_to_min() {
    let mut store = store();
    let mut vp = ViewportCoordinator::new();
    drive(
        &mut vp,
        &mut store,
        &[
            GestureEvent::PinchBegin,
            GestureEvent::PinchUpdate { scale: 0.1 },
            GestureEvent::PinchEnd,
        ],
        None,
    );
    assert_eq!(store.zoom(), 0.5);
}

#[test]
fn pan_disabled_by_policy() {
    let config = FlowConfig {
        pan_on_drag: false,
        ..FlowConfig::default()
    };
    let mut store = FlowStore::new(Vec::new(), Vec::new(), config);
    let mut vp = ViewportCoordinator::new();
    let commands = drive(
        &mut vp,
        &mut store,
        &[begin(), pan_update(100.0, 100.0), GestureEvent::PanEnd],
        None,
    );
    assert!(commands.is_empty());
    assert_eq!(*store.viewport(), Viewport::default());
}

#[test]
fn pane_tap_clears_selection() {
    let mut store = store();
    store.select_node(NodeId::intern("A"), false);
    let mut vp = ViewportCoordinator::new();
    drive(&mut vp, &mut store, &[GestureEvent::Tap { x: 700.0, y: 500.0 }], None);
    assert!(store.selected_nodes().is_empty());
    assert!(store.nodes().iter().all(|n| !n.selected));
}

// ─── Minimap ─────────────────────────────────────────────────────────────

#[test]
fn minimap_drag_right_moves_viewport_left() {
    let mut store = store();
    let mut minimap = MinimapCoordinator::new(Size::new(200.0, 150.0));
    let scale = minimap.projection(&store).scale;

    drive(
        &mut minimap,
        &mut store,
        &[begin(), pan_update(10.0, 0.0), pan_update(25.0, 0.0)],
        None,
    );
    let vp = *store.viewport();
    assert!(vp.x < 0.0);
    assert!(approx_eq(vp.x, -25.0 / scale));
    assert!(approx_eq(vp.y, 0.0));
}

#[test]
fn minimap_respects_pannable_flag() {
    let mut store = store();
    let mut minimap = MinimapCoordinator::new(Size::new(200.0, 150.0));
    minimap.pannable = false;
    drive(&mut minimap, &mut store, &[begin(), pan_update(10.0, 0.0)], None);
    assert_eq!(*store.viewport(), Viewport::default());
}

// ─── Connections ─────────────────────────────────────────────────────────

fn hit(node: &str, id: &str, kind: HandleType) -> HandleHit {
    HandleHit {
        node_id: NodeId::intern(node),
        handle: HandleElement::new(HandleId::intern(id), kind, Side::Top),
    }
}

#[test]
fn drag_from_target_port_onto_source_port() {
    init_logger();
    let mut store = store();
    let mut c = ConnectionCoordinator::new(hit("B", "in", HandleType::Target));

    drive(&mut c, &mut store, &[begin(), pan_update(-100.0, -100.0)], None);
    assert!(store.connection().is_connecting);
    assert_eq!(store.connection().pointer_position, Some(Point::new(-100.0, -100.0)));

    let over = hit("A", "out", HandleType::Source);
    drive(&mut c, &mut store, &[GestureEvent::PanEnd], Some(&over));

    assert!(!store.connection().is_connecting);
    let added = &store.edges()[0];
    assert_eq!(added.id.as_str(), "eA-B");
    assert_eq!(added.source_handle, Some(HandleId::intern("out")));
    assert_eq!(added.target_handle, Some(HandleId::intern("in")));
}

#[test]
fn release_over_nothing_abandons() {
    let mut store = store();
    let mut c = ConnectionCoordinator::new(hit("A", "out", HandleType::Source));
    drive(
        &mut c,
        &mut store,
        &[begin(), pan_update(5.0, 5.0), GestureEvent::PanEnd],
        None,
    );
    assert_eq!(*store.connection(), ConnectionDraft::default());
    assert!(store.edges().is_empty());
}

#[test]
fn not_connectable_never_drafts() {
    let config = FlowConfig {
        nodes_connectable: false,
        ..FlowConfig::default()
    };
    let mut store = FlowStore::new(
        vec![Node::new(NodeId::intern("A"), Point::ZERO)],
        Vec::new(),
        config,
    );
    let mut c = ConnectionCoordinator::new(hit("A", "out", HandleType::Source));
    let commands = drive(&mut c, &mut store, &[begin(), GestureEvent::PanEnd], None);
    assert!(commands.is_empty());
    assert!(!store.connection().is_connecting);
}

#[test]
fn tap_on_second_port_completes_draft() {
    let mut store = store();
    store.start_connection(NodeId::intern("A"), hit("A", "out", HandleType::Source).handle);

    let mut target = ConnectionCoordinator::new(hit("B", "in", HandleType::Target));
    drive(&mut target, &mut store, &[GestureEvent::Tap { x: 0.0, y: 0.0 }], None);
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].id.as_str(), "eA-B");
}
