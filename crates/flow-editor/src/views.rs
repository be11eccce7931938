//! Read-only projections over the store, for consumers that render.

use crate::store::FlowStore;
use flow_core::{
    Connection, Edge, EdgeGeometry, HandleElement, HandleId, HandleType, Node, NodeId, Point,
    is_edge_visible, is_node_visible, resolve_edge_geometry,
};
use serde::Serialize;

/// True once every node has reported both measured dimensions. An empty
/// graph counts as initialized.
pub fn nodes_initialized(store: &FlowStore) -> bool {
    store.nodes().iter().all(|node| {
        store
            .internal(node.id)
            .is_some_and(|internal| internal.is_measured())
    })
}

/// Connections attached to a node's ports of one kind. With `handle`, only
/// edges on that port count. Without a node there is nothing to report.
pub fn handle_connections(
    store: &FlowStore,
    kind: HandleType,
    node: Option<NodeId>,
    handle: Option<HandleId>,
) -> Vec<Connection> {
    let Some(node) = node else {
        return Vec::new();
    };
    store
        .edges()
        .iter()
        .filter(|edge| match kind {
            HandleType::Source => edge.source == node,
            HandleType::Target => edge.target == node,
        })
        .filter(|edge| {
            let port = match kind {
                HandleType::Source => edge.source_handle,
                HandleType::Target => edge.target_handle,
            };
            handle.is_none() || port == handle
        })
        .map(Connection::from)
        .collect()
}

/// The connection draft as consumers see it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub is_connecting: bool,
    pub start_handle: Option<HandleElement>,
    pub end_position: Option<Point>,
    pub start_node_id: Option<NodeId>,
}

pub fn connection_state(store: &FlowStore) -> ConnectionState {
    let draft = store.connection();
    ConnectionState {
        is_connecting: draft.is_connecting,
        start_handle: draft.start_handle,
        end_position: draft.pointer_position,
        start_node_id: draft.start_node_id,
    }
}

/// Non-hidden nodes overlapping the container, in paint order.
pub fn visible_nodes(store: &FlowStore) -> Vec<&Node> {
    let (viewport, container) = (store.viewport(), store.container());
    let mut nodes: Vec<&Node> = store
        .nodes()
        .iter()
        .filter(|n| !n.hidden && is_node_visible(n, viewport, container))
        .collect();
    // Stable: equal z-index keeps insertion order.
    nodes.sort_by_key(|n| n.z_index);
    nodes
}

/// Renderable edges whose anchor box overlaps the container, in paint order.
pub fn visible_edges(store: &FlowStore) -> Vec<&Edge> {
    let (viewport, container) = (store.viewport(), store.container());
    let mut edges: Vec<&Edge> = store
        .edges()
        .iter()
        .filter(|edge| {
            resolve_edge_geometry(edge, store.nodes(), store.internals()).is_some_and(|g| {
                is_edge_visible(g.source, g.target, viewport, container)
            })
        })
        .collect();
    edges.sort_by_key(|e| e.z_index);
    edges
}

/// Anchors and paths for every renderable edge, in paint order.
pub fn edge_geometries(store: &FlowStore) -> Vec<EdgeGeometry> {
    let mut edges: Vec<&Edge> = store.edges().iter().collect();
    edges.sort_by_key(|e| e.z_index);
    edges
        .into_iter()
        .filter_map(|edge| resolve_edge_geometry(edge, store.nodes(), store.internals()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use flow_core::{EdgeId, Size, Viewport};
    use pretty_assertions::assert_eq;

    fn store() -> FlowStore {
        let (a, b) = (NodeId::intern("a"), NodeId::intern("b"));
        let nodes = vec![Node::new(a, Point::ZERO), Node::new(b, Point::new(0.0, 200.0))];
        let edges = vec![
            Edge::new(EdgeId::intern("ab-1"), a, b)
                .with_handles(Some(HandleId::intern("x")), None),
            Edge::new(EdgeId::intern("ab-2"), a, b)
                .with_handles(Some(HandleId::intern("y")), None),
        ];
        FlowStore::new(nodes, edges, FlowConfig::default())
    }

    #[test]
    fn handle_connections_filter_by_port() {
        let s = store();
        let a = NodeId::intern("a");
        assert_eq!(handle_connections(&s, HandleType::Source, Some(a), None).len(), 2);

        let on_x = handle_connections(&s, HandleType::Source, Some(a), Some(HandleId::intern("x")));
        assert_eq!(on_x.len(), 1);
        assert_eq!(on_x[0].source_handle, Some(HandleId::intern("x")));

        assert!(handle_connections(&s, HandleType::Target, Some(a), None).is_empty());
        assert!(handle_connections(&s, HandleType::Source, None, None).is_empty());
    }

    #[test]
    fn empty_graph_is_initialized() {
        let s = FlowStore::new(Vec::new(), Vec::new(), FlowConfig::default());
        assert!(nodes_initialized(&s));
    }

    #[test]
    fn offscreen_and_hidden_nodes_are_not_visible() {
        let mut s = store();
        s.set_viewport(Viewport::new(0.0, -100.0, 1.0));
        s.set_container_dimensions(Size::new(400.0, 120.0));
        // a spans y 0..50 → screen -100..-50; b spans 200..250 → 100..150
        let ids: Vec<&str> = visible_nodes(&s).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);

        let mut nodes = s.nodes().to_vec();
        nodes[1].hidden = true;
        s.set_nodes(nodes);
        assert!(visible_nodes(&s).is_empty());
    }

    #[test]
    fn z_index_overrides_insertion_order() {
        let mut s = store();
        let mut nodes = s.nodes().to_vec();
        nodes.push(Node::new(NodeId::intern("c"), Point::new(10.0, 10.0)));
        nodes[0].z_index = 1;
        nodes[2].z_index = -1;
        s.set_nodes(nodes);

        let ids: Vec<&str> = visible_nodes(&s).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let mut edges = s.edges().to_vec();
        edges[0].z_index = 2;
        s.set_edges(edges);
        let ids: Vec<&str> = edge_geometries(&s).iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["ab-2", "ab-1"]);
    }

    #[test]
    fn connection_state_mirrors_draft() {
        let mut s = store();
        assert_eq!(connection_state(&s), ConnectionState::default());

        let handle = HandleElement::new(
            HandleType::Source.default_id(),
            HandleType::Source,
            flow_core::Side::Bottom,
        );
        s.start_connection(NodeId::intern("a"), handle);
        s.update_connection(Point::new(5.0, 6.0));
        let state = connection_state(&s);
        assert!(state.is_connecting);
        assert_eq!(state.end_position, Some(Point::new(5.0, 6.0)));
        assert_eq!(state.start_node_id, Some(NodeId::intern("a")));
    }
}
