//! Graph traversal and edge-list helpers.
//!
//! Plain filters over the node and edge slices. Results keep input order.

use crate::id::{EdgeId, NodeId};
use crate::model::{Connection, Edge, Node};
use std::collections::HashSet;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Edges touching any of `nodes` by source or target.
pub fn connected_edges<'a>(nodes: &[Node], edges: &'a [Edge]) -> Vec<&'a Edge> {
    let ids: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
    edges
        .iter()
        .filter(|e| ids.contains(&e.source) || ids.contains(&e.target))
        .collect()
}

/// Nodes with an edge pointing into `node`.
pub fn incomers<'a>(node: NodeId, nodes: &'a [Node], edges: &[Edge]) -> Vec<&'a Node> {
    let sources: HashSet<NodeId> = edges
        .iter()
        .filter(|e| e.target == node)
        .map(|e| e.source)
        .collect();
    nodes.iter().filter(|n| sources.contains(&n.id)).collect()
}

/// Nodes `node` has an edge pointing to.
pub fn outgoers<'a>(node: NodeId, nodes: &'a [Node], edges: &[Edge]) -> Vec<&'a Node> {
    let targets: HashSet<NodeId> = edges
        .iter()
        .filter(|e| e.source == node)
        .map(|e| e.target)
        .collect();
    nodes.iter().filter(|n| targets.contains(&n.id)).collect()
}

/// Append an edge. Does not check for an existing id.
pub fn add_edge(edge: Edge, mut edges: Vec<Edge>) -> Vec<Edge> {
    edges.push(edge);
    edges
}

/// Rewire the edge `old` to a new connection, keeping its other fields.
pub fn update_edge(old: EdgeId, connection: &Connection, mut edges: Vec<Edge>) -> Vec<Edge> {
    if let Some(edge) = edges.iter_mut().find(|e| e.id == old) {
        edge.source = connection.source;
        edge.target = connection.target;
        edge.source_handle = connection.source_handle;
        edge.target_handle = connection.target_handle;
    }
    edges
}

/// A short random-looking id: 7 lowercase base-36 characters.
pub fn generate_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut hasher = RandomState::new().build_hasher();
    COUNTER.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
    let mut value = hasher.finish();

    let mut id = String::with_capacity(7);
    for _ in 0..7 {
        let digit = (value % 36) as u32;
        id.extend(char::from_digit(digit, 36));
        value /= 36;
    }
    id
}
