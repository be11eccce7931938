//! Change records: the mutation protocol for node and edge collections.
//!
//! A batch of changes is applied as a left fold over the collection. Each
//! record sees the result of the previous one, so `remove` and `reset` take
//! effect immediately for later records in the same batch. Records that
//! target an id missing from the collection are no-ops.

use crate::id::{EdgeId, NodeId};
use crate::model::{Dimensions, Edge, Node};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// One atomic mutation of the node collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    /// Move a node and/or update its dragging flag.
    Position {
        id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Point>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dragging: Option<bool>,
    },
    /// Record the node's laid-out size. Updates `measured` only.
    Dimensions { id: NodeId, dimensions: Size },
    Select { id: NodeId, selected: bool },
    Remove { id: NodeId },
    Add { item: Box<Node> },
    /// Clear the entire collection.
    Reset,
}

impl NodeChange {
    pub fn position(id: NodeId, position: Point, dragging: bool) -> Self {
        NodeChange::Position {
            id,
            position: Some(position),
            dragging: Some(dragging),
        }
    }

    pub fn add(node: Node) -> Self {
        NodeChange::Add {
            item: Box::new(node),
        }
    }

    /// The id this record targets, if any.
    pub fn id(&self) -> Option<NodeId> {
        match self {
            NodeChange::Position { id, .. }
            | NodeChange::Dimensions { id, .. }
            | NodeChange::Select { id, .. }
            | NodeChange::Remove { id } => Some(*id),
            NodeChange::Add { item } => Some(item.id),
            NodeChange::Reset => None,
        }
    }
}

/// One atomic mutation of the edge collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
    Add { item: Box<Edge> },
    Reset,
}

impl EdgeChange {
    pub fn add(edge: Edge) -> Self {
        EdgeChange::Add {
            item: Box::new(edge),
        }
    }

    pub fn id(&self) -> Option<EdgeId> {
        match self {
            EdgeChange::Select { id, .. } | EdgeChange::Remove { id } => Some(*id),
            EdgeChange::Add { item } => Some(item.id),
            EdgeChange::Reset => None,
        }
    }
}

// ─── Fold ────────────────────────────────────────────────────────────────

/// Apply a batch of node changes in order.
pub fn apply_node_changes(changes: &[NodeChange], nodes: Vec<Node>) -> Vec<Node> {
    changes.iter().fold(nodes, |mut nodes, change| {
        apply_node_change(change, &mut nodes);
        nodes
    })
}

fn apply_node_change(change: &NodeChange, nodes: &mut Vec<Node>) {
    match change {
        NodeChange::Position {
            id,
            position,
            dragging,
        } => {
            if let Some(node) = nodes.iter_mut().find(|n| n.id == *id) {
                if let Some(position) = position {
                    node.position = *position;
                }
                if let Some(dragging) = dragging {
                    node.dragging = *dragging;
                }
            }
        }
        NodeChange::Dimensions { id, dimensions } => {
            if let Some(node) = nodes.iter_mut().find(|n| n.id == *id) {
                node.measured = Dimensions::from(*dimensions);
            }
        }
        NodeChange::Select { id, selected } => {
            if let Some(node) = nodes.iter_mut().find(|n| n.id == *id) {
                node.selected = *selected;
            }
        }
        NodeChange::Remove { id } => nodes.retain(|n| n.id != *id),
        NodeChange::Add { item } => {
            // Ids stay unique: a second add for the same id replaces in place.
            match nodes.iter_mut().find(|n| n.id == item.id) {
                Some(existing) => {
                    log::warn!("node {} added twice; replacing", item.id);
                    *existing = (**item).clone();
                }
                None => nodes.push((**item).clone()),
            }
        }
        NodeChange::Reset => nodes.clear(),
    }
}

/// Apply a batch of edge changes in order.
pub fn apply_edge_changes(changes: &[EdgeChange], edges: Vec<Edge>) -> Vec<Edge> {
    changes.iter().fold(edges, |mut edges, change| {
        apply_edge_change(change, &mut edges);
        edges
    })
}

fn apply_edge_change(change: &EdgeChange, edges: &mut Vec<Edge>) {
    match change {
        EdgeChange::Select { id, selected } => {
            if let Some(edge) = edges.iter_mut().find(|e| e.id == *id) {
                edge.selected = *selected;
            }
        }
        EdgeChange::Remove { id } => edges.retain(|e| e.id != *id),
        EdgeChange::Add { item } => match edges.iter_mut().find(|e| e.id == item.id) {
            Some(existing) => {
                log::warn!("edge {} added twice; replacing", item.id);
                *existing = (**item).clone();
            }
            None => edges.push((**item).clone()),
        },
        EdgeChange::Reset => edges.clear(),
    }
}

// ─── JSON ────────────────────────────────────────────────────────────────

/// Decode a JSON array of node change records.
pub fn node_changes_from_json(json: &str) -> Result<Vec<NodeChange>, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid node changes: {e}"))
}

/// Decode a JSON array of edge change records.
pub fn edge_changes_from_json(json: &str) -> Result<Vec<EdgeChange>, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid edge changes: {e}"))
}
