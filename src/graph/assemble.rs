//! Final deduplication of traversal output.

use std::collections::HashMap;
use std::hash::Hash;

use crate::graph::policy::EdgeIdentity;
use crate::graph::{Edge, EdgeKind, GraphSnapshot, Node, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKey {
    Endpoints(NodeId, NodeId),
    Typed(NodeId, NodeId, EdgeKind),
}

fn edge_key(edge: &Edge, identity: EdgeIdentity) -> EdgeKey {
    match identity {
        EdgeIdentity::Endpoints => EdgeKey::Endpoints(edge.from, edge.to),
        EdgeIdentity::EndpointsAndKind => EdgeKey::Typed(edge.from, edge.to, edge.kind),
    }
}

/// Keep one item per key: the value of the last occurrence at the position of
/// the first.
fn dedup_last_wins<T, K: Eq + Hash>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(&key(&item)) {
            Some(&pos) => out[pos] = item,
            None => {
                positions.insert(key(&item), out.len());
                out.push(item);
            }
        }
    }
    out
}

/// Deduplicate nodes by id and edges by `identity`.
pub fn assemble(nodes: Vec<Node>, edges: Vec<Edge>, identity: EdgeIdentity) -> GraphSnapshot {
    GraphSnapshot {
        nodes: dedup_last_wins(nodes, |n| n.id),
        edges: dedup_last_wins(edges, |e| edge_key(e, identity)),
    }
}
