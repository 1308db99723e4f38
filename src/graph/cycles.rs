//! Cycle bookkeeping for the DFS traversal and post-pass annotation.

use std::collections::HashSet;

use crate::graph::{Edge, EdgeType, Node, NodeId, NodeType};

/// Cycles found during one top-level traversal, in discovery order.
///
/// Ids start at 1 and are unique within a single request.
#[derive(Debug, Clone, Default)]
pub struct CycleRegistry {
    cycles: Vec<(u32, HashSet<NodeId>)>,
    counter: u32,
}

impl CycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the cycle closed by revisiting `repeated` while `path` is active.
    ///
    /// Members are the path suffix starting at the first occurrence of
    /// `repeated`. Returns the new cycle id, or `None` if `repeated` is not
    /// on the path.
    pub fn record(&mut self, path: &[NodeId], repeated: NodeId) -> Option<u32> {
        let start = path.iter().position(|id| *id == repeated)?;
        let mut members: HashSet<NodeId> = path[start..].iter().copied().collect();
        members.insert(repeated);
        self.counter += 1;
        self.cycles.push((self.counter, members));
        Some(self.counter)
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn members(&self, cycle_id: u32) -> Option<&HashSet<NodeId>> {
        self.cycles
            .iter()
            .find(|(id, _)| *id == cycle_id)
            .map(|(_, members)| members)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &HashSet<NodeId>)> {
        self.cycles.iter().map(|(id, members)| (*id, members))
    }
}

/// Mark nodes and edges that belong to recorded cycles.
///
/// A node in several cycles keeps the id of the last one. An edge is marked
/// when both endpoints sit in the same cycle set, so chords between cycle
/// members are marked as well: this is a membership test, not an extraction
/// of the exact cyclic path.
pub fn annotate_cycles(nodes: &mut [Node], edges: &mut [Edge], registry: &CycleRegistry) {
    for node in nodes.iter_mut() {
        for (cycle_id, members) in registry.iter() {
            if members.contains(&node.id) {
                node.in_cycle = Some(true);
                node.cycle_id = Some(cycle_id);
                node.node_type = Some(NodeType::CycleNode);
            }
        }
    }

    for edge in edges.iter_mut() {
        for (cycle_id, members) in registry.iter() {
            if members.contains(&edge.from) && members.contains(&edge.to) {
                edge.in_cycle = Some(true);
                edge.cycle_id = Some(cycle_id);
                edge.edge_type = Some(EdgeType::CycleDirection);
            }
        }
    }
}
