//! Relation graph module: cycle-aware traversal of module dependency graphs.
//!
//! Walks dependency/exclusion links (or model foreign keys) from a set of seed
//! records under a [`TraversalPolicy`], marks cycles found on the active DFS
//! path and returns a deduplicated [`GraphSnapshot`].

pub mod assemble;
pub mod cycles;
pub mod domain;
pub mod models;
pub mod policy;
pub mod resolver;
pub mod traversal;

pub use assemble::assemble;
pub use cycles::{annotate_cycles, CycleRegistry};
pub use domain::Domain;
pub use models::{build_model_graph, MemoryModelResolver, ModelResolver};
pub use policy::{validate_seed_ids, Direction, EdgeIdentity, TraversalOptions, TraversalPolicy};
pub use resolver::{MemoryResolver, NodeMetadata, RelationResolver};
pub use traversal::{build_graph, build_module_graph, build_reverse_graph, GraphTraversalEngine};

use serde::{Deserialize, Serialize};

/// Record id in the host data store.
pub type NodeId = i64;

/// Rendering hint attached by the cycle annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Normal,
    CycleNode,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Normal => "normal",
            NodeType::CycleNode => "cycleNode",
        }
    }
}

/// A module (or model) materialized in the output graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Distance from the seed that first reached this occurrence.
    #[serde(default)]
    pub depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, alias = "category_id", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<NodeId>,
    #[serde(default, alias = "is_custom", skip_serializing_if = "Option::is_none")]
    pub is_custom: Option<bool>,
    /// Technical model name, only set on model graph nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, alias = "in_cycle", skip_serializing_if = "Option::is_none")]
    pub in_cycle: Option<bool>,
    #[serde(default, alias = "cycle_id", skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<u32>,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
}

impl Node {
    /// Bare node with only identity, label and depth filled in.
    pub fn new(id: NodeId, label: impl Into<String>, depth: u32) -> Self {
        Self {
            id,
            label: label.into(),
            state: None,
            depth,
            category: None,
            category_id: None,
            is_custom: None,
            model: None,
            in_cycle: None,
            cycle_id: None,
            node_type: None,
        }
    }

    pub fn is_in_cycle(&self) -> bool {
        self.in_cycle.unwrap_or(false)
    }
}

/// Relation kind carried by an edge (`type` on the wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    #[default]
    #[serde(rename = "dependency")]
    Dependency,
    #[serde(rename = "exclusion")]
    Exclusion,
    #[serde(rename = "reverse_dependency")]
    ReverseDependency,
    #[serde(rename = "reverse_exclusion")]
    ReverseExclusion,
    #[serde(rename = "many2one")]
    Many2one,
    #[serde(rename = "one2many")]
    One2many,
    #[serde(rename = "many2many")]
    Many2many,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Dependency => "dependency",
            EdgeKind::Exclusion => "exclusion",
            EdgeKind::ReverseDependency => "reverse_dependency",
            EdgeKind::ReverseExclusion => "reverse_exclusion",
            EdgeKind::Many2one => "many2one",
            EdgeKind::One2many => "one2many",
            EdgeKind::Many2many => "many2many",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker set on edges whose endpoints share a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeType {
    CycleDirection,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::CycleDirection => "cycleDirection",
        }
    }
}

/// A directed relation instance between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireEdge")]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    /// Relational field name, only set on model graph edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, alias = "in_cycle", skip_serializing_if = "Option::is_none")]
    pub in_cycle: Option<bool>,
    #[serde(default, alias = "cycle_id", skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<u32>,
    #[serde(default, alias = "edge_type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeType>,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            field: None,
            in_cycle: None,
            cycle_id: None,
            edge_type: None,
        }
    }

    pub fn is_in_cycle(&self) -> bool {
        self.in_cycle.unwrap_or(false)
    }
}

/// `type` as found in stored or remote payloads. Older producers overwrite
/// the relation kind of cycle edges with `cycleDirection`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireEdgeKind {
    Relation(EdgeKind),
    Marker(EdgeType),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEdge {
    from: NodeId,
    to: NodeId,
    #[serde(rename = "type", default)]
    kind: Option<WireEdgeKind>,
    #[serde(default)]
    field: Option<String>,
    #[serde(default, alias = "in_cycle")]
    in_cycle: Option<bool>,
    #[serde(default, alias = "cycle_id")]
    cycle_id: Option<u32>,
    #[serde(default, alias = "edge_type")]
    edge_type: Option<EdgeType>,
}

impl From<WireEdge> for Edge {
    fn from(wire: WireEdge) -> Self {
        // A marker in `type` loses the relation kind; it reads as a dependency.
        let (kind, marker) = match wire.kind {
            Some(WireEdgeKind::Relation(kind)) => (kind, None),
            Some(WireEdgeKind::Marker(marker)) => (EdgeKind::default(), Some(marker)),
            None => (EdgeKind::default(), None),
        };
        Self {
            from: wire.from,
            to: wire.to,
            kind,
            field: wire.field,
            in_cycle: wire.in_cycle,
            cycle_id: wire.cycle_id,
            edge_type: wire.edge_type.or(marker),
        }
    }
}

/// Deduplicated traversal result, the `{nodes, edges}` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }

    /// Distinct cycle ids present on nodes, ascending.
    pub fn cycle_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.nodes.iter().filter_map(|n| n.cycle_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
