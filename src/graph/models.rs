//! Model relation graph: models linked by their relational fields.
//!
//! Unlike the module graph this walk keeps one visited set for the whole
//! request, so every model is expanded at most once and cycles simply stop
//! the descent instead of being annotated.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::assemble::assemble;
use crate::graph::policy::EdgeIdentity;
use crate::graph::{Edge, EdgeKind, GraphSnapshot, Node, NodeId};
use crate::{ModgraphError, Result};

/// Depth used when the caller does not pass one.
pub const DEFAULT_MODEL_DEPTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    #[serde(rename = "many2one")]
    Many2one,
    #[serde(rename = "one2many")]
    One2many,
    #[serde(rename = "many2many")]
    Many2many,
}

impl FieldKind {
    pub fn edge_kind(&self) -> EdgeKind {
        match self {
            FieldKind::Many2one => EdgeKind::Many2one,
            FieldKind::One2many => EdgeKind::One2many,
            FieldKind::Many2many => EdgeKind::Many2many,
        }
    }
}

/// A relational field declared on a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Technical name of the comodel, e.g. `res.partner`.
    #[serde(default)]
    pub relation: Option<String>,
}

/// One model entry of a registry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: NodeId,
    /// Human readable name, e.g. `Contact`.
    pub name: String,
    /// Technical name, e.g. `res.partner`.
    pub model: String,
    #[serde(default)]
    pub fields: Vec<RelationalField>,
}

/// Display fields of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    pub name: String,
    pub model: String,
}

/// Source of models and their relational fields.
pub trait ModelResolver {
    fn model_metadata(&self, id: NodeId) -> Result<ModelMetadata>;

    fn relational_fields(&self, id: NodeId) -> Result<Vec<RelationalField>>;

    /// Resolve a technical model name; `None` when no such model is known.
    fn model_by_name(&self, model: &str) -> Result<Option<NodeId>>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryModelResolver {
    models: HashMap<NodeId, ModelRecord>,
    by_name: HashMap<String, NodeId>,
}

impl MemoryModelResolver {
    pub fn from_models(models: impl IntoIterator<Item = ModelRecord>) -> Self {
        let mut resolver = Self::default();
        for model in models {
            resolver.by_name.insert(model.model.clone(), model.id);
            resolver.models.insert(model.id, model);
        }
        resolver
    }

    fn record(&self, id: NodeId) -> Result<&ModelRecord> {
        self.models
            .get(&id)
            .ok_or_else(|| ModgraphError::Resolver(format!("model {} not found", id)))
    }
}

impl ModelResolver for MemoryModelResolver {
    fn model_metadata(&self, id: NodeId) -> Result<ModelMetadata> {
        let record = self.record(id)?;
        Ok(ModelMetadata {
            name: record.name.clone(),
            model: record.model.clone(),
        })
    }

    fn relational_fields(&self, id: NodeId) -> Result<Vec<RelationalField>> {
        Ok(self.record(id)?.fields.clone())
    }

    fn model_by_name(&self, model: &str) -> Result<Option<NodeId>> {
        Ok(self.by_name.get(model).copied())
    }
}

/// Build the relation graph of `seeds` up to `max_depth` hops.
///
/// A model at `max_depth` is emitted but not expanded. Edges carry the field
/// kind as their type and the field name.
pub fn build_model_graph<R: ModelResolver + ?Sized>(
    resolver: &R,
    seeds: &[NodeId],
    max_depth: u32,
) -> Result<GraphSnapshot> {
    let mut visited = HashSet::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    visit_models(resolver, seeds, 0, max_depth, &mut visited, &mut nodes, &mut edges)?;
    log::debug!(
        "Model graph from {:?}: {} nodes, {} edges",
        seeds,
        visited.len(),
        edges.len()
    );
    Ok(assemble(nodes, edges, EdgeIdentity::Endpoints))
}

fn visit_models<R: ModelResolver + ?Sized>(
    resolver: &R,
    ids: &[NodeId],
    depth: u32,
    max_depth: u32,
    visited: &mut HashSet<NodeId>,
    nodes: &mut Vec<Node>,
    edges: &mut Vec<Edge>,
) -> Result<()> {
    for &id in ids {
        if !visited.insert(id) {
            continue;
        }

        let meta = resolver.model_metadata(id)?;
        let mut node = Node::new(id, meta.name, depth);
        node.model = Some(meta.model);
        nodes.push(node);

        if depth >= max_depth {
            continue;
        }

        for field in resolver.relational_fields(id)? {
            let Some(relation) = field.relation.as_deref() else {
                continue;
            };
            let Some(target) = resolver.model_by_name(relation)? else {
                log::debug!("Field {} points at unknown model {}", field.name, relation);
                continue;
            };

            let mut edge = Edge::new(id, target, field.kind.edge_kind());
            edge.field = Some(field.name.clone());
            edges.push(edge);

            if !visited.contains(&target) {
                visit_models(resolver, &[target], depth + 1, max_depth, visited, nodes, edges)?;
            }
        }
    }
    Ok(())
}
