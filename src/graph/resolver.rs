//! Relation lookup capability consumed by the traversal engine.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::domain::{Domain, DomainRecord};
use crate::graph::models::ModelRecord;
use crate::graph::NodeId;
use crate::{ModgraphError, Result};

/// Display fields of a record, copied onto the node built for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMetadata {
    pub label: String,
    pub state: Option<String>,
    pub category: Option<String>,
    pub category_id: Option<NodeId>,
    pub is_custom: Option<bool>,
}

/// Source of relation edges and record metadata.
///
/// Implemented by whatever owns the records (an ORM, a registry file, a
/// cache in front of either). Lookups for unknown ids should fail with
/// [`ModgraphError::Resolver`]; the engine aborts the traversal on any
/// lookup error.
pub trait RelationResolver {
    /// Records `id` depends on.
    fn dependencies(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Records `id` declares as mutually exclusive with itself.
    fn exclusions(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Records that declare a dependency on `id`.
    fn reverse_dependents(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Records that declare an exclusion of `id`.
    fn reverse_excluders(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Evaluate a stop/exclude domain against record `id`.
    fn matches_domain(&self, id: NodeId, domain: &Domain) -> Result<bool>;

    fn node_metadata(&self, id: NodeId) -> Result<NodeMetadata>;
}

/// One module entry of a registry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_id: Option<NodeId>,
    #[serde(default)]
    pub is_custom: Option<bool>,
    #[serde(default)]
    pub depends: Vec<NodeId>,
    #[serde(default)]
    pub excludes: Vec<NodeId>,
}

impl ModuleRecord {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: Some("installed".to_string()),
            category: None,
            category_id: None,
            is_custom: None,
            depends: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.depends.extend(ids);
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.excludes.extend(ids);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_category(mut self, id: NodeId, name: impl Into<String>) -> Self {
        self.category_id = Some(id);
        self.category = Some(name.into());
        self
    }

    pub fn custom(mut self, is_custom: bool) -> Self {
        self.is_custom = Some(is_custom);
        self
    }
}

impl DomainRecord for ModuleRecord {
    fn field_value(&self, field: &str) -> Result<Value> {
        let value = match field {
            "id" => Value::from(self.id),
            "name" => Value::from(self.name.clone()),
            "state" => self.state.clone().map(Value::from).unwrap_or(Value::Null),
            "category" => self.category.clone().map(Value::from).unwrap_or(Value::Null),
            "category_id" => self.category_id.map(Value::from).unwrap_or(Value::Null),
            "is_custom" => self.is_custom.map(Value::from).unwrap_or(Value::Null),
            other => {
                return Err(ModgraphError::Predicate(format!(
                    "unknown module field '{}'",
                    other
                )))
            }
        };
        Ok(value)
    }
}

/// On-disk catalog of modules and models, read by the `modgraph` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
    #[serde(default)]
    pub models: Vec<ModelRecord>,
}

impl Registry {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let registry: Registry = serde_json::from_str(&raw).map_err(|e| {
            ModgraphError::Parse(format!(
                "invalid registry file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(registry)
    }
}

/// Resolver over an in-memory module catalog with a prebuilt reverse index.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    order: Vec<NodeId>,
    modules: HashMap<NodeId, ModuleRecord>,
    dependents: HashMap<NodeId, Vec<NodeId>>,
    excluders: HashMap<NodeId, Vec<NodeId>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modules(modules: impl IntoIterator<Item = ModuleRecord>) -> Self {
        let mut resolver = Self::new();
        for module in modules {
            resolver.insert(module);
        }
        resolver.rebuild_reverse_index();
        resolver
    }

    pub fn from_registry(registry: &Registry) -> Self {
        Self::from_modules(registry.modules.iter().cloned())
    }

    /// Add or replace a module and refresh the reverse index.
    pub fn add_module(&mut self, module: ModuleRecord) {
        self.insert(module);
        self.rebuild_reverse_index();
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn insert(&mut self, module: ModuleRecord) {
        if !self.modules.contains_key(&module.id) {
            self.order.push(module.id);
        }
        self.modules.insert(module.id, module);
    }

    fn rebuild_reverse_index(&mut self) {
        self.dependents.clear();
        self.excluders.clear();
        for id in &self.order {
            let module = &self.modules[id];
            for dep in &module.depends {
                self.dependents.entry(*dep).or_default().push(module.id);
            }
            for excluded in &module.excludes {
                self.excluders.entry(*excluded).or_default().push(module.id);
            }
        }
    }

    fn module(&self, id: NodeId) -> Result<&ModuleRecord> {
        self.modules
            .get(&id)
            .ok_or_else(|| ModgraphError::Resolver(format!("module {} not found", id)))
    }
}

impl RelationResolver for MemoryResolver {
    fn dependencies(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.module(id)?.depends.clone())
    }

    fn exclusions(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.module(id)?.excludes.clone())
    }

    fn reverse_dependents(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.module(id)?;
        Ok(self.dependents.get(&id).cloned().unwrap_or_default())
    }

    fn reverse_excluders(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.module(id)?;
        Ok(self.excluders.get(&id).cloned().unwrap_or_default())
    }

    fn matches_domain(&self, id: NodeId, domain: &Domain) -> Result<bool> {
        domain.evaluate(self.module(id)?)
    }

    fn node_metadata(&self, id: NodeId) -> Result<NodeMetadata> {
        let module = self.module(id)?;
        Ok(NodeMetadata {
            label: module.name.clone(),
            state: module.state.clone(),
            category: module.category.clone(),
            category_id: module.category_id,
            is_custom: module.is_custom,
        })
    }
}
