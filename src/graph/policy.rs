//! Traversal policy: depth limit, stop/exclude domains, relation toggles.
//!
//! [`TraversalOptions`] is the loose shape callers send over JSON-RPC or put in
//! config files; [`TraversalPolicy::from_options`] validates it once, before
//! any traversal starts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::domain::Domain;
use crate::graph::resolver::RelationResolver;
use crate::graph::NodeId;
use crate::{ModgraphError, Result};

/// Which way relations are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow declared dependencies/exclusions.
    #[default]
    Forward,
    /// Follow records that declare a dependency/exclusion on the current one.
    Reverse,
}

/// Key used to deduplicate edges in the assembled graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeIdentity {
    /// `(from, to)`: a dependency and an exclusion between the same ordered
    /// pair collapse into whichever was emitted last.
    #[default]
    Endpoints,
    /// `(from, to, type)`: relations of different kinds stay distinct.
    EndpointsAndKind,
}

/// Raw traversal options as received from callers. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalOptions {
    /// `false`, `null` or absent for unlimited, otherwise a non-negative integer.
    #[serde(default)]
    pub max_depth: Option<Value>,
    #[serde(default)]
    pub stop_domains: Option<Value>,
    #[serde(default)]
    pub exclude_domains: Option<Value>,
    #[serde(default)]
    pub include_dependencies: Option<bool>,
    #[serde(default)]
    pub include_exclusions: Option<bool>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub edge_identity: Option<EdgeIdentity>,
}

impl TraversalOptions {
    /// Parse an options object; `null` means defaults.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| ModgraphError::InvalidInput(format!("invalid options: {}", e))),
            other => Err(ModgraphError::InvalidInput(format!(
                "options must be an object, got {}",
                other
            ))),
        }
    }
}

/// Validated, immutable-per-call traversal configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalPolicy {
    pub max_depth: Option<u32>,
    pub stop_domains: Vec<Domain>,
    pub exclude_domains: Vec<Domain>,
    pub include_dependencies: bool,
    pub include_exclusions: bool,
    pub direction: Direction,
    pub edge_identity: EdgeIdentity,
}

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            max_depth: None,
            stop_domains: Vec::new(),
            exclude_domains: Vec::new(),
            include_dependencies: true,
            include_exclusions: true,
            direction: Direction::Forward,
            edge_identity: EdgeIdentity::Endpoints,
        }
    }
}

impl TraversalPolicy {
    pub fn from_options(options: &TraversalOptions) -> Result<Self> {
        Ok(Self {
            max_depth: parse_max_depth(options.max_depth.as_ref())?,
            stop_domains: parse_domains("stop_domains", options.stop_domains.as_ref())?,
            exclude_domains: parse_domains("exclude_domains", options.exclude_domains.as_ref())?,
            include_dependencies: options.include_dependencies.unwrap_or(true),
            include_exclusions: options.include_exclusions.unwrap_or(true),
            direction: options.direction.unwrap_or_default(),
            edge_identity: options.edge_identity.unwrap_or_default(),
        })
    }

    /// Validate a JSON options object straight into a policy.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::from_options(&TraversalOptions::from_value(value)?)
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn stop_when(mut self, domain: Domain) -> Self {
        self.stop_domains.push(domain);
        self
    }

    pub fn exclude_when(mut self, domain: Domain) -> Self {
        self.exclude_domains.push(domain);
        self
    }

    pub fn with_dependencies(mut self, include: bool) -> Self {
        self.include_dependencies = include;
        self
    }

    pub fn with_exclusions(mut self, include: bool) -> Self {
        self.include_exclusions = include;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_edge_identity(mut self, identity: EdgeIdentity) -> Self {
        self.edge_identity = identity;
        self
    }

    /// Whether `depth` lies past the configured horizon.
    pub fn beyond_max_depth(&self, depth: u32) -> bool {
        self.max_depth.map_or(false, |max| depth > max)
    }

    /// Any stop domain matches: emit the node but do not descend.
    pub fn should_stop<R: RelationResolver + ?Sized>(&self, resolver: &R, id: NodeId) -> bool {
        any_domain_matches("stop", &self.stop_domains, resolver, id)
    }

    /// Any exclude domain matches: drop the candidate and its edge.
    pub fn is_excluded<R: RelationResolver + ?Sized>(&self, resolver: &R, id: NodeId) -> bool {
        any_domain_matches("exclude", &self.exclude_domains, resolver, id)
    }
}

fn any_domain_matches<R: RelationResolver + ?Sized>(
    kind: &str,
    domains: &[Domain],
    resolver: &R,
    id: NodeId,
) -> bool {
    for domain in domains {
        match resolver.matches_domain(id, domain) {
            Ok(true) => return true,
            Ok(false) => {}
            // Fail open: a broken filter must not abort the traversal.
            Err(e) => log::error!("Error processing {} domain {} for node {}: {}", kind, domain, id, e),
        }
    }
    false
}

fn parse_max_depth(value: Option<&Value>) -> Result<Option<u32>> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|depth| u32::try_from(depth).ok())
            .map(Some)
            .ok_or_else(|| {
                ModgraphError::InvalidInput(format!(
                    "max_depth must be a non-negative integer, got {}",
                    n
                ))
            }),
        Some(other) => Err(ModgraphError::InvalidInput(format!(
            "max_depth must be a non-negative integer or false, got {}",
            other
        ))),
    }
}

fn parse_domains(name: &str, value: Option<&Value>) -> Result<Vec<Domain>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(entries
            .iter()
            .filter_map(|entry| {
                let domain = Domain::from_value(entry);
                if domain.is_none() {
                    log::warn!("Skipping {} entry that is not a list: {}", name, entry);
                }
                domain
            })
            .collect()),
        Some(other) => Err(ModgraphError::InvalidInput(format!(
            "{} must be a list of domains, got {}",
            name, other
        ))),
    }
}

/// Boundary check for seed ids: a JSON list of integers.
pub fn validate_seed_ids(value: &Value) -> Result<Vec<NodeId>> {
    let items = value.as_array().ok_or_else(|| {
        ModgraphError::InvalidInput("module_ids must be a list of integers".to_string())
    })?;
    items
        .iter()
        .map(|item| {
            item.as_i64().ok_or_else(|| {
                ModgraphError::InvalidInput(format!(
                    "module_ids must be a list of integers, found {}",
                    item
                ))
            })
        })
        .collect()
}
