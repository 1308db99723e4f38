//! Depth-bounded DFS over module relations with active-path cycle detection.
//!
//! The engine is a single recursive walker parameterized by a
//! [`RelationStrategy`], which decides where related records come from and
//! which way the emitted edges point. Stop/exclude decisions come from the
//! [`TraversalPolicy`].
//!
//! Only ancestors on the current branch block a revisit. A record reachable
//! through two independent branches is expanded once per branch, so total
//! work grows with the number of paths, not the number of records. Callers
//! facing wide graphs should set `max_depth`.

use std::collections::HashSet;

use crate::graph::assemble::assemble;
use crate::graph::cycles::{annotate_cycles, CycleRegistry};
use crate::graph::policy::{Direction, TraversalPolicy};
use crate::graph::resolver::RelationResolver;
use crate::graph::{Edge, EdgeKind, GraphSnapshot, Node, NodeId};
use crate::Result;

/// The two relation families a module declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Dependency,
    Exclusion,
}

/// Where related records come from and how edges to them are oriented.
pub trait RelationStrategy {
    fn related<R: RelationResolver + ?Sized>(
        &self,
        resolver: &R,
        kind: RelationKind,
        id: NodeId,
    ) -> Result<Vec<NodeId>>;

    fn edge(&self, kind: RelationKind, current: NodeId, related: NodeId) -> Edge;
}

/// Declared relations: `current -> related`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forward;

impl RelationStrategy for Forward {
    fn related<R: RelationResolver + ?Sized>(
        &self,
        resolver: &R,
        kind: RelationKind,
        id: NodeId,
    ) -> Result<Vec<NodeId>> {
        match kind {
            RelationKind::Dependency => resolver.dependencies(id),
            RelationKind::Exclusion => resolver.exclusions(id),
        }
    }

    fn edge(&self, kind: RelationKind, current: NodeId, related: NodeId) -> Edge {
        match kind {
            RelationKind::Dependency => Edge::new(current, related, EdgeKind::Dependency),
            RelationKind::Exclusion => Edge::new(current, related, EdgeKind::Exclusion),
        }
    }
}

/// Inverse relations: records pointing at `current`, edges `related -> current`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse;

impl RelationStrategy for Reverse {
    fn related<R: RelationResolver + ?Sized>(
        &self,
        resolver: &R,
        kind: RelationKind,
        id: NodeId,
    ) -> Result<Vec<NodeId>> {
        match kind {
            RelationKind::Dependency => resolver.reverse_dependents(id),
            RelationKind::Exclusion => resolver.reverse_excluders(id),
        }
    }

    fn edge(&self, kind: RelationKind, current: NodeId, related: NodeId) -> Edge {
        match kind {
            RelationKind::Dependency => Edge::new(related, current, EdgeKind::ReverseDependency),
            RelationKind::Exclusion => Edge::new(related, current, EdgeKind::ReverseExclusion),
        }
    }
}

/// Mutable state shared by every recursive step of one top-level traversal.
#[derive(Debug, Default)]
pub struct TraversalContext {
    /// Ancestors on the current DFS branch.
    path: Vec<NodeId>,
    visited: HashSet<NodeId>,
    cycles: CycleRegistry,
}

impl TraversalContext {
    pub fn visited(&self) -> &HashSet<NodeId> {
        &self.visited
    }

    pub fn cycles(&self) -> &CycleRegistry {
        &self.cycles
    }
}

/// Recursive graph builder over a resolver, a policy and a strategy.
pub struct GraphTraversalEngine<'a, R: ?Sized, S> {
    resolver: &'a R,
    policy: &'a TraversalPolicy,
    strategy: S,
}

impl<'a, R, S> GraphTraversalEngine<'a, R, S>
where
    R: RelationResolver + ?Sized,
    S: RelationStrategy,
{
    pub fn new(resolver: &'a R, policy: &'a TraversalPolicy, strategy: S) -> Self {
        Self {
            resolver,
            policy,
            strategy,
        }
    }

    /// Traverse from `seeds` and return the cycle-annotated, deduplicated graph.
    pub fn traverse(&self, seeds: &[NodeId]) -> Result<GraphSnapshot> {
        let mut ctx = TraversalContext::default();
        let snapshot = self.visit(seeds, 0, &mut ctx)?;
        log::debug!(
            "Traversal from {:?}: {} nodes, {} edges, {} cycles, {} records entered",
            seeds,
            snapshot.nodes.len(),
            snapshot.edges.len(),
            ctx.cycles.len(),
            ctx.visited.len()
        );
        Ok(snapshot)
    }

    fn visit(&self, ids: &[NodeId], depth: u32, ctx: &mut TraversalContext) -> Result<GraphSnapshot> {
        if ids.is_empty() || self.policy.beyond_max_depth(depth) {
            return Ok(GraphSnapshot::default());
        }

        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for &id in ids {
            if ctx.path.contains(&id) {
                if let Some(cycle_id) = ctx.cycles.record(&ctx.path, id) {
                    log::debug!("Cycle {} closed by revisiting node {}", cycle_id, id);
                }
                continue;
            }

            ctx.path.push(id);
            ctx.visited.insert(id);
            let expanded = self.expand(id, depth, ctx, &mut nodes, &mut edges);
            ctx.path.pop();
            expanded?;
        }

        if depth == 0 && !ctx.cycles.is_empty() {
            annotate_cycles(&mut nodes, &mut edges, &ctx.cycles);
        }

        Ok(assemble(nodes, edges, self.policy.edge_identity))
    }

    /// Emit `id` and, unless a stop domain matches, its relations and subtrees.
    fn expand(
        &self,
        id: NodeId,
        depth: u32,
        ctx: &mut TraversalContext,
        nodes: &mut Vec<Node>,
        edges: &mut Vec<Edge>,
    ) -> Result<()> {
        nodes.push(self.build_node(id, depth)?);

        if self.policy.should_stop(self.resolver, id) {
            return Ok(());
        }

        for kind in [RelationKind::Dependency, RelationKind::Exclusion] {
            let enabled = match kind {
                RelationKind::Dependency => self.policy.include_dependencies,
                RelationKind::Exclusion => self.policy.include_exclusions,
            };
            if !enabled {
                continue;
            }

            let mut targets = Vec::new();
            for related in self.strategy.related(self.resolver, kind, id)? {
                if self.policy.is_excluded(self.resolver, related) {
                    continue;
                }
                edges.push(self.strategy.edge(kind, id, related));
                targets.push(related);
            }

            if !targets.is_empty() {
                let sub = self.visit(&targets, depth + 1, ctx)?;
                nodes.extend(sub.nodes);
                edges.extend(sub.edges);
            }
        }

        Ok(())
    }

    fn build_node(&self, id: NodeId, depth: u32) -> Result<Node> {
        let meta = self.resolver.node_metadata(id)?;
        let mut node = Node::new(id, meta.label, depth);
        node.state = meta.state;
        if meta.category_id.is_some() {
            node.category = meta.category;
            node.category_id = meta.category_id;
        }
        node.is_custom = meta.is_custom;
        Ok(node)
    }
}

/// Seed nodes only, no edges: the `max_depth == 0` answer.
fn seed_nodes<R: RelationResolver + ?Sized>(
    resolver: &R,
    seeds: &[NodeId],
    policy: &TraversalPolicy,
) -> Result<GraphSnapshot> {
    let mut nodes = Vec::with_capacity(seeds.len());
    for &id in seeds {
        let meta = resolver.node_metadata(id)?;
        let mut node = Node::new(id, meta.label, 0);
        node.state = meta.state;
        nodes.push(node);
    }
    Ok(assemble(nodes, Vec::new(), policy.edge_identity))
}

/// Build a graph in the direction the policy asks for.
pub fn build_graph<R: RelationResolver + ?Sized>(
    resolver: &R,
    seeds: &[NodeId],
    policy: &TraversalPolicy,
) -> Result<GraphSnapshot> {
    if policy.max_depth == Some(0) {
        return seed_nodes(resolver, seeds, policy);
    }
    match policy.direction {
        Direction::Forward => GraphTraversalEngine::new(resolver, policy, Forward).traverse(seeds),
        Direction::Reverse => GraphTraversalEngine::new(resolver, policy, Reverse).traverse(seeds),
    }
}

/// Dependency graph: what the seeds depend on or exclude.
pub fn build_module_graph<R: RelationResolver + ?Sized>(
    resolver: &R,
    seeds: &[NodeId],
    policy: &TraversalPolicy,
) -> Result<GraphSnapshot> {
    let policy = policy.clone().with_direction(Direction::Forward);
    build_graph(resolver, seeds, &policy)
}

/// Reverse dependency graph: what depends on or excludes the seeds.
pub fn build_reverse_graph<R: RelationResolver + ?Sized>(
    resolver: &R,
    seeds: &[NodeId],
    policy: &TraversalPolicy,
) -> Result<GraphSnapshot> {
    let policy = policy.clone().with_direction(Direction::Reverse);
    build_graph(resolver, seeds, &policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::domain::Domain;
    use crate::graph::policy::EdgeIdentity;
    use crate::graph::resolver::{MemoryResolver, ModuleRecord, NodeMetadata};
    use crate::graph::{EdgeType, NodeType};
    use crate::ModgraphError;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::{BTreeSet, HashMap};

    fn node_ids(snapshot: &GraphSnapshot) -> BTreeSet<NodeId> {
        snapshot.nodes.iter().map(|n| n.id).collect()
    }

    fn edge_pairs(snapshot: &GraphSnapshot) -> BTreeSet<(NodeId, NodeId)> {
        snapshot.edges.iter().map(|e| (e.from, e.to)).collect()
    }

    /// Counts dependency lookups per node.
    struct CountingResolver {
        inner: MemoryResolver,
        lookups: RefCell<HashMap<NodeId, usize>>,
    }

    impl CountingResolver {
        fn lookups(&self, id: NodeId) -> usize {
            self.lookups.borrow().get(&id).copied().unwrap_or(0)
        }
    }

    impl RelationResolver for CountingResolver {
        fn dependencies(&self, id: NodeId) -> Result<Vec<NodeId>> {
            *self.lookups.borrow_mut().entry(id).or_default() += 1;
            self.inner.dependencies(id)
        }
        fn exclusions(&self, id: NodeId) -> Result<Vec<NodeId>> {
            self.inner.exclusions(id)
        }
        fn reverse_dependents(&self, id: NodeId) -> Result<Vec<NodeId>> {
            self.inner.reverse_dependents(id)
        }
        fn reverse_excluders(&self, id: NodeId) -> Result<Vec<NodeId>> {
            self.inner.reverse_excluders(id)
        }
        fn matches_domain(&self, id: NodeId, domain: &Domain) -> Result<bool> {
            self.inner.matches_domain(id, domain)
        }
        fn node_metadata(&self, id: NodeId) -> Result<NodeMetadata> {
            self.inner.node_metadata(id)
        }
    }

    #[test]
    fn test_empty_seeds() {
        let resolver = MemoryResolver::new();
        let snapshot = build_module_graph(&resolver, &[], &TraversalPolicy::default()).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_max_depth_zero_returns_bare_seeds() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base").with_category(7, "Hidden"),
            ModuleRecord::new(2, "web").depends_on([1]),
            ModuleRecord::new(3, "sale").depends_on([2]),
        ]);
        let policy = TraversalPolicy::default().with_max_depth(0);
        for snapshot in [
            build_module_graph(&resolver, &[3, 1], &policy).unwrap(),
            build_reverse_graph(&resolver, &[3, 1], &policy).unwrap(),
        ] {
            assert_eq!(node_ids(&snapshot), BTreeSet::from([1, 3]));
            assert!(snapshot.edges.is_empty());
            let base = snapshot.node(1).unwrap();
            assert_eq!(base.depth, 0);
            assert_eq!(base.state.as_deref(), Some("installed"));
            assert_eq!(base.category, None);
        }
    }

    #[test]
    fn test_acyclic_closure_without_depth_limit() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base"),
            ModuleRecord::new(2, "web").depends_on([1]),
            ModuleRecord::new(3, "mail").depends_on([1, 2]),
            ModuleRecord::new(4, "sale").depends_on([3]).excluding([5]),
            ModuleRecord::new(5, "sale_lite").depends_on([1]),
            ModuleRecord::new(6, "unrelated"),
        ]);
        let snapshot = build_module_graph(&resolver, &[4], &TraversalPolicy::default()).unwrap();

        assert_eq!(node_ids(&snapshot), BTreeSet::from([1, 2, 3, 4, 5]));
        assert!(snapshot.nodes.iter().all(|n| !n.is_in_cycle()));
        assert!(snapshot.edges.iter().all(|e| !e.is_in_cycle()));
        assert_eq!(snapshot.edge(4, 5).unwrap().kind, EdgeKind::Exclusion);
        assert_eq!(snapshot.edge(3, 2).unwrap().kind, EdgeKind::Dependency);
        assert_eq!(snapshot.node(4).unwrap().depth, 0);
        assert_eq!(snapshot.node(3).unwrap().depth, 1);
    }

    #[test]
    fn test_two_node_cycle() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "a").depends_on([2]),
            ModuleRecord::new(2, "b").depends_on([1]),
        ]);
        let snapshot = build_module_graph(&resolver, &[1], &TraversalPolicy::default()).unwrap();

        assert_eq!(node_ids(&snapshot), BTreeSet::from([1, 2]));
        let a = snapshot.node(1).unwrap();
        let b = snapshot.node(2).unwrap();
        assert!(a.is_in_cycle() && b.is_in_cycle());
        assert_eq!(a.cycle_id, Some(1));
        assert_eq!(a.cycle_id, b.cycle_id);
        assert_eq!(a.node_type, Some(NodeType::CycleNode));

        assert_eq!(snapshot.edges.len(), 2);
        for (from, to) in [(1, 2), (2, 1)] {
            let edge = snapshot.edge(from, to).unwrap();
            assert!(edge.is_in_cycle());
            assert_eq!(edge.cycle_id, Some(1));
            assert_eq!(edge.edge_type, Some(EdgeType::CycleDirection));
        }
    }

    #[test]
    fn test_two_cycles_get_distinct_ids_in_one_request() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "hub").depends_on([2, 3]),
            ModuleRecord::new(2, "left").depends_on([1]),
            ModuleRecord::new(3, "right").depends_on([1]),
        ]);
        let snapshot = build_module_graph(&resolver, &[1], &TraversalPolicy::default()).unwrap();

        assert_eq!(snapshot.cycle_ids(), vec![1, 2]);
        // The hub closes both cycles and keeps the later id.
        assert_eq!(snapshot.node(1).unwrap().cycle_id, Some(2));
        assert_eq!(snapshot.node(2).unwrap().cycle_id, Some(1));
        assert_eq!(snapshot.node(3).unwrap().cycle_id, Some(2));

        for ((from, to), cycle_id) in [((1, 2), 1), ((2, 1), 1), ((1, 3), 2), ((3, 1), 2)] {
            let edge = snapshot.edge(from, to).unwrap();
            assert!(edge.is_in_cycle(), "edge {}->{} should be marked", from, to);
            assert_eq!(edge.cycle_id, Some(cycle_id), "edge {}->{}", from, to);
            assert_eq!(edge.edge_type, Some(EdgeType::CycleDirection));
        }
    }

    #[test]
    fn test_cycle_behind_tail_only_marks_members() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(10, "entry").depends_on([1]),
            ModuleRecord::new(1, "a").depends_on([2]),
            ModuleRecord::new(2, "b").depends_on([3]),
            ModuleRecord::new(3, "c").depends_on([1]),
        ]);
        let snapshot = build_module_graph(&resolver, &[10], &TraversalPolicy::default()).unwrap();

        assert!(!snapshot.node(10).unwrap().is_in_cycle());
        assert!(!snapshot.edge(10, 1).unwrap().is_in_cycle());
        for id in [1, 2, 3] {
            assert_eq!(snapshot.node(id).unwrap().cycle_id, Some(1));
        }
        for (from, to) in [(1, 2), (2, 3), (3, 1)] {
            assert!(snapshot.edge(from, to).unwrap().is_in_cycle());
        }
        assert_eq!(snapshot.cycle_ids(), vec![1]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let resolver = MemoryResolver::from_modules(vec![ModuleRecord::new(1, "loop").depends_on([1])]);
        let snapshot = build_module_graph(&resolver, &[1], &TraversalPolicy::default()).unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.node(1).unwrap().is_in_cycle());
        assert!(snapshot.edge(1, 1).unwrap().is_in_cycle());
    }

    #[test]
    fn test_excluded_node_never_appears() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base"),
            ModuleRecord::new(2, "test_helpers").depends_on([1]),
            ModuleRecord::new(3, "web").depends_on([1, 2]),
            ModuleRecord::new(4, "sale").depends_on([3, 2]),
        ]);
        let policy = TraversalPolicy::default()
            .exclude_when(Domain::from_value(&json!([["name", "=like", "test_%"]])).unwrap());
        let snapshot = build_module_graph(&resolver, &[4], &policy).unwrap();

        assert_eq!(node_ids(&snapshot), BTreeSet::from([1, 3, 4]));
        assert!(snapshot.edges.iter().all(|e| e.from != 2 && e.to != 2));
    }

    #[test]
    fn test_stop_domain_keeps_node_without_outgoing_edges() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base"),
            ModuleRecord::new(2, "web").depends_on([1]).with_state("to upgrade"),
            ModuleRecord::new(3, "sale").depends_on([2]),
        ]);
        let policy = TraversalPolicy::default()
            .stop_when(Domain::from_value(&json!([["state", "=", "to upgrade"]])).unwrap());
        let snapshot = build_module_graph(&resolver, &[3], &policy).unwrap();

        assert_eq!(node_ids(&snapshot), BTreeSet::from([2, 3]));
        assert!(snapshot.edges.iter().all(|e| e.from != 2));
        assert!(snapshot.edge(3, 2).is_some());
    }

    #[test]
    fn test_reverse_edges_transpose_forward_traversal() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base"),
            ModuleRecord::new(2, "web").depends_on([1]),
            ModuleRecord::new(3, "sale").depends_on([2]).excluding([1]),
        ]);
        let policy = TraversalPolicy::default();
        let forward = build_module_graph(&resolver, &[3], &policy).unwrap();
        let reverse = build_reverse_graph(&resolver, &[1], &policy).unwrap();

        assert_eq!(edge_pairs(&forward), edge_pairs(&reverse));
        assert_eq!(reverse.edge(2, 1).unwrap().kind, EdgeKind::ReverseDependency);
        assert_eq!(reverse.edge(3, 2).unwrap().kind, EdgeKind::ReverseDependency);
        assert_eq!(reverse.edge(3, 1).unwrap().kind, EdgeKind::ReverseExclusion);
        assert_eq!(reverse.node(1).unwrap().depth, 0);
    }

    #[test]
    fn test_shared_dependency_from_two_seeds() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "a").depends_on([3]),
            ModuleRecord::new(2, "b").depends_on([3]),
            ModuleRecord::new(3, "c"),
        ]);
        let policy = TraversalPolicy::default().with_max_depth(5);
        let snapshot = build_module_graph(&resolver, &[1, 2], &policy).unwrap();

        assert_eq!(snapshot.nodes.iter().filter(|n| n.id == 3).count(), 1);
        assert_eq!(edge_pairs(&snapshot), BTreeSet::from([(1, 3), (2, 3)]));
    }

    #[test]
    fn test_depth_limit_is_strict_greater_than() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "a").depends_on([2]),
            ModuleRecord::new(2, "b").depends_on([3]),
            ModuleRecord::new(3, "c"),
        ]);
        let policy = TraversalPolicy::default().with_max_depth(1);
        let snapshot = build_module_graph(&resolver, &[1], &policy).unwrap();

        assert_eq!(node_ids(&snapshot), BTreeSet::from([1, 2]));
        // The last expanded level still reports edges to the next one.
        assert_eq!(edge_pairs(&snapshot), BTreeSet::from([(1, 2), (2, 3)]));
    }

    #[test]
    fn test_relation_toggles() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base"),
            ModuleRecord::new(2, "lite"),
            ModuleRecord::new(3, "sale").depends_on([1]).excluding([2]),
        ]);
        let only_deps = TraversalPolicy::default().with_exclusions(false);
        let snapshot = build_module_graph(&resolver, &[3], &only_deps).unwrap();
        assert_eq!(node_ids(&snapshot), BTreeSet::from([1, 3]));

        let only_excl = TraversalPolicy::default().with_dependencies(false);
        let snapshot = build_module_graph(&resolver, &[3], &only_excl).unwrap();
        assert_eq!(node_ids(&snapshot), BTreeSet::from([2, 3]));
        assert_eq!(snapshot.edge(3, 2).unwrap().kind, EdgeKind::Exclusion);
    }

    #[test]
    fn test_same_pair_dependency_and_exclusion() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base"),
            ModuleRecord::new(2, "odd").depends_on([1]).excluding([1]),
        ]);
        let collapsed = build_module_graph(&resolver, &[2], &TraversalPolicy::default()).unwrap();
        assert_eq!(collapsed.edges.len(), 1);
        assert_eq!(collapsed.edges[0].kind, EdgeKind::Exclusion);

        let strict = TraversalPolicy::default().with_edge_identity(EdgeIdentity::EndpointsAndKind);
        let typed = build_module_graph(&resolver, &[2], &strict).unwrap();
        assert_eq!(typed.edges.len(), 2);
    }

    #[test]
    fn test_independent_branches_are_expanded_each_time() {
        let resolver = CountingResolver {
            inner: MemoryResolver::from_modules(vec![
                ModuleRecord::new(1, "root").depends_on([2, 4]),
                ModuleRecord::new(2, "mid").depends_on([4]),
                ModuleRecord::new(4, "leaf"),
            ]),
            lookups: RefCell::new(HashMap::new()),
        };
        let snapshot = build_module_graph(&resolver, &[1], &TraversalPolicy::default()).unwrap();

        assert_eq!(resolver.lookups(4), 2);
        assert_eq!(snapshot.nodes.iter().filter(|n| n.id == 4).count(), 1);
        // Last occurrence wins: reached directly from the root at depth 1.
        assert_eq!(snapshot.node(4).unwrap().depth, 1);
        assert!(snapshot.nodes.iter().all(|n| !n.is_in_cycle()));
    }

    #[test]
    fn test_category_fields_follow_metadata() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base").with_category(4, "Hidden").custom(false),
            ModuleRecord::new(2, "x_custom").depends_on([1]).custom(true),
        ]);
        let snapshot = build_module_graph(&resolver, &[2], &TraversalPolicy::default()).unwrap();
        let base = snapshot.node(1).unwrap();
        assert_eq!(base.category.as_deref(), Some("Hidden"));
        assert_eq!(base.category_id, Some(4));
        assert_eq!(base.is_custom, Some(false));
        let custom = snapshot.node(2).unwrap();
        assert_eq!(custom.category, None);
        assert_eq!(custom.is_custom, Some(true));
    }

    #[test]
    fn test_resolver_error_aborts_traversal() {
        let resolver = MemoryResolver::from_modules(vec![ModuleRecord::new(1, "base").depends_on([99])]);
        let result = build_module_graph(&resolver, &[1], &TraversalPolicy::default());
        assert!(matches!(result, Err(ModgraphError::Resolver(_))));
    }

    #[test]
    fn test_engine_can_be_driven_directly() {
        let resolver = MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "a").depends_on([2]),
            ModuleRecord::new(2, "b").depends_on([1]),
        ]);
        let policy = TraversalPolicy::default();
        let engine = GraphTraversalEngine::new(&resolver, &policy, Reverse);
        let snapshot = engine.traverse(&[2]).unwrap();
        assert_eq!(snapshot.edge(1, 2).unwrap().kind, EdgeKind::ReverseDependency);
        assert!(snapshot.nodes.iter().all(|n| n.is_in_cycle()));
    }
}
