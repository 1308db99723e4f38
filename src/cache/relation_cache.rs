use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::graph::{Domain, NodeId, NodeMetadata, RelationResolver};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lookup {
    Dependencies,
    Exclusions,
    ReverseDependents,
    ReverseExcluders,
}

/// LRU cache in front of a [`RelationResolver`]
///
/// Independent DFS branches ask for the same records over and over; wrapping
/// an expensive resolver (a database, an RPC client) for the duration of one
/// request turns those repeats into memory hits. Domain evaluation is passed
/// straight through.
pub struct RelationCache<R> {
    inner: R,
    relations: Mutex<LruCache<(Lookup, NodeId), Vec<NodeId>>>,
    metadata: Mutex<LruCache<NodeId, NodeMetadata>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<R: RelationResolver> RelationCache<R> {
    /// Wrap `inner`, keeping at most `capacity` entries per lookup kind
    /// (a capacity of 0 is treated as 1)
    pub fn new(inner: R, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            relations: Mutex::new(LruCache::new(cap)),
            metadata: Mutex::new(LruCache::new(cap)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        lock(&self.relations).clear();
        lock(&self.metadata).clear();
    }

    fn relation(
        &self,
        lookup: Lookup,
        id: NodeId,
        fetch: impl FnOnce(&R) -> Result<Vec<NodeId>>,
    ) -> Result<Vec<NodeId>> {
        if let Some(cached) = lock(&self.relations).get(&(lookup, id)).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // Errors are not cached, the next call retries the lookup.
        let fresh = fetch(&self.inner)?;
        lock(&self.relations).put((lookup, id), fresh.clone());
        Ok(fresh)
    }
}

impl<R: RelationResolver> RelationResolver for RelationCache<R> {
    fn dependencies(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.relation(Lookup::Dependencies, id, |r| r.dependencies(id))
    }

    fn exclusions(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.relation(Lookup::Exclusions, id, |r| r.exclusions(id))
    }

    fn reverse_dependents(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.relation(Lookup::ReverseDependents, id, |r| r.reverse_dependents(id))
    }

    fn reverse_excluders(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.relation(Lookup::ReverseExcluders, id, |r| r.reverse_excluders(id))
    }

    fn matches_domain(&self, id: NodeId, domain: &Domain) -> Result<bool> {
        self.inner.matches_domain(id, domain)
    }

    fn node_metadata(&self, id: NodeId) -> Result<NodeMetadata> {
        if let Some(cached) = lock(&self.metadata).get(&id).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let fresh = self.inner.node_metadata(id)?;
        lock(&self.metadata).put(id, fresh.clone());
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::resolver::{MemoryResolver, ModuleRecord};
    use crate::graph::{build_module_graph, TraversalPolicy};

    fn resolver() -> MemoryResolver {
        MemoryResolver::from_modules(vec![
            ModuleRecord::new(1, "base"),
            ModuleRecord::new(2, "web").depends_on([1]),
            ModuleRecord::new(3, "mail").depends_on([1, 2]),
        ])
    }

    #[test]
    fn test_repeat_lookup_is_a_hit() {
        let cache = RelationCache::new(resolver(), 10);
        assert_eq!(cache.dependencies(3).unwrap(), vec![1, 2]);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.dependencies(3).unwrap(), vec![1, 2]);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_lookup_kinds_are_cached_separately() {
        let cache = RelationCache::new(resolver(), 10);
        cache.dependencies(1).unwrap();
        assert_eq!(cache.reverse_dependents(1).unwrap(), vec![2, 3]);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = RelationCache::new(resolver(), 10);
        assert!(cache.dependencies(99).is_err());
        assert!(cache.dependencies(99).is_err());
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_eviction_and_clear() {
        let cache = RelationCache::new(resolver(), 1);
        cache.node_metadata(1).unwrap();
        cache.node_metadata(2).unwrap();
        cache.node_metadata(1).unwrap();
        assert_eq!(cache.hits(), 0);

        cache.node_metadata(1).unwrap();
        assert_eq!(cache.hits(), 1);
        cache.clear();
        cache.node_metadata(1).unwrap();
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_cached_traversal_matches_uncached() {
        let policy = TraversalPolicy::default();
        let plain = build_module_graph(&resolver(), &[3], &policy).unwrap();
        let cache = RelationCache::new(resolver(), 16);
        let cached = build_module_graph(&cache, &[3], &policy).unwrap();
        assert_eq!(plain, cached);
        // Node 1 is reached from 3 and from 2.
        assert!(cache.hits() > 0);
    }
}
