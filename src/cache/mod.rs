pub mod relation_cache;

pub use relation_cache::RelationCache;
