pub mod config;
pub mod error;
pub mod db;
pub mod ingest;
pub mod cache;
pub mod graph;

pub use config::Config;
pub use error::{ModgraphError, Result};
pub use graph::{build_model_graph, build_module_graph, build_reverse_graph, GraphSnapshot, TraversalPolicy};
