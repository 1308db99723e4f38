//! Ingestion: pull a traversal snapshot from the remote graph API and
//! materialize it in the SQLite graph store.

pub mod fetcher;
pub mod pipeline;
pub mod store;

pub use fetcher::{extract_graph_components, parse_rpc_response, GraphFetcher};
pub use pipeline::{IngestPipeline, IngestReport};
pub use store::{EdgeLoad, GraphStore, StoreStats};
