use serde_json::Value;

use crate::config::{Config, Endpoint};
use crate::db::Db;
use crate::error::Result;
use crate::graph::NodeId;

use super::fetcher::{extract_graph_components, GraphFetcher};
use super::store::GraphStore;

/// Counts reported by a finished ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub nodes: usize,
    pub edges: usize,
    pub skipped_edges: usize,
}

/// Fetch a snapshot from the graph API and load it into the store
pub struct IngestPipeline {
    fetcher: GraphFetcher,
    db: Db,
    endpoint: Endpoint,
    module_ids: Vec<NodeId>,
    options: Value,
}

impl IngestPipeline {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            fetcher: GraphFetcher::from_config(config)?,
            db: Db::new(config.db_path()),
            endpoint: config.source.endpoint,
            module_ids: config.source.module_ids.clone(),
            options: config.source.options.clone(),
        })
    }

    /// Run one ingestion: store setup, fetch, then nodes before edges.
    ///
    /// The store is opened first so a broken database fails fast without
    /// touching the network.
    pub async fn run(&self) -> Result<IngestReport> {
        let store = GraphStore::connect(self.db.clone())
            .await
            .map_err(|e| {
                log::error!("Failed to open graph store: {}", e);
                e
            })?;

        log::info!(
            "Fetching {:?} graph for module_ids={:?} with options={}",
            self.endpoint,
            self.module_ids,
            self.options
        );
        let snapshot = self
            .fetcher
            .fetch(self.endpoint, &self.module_ids, &self.options)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch graph data: {}", e);
                e
            })?;

        let (nodes, edges) = extract_graph_components(snapshot);
        if nodes.is_empty() {
            log::warn!("No nodes found in the graph data");
        }

        let node_count = store.load_nodes(nodes).await?;
        let edge_load = store.load_edges(edges).await?;

        let report = IngestReport {
            nodes: node_count,
            edges: edge_load.loaded,
            skipped_edges: edge_load.skipped,
        };
        log::info!("Graph ingestion completed: {:?}", report);
        Ok(report)
    }
}
