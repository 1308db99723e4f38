use chrono::Utc;
use rusqlite::params;
use crate::db::{migrate, Db};
use crate::error::{ModgraphError, Result};
use crate::graph::{Edge, Node};

/// Row counts of the stored graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub nodes: usize,
    pub edges: usize,
    /// Distinct cycle ids on stored nodes
    pub cycles: usize,
}

/// Outcome of an edge load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeLoad {
    pub loaded: usize,
    /// Edges dropped because an endpoint is not stored
    pub skipped: usize,
}

/// SQLite sink for traversal snapshots
///
/// Nodes are upserted by id and edges by `(from, to)`, so loading the same
/// snapshot twice leaves the store unchanged apart from `updated_at`.
#[derive(Debug, Clone)]
pub struct GraphStore {
    db: Db,
}

impl GraphStore {
    /// Open the store and apply pending migrations
    pub async fn connect(db: Db) -> Result<Self> {
        let applied = db.with_connection(migrate::run_migrations).await?;
        log::info!(
            "Connected to graph store at {} ({} migrations applied)",
            db.path().display(),
            applied
        );
        Ok(Self { db })
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub async fn load_nodes(&self, nodes: Vec<Node>) -> Result<usize> {
        if nodes.is_empty() {
            log::warn!("No nodes to load");
            return Ok(0);
        }

        let updated_at = Utc::now().to_rfc3339();
        let count = self.db.with_connection(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO graph_nodes (
                        id, label, state, depth, category, category_id, is_custom,
                        model, in_cycle, cycle_id, node_type, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    ON CONFLICT(id) DO UPDATE SET
                        label = excluded.label,
                        state = excluded.state,
                        depth = excluded.depth,
                        category = excluded.category,
                        category_id = excluded.category_id,
                        is_custom = excluded.is_custom,
                        model = excluded.model,
                        in_cycle = excluded.in_cycle,
                        cycle_id = excluded.cycle_id,
                        node_type = excluded.node_type,
                        updated_at = excluded.updated_at
                    "#,
                )?;

                for node in &nodes {
                    stmt.execute(params![
                        node.id,
                        node.label,
                        node.state,
                        node.depth,
                        node.category,
                        node.category_id,
                        node.is_custom,
                        node.model,
                        node.is_in_cycle(),
                        node.cycle_id,
                        node.node_type.map(|t| t.as_str()),
                        updated_at,
                    ])?;
                }
            }
            tx.commit()?;
            Ok::<usize, ModgraphError>(nodes.len())
        }).await?;

        log::info!("Loaded {} nodes into graph store", count);
        Ok(count)
    }

    pub async fn load_edges(&self, edges: Vec<Edge>) -> Result<EdgeLoad> {
        if edges.is_empty() {
            log::warn!("No edges to load");
            return Ok(EdgeLoad::default());
        }

        let updated_at = Utc::now().to_rfc3339();
        let load = self.db.with_connection(move |conn| {
            let tx = conn.transaction()?;
            let mut load = EdgeLoad::default();
            {
                // Only link endpoints that are already stored.
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO graph_edges (
                        from_id, to_id, type, field, in_cycle, cycle_id, edge_type, updated_at
                    )
                    SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
                    WHERE EXISTS (SELECT 1 FROM graph_nodes WHERE id = ?1)
                      AND EXISTS (SELECT 1 FROM graph_nodes WHERE id = ?2)
                    ON CONFLICT(from_id, to_id) DO UPDATE SET
                        type = excluded.type,
                        field = excluded.field,
                        in_cycle = excluded.in_cycle,
                        cycle_id = excluded.cycle_id,
                        edge_type = excluded.edge_type,
                        updated_at = excluded.updated_at
                    "#,
                )?;

                for edge in &edges {
                    let changed = stmt.execute(params![
                        edge.from,
                        edge.to,
                        edge.kind.as_str(),
                        edge.field,
                        edge.is_in_cycle(),
                        edge.cycle_id,
                        edge.edge_type.map(|t| t.as_str()),
                        updated_at,
                    ])?;
                    if changed == 0 {
                        log::debug!("Skipping edge {} -> {}: endpoint not stored", edge.from, edge.to);
                        load.skipped += 1;
                    } else {
                        load.loaded += 1;
                    }
                }
            }
            tx.commit()?;
            Ok::<EdgeLoad, ModgraphError>(load)
        }).await?;

        if load.skipped > 0 {
            log::warn!("Skipped {} edges with unknown endpoints", load.skipped);
        }
        log::info!("Loaded {} edges into graph store", load.loaded);
        Ok(load)
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.db.with_connection(|conn| {
            let count = |sql: &str| -> Result<usize> {
                let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
                Ok(n as usize)
            };
            Ok(StoreStats {
                nodes: count("SELECT COUNT(*) FROM graph_nodes")?,
                edges: count("SELECT COUNT(*) FROM graph_edges")?,
                cycles: count("SELECT COUNT(DISTINCT cycle_id) FROM graph_nodes WHERE cycle_id IS NOT NULL")?,
            })
        }).await
    }
}
