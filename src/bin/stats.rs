use modgraph::config::Config;
use modgraph::db::Db;
use modgraph::error::ModgraphError;
use modgraph::ingest::GraphStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();

    let store = GraphStore::connect(Db::new(config.db_path())).await?;

    println!("\n=== Module Graph Store Statistics ===\n");

    let stats = store.stats().await?;
    println!("{:<20} {:>10}", "Nodes", stats.nodes);
    println!("{:<20} {:>10}", "Edges", stats.edges);
    println!("{:<20} {:>10}", "Cycles", stats.cycles);

    if stats.nodes == 0 {
        println!("\nStore is empty. Run `ingest` to load a graph.");
        return Ok(());
    }

    // Edge counts per relation type
    let by_type = store.db().with_connection(|conn| {
        let mut stmt = conn.prepare(
            r#"
            SELECT type, COUNT(*) AS count, SUM(in_cycle) AS cyclic
            FROM graph_edges
            GROUP BY type
            ORDER BY count DESC
            "#
        )?;

        let mut rows = stmt.query([])?;
        let mut results = Vec::new();

        while let Some(row) = rows.next()? {
            results.push((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ));
        }

        Ok::<Vec<_>, ModgraphError>(results)
    }).await?;

    if !by_type.is_empty() {
        println!("\nEdges by type:\n");
        println!("{:-<50}", "");
        println!("{:<25} {:>10} {:>12}", "Type", "Count", "In cycle");
        println!("{:-<50}", "");
        for (kind, count, cyclic) in &by_type {
            println!("{:<25} {:>10} {:>12}", kind, count, cyclic.unwrap_or(0));
        }
        println!("{:-<50}", "");
    }

    let last_update = store.db().with_connection(|conn| {
        conn.query_row("SELECT MAX(updated_at) FROM graph_nodes", [], |row| {
            row.get::<_, Option<String>>(0)
        })
        .map_err(ModgraphError::from)
    }).await?;

    if let Some(ts) = last_update {
        println!("\nLast update: {}", ts);
    }

    println!();

    Ok(())
}
