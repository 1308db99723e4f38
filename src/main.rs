use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use modgraph::cache::RelationCache;
use modgraph::graph::models::DEFAULT_MODEL_DEPTH;
use modgraph::graph::resolver::Registry;
use modgraph::graph::{
    build_graph, build_model_graph, validate_seed_ids, Direction, EdgeIdentity, GraphSnapshot,
    MemoryModelResolver, MemoryResolver, NodeId, TraversalPolicy,
};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modgraph")]
#[command(about = "Cycle-aware dependency graphs over a module registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Module dependency graph (or its reverse with --reverse)
    Graph(GraphArgs),
    /// Model relation graph over relational fields
    Models(ModelArgs),
}

#[derive(Args, Debug)]
struct GraphArgs {
    /// Registry JSON file with a `modules` list
    #[arg(short, long)]
    registry: PathBuf,

    /// Seed ids, either `1,2` or a JSON list `[1, 2]`
    #[arg(short, long)]
    seeds: String,

    /// Follow dependents and excluders instead of dependencies
    #[arg(long)]
    reverse: bool,

    /// Maximum depth; overrides `max_depth` from --options
    #[arg(long)]
    max_depth: Option<u32>,

    /// Traversal options as a JSON object
    #[arg(long)]
    options: Option<String>,

    /// Keep edges of different types between the same pair apart
    #[arg(long)]
    strict_edges: bool,

    /// LRU capacity for relation lookups, 0 disables the cache
    #[arg(long, default_value_t = 1024)]
    cache: usize,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Registry JSON file with a `models` list
    #[arg(short, long)]
    registry: PathBuf,

    /// Seed model ids, either `1,2` or a JSON list `[1, 2]`
    #[arg(short, long)]
    seeds: String,

    #[arg(long, default_value_t = DEFAULT_MODEL_DEPTH)]
    max_depth: u32,

    #[arg(long)]
    pretty: bool,
}

fn parse_seeds(raw: &str) -> Result<Vec<NodeId>> {
    let raw = raw.trim();
    let value = if raw.starts_with('[') {
        serde_json::from_str(raw).context("--seeds is not valid JSON")?
    } else {
        Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(s)))
                .collect(),
        )
    };
    Ok(validate_seed_ids(&value)?)
}

fn policy(args: &GraphArgs) -> Result<TraversalPolicy> {
    let options: Value = match &args.options {
        Some(raw) => serde_json::from_str(raw).context("--options is not valid JSON")?,
        None => Value::Null,
    };
    let mut policy = TraversalPolicy::from_value(&options)?;

    if let Some(depth) = args.max_depth {
        policy = policy.with_max_depth(depth);
    }
    if args.reverse {
        policy = policy.with_direction(Direction::Reverse);
    }
    if args.strict_edges {
        policy = policy.with_edge_identity(EdgeIdentity::EndpointsAndKind);
    }
    Ok(policy)
}

fn print_snapshot(snapshot: &GraphSnapshot, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    println!("{}", json);
    Ok(())
}

fn run_graph(args: &GraphArgs) -> Result<()> {
    let seeds = parse_seeds(&args.seeds)?;
    let policy = policy(args)?;
    let registry = Registry::from_path(&args.registry)?;
    let resolver = MemoryResolver::from_registry(&registry);
    log::info!(
        "Loaded {} modules from {}",
        resolver.len(),
        args.registry.display()
    );

    let snapshot = if args.cache > 0 {
        let cached = RelationCache::new(resolver, args.cache);
        let snapshot = build_graph(&cached, &seeds, &policy)?;
        log::debug!("Relation cache: {} hits, {} misses", cached.hits(), cached.misses());
        snapshot
    } else {
        build_graph(&resolver, &seeds, &policy)?
    };

    log::info!(
        "Graph for {:?}: {} nodes, {} edges, {} cycles",
        seeds,
        snapshot.nodes.len(),
        snapshot.edges.len(),
        snapshot.cycle_ids().len()
    );
    print_snapshot(&snapshot, args.pretty)
}

fn run_models(args: &ModelArgs) -> Result<()> {
    let seeds = parse_seeds(&args.seeds)?;
    let registry = Registry::from_path(&args.registry)?;
    let resolver = MemoryModelResolver::from_models(registry.models);

    let snapshot = build_model_graph(&resolver, &seeds, args.max_depth)?;
    print_snapshot(&snapshot, args.pretty)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Graph(args) => run_graph(args),
        Command::Models(args) => run_models(args),
    }
}
