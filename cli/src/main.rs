//! Graphsuite CLI: run catalog, traversal, centrality and mutation operations over the demo graph
//!
//! Every run starts from an in-memory backend seeded with the Three Kingdoms dataset.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use graphsuite::dataset::load_three_kingdoms;
use graphsuite::{
    CentralityMethod, CentralityReport, Direction, EngineConfig, EngineResult, GraphEngine, GraphFragment,
    MemoryBackend, Node, Path, PathEngine, PropertyMap, PropertyValue, Selector,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graphsuite", version, about = "Graph traversal and centrality over the Three Kingdoms graph")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "GRAPHSUITE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Install the analytics extension (PageRank, betweenness, k-shortest paths)
    #[arg(long, global = true)]
    analytics: bool,

    /// Install the single-call subgraph procedure
    #[arg(long, global = true)]
    path_expansion: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Node selectors accept `id:<n>`, `#<n>`, `key=value`, or a bare name
#[derive(Subcommand)]
enum Commands {
    /// List nodes in id order
    Nodes {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Show one node
    Get { node: String },
    /// Distinct values of a property, e.g. faction
    Values { key: String },
    /// Set properties on an existing node
    Update {
        node: String,

        #[arg(long = "prop", value_parser = parse_property, required = true)]
        props: Vec<(String, PropertyValue)>,
    },
    /// Delete a node that has no relationships
    Delete { node: String },
    /// Expand the neighborhood of a node
    Expand {
        start: String,

        #[arg(long, default_value_t = 1)]
        hops: usize,

        /// out, in or any
        #[arg(long, default_value = "any")]
        direction: String,

        /// Relationship types to follow
        #[arg(long = "type", value_delimiter = ',')]
        types: Vec<String>,

        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Follow one relationship type outward from a node
    Filter {
        start: String,
        rel_type: String,

        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Extract the undirected subgraph around a node
    Subgraph {
        start: String,

        #[arg(long, default_value_t = 2)]
        depth: usize,

        /// Rows fetched per level
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Subgraph as {nodes, edges} JSON for drawing
    Visual {
        start: String,

        #[arg(long, default_value_t = 2)]
        depth: usize,

        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Page through the nodes within a depth
    Neighbors {
        start: String,

        #[arg(long, default_value_t = 1)]
        depth: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Simple paths between two nodes
    Paths {
        from: String,
        to: String,

        #[arg(long, default_value_t = 4)]
        max_hops: usize,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Shortest path(s) between two nodes
    Shortest {
        from: String,
        to: String,

        /// Number of paths; more than one needs --analytics
        #[arg(short, default_value_t = 1)]
        k: usize,
    },
    /// Rank nodes by degree, pagerank or betweenness
    Centrality {
        #[arg(default_value = "degree")]
        method: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Find nodes whose name contains a string
    Search {
        needle: String,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List labels and relationship types
    Schema,
    /// Create or update a node by key
    UpsertNode {
        label: String,
        key: String,

        /// Properties as key=value; must include the key
        #[arg(long = "prop", value_parser = parse_property)]
        props: Vec<(String, PropertyValue)>,
    },
    /// Upsert two nodes by key and the relationship between them
    Connect {
        label: String,
        key: String,
        from: String,
        to: String,
        rel_type: String,

        #[arg(long = "prop", value_parser = parse_property)]
        props: Vec<(String, PropertyValue)>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn build_engine(cli: &Cli) -> anyhow::Result<GraphEngine> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides()?;

    let mut backend = MemoryBackend::new();
    if cli.analytics {
        backend = backend.with_analytics();
    }
    if cli.path_expansion {
        backend = backend.with_path_expansion();
    }

    let engine = GraphEngine::new(Arc::new(backend), config)?;
    let summary = load_three_kingdoms(&engine).await.context("seeding the demo dataset")?;
    debug!(
        "seeded {} characters and {} relationships",
        summary.characters, summary.relationships
    );
    Ok(engine)
}

fn select(engine: &GraphEngine, raw: &str) -> EngineResult<Selector> {
    Selector::parse(raw, engine.name_key())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let engine = build_engine(&cli).await?;
    let format = &cli.format;

    match &cli.command {
        Commands::Nodes { limit } => {
            let nodes = engine.list_nodes(*limit).await?;
            print_node_list(&nodes, engine.name_key(), format)
        }
        Commands::Get { node } => {
            let node = engine.get_node(&select(&engine, node)?).await?;
            print_node_list(std::slice::from_ref(&node), engine.name_key(), format)
        }
        Commands::Values { key } => {
            let values = engine.distinct_values(key).await?;
            match format {
                OutputFormat::Json => print_json(&values),
                OutputFormat::Table => {
                    let mut table = new_table(&[key.as_str()]);
                    for value in &values {
                        table.add_row(vec![value.to_string()]);
                    }
                    println!("{}", table);
                    Ok(())
                }
            }
        }
        Commands::Update { node, props } => {
            let properties: PropertyMap = props.iter().cloned().collect();
            let node = engine.update_node(&select(&engine, node)?, properties).await?;
            print_node_list(std::slice::from_ref(&node), engine.name_key(), format)
        }
        Commands::Delete { node } => {
            let node = engine.delete_node(&select(&engine, node)?).await?;
            match format {
                OutputFormat::Json => print_json(&node),
                OutputFormat::Table => {
                    println!("deleted {} ({})", node.display_name(engine.name_key()), node.id);
                    Ok(())
                }
            }
        }
        Commands::Expand {
            start,
            hops,
            direction,
            types,
            limit,
        } => {
            let direction =
                Direction::parse(direction).ok_or_else(|| anyhow!("direction must be out, in or any, got {:?}", direction))?;
            let types: Vec<&str> = types.iter().map(String::as_str).collect();
            let fragment = engine.expand(&select(&engine, start)?, *hops, direction, &types, *limit).await?;
            print_fragment(&fragment, engine.name_key(), format)
        }
        Commands::Filter { start, rel_type, limit } => {
            let fragment = engine.filter_relation(&select(&engine, start)?, rel_type, *limit).await?;
            print_fragment(&fragment, engine.name_key(), format)
        }
        Commands::Subgraph { start, depth, limit } => {
            let fragment = engine.subgraph(&select(&engine, start)?, *depth, *limit).await?;
            print_fragment(&fragment, engine.name_key(), format)
        }
        Commands::Visual { start, depth, limit } => {
            let fragment = engine.subgraph(&select(&engine, start)?, *depth, *limit).await?;
            print_json(&fragment.to_visual(engine.name_key()))
        }
        Commands::Neighbors {
            start,
            depth,
            offset,
            limit,
        } => {
            let page = engine.neighbors(&select(&engine, start)?, *depth, *offset, *limit).await?;
            match format {
                OutputFormat::Json => print_json(&page),
                OutputFormat::Table => {
                    print_fragment(&page.fragment, engine.name_key(), format)?;
                    println!(
                        "showing {} of {} node(s) from offset {}",
                        page.fragment.node_count(),
                        page.total,
                        page.offset
                    );
                    Ok(())
                }
            }
        }
        Commands::Paths {
            from,
            to,
            max_hops,
            limit,
        } => {
            let paths = engine
                .paths_between(&select(&engine, from)?, &select(&engine, to)?, *max_hops, *limit)
                .await?;
            print_paths(&paths, engine.name_key(), format)
        }
        Commands::Shortest { from, to, k } => {
            let result = engine.shortest_path(&select(&engine, from)?, &select(&engine, to)?, *k).await?;
            match format {
                OutputFormat::Json => print_json(&result),
                OutputFormat::Table => {
                    print_paths(&result.paths, engine.name_key(), format)?;
                    let engine = match result.engine {
                        PathEngine::Native => "native",
                        PathEngine::KShortest => "k_shortest",
                    };
                    println!("engine: {} (k = {})", engine, result.k);
                    Ok(())
                }
            }
        }
        Commands::Centrality { method, limit } => {
            let report = engine.centrality(CentralityMethod::parse(method)?, *limit).await?;
            match format {
                OutputFormat::Json => print_json(&report),
                OutputFormat::Table => {
                    print_centrality(&report);
                    Ok(())
                }
            }
        }
        Commands::Search { needle, limit } => {
            let nodes = engine.search(needle, *limit).await?;
            print_node_list(&nodes, engine.name_key(), format)
        }
        Commands::Schema => {
            let labels = engine.labels().await?;
            let types = engine.relationship_types().await?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "labels": labels,
                    "relationship_types": types,
                })),
                OutputFormat::Table => {
                    let mut table = new_table(&["kind", "name"]);
                    for label in &labels {
                        table.add_row(vec!["label".to_string(), label.to_string()]);
                    }
                    for rel_type in &types {
                        table.add_row(vec!["relationship type".to_string(), rel_type.to_string()]);
                    }
                    println!("{}", table);
                    Ok(())
                }
            }
        }
        Commands::UpsertNode { label, key, props } => {
            let properties: PropertyMap = props.iter().cloned().collect();
            let node = engine.upsert_node(label, key, properties).await?;
            print_node_list(std::slice::from_ref(&node), engine.name_key(), format)
        }
        Commands::Connect {
            label,
            key,
            from,
            to,
            rel_type,
            props,
        } => {
            let properties: PropertyMap = props.iter().cloned().collect();
            let rel = engine
                .connect_by_key(label, key, infer_value(from), infer_value(to), rel_type, properties)
                .await?;
            match format {
                OutputFormat::Json => print_json(&rel),
                OutputFormat::Table => {
                    println!("[{}:{}] {} -> {}", rel.id, rel.rel_type, rel.start, rel.end);
                    Ok(())
                }
            }
        }
    }
}

/// `key=value` with the value typed as integer, float, boolean or string
fn parse_property(raw: &str) -> Result<(String, PropertyValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    Ok((key.trim().to_string(), infer_value(value)))
}

fn infer_value(raw: &str) -> PropertyValue {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return PropertyValue::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return PropertyValue::Float(f);
    }
    match raw {
        "true" => PropertyValue::Boolean(true),
        "false" => PropertyValue::Boolean(false),
        _ => PropertyValue::String(raw.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

fn format_properties(properties: &PropertyMap) -> String {
    properties
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_nodes(nodes: &[Node], name_key: &str) {
    if nodes.is_empty() {
        println!("(no results)");
        return;
    }
    let mut table = new_table(&["id", "labels", "name", "properties"]);
    for node in nodes {
        let labels: Vec<&str> = node.labels.iter().map(|l| l.as_str()).collect();
        table.add_row(vec![
            node.id.to_string(),
            labels.join(","),
            node.display_name(name_key),
            format_properties(&node.properties),
        ]);
    }
    println!("{}", table);
    println!("{} node(s)", nodes.len());
}

fn print_node_list(nodes: &[Node], name_key: &str, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&nodes),
        OutputFormat::Table => {
            print_nodes(nodes, name_key);
            Ok(())
        }
    }
}

fn print_fragment(fragment: &GraphFragment, name_key: &str, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return print_json(fragment);
    }

    let nodes: Vec<Node> = fragment.nodes().cloned().collect();
    print_nodes(&nodes, name_key);

    if fragment.relationship_count() > 0 {
        let mut table = new_table(&["id", "type", "from", "to", "properties"]);
        for rel in fragment.relationships() {
            let name = |id| {
                fragment
                    .node(id)
                    .map(|n| n.display_name(name_key))
                    .unwrap_or_else(|| id.to_string())
            };
            table.add_row(vec![
                rel.id.to_string(),
                rel.rel_type.to_string(),
                name(rel.start),
                name(rel.end),
                format_properties(&rel.properties),
            ]);
        }
        println!("{}", table);
        println!("{} relationship(s)", fragment.relationship_count());
    }
    Ok(())
}

fn render_path(path: &Path, name_key: &str) -> String {
    let mut out = path.start().display_name(name_key);
    let mut current = path.start().id;
    for (rel, node) in path.relationships().iter().zip(path.nodes().iter().skip(1)) {
        let arrow = if rel.start == current {
            format!(" -[{}]-> ", rel.rel_type)
        } else {
            format!(" <-[{}]- ", rel.rel_type)
        };
        out.push_str(&arrow);
        out.push_str(&node.display_name(name_key));
        current = node.id;
    }
    out
}

fn print_paths(paths: &[Path], name_key: &str, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&paths);
    }
    if paths.is_empty() {
        println!("(no paths)");
        return Ok(());
    }
    let mut table = new_table(&["#", "length", "path"]);
    for (i, path) in paths.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), path.len().to_string(), render_path(path, name_key)]);
    }
    println!("{}", table);
    Ok(())
}

fn print_centrality(report: &CentralityReport) {
    let mut table = new_table(&["rank", "id", "name", "score"]);
    match report {
        CentralityReport::Degree(scores) => {
            for (i, s) in scores.iter().enumerate() {
                table.add_row(vec![(i + 1).to_string(), s.node_id.to_string(), s.name.clone(), s.score.to_string()]);
            }
        }
        CentralityReport::Advanced(result) => {
            for (i, s) in result.scores.iter().enumerate() {
                table.add_row(vec![
                    (i + 1).to_string(),
                    s.node_id.to_string(),
                    s.name.clone(),
                    format!("{:.6}", s.score),
                ]);
            }
        }
    }
    println!("{}", table);
    if let CentralityReport::Advanced(result) = report {
        println!("{} via computation {}", result.kind, result.computation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_value() {
        assert_eq!(infer_value("42"), PropertyValue::Integer(42));
        assert_eq!(infer_value("2.5"), PropertyValue::Float(2.5));
        assert_eq!(infer_value("true"), PropertyValue::Boolean(true));
        assert_eq!(infer_value(" Lưu Bị "), PropertyValue::String("Lưu Bị".to_string()));
    }

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("faction=Thục Hán").unwrap(),
            ("faction".to_string(), PropertyValue::from("Thục Hán"))
        );
        assert!(parse_property("faction").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["graphsuite", "--analytics", "shortest", "Lưu Bị", "Tào Tháo", "-k", "3"]).unwrap();
        assert!(cli.analytics);
        assert!(matches!(cli.command, Commands::Shortest { k: 3, .. }));
    }

    #[test]
    fn test_update_needs_a_property() {
        assert!(Cli::try_parse_from(["graphsuite", "update", "Hoa Đà"]).is_err());
        let cli = Cli::try_parse_from(["graphsuite", "update", "character_id=63", "--prop", "faction=Danh y"]).unwrap();
        match cli.command {
            Commands::Update { node, props } => {
                assert_eq!(node, "character_id=63");
                assert_eq!(props, vec![("faction".to_string(), PropertyValue::from("Danh y"))]);
            }
            _ => panic!("expected update"),
        }
    }
}
