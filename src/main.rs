use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use component_graph::config::AppConfig;
use component_graph::store::GraphStore;
use component_graph::{
    check_connection, graph_report, import_edges, import_nodes, neo4j_store, ImportResult,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "component-graph")]
#[command(about = "Bulk import of architecture components into a graph database")]
struct Cli {
    /// Create the uniqueness constraint on component ids before running
    #[arg(long, global = true)]
    ensure_schema: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import components from a nodes CSV
    ImportNodes {
        /// CSV file with id,label,component_type,... rows
        file: PathBuf,
    },
    /// Import relationships from an edges CSV
    ImportEdges {
        /// CSV file with source,target[,type_of_relation] columns
        file: PathBuf,
    },
    /// Verify the graph database is reachable
    Check,
    /// Print node and relationship counts with a sample of components
    Report {
        /// Number of components to sample
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress driver debug logs
    use env_logger::{Builder, Env};
    use log::LevelFilter;

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("neo4rs", LevelFilter::Warn)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let store = neo4j_store(&config);
    log::info!(
        "Using Neo4j at {} (database {})",
        store.settings().uri,
        store.settings().database
    );

    if cli.ensure_schema {
        store.ensure_schema().await?;
        log::info!("Uniqueness constraint on Component.id is in place");
    }

    match cli.command {
        Commands::ImportNodes { file } => {
            let payload = read_payload(&file)?;
            let result = import_nodes(&store, &payload).await?;
            print_json(&result)?;
            warn_on_errors(&result);
        }
        Commands::ImportEdges { file } => {
            let payload = read_payload(&file)?;
            let result = import_edges(&store, &payload).await?;
            print_json(&result)?;
            warn_on_errors(&result);
        }
        Commands::Check => {
            let count = check_connection(&store).await?;
            println!("Connected to Neo4j, {} component node(s) present", count);
        }
        Commands::Report { limit } => {
            let limit = limit.unwrap_or(config.import.report_sample_size);
            let report = graph_report(&store, limit).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}

fn read_payload(file: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn warn_on_errors(result: &ImportResult) {
    if result.has_errors() {
        log::warn!(
            "{} of {} item(s) failed, see details for reasons",
            result.errors,
            result.total()
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
