pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

pub use error::ImportError;

// Export the import pipeline
pub use logic::{
    check_connection, detect_delimiter, graph_report, import_edges, import_nodes, plan_edges,
    plan_nodes, CsvRow, CsvTableReader, EdgeColumns, GraphReconciler, NodePlan, PlannedEdge,
    PlannedNode,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{GraphSession, GraphStore, MemoryGraphStore, Neo4jStore};

/// Build the Neo4j store described by the loaded configuration
pub fn neo4j_store(config: &crate::config::AppConfig) -> Neo4jStore {
    Neo4jStore::new(config.connection())
}
