use anyhow::Context;
use log::info;

use crate::error::ImportError;
use crate::logic::csv_reader::{CsvRow, CsvTableReader};
use crate::logic::edge_planner::{plan_edges, EdgeColumns};
use crate::logic::node_planner::plan_nodes;
use crate::logic::reconcile::GraphReconciler;
use crate::model::{GraphReport, ImportResult};
use crate::store::traits::{GraphSession, GraphStore};

/// Import components from a nodes CSV payload.
///
/// The whole file is parsed before the store is touched, so a malformed
/// payload fails the call without side effects.
pub async fn import_nodes<S: GraphStore>(
    store: &S,
    payload: &[u8],
) -> Result<ImportResult, ImportError> {
    let reader = CsvTableReader::from_bytes(payload)?;
    let delimiter = reader.delimiter() as char;
    let rows = reader.collect::<Result<Vec<CsvRow>, _>>()?;

    let planned = plan_nodes(rows);
    info!(
        "Read {} component row(s) from CSV (delimiter {:?})",
        planned.len(),
        delimiter
    );

    Ok(GraphReconciler::new(store).reconcile_nodes(&planned).await)
}

/// Import relationships from an edges CSV payload
pub async fn import_edges<S: GraphStore>(
    store: &S,
    payload: &[u8],
) -> Result<ImportResult, ImportError> {
    let reader = CsvTableReader::from_bytes(payload)?;
    let columns = EdgeColumns::resolve(reader.header());
    let delimiter = reader.delimiter() as char;
    let rows = reader.collect::<Result<Vec<CsvRow>, _>>()?;

    let planned = plan_edges(&columns, rows);
    info!(
        "Read {} relationship(s) from CSV (delimiter {:?})",
        planned.len(),
        delimiter
    );

    Ok(GraphReconciler::new(store).reconcile_edges(&planned).await)
}

/// Verify the store is reachable and return how many components it holds
pub async fn check_connection<S: GraphStore>(store: &S) -> anyhow::Result<i64> {
    let session = store.session().await?;
    session
        .count_nodes()
        .await
        .context("Connected, but failed to count component nodes")
}

/// Summarize node and relationship counts plus a sample of components
pub async fn graph_report<S: GraphStore>(
    store: &S,
    sample_limit: usize,
) -> anyhow::Result<GraphReport> {
    let session = store.session().await?;
    session.report(sample_limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentRecord;
    use crate::store::MemoryGraphStore;

    #[tokio::test]
    async fn malformed_payload_touches_nothing() {
        let store = MemoryGraphStore::new();

        let err = import_nodes(&store, b"id,label\nn1,\xff\n").await.unwrap_err();
        assert!(matches!(err, ImportError::Encoding(_)));
        assert_eq!(store.node_count().await, 0);

        let err = import_edges(&store, b"").await.unwrap_err();
        assert!(matches!(err, ImportError::MissingHeader));
    }

    #[tokio::test]
    async fn whitespace_line_before_header_still_imports() {
        let store = MemoryGraphStore::new();

        let result = import_nodes(&store, b"   \nid;label\nn1;A\n").await.unwrap();

        assert_eq!((result.created, result.errors), (1, 0));
        assert_eq!(result.details[0].row, 2);
        assert_eq!(store.node("n1").await.unwrap().label, "A");
    }

    #[tokio::test]
    async fn semicolon_edges_file_resolves_reordered_columns() {
        let store = MemoryGraphStore::new();
        for id in ["a", "b", "c"] {
            store.insert_node(ComponentRecord::new(id)).await;
        }

        let payload = "type;target;source\nUSES;\"b;c\";a\n";
        let result = import_edges(&store, payload.as_bytes()).await.unwrap();

        assert_eq!(result.created, 2);
        assert_eq!(store.relation_type("a", "c", "CONNECTS_TO").await.as_deref(), Some("USES"));
    }

    #[tokio::test]
    async fn check_and_report_reflect_store_contents() {
        let store = MemoryGraphStore::new();
        store.insert_node(ComponentRecord::new("a")).await;

        assert_eq!(check_connection(&store).await.unwrap(), 1);
        assert_eq!(graph_report(&store, 5).await.unwrap().sample.len(), 1);

        store.set_offline(true).await;
        assert!(check_connection(&store).await.is_err());
    }
}
