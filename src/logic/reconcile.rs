use anyhow::Result;
use log::{error, info, warn};

use crate::logic::edge_planner::PlannedEdge;
use crate::logic::node_planner::{NodePlan, PlannedNode};
use crate::model::{
    ComponentRecord, EdgeDescriptor, ImportResult, ItemKey, ItemOutcome, SkipReason,
    RELATIONSHIP_KIND,
};
use crate::store::traits::{GraphSession, GraphStore};

const NODES_NOT_FOUND: &str = "nodes not found";
const NO_CONFIRMATION: &str = "store returned no confirmation";

/// Applies planned nodes and edges to a graph store.
///
/// Each call opens one session and drops it before returning. Failures of a
/// single item are recorded and the batch carries on; an unreachable store
/// (or, for edges, an empty graph) fails every item with one shared reason.
pub struct GraphReconciler<'s, S> {
    store: &'s S,
}

impl<'s, S: GraphStore> GraphReconciler<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub async fn reconcile_nodes(&self, planned: &[PlannedNode]) -> ImportResult {
        let mut result = ImportResult::new();
        if planned.is_empty() {
            return result;
        }

        let session = self.store.session().await.map_err(|e| {
            error!("Graph store unavailable, failing component import: {:#}", e);
            format!("graph store unavailable: {:#}", e)
        });

        for node in planned {
            let outcome = match (&node.plan, &session) {
                (NodePlan::Skip(reason), _) => ItemOutcome::Skipped(*reason),
                (NodePlan::Create(_), Err(reason)) => ItemOutcome::Error(reason.clone()),
                (NodePlan::Create(record), Ok(session)) => {
                    reconcile_node(session, node.row, record).await
                }
            };

            let id = node.record().map(|r| r.id.clone()).unwrap_or_default();
            result.record(node.row, ItemKey::node(id), outcome);
        }

        info!(
            "Component import finished: {} created, {} skipped, {} errors",
            result.created, result.skipped, result.errors
        );
        result
    }

    pub async fn reconcile_edges(&self, planned: &[PlannedEdge]) -> ImportResult {
        if planned.is_empty() {
            return ImportResult::new();
        }

        let session = match self.store.session().await {
            Ok(session) => session,
            Err(e) => {
                error!("Graph store unavailable, failing relationship import: {:#}", e);
                return fail_edges(planned, format!("graph store unavailable: {:#}", e));
            }
        };

        match session.count_nodes().await {
            Ok(0) => {
                error!("No component nodes in the graph, import nodes before relationships");
                return fail_edges(
                    planned,
                    "no component nodes in the graph; import nodes first".to_string(),
                );
            }
            Ok(count) => info!("{} component node(s) available for relationships", count),
            Err(e) => {
                error!("Failed to count component nodes: {:#}", e);
                return fail_edges(planned, format!("failed to count component nodes: {:#}", e));
            }
        }

        let mut result = ImportResult::new();
        for (index, edge) in planned.iter().enumerate() {
            info!(
                "Reconciling relationship {}/{}: {}",
                index + 1,
                planned.len(),
                edge.descriptor
            );
            let outcome = reconcile_edge(&session, edge.row, &edge.descriptor).await;
            result.record(edge.row, ItemKey::edge(&edge.descriptor), outcome);
        }

        info!(
            "Relationship import finished: {} created, {} updated, {} errors",
            result.created, result.updated, result.errors
        );
        result
    }
}

fn fail_edges(planned: &[PlannedEdge], reason: String) -> ImportResult {
    let mut result = ImportResult::new();
    for edge in planned {
        result.record(
            edge.row,
            ItemKey::edge(&edge.descriptor),
            ItemOutcome::Error(reason.clone()),
        );
    }
    result
}

/// Map a write result to `success`, or to an error outcome
fn confirmed(write: Result<bool>, success: ItemOutcome) -> ItemOutcome {
    match write {
        Ok(true) => success,
        Ok(false) => ItemOutcome::Error(NO_CONFIRMATION.to_string()),
        Err(e) => ItemOutcome::Error(format!("{:#}", e)),
    }
}

async fn reconcile_node<T: GraphSession>(
    session: &T,
    row: usize,
    record: &ComponentRecord,
) -> ItemOutcome {
    let outcome = match session.node_exists(&record.id).await {
        Ok(true) => {
            info!("Row {}: component {} already exists, skipping", row, record.id);
            ItemOutcome::Skipped(SkipReason::AlreadyExists)
        }
        Ok(false) => confirmed(session.create_node(record).await, ItemOutcome::Created),
        Err(e) => ItemOutcome::Error(format!("{:#}", e)),
    };

    if let ItemOutcome::Error(reason) = &outcome {
        error!("Row {}: failed to create component {}: {}", row, record.id, reason);
    }
    outcome
}

async fn reconcile_edge<T: GraphSession>(
    session: &T,
    row: usize,
    edge: &EdgeDescriptor,
) -> ItemOutcome {
    let outcome = match session
        .edge_endpoints_exist(&edge.source_id, &edge.target_id)
        .await
    {
        Ok(false) => ItemOutcome::Error(NODES_NOT_FOUND.to_string()),
        Err(e) => ItemOutcome::Error(format!("{:#}", e)),
        Ok(true) => match session
            .edge_exists(&edge.source_id, &edge.target_id, RELATIONSHIP_KIND)
            .await
        {
            Ok(true) => {
                warn!("Row {}: relationship {} exists, updating", row, edge);
                confirmed(
                    session.update_edge(edge, RELATIONSHIP_KIND).await,
                    ItemOutcome::Updated,
                )
            }
            Ok(false) => confirmed(
                session.create_edge(edge, RELATIONSHIP_KIND).await,
                ItemOutcome::Created,
            ),
            Err(e) => ItemOutcome::Error(format!("{:#}", e)),
        },
    };

    if let ItemOutcome::Error(reason) = &outcome {
        error!("Row {}: relationship {} failed: {}", row, edge, reason);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGraphStore;

    fn create(row: usize, id: &str) -> PlannedNode {
        PlannedNode {
            row,
            plan: NodePlan::Create(ComponentRecord::new(id)),
        }
    }

    fn edge(row: usize, source: &str, target: &str) -> PlannedEdge {
        PlannedEdge {
            row,
            descriptor: EdgeDescriptor::new(source, target, "USES"),
        }
    }

    #[tokio::test]
    async fn existing_nodes_are_skipped_and_new_ones_created() {
        let store = MemoryGraphStore::new();
        store.insert_node(ComponentRecord::new("old")).await;

        let result = GraphReconciler::new(&store)
            .reconcile_nodes(&[create(2, "old"), create(3, "new")])
            .await;

        assert_eq!((result.created, result.skipped, result.errors), (1, 1, 0));
        assert_eq!(result.details[0].status, "skipped (already exists)");
        assert_eq!(result.details[1].status, "created");
        assert!(store.node("new").await.is_some());
    }

    #[tokio::test]
    async fn rejected_write_is_isolated_to_its_row() {
        let store = MemoryGraphStore::new();
        store.reject_writes_for("bad").await;

        let result = GraphReconciler::new(&store)
            .reconcile_nodes(&[create(2, "bad"), create(3, "good")])
            .await;

        assert_eq!((result.created, result.errors), (1, 1));
        assert!(result.details[0].status.starts_with("error: "));
        assert!(result.details[0].status.contains("write rejected"));
        assert_eq!(result.details[1].status, "created");
    }

    #[tokio::test]
    async fn unreachable_store_fails_every_planned_node() {
        let store = MemoryGraphStore::new();
        store.set_offline(true).await;

        let planned = vec![
            create(2, "a"),
            PlannedNode {
                row: 3,
                plan: NodePlan::Skip(SkipReason::MissingId),
            },
            create(4, "b"),
        ];
        let result = GraphReconciler::new(&store).reconcile_nodes(&planned).await;

        assert_eq!((result.created, result.skipped, result.errors), (0, 1, 2));
        assert_eq!(result.details[0].status, result.details[2].status);
        assert!(result.details[0].status.contains("graph store unavailable"));
        assert_eq!(result.details[1].status, "skipped (missing id)");
    }

    #[tokio::test]
    async fn empty_graph_fails_every_edge() {
        let store = MemoryGraphStore::new();

        let result = GraphReconciler::new(&store)
            .reconcile_edges(&[edge(2, "a", "b"), edge(3, "a", "c")])
            .await;

        assert_eq!((result.created, result.updated, result.errors), (0, 0, 2));
        assert!(result
            .details
            .iter()
            .all(|d| d.status == "error: no component nodes in the graph; import nodes first"));
    }

    #[tokio::test]
    async fn missing_endpoint_does_not_abort_the_batch() {
        let store = MemoryGraphStore::new();
        for id in ["a", "b", "c"] {
            store.insert_node(ComponentRecord::new(id)).await;
        }

        let result = GraphReconciler::new(&store)
            .reconcile_edges(&[edge(2, "a", "ghost"), edge(3, "a", "b"), edge(4, "c", "b")])
            .await;

        assert_eq!((result.created, result.updated, result.errors), (2, 0, 1));
        assert_eq!(result.details[0].status, "error: nodes not found");
        assert_eq!(result.details[1].status, "created");
        assert_eq!(result.details[2].status, "created");
    }

    #[tokio::test]
    async fn rejected_edge_write_does_not_stop_the_batch() {
        let store = MemoryGraphStore::new();
        for id in ["a", "b", "c"] {
            store.insert_node(ComponentRecord::new(id)).await;
        }
        store.reject_writes_for("b").await;

        let result = GraphReconciler::new(&store)
            .reconcile_edges(&[edge(2, "a", "b"), edge(2, "a", "c")])
            .await;

        assert_eq!((result.created, result.updated, result.errors), (1, 0, 1));
        assert!(result.has_errors());
        assert_eq!(result.details[0].status, "error: write rejected for component b");
        assert_eq!(result.details[1].status, "created");
        assert_eq!(store.relation_type("a", "b", RELATIONSHIP_KIND).await, None);
        assert_eq!(
            store.relation_type("a", "c", RELATIONSHIP_KIND).await.as_deref(),
            Some("USES")
        );
    }

    #[tokio::test]
    async fn existing_edge_is_updated_with_new_relation_type() {
        let store = MemoryGraphStore::new();
        store.insert_node(ComponentRecord::new("a")).await;
        store.insert_node(ComponentRecord::new("b")).await;
        let reconciler = GraphReconciler::new(&store);

        let first = reconciler.reconcile_edges(&[edge(2, "a", "b")]).await;
        assert_eq!(first.created, 1);

        let retyped = PlannedEdge {
            row: 2,
            descriptor: EdgeDescriptor::new("a", "b", "CALLS"),
        };
        let second = reconciler.reconcile_edges(&[retyped]).await;
        assert_eq!((second.created, second.updated), (0, 1));
        assert_eq!(
            store.relation_type("a", "b", RELATIONSHIP_KIND).await.as_deref(),
            Some("CALLS")
        );
        assert_eq!(store.edge_count().await, 1);
    }
}
