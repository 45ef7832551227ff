use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::model::{
    ComponentConnections, ComponentRecord, Connection, EdgeDescriptor, GraphReport, Id, LabelCount,
    TypeCount,
};
use crate::store::traits::{GraphSession, GraphStore};

/// Relationships keyed by (source, target, kind), valued by relation type
type EdgeMap = BTreeMap<(Id, Id, String), String>;

#[derive(Debug, Default)]
struct MemoryGraph {
    nodes: BTreeMap<Id, ComponentRecord>,
    edges: EdgeMap,
    /// Simulates an unreachable server
    offline: bool,
    /// Ids whose writes the store rejects
    rejected: HashSet<Id>,
}

impl MemoryGraph {
    fn check_writable(&self, ids: &[&str]) -> Result<()> {
        if let Some(id) = ids.iter().find(|id| self.rejected.contains(**id)) {
            bail!("write rejected for component {}", id);
        }
        Ok(())
    }
}

/// In-process graph store with the same semantics as the Neo4j store,
/// plus knobs for simulating an unreachable server and rejected writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    graph: Arc<RwLock<MemoryGraph>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a component directly, bypassing the import
    pub async fn insert_node(&self, record: ComponentRecord) {
        let mut graph = self.graph.write().await;
        graph.nodes.insert(record.id.clone(), record);
    }

    pub async fn set_offline(&self, offline: bool) {
        self.graph.write().await.offline = offline;
    }

    /// Make every write touching `id` fail
    pub async fn reject_writes_for(&self, id: impl Into<Id>) {
        self.graph.write().await.rejected.insert(id.into());
    }

    pub async fn node(&self, id: &str) -> Option<ComponentRecord> {
        self.graph.read().await.nodes.get(id).cloned()
    }

    pub async fn node_count(&self) -> usize {
        self.graph.read().await.nodes.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.graph.read().await.edges.len()
    }

    /// Relation type stored on the relationship, if it exists
    pub async fn relation_type(&self, source_id: &str, target_id: &str, kind: &str) -> Option<String> {
        let key = (source_id.to_string(), target_id.to_string(), kind.to_string());
        self.graph.read().await.edges.get(&key).cloned()
    }
}

#[async_trait::async_trait]
impl GraphStore for MemoryGraphStore {
    type Session = MemorySession;

    async fn session(&self) -> Result<MemorySession> {
        if self.graph.read().await.offline {
            bail!("connection refused: in-memory store is offline");
        }
        Ok(MemorySession {
            graph: Arc::clone(&self.graph),
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }
}

pub struct MemorySession {
    graph: Arc<RwLock<MemoryGraph>>,
}

fn edge_key(source_id: &str, target_id: &str, kind: &str) -> (Id, Id, String) {
    (source_id.to_string(), target_id.to_string(), kind.to_string())
}

fn connection(nodes: &BTreeMap<Id, ComponentRecord>, kind: &str, relation: &str, peer: &str) -> Connection {
    Connection {
        relationship_type: kind.to_string(),
        relation_type: Some(relation.to_string()),
        peer_id: peer.to_string(),
        peer_label: nodes.get(peer).map(|n| n.label.clone()).unwrap_or_default(),
    }
}

#[async_trait::async_trait]
impl GraphSession for MemorySession {
    async fn count_nodes(&self) -> Result<i64> {
        Ok(self.graph.read().await.nodes.len() as i64)
    }

    async fn node_exists(&self, id: &str) -> Result<bool> {
        Ok(self.graph.read().await.nodes.contains_key(id))
    }

    async fn create_node(&self, record: &ComponentRecord) -> Result<bool> {
        let mut graph = self.graph.write().await;
        graph.check_writable(&[record.id.as_str()])?;

        if graph.nodes.contains_key(&record.id) {
            return Ok(false);
        }
        graph.nodes.insert(record.id.clone(), record.clone());
        Ok(true)
    }

    async fn edge_endpoints_exist(&self, source_id: &str, target_id: &str) -> Result<bool> {
        let graph = self.graph.read().await;
        Ok(graph.nodes.contains_key(source_id) && graph.nodes.contains_key(target_id))
    }

    async fn edge_exists(&self, source_id: &str, target_id: &str, kind: &str) -> Result<bool> {
        let graph = self.graph.read().await;
        Ok(graph.edges.contains_key(&edge_key(source_id, target_id, kind)))
    }

    async fn create_edge(&self, edge: &EdgeDescriptor, kind: &str) -> Result<bool> {
        let mut graph = self.graph.write().await;
        graph.check_writable(&[edge.source_id.as_str(), edge.target_id.as_str()])?;

        if !graph.nodes.contains_key(&edge.source_id) || !graph.nodes.contains_key(&edge.target_id) {
            return Ok(false);
        }
        graph.edges.insert(
            edge_key(&edge.source_id, &edge.target_id, kind),
            edge.relation_type.clone(),
        );
        Ok(true)
    }

    async fn update_edge(&self, edge: &EdgeDescriptor, kind: &str) -> Result<bool> {
        let mut graph = self.graph.write().await;
        graph.check_writable(&[edge.source_id.as_str(), edge.target_id.as_str()])?;

        match graph.edges.get_mut(&edge_key(&edge.source_id, &edge.target_id, kind)) {
            Some(relation_type) => {
                *relation_type = edge.relation_type.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn report(&self, sample_limit: usize) -> Result<GraphReport> {
        let graph = self.graph.read().await;

        let mut nodes_by_label = Vec::new();
        if !graph.nodes.is_empty() {
            nodes_by_label.push(LabelCount {
                labels: vec!["Component".to_string()],
                count: graph.nodes.len() as i64,
            });
        }

        let mut by_type: BTreeMap<&str, i64> = BTreeMap::new();
        for (_, _, kind) in graph.edges.keys() {
            *by_type.entry(kind.as_str()).or_default() += 1;
        }
        let mut relationships_by_type: Vec<TypeCount> = by_type
            .into_iter()
            .map(|(kind, count)| TypeCount {
                relationship_type: kind.to_string(),
                count,
            })
            .collect();
        relationships_by_type.sort_by(|a, b| b.count.cmp(&a.count));

        let sample = graph
            .nodes
            .values()
            .take(sample_limit)
            .map(|node| {
                let mut outgoing = Vec::new();
                let mut incoming = Vec::new();
                for ((source, target, kind), relation) in &graph.edges {
                    if *source == node.id {
                        outgoing.push(connection(&graph.nodes, kind, relation, target));
                    }
                    if *target == node.id {
                        incoming.push(connection(&graph.nodes, kind, relation, source));
                    }
                }
                ComponentConnections {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    component_type: node.component_type.clone(),
                    outgoing,
                    incoming,
                }
            })
            .collect();

        Ok(GraphReport {
            nodes_by_label,
            relationships_by_type,
            sample,
        })
    }
}
