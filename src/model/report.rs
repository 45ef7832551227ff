use serde::{Deserialize, Serialize};

use crate::model::Id;

/// Snapshot of what the graph currently holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphReport {
    pub nodes_by_label: Vec<LabelCount>,
    pub relationships_by_type: Vec<TypeCount>,
    pub sample: Vec<ComponentConnections>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub labels: Vec<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub relationship_type: String,
    pub count: i64,
}

/// A sampled component with the relationships touching it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConnections {
    pub id: Id,
    pub label: String,
    pub component_type: String,
    pub outgoing: Vec<Connection>,
    pub incoming: Vec<Connection>,
}

/// One relationship as seen from a sampled component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub relationship_type: String,
    pub relation_type: Option<String>,
    pub peer_id: Id,
    pub peer_label: String,
}

impl GraphReport {
    pub fn total_nodes(&self) -> i64 {
        self.nodes_by_label.iter().map(|entry| entry.count).sum()
    }

    pub fn total_relationships(&self) -> i64 {
        self.relationships_by_type.iter().map(|entry| entry.count).sum()
    }
}
