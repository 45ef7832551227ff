use crate::model::{ComponentRecord, EdgeDescriptor, GraphReport};
use anyhow::Result;

/// Handle on the graph database. A session is acquired once per import call
/// and released when it is dropped.
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    type Session: GraphSession;

    /// Acquire a session, failing when the store cannot be reached
    async fn session(&self) -> Result<Self::Session>;
    /// Install the constraints the import relies on (idempotent)
    async fn ensure_schema(&self) -> Result<()>;
}

/// Operations the import performs against one open session.
///
/// Writes return `Ok(false)` when the store accepted the statement but
/// confirmed nothing, and `Err` when it rejected it. Each write runs in its
/// own transaction.
#[async_trait::async_trait]
pub trait GraphSession: Send + Sync {
    /// Number of component nodes
    async fn count_nodes(&self) -> Result<i64>;
    async fn node_exists(&self, id: &str) -> Result<bool>;
    /// Create the node unless a component with the same id already exists
    async fn create_node(&self, record: &ComponentRecord) -> Result<bool>;
    async fn edge_endpoints_exist(&self, source_id: &str, target_id: &str) -> Result<bool>;
    async fn edge_exists(&self, source_id: &str, target_id: &str, kind: &str) -> Result<bool>;
    async fn create_edge(&self, edge: &EdgeDescriptor, kind: &str) -> Result<bool>;
    /// Overwrite the relation type of an existing relationship
    async fn update_edge(&self, edge: &EdgeDescriptor, kind: &str) -> Result<bool>;
    /// Summarize the graph, sampling up to `sample_limit` components
    async fn report(&self, sample_limit: usize) -> Result<GraphReport>;
}
