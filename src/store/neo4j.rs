use anyhow::{bail, Context, Result};
use log::{info, warn};
use neo4rs::{query, ConfigBuilder, Graph, Query, Row, Txn};

use crate::config::ConnectionSettings;
use crate::model::{
    ComponentConnections, ComponentRecord, Connection, EdgeDescriptor, GraphReport, LabelCount,
    TypeCount, RELATION_TYPE_PROPERTY,
};
use crate::store::traits::{GraphSession, GraphStore};

/// Graph store backed by a Neo4j server over Bolt
#[derive(Debug, Clone)]
pub struct Neo4jStore {
    settings: ConnectionSettings,
}

impl Neo4jStore {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    async fn connect(&self) -> Result<Graph> {
        let config = ConfigBuilder::default()
            .uri(self.settings.uri.as_str())
            .user(self.settings.user.as_str())
            .password(self.settings.password.as_str())
            .db(self.settings.database.as_str())
            .max_connections(self.settings.max_connections)
            .build()
            .context("Invalid Neo4j connection settings")?;

        let graph = Graph::connect(config)
            .await
            .with_context(|| format!("Failed to connect to Neo4j at {}", self.settings.uri))?;

        // The pool connects lazily, so probe it before handing out the session
        graph
            .run(query("RETURN 1"))
            .await
            .with_context(|| format!("Neo4j at {} is not reachable", self.settings.uri))?;

        Ok(graph)
    }
}

#[async_trait::async_trait]
impl GraphStore for Neo4jStore {
    type Session = Neo4jSession;

    async fn session(&self) -> Result<Neo4jSession> {
        let graph = self.connect().await?;
        info!(
            "Connected to Neo4j at {} (database {})",
            self.settings.uri, self.settings.database
        );
        Ok(Neo4jSession { graph })
    }

    async fn ensure_schema(&self) -> Result<()> {
        let graph = self.connect().await?;
        graph
            .run(query(
                "CREATE CONSTRAINT component_id_unique IF NOT EXISTS \
                 FOR (c:Component) REQUIRE c.id IS UNIQUE",
            ))
            .await
            .context("Failed to create uniqueness constraint on Component.id")?;
        Ok(())
    }
}

/// An open connection pool scoped to one import call
pub struct Neo4jSession {
    graph: Graph,
}

/// Relationship types cannot be query parameters, so only plain identifiers
/// are spliced into Cypher.
fn relationship_kind(kind: &str) -> Result<&str> {
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid relationship kind '{}'", kind);
    }
    Ok(kind)
}

impl Neo4jSession {
    async fn fetch_one(&self, q: Query, what: &str) -> Result<Option<Row>> {
        Ok(self.fetch_all(q, what).await?.into_iter().next())
    }

    async fn fetch_all(&self, q: Query, what: &str) -> Result<Vec<Row>> {
        let mut rows = self
            .graph
            .execute(q)
            .await
            .with_context(|| format!("Failed to {}", what))?;

        let mut all = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .with_context(|| format!("Failed to read result of {}", what))?
        {
            all.push(row);
        }
        Ok(all)
    }

    async fn fetch_flag(&self, q: Query, column: &str, what: &str) -> Result<bool> {
        match self.fetch_one(q, what).await? {
            Some(row) => row
                .get::<bool>(column)
                .with_context(|| format!("Missing '{}' in result of {}", column, what)),
            None => Ok(false),
        }
    }

    /// Run one write in its own transaction. Commits when the statement
    /// succeeds and rolls back when it fails; returns whether any row came
    /// back as confirmation.
    async fn write(&self, q: Query, what: &str) -> Result<bool> {
        let mut txn = self
            .graph
            .start_txn()
            .await
            .context("Failed to start transaction")?;

        match confirm(&mut txn, q).await {
            Ok(confirmed) => {
                txn.commit()
                    .await
                    .with_context(|| format!("Failed to commit {}", what))?;
                Ok(confirmed)
            }
            Err(e) => {
                warn!("Failed to {}, rolling back: {}", what, e);
                txn.rollback()
                    .await
                    .context("Failed to rollback transaction")?;
                Err(e).with_context(|| format!("Failed to {}", what))
            }
        }
    }

    async fn connections(&self, cypher: &str, id: &str) -> Result<Vec<Connection>> {
        let rows = self
            .fetch_all(query(cypher).param("id", id), "list component relationships")
            .await?;

        rows.iter()
            .map(|row| -> Result<Connection, neo4rs::DeError> {
                Ok(Connection {
                    relationship_type: row.get("relationship_type")?,
                    relation_type: row.get("relation_type")?,
                    peer_id: row.get("peer_id")?,
                    peer_label: row.get("peer_label")?,
                })
            })
            .collect::<Result<Vec<_>, neo4rs::DeError>>()
            .context("Unexpected shape of relationship rows")
    }
}

async fn confirm(txn: &mut Txn, q: Query) -> Result<bool, neo4rs::Error> {
    let mut rows = txn.execute(q).await?;
    let mut confirmed = false;
    while rows.next(txn.handle()).await?.is_some() {
        confirmed = true;
    }
    Ok(confirmed)
}

#[async_trait::async_trait]
impl GraphSession for Neo4jSession {
    async fn count_nodes(&self) -> Result<i64> {
        let row = self
            .fetch_one(
                query("MATCH (c:Component) RETURN count(c) AS count"),
                "count component nodes",
            )
            .await?;

        match row {
            Some(row) => row.get::<i64>("count").context("Missing node count"),
            None => Ok(0),
        }
    }

    async fn node_exists(&self, id: &str) -> Result<bool> {
        self.fetch_flag(
            query("MATCH (c:Component {id: $id}) RETURN count(c) > 0 AS exists").param("id", id),
            "exists",
            "look up component",
        )
        .await
    }

    async fn create_node(&self, record: &ComponentRecord) -> Result<bool> {
        // Conditional create: yields no row when the id is already taken
        let mut q = query(
            r#"
            OPTIONAL MATCH (existing:Component {id: $id})
            WITH existing WHERE existing IS NULL
            CREATE (c:Component {
                id: $id,
                label: $label,
                component_type: $component_type,
                category: $category,
                location: $location,
                technology: $technology,
                host: $host,
                description: $description,
                interface: $interface
            })
            RETURN c.id AS id
            "#,
        );
        for (name, value) in record.properties() {
            q = q.param(name, value);
        }

        self.write(q, &format!("create component {}", record.id))
            .await
    }

    async fn edge_endpoints_exist(&self, source_id: &str, target_id: &str) -> Result<bool> {
        self.fetch_flag(
            query(
                r#"
                OPTIONAL MATCH (source:Component {id: $source})
                WITH count(source) AS sources
                OPTIONAL MATCH (target:Component {id: $target})
                RETURN sources > 0 AND count(target) > 0 AS both_exist
                "#,
            )
            .param("source", source_id)
            .param("target", target_id),
            "both_exist",
            "look up relationship endpoints",
        )
        .await
    }

    async fn edge_exists(&self, source_id: &str, target_id: &str, kind: &str) -> Result<bool> {
        let cypher = format!(
            "MATCH (:Component {{id: $source}})-[r:{}]->(:Component {{id: $target}}) \
             RETURN count(r) > 0 AS exists",
            relationship_kind(kind)?
        );

        self.fetch_flag(
            query(&cypher)
                .param("source", source_id)
                .param("target", target_id),
            "exists",
            "look up relationship",
        )
        .await
    }

    async fn create_edge(&self, edge: &EdgeDescriptor, kind: &str) -> Result<bool> {
        // MERGE keeps a concurrent importer from duplicating the relationship
        let cypher = format!(
            "MATCH (source:Component {{id: $source}}) \
             MATCH (target:Component {{id: $target}}) \
             MERGE (source)-[r:{}]->(target) \
             SET r.{} = $relation_type \
             RETURN type(r) AS kind",
            relationship_kind(kind)?,
            RELATION_TYPE_PROPERTY
        );

        self.write(
            query(&cypher)
                .param("source", edge.source_id.as_str())
                .param("target", edge.target_id.as_str())
                .param("relation_type", edge.relation_type.as_str()),
            &format!("create relationship {}", edge),
        )
        .await
    }

    async fn update_edge(&self, edge: &EdgeDescriptor, kind: &str) -> Result<bool> {
        let cypher = format!(
            "MATCH (:Component {{id: $source}})-[r:{}]->(:Component {{id: $target}}) \
             SET r.{} = $relation_type \
             RETURN type(r) AS kind",
            relationship_kind(kind)?,
            RELATION_TYPE_PROPERTY
        );

        self.write(
            query(&cypher)
                .param("source", edge.source_id.as_str())
                .param("target", edge.target_id.as_str())
                .param("relation_type", edge.relation_type.as_str()),
            &format!("update relationship {}", edge),
        )
        .await
    }

    async fn report(&self, sample_limit: usize) -> Result<GraphReport> {
        let nodes_by_label = self
            .fetch_all(
                query(
                    "MATCH (n) RETURN labels(n) AS labels, count(*) AS count ORDER BY count DESC",
                ),
                "count nodes by label",
            )
            .await?
            .iter()
            .map(|row| -> Result<LabelCount, neo4rs::DeError> {
                Ok(LabelCount {
                    labels: row.get("labels")?,
                    count: row.get("count")?,
                })
            })
            .collect::<Result<Vec<_>, neo4rs::DeError>>()
            .context("Unexpected shape of label counts")?;

        let relationships_by_type = self
            .fetch_all(
                query(
                    "MATCH ()-[r]->() RETURN type(r) AS relationship_type, count(*) AS count \
                     ORDER BY count DESC",
                ),
                "count relationships by type",
            )
            .await?
            .iter()
            .map(|row| -> Result<TypeCount, neo4rs::DeError> {
                Ok(TypeCount {
                    relationship_type: row.get("relationship_type")?,
                    count: row.get("count")?,
                })
            })
            .collect::<Result<Vec<_>, neo4rs::DeError>>()
            .context("Unexpected shape of relationship counts")?;

        let sampled = self
            .fetch_all(
                query(
                    "MATCH (c:Component) \
                     RETURN c.id AS id, coalesce(c.label, '') AS label, \
                            coalesce(c.component_type, '') AS component_type \
                     ORDER BY c.id LIMIT $limit",
                )
                .param("limit", sample_limit as i64),
                "sample components",
            )
            .await?;

        let mut sample = Vec::with_capacity(sampled.len());
        for row in &sampled {
            let id: String = row.get("id").context("Sampled component without id")?;

            let outgoing = self
                .connections(
                    "MATCH (c:Component {id: $id})-[r]->(m) \
                     RETURN type(r) AS relationship_type, r.type_of_relation AS relation_type, \
                            coalesce(m.id, '') AS peer_id, coalesce(m.label, '') AS peer_label \
                     ORDER BY peer_id",
                    &id,
                )
                .await?;
            let incoming = self
                .connections(
                    "MATCH (c:Component {id: $id})<-[r]-(m) \
                     RETURN type(r) AS relationship_type, r.type_of_relation AS relation_type, \
                            coalesce(m.id, '') AS peer_id, coalesce(m.label, '') AS peer_label \
                     ORDER BY peer_id",
                    &id,
                )
                .await?;

            sample.push(ComponentConnections {
                label: row.get("label").context("Sampled component without label")?,
                component_type: row
                    .get("component_type")
                    .context("Sampled component without type")?,
                id,
                outgoing,
                incoming,
            });
        }

        Ok(GraphReport {
            nodes_by_label,
            relationships_by_type,
            sample,
        })
    }
}
