use serde::{Deserialize, Serialize};

use crate::model::Id;

/// Relationship kind every imported edge is stored under
pub const RELATIONSHIP_KIND: &str = "CONNECTS_TO";

/// Relation type used when the CSV row does not name one
pub const DEFAULT_RELATION_TYPE: &str = "CONNECTS_TO";

/// Property on the relationship holding the CSV relation type
pub const RELATION_TYPE_PROPERTY: &str = "type_of_relation";

/// A directed relationship between two existing components.
///
/// Endpoints are weak references: the reconciler never creates a missing
/// component to satisfy an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    pub source_id: Id,
    pub target_id: Id,
    #[serde(default = "default_relation_type")]
    pub relation_type: String,
}

fn default_relation_type() -> String {
    DEFAULT_RELATION_TYPE.to_string()
}

impl EdgeDescriptor {
    pub fn new(
        source_id: impl Into<Id>,
        target_id: impl Into<Id>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type: relation_type.into(),
        }
    }
}

impl std::fmt::Display for EdgeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.source_id, self.target_id, self.relation_type
        )
    }
}
