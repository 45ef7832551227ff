use serde::{Deserialize, Serialize};

use crate::model::{EdgeDescriptor, Id};

/// Identifying keys of one imported item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Edge {
        source: Id,
        target: Id,
        relation_type: String,
    },
    Node {
        id: Id,
    },
}

impl ItemKey {
    pub fn node(id: impl Into<Id>) -> Self {
        ItemKey::Node { id: id.into() }
    }

    pub fn edge(descriptor: &EdgeDescriptor) -> Self {
        ItemKey::Edge {
            source: descriptor.source_id.clone(),
            target: descriptor.target_id.clone(),
            relation_type: descriptor.relation_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyExists,
    MissingId,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyExists => write!(f, "already exists"),
            SkipReason::MissingId => write!(f, "missing id"),
        }
    }
}

/// Terminal state of one item after reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Created,
    Updated,
    Skipped(SkipReason),
    Error(String),
}

impl std::fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemOutcome::Created => write!(f, "created"),
            ItemOutcome::Updated => write!(f, "updated"),
            ItemOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            ItemOutcome::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDetail {
    /// Row the item came from, counting only non-blank lines (header is 1)
    pub row: usize,
    #[serde(flatten)]
    pub key: ItemKey,
    pub status: String,
}

/// Aggregate outcome of one import call, serialized verbatim to callers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub details: Vec<ImportDetail>,
}

impl ImportResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one item and bump the matching counter
    pub fn record(&mut self, row: usize, key: ItemKey, outcome: ItemOutcome) {
        match &outcome {
            ItemOutcome::Created => self.created += 1,
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Error(_) => self.errors += 1,
        }

        self.details.push(ImportDetail {
            row,
            key,
            status: outcome.to_string(),
        });
    }

    /// Number of items accounted for in this result
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
