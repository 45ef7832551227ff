use log::warn;

use crate::logic::csv_reader::CsvRow;
use crate::model::{ComponentRecord, SkipReason};

/// What the import intends to do with one nodes CSV row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePlan {
    Create(ComponentRecord),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNode {
    pub row: usize,
    pub plan: NodePlan,
}

impl PlannedNode {
    pub fn record(&self) -> Option<&ComponentRecord> {
        match &self.plan {
            NodePlan::Create(record) => Some(record),
            NodePlan::Skip(_) => None,
        }
    }
}

/// Map rows to component records by fixed position.
///
/// Rows without an id are kept in the plan as skipped so the caller can
/// report them, but they never reach the store.
pub fn plan_nodes<I>(rows: I) -> Vec<PlannedNode>
where
    I: IntoIterator<Item = CsvRow>,
{
    rows.into_iter()
        .map(|row| {
            let record = ComponentRecord::from_cells(&row.cells);

            let plan = if record.has_id() {
                NodePlan::Create(record)
            } else {
                warn!("Row {}: missing id, skipping row", row.number);
                NodePlan::Skip(SkipReason::MissingId)
            };

            PlannedNode {
                row: row.number,
                plan,
            }
        })
        .collect()
}
