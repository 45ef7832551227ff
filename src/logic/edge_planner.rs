use log::warn;

use crate::logic::csv_reader::CsvRow;
use crate::model::{EdgeDescriptor, DEFAULT_RELATION_TYPE};

/// Separator between several targets listed in one cell
pub const TARGET_SEPARATOR: char = ';';

/// Column positions of an edges CSV, resolved from its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeColumns {
    pub source: usize,
    pub target: usize,
    pub relation_type: Option<usize>,
}

impl Default for EdgeColumns {
    fn default() -> Self {
        Self {
            source: 0,
            target: 1,
            relation_type: None,
        }
    }
}

impl EdgeColumns {
    /// Look columns up by case-insensitive name. `source` and `target` fall
    /// back to the first two positions; the relation type is read from
    /// `type_of_relation`, else `type`, else not at all.
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Self {
        let names: Vec<String> = header
            .iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .collect();
        let position = |wanted: &str| names.iter().position(|name| name == wanted);

        Self {
            source: position("source").unwrap_or(0),
            target: position("target").unwrap_or(1),
            relation_type: position("type_of_relation").or_else(|| position("type")),
        }
    }

    fn relation_type<'r>(&self, row: &'r CsvRow) -> &'r str {
        match self.relation_type.map(|index| row.cell(index)) {
            Some(value) if !value.is_empty() => value,
            _ => DEFAULT_RELATION_TYPE,
        }
    }
}

/// One edge to reconcile, tagged with the CSV row it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEdge {
    pub row: usize,
    pub descriptor: EdgeDescriptor,
}

/// Turn rows into edge descriptors, fanning a multi-target cell out into one
/// descriptor per target. Rows missing a source or target are dropped.
pub fn plan_edges<I>(columns: &EdgeColumns, rows: I) -> Vec<PlannedEdge>
where
    I: IntoIterator<Item = CsvRow>,
{
    let mut planned = Vec::new();

    for row in rows {
        let source = row.cell(columns.source);
        let target = row.cell(columns.target);

        if source.is_empty() || target.is_empty() {
            warn!("Row {}: missing source or target, skipping row", row.number);
            continue;
        }

        let relation_type = columns.relation_type(&row);

        let before = planned.len();
        planned.extend(
            target
                .split(TARGET_SEPARATOR)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|target_id| PlannedEdge {
                    row: row.number,
                    descriptor: EdgeDescriptor::new(source, target_id, relation_type),
                }),
        );

        if planned.len() == before {
            warn!("Row {}: target cell lists no ids, skipping row", row.number);
        }
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(number: usize, cells: &[&str]) -> CsvRow {
        CsvRow::new(number, cells.iter().map(|c| c.to_string()).collect())
    }

    fn descriptors(planned: &[PlannedEdge]) -> Vec<(&str, &str, &str)> {
        planned
            .iter()
            .map(|p| {
                (
                    p.descriptor.source_id.as_str(),
                    p.descriptor.target_id.as_str(),
                    p.descriptor.relation_type.as_str(),
                )
            })
            .collect()
    }

    #[test]
    fn columns_resolve_by_name_in_any_order() {
        let columns = EdgeColumns::resolve(&["Type_Of_Relation", " TARGET ", "Source"]);
        assert_eq!(
            columns,
            EdgeColumns {
                source: 2,
                target: 1,
                relation_type: Some(0),
            }
        );
    }

    #[test]
    fn type_column_is_the_second_choice() {
        let columns = EdgeColumns::resolve(&["source", "target", "type"]);
        assert_eq!(columns.relation_type, Some(2));

        let both = EdgeColumns::resolve(&["type", "source", "target", "type_of_relation"]);
        assert_eq!(both.relation_type, Some(3));
    }

    #[test]
    fn unnamed_columns_fall_back_to_position() {
        let columns = EdgeColumns::resolve(&["from", "to", "kind"]);
        assert_eq!(columns, EdgeColumns::default());
    }

    #[test]
    fn multi_target_cell_fans_out() {
        let columns = EdgeColumns::resolve(&["source", "target", "type_of_relation"]);
        let planned = plan_edges(&columns, vec![row(2, &["A", "B;C;D", "USES"])]);

        assert_eq!(
            descriptors(&planned),
            vec![("A", "B", "USES"), ("A", "C", "USES"), ("A", "D", "USES")]
        );
        assert!(planned.iter().all(|p| p.row == 2));
    }

    #[test]
    fn empty_target_tokens_are_ignored() {
        let columns = EdgeColumns::default();
        let planned = plan_edges(&columns, vec![row(2, &["A", " B ; ;C;"])]);

        assert_eq!(
            descriptors(&planned),
            vec![("A", "B", "CONNECTS_TO"), ("A", "C", "CONNECTS_TO")]
        );
    }

    #[test]
    fn rows_missing_an_endpoint_are_dropped() {
        let columns = EdgeColumns::resolve(&["source", "target", "type"]);
        let planned = plan_edges(
            &columns,
            vec![
                row(2, &["", "B", "USES"]),
                row(3, &["A", "  ", "USES"]),
                row(4, &["A"]),
                row(5, &["A", ";", "USES"]),
                row(6, &["A", "B", ""]),
            ],
        );

        assert_eq!(descriptors(&planned), vec![("A", "B", "CONNECTS_TO")]);
        assert_eq!(planned[0].row, 6);
    }
}
