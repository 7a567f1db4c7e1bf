use std::collections::BTreeSet;

use tracing::debug;

use crate::cell::{Cell, ReconciledRow};
use crate::column_types::Registry;
use crate::error::ReconcileError;
use crate::table::{ColumnTypes, SubjectGroup, Table};

/// The consensus of one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectResult {
    pub subject: String,
    pub cells: Vec<(String, Cell)>,
    pub reconciled: ReconciledRow,
    pub explanations: Vec<(String, String)>,
}

impl SubjectResult {
    #[must_use]
    pub fn cell(&self, field: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, cell)| cell)
    }

    #[must_use]
    pub fn explanation(&self, field: &str) -> Option<&str> {
        self.explanations
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, note)| note.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub subjects: Vec<SubjectResult>,
}

impl Reconciled {
    #[must_use]
    pub fn subject(&self, subject: &str) -> Option<&SubjectResult> {
        self.subjects.iter().find(|result| result.subject == subject)
    }

    /// Reconciled column names across all subjects, in first-seen order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.subjects
            .iter()
            .flat_map(|result| result.reconciled.iter().map(|(name, _)| name))
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Reconciles every field of every subject in `table`.
///
/// Fields without a column type, or whose type has no registered strategy,
/// are collected and reported together.
pub fn reconcile_table(
    table: &Table,
    column_types: &ColumnTypes,
    registry: &Registry,
) -> Result<Reconciled, ReconcileError> {
    let mut errors = BTreeSet::new();
    let mut subjects = Vec::new();

    for group in table.groups() {
        match reconcile_group(&group, column_types, registry) {
            Ok(result) => subjects.push(result),
            Err(missing) => errors.extend(missing),
        }
    }

    if !errors.is_empty() {
        return Err(ReconcileError::Validation(errors.into_iter().collect()));
    }

    debug!(subjects = subjects.len(), "reconciled table");
    Ok(Reconciled { subjects })
}

fn reconcile_group(
    group: &SubjectGroup<'_>,
    column_types: &ColumnTypes,
    registry: &Registry,
) -> Result<SubjectResult, Vec<String>> {
    let mut errors = Vec::new();
    let mut cells = Vec::new();

    for field in group.field_keys() {
        let Some(column_type) = column_types.get(field).copied() else {
            errors.push(format!("No column type for field '{field}'"));
            continue;
        };
        let Some(strategy) = registry.get(column_type) else {
            errors.push(format!(
                "No reconciler registered for column type '{column_type}'"
            ));
            continue;
        };

        let values = group.values(field);
        cells.push((field.to_string(), strategy.reconcile(&values)));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut reconciled = ReconciledRow::new();
    let mut explanations = Vec::with_capacity(cells.len());
    for (field, cell) in &cells {
        for (column, value) in cell.columns(field) {
            reconciled.insert(column, value.clone());
        }
        explanations.push((field.clone(), cell.note.clone()));
    }

    for strategy in registry.strategies() {
        strategy.reconcile_row(&mut reconciled);
    }

    Ok(SubjectResult {
        subject: group.subject.to_string(),
        cells,
        reconciled,
        explanations,
    })
}

#[cfg(test)]
mod tests {
    use super::reconcile_table;
    use crate::cell::{CellStatus, Value};
    use crate::column_types::Registry;
    use crate::error::ReconcileError;
    use crate::field::{ColumnType, FieldValue, LineGeometry};
    use crate::table::{ColumnTypes, Row, Table};

    fn row(subject: &str, key: &str, fields: Vec<(&str, FieldValue)>) -> Row {
        let mut row = Row::new(subject, key);
        row.add_field("subject_id", FieldValue::Same(subject.to_string()));
        for (name, value) in fields {
            row.add_field(name, value);
        }
        row
    }

    fn line(x2: i64) -> FieldValue {
        FieldValue::Length(LineGeometry {
            x1: 0,
            y1: 0,
            x2,
            y2: 0,
        })
    }

    #[test]
    fn reconciles_each_subject_and_field() {
        let mut table = Table::new();
        table.push(row(
            "s1",
            "c1",
            vec![("~T1~ Name", FieldValue::Text("oak".into()))],
        ));
        table.push(row(
            "s1",
            "c2",
            vec![("~T1~ Name", FieldValue::Text("oak".into()))],
        ));
        table.push(row("s2", "c3", vec![]));

        let types = table.column_types().expect("types");
        let reconciled = reconcile_table(&table, &types, &Registry::builtin()).expect("ok");

        assert_eq!(reconciled.subjects.len(), 2);
        let first = reconciled.subject("s1").expect("s1");
        assert_eq!(
            first.reconciled.get("~T1~ Name"),
            Some(&Value::Text("oak".into()))
        );
        assert_eq!(
            first.explanation("~T1~ Name"),
            Some("Unanimous match, 2 of 2 records with 0 blanks.")
        );
        assert!(reconciled.subject("s2").expect("s2").cell("~T1~ Name").is_none());
    }

    #[test]
    fn row_adjustment_runs_after_all_fields() {
        let mut table = Table::new();
        table.push(row(
            "s1",
            "c1",
            vec![
                ("~T1~ Scale 2 mm", line(200)),
                ("~T2~ Leaf", line(30)),
            ],
        ));

        let types = table.column_types().expect("types");
        let reconciled = reconcile_table(&table, &types, &Registry::builtin()).expect("ok");
        let subject = &reconciled.subjects[0];

        assert_eq!(
            subject.reconciled.get("~T2~ Leaf: length mm"),
            Some(&Value::Number(0.3))
        );
        assert_eq!(
            subject.cell("~T1~ Scale 2 mm").map(|cell| cell.status),
            Some(CellStatus::Ok)
        );
    }

    #[test]
    fn untyped_fields_are_all_reported() {
        let mut table = Table::new();
        table.push(row(
            "s1",
            "c1",
            vec![
                ("a", FieldValue::Text("x".into())),
                ("b", FieldValue::Text("y".into())),
            ],
        ));

        let mut types = ColumnTypes::new();
        types.insert("subject_id".to_string(), ColumnType::Same);

        match reconcile_table(&table, &types, &Registry::builtin()) {
            Err(ReconcileError::Validation(messages)) => assert_eq!(
                messages,
                vec![
                    "No column type for field 'a'".to_string(),
                    "No column type for field 'b'".to_string()
                ]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
