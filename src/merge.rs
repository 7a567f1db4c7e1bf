use crate::model::OutputTable;
use crate::reconcile::{Reconciled, SubjectResult};
use crate::table::{Row, Table};

pub const ROW_TYPE: &str = "row_type";

/// Kinds of rows in the merged output, in their sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RowType {
    Reconciled,
    Explanations,
    Unreconciled,
}

impl RowType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reconciled => "1-reconciled",
            Self::Explanations => "2-explanations",
            Self::Unreconciled => "3-unreconciled",
        }
    }
}

type Record = Vec<(String, String)>;

struct SortedRecord {
    subject: String,
    row_type: RowType,
    row_key: String,
    record: Record,
}

/// Reconciled, explanation and raw rows of every subject in one table.
///
/// Each subject's reconciled row comes first, then its explanations, then the
/// raw transcriptions ordered by row key.
#[must_use]
pub fn merge(table: &Table, reconciled: &Reconciled, group_by: &str, row_key: &str) -> OutputTable {
    let mut headers = vec![group_by.to_string(), ROW_TYPE.to_string()];
    for column in field_headers(table, reconciled, group_by, row_key) {
        push_unique(&mut headers, &column);
    }

    let mut sorted = Vec::new();
    for subject in &reconciled.subjects {
        sorted.push(SortedRecord {
            subject: subject.subject.clone(),
            row_type: RowType::Reconciled,
            row_key: String::new(),
            record: reconciled_record(subject, group_by),
        });
        sorted.push(SortedRecord {
            subject: subject.subject.clone(),
            row_type: RowType::Explanations,
            row_key: String::new(),
            record: explanation_record(subject, group_by),
        });
    }
    for row in table.rows() {
        sorted.push(SortedRecord {
            subject: row.group_key().to_string(),
            row_type: RowType::Unreconciled,
            row_key: row.row_key().to_string(),
            record: unreconciled_record(row),
        });
    }

    sorted.sort_by(|left, right| {
        (&left.subject, left.row_type, &left.row_key).cmp(&(
            &right.subject,
            right.row_type,
            &right.row_key,
        ))
    });

    let records = sorted
        .into_iter()
        .map(|mut sorted| {
            sorted
                .record
                .push((ROW_TYPE.to_string(), sorted.row_type.as_str().to_string()));
            sorted.record
        })
        .collect::<Vec<_>>();

    OutputTable::from_records(headers, &records, reconciled.subjects.len())
}

/// One consensus row per subject.
#[must_use]
pub fn reconciled_output(
    table: &Table,
    reconciled: &Reconciled,
    group_by: &str,
    row_key: &str,
) -> OutputTable {
    let present = reconciled.columns();
    let mut headers = vec![group_by.to_string()];
    for column in field_headers(table, reconciled, group_by, row_key) {
        if present.contains(&column.as_str()) {
            push_unique(&mut headers, &column);
        }
    }

    let records = reconciled
        .subjects
        .iter()
        .map(|subject| reconciled_record(subject, group_by))
        .collect::<Vec<_>>();
    OutputTable::from_records(headers, &records, reconciled.subjects.len())
}

/// One row of notes per subject, under the raw field columns.
#[must_use]
pub fn explanations_output(table: &Table, reconciled: &Reconciled, group_by: &str) -> OutputTable {
    let headers = raw_headers(table, group_by);
    let records = reconciled
        .subjects
        .iter()
        .map(|subject| explanation_record(subject, group_by))
        .collect::<Vec<_>>();
    OutputTable::from_records(headers, &records, reconciled.subjects.len())
}

/// The flattened transcriptions, grouped by subject.
#[must_use]
pub fn unreconciled_output(table: &Table, group_by: &str) -> OutputTable {
    let headers = raw_headers(table, group_by);
    let mut rows = table.rows().iter().collect::<Vec<_>>();
    rows.sort_by(|left, right| {
        (left.group_key(), left.row_key()).cmp(&(right.group_key(), right.row_key()))
    });

    let records = rows.into_iter().map(unreconciled_record).collect::<Vec<_>>();
    OutputTable::from_records(headers, &records, table.groups().len())
}

/// Row key, then each raw column followed by the columns derived from it.
fn field_headers(table: &Table, reconciled: &Reconciled, group_by: &str, row_key: &str) -> Vec<String> {
    let columns = table.columns();
    let derived = reconciled.columns();
    let mut headers = Vec::new();

    if columns.contains(&row_key) {
        push_unique(&mut headers, row_key);
    }
    for column in columns.iter().filter(|column| **column != group_by) {
        push_unique(&mut headers, column);
        let prefix = format!("{column}: ");
        for name in derived.iter().filter(|name| name.starts_with(&prefix)) {
            push_unique(&mut headers, name);
        }
    }
    for name in derived.iter().filter(|name| **name != group_by) {
        push_unique(&mut headers, name);
    }

    headers
}

fn raw_headers(table: &Table, group_by: &str) -> Vec<String> {
    let mut headers = vec![group_by.to_string()];
    for column in table.columns() {
        push_unique(&mut headers, column);
    }
    headers
}

fn push_unique(headers: &mut Vec<String>, name: &str) {
    if !headers.iter().any(|header| header == name) {
        headers.push(name.to_string());
    }
}

fn reconciled_record(subject: &SubjectResult, group_by: &str) -> Record {
    let mut record = vec![(group_by.to_string(), subject.subject.clone())];
    record.extend(
        subject
            .reconciled
            .iter()
            .filter(|(name, _)| *name != group_by)
            .map(|(name, value)| (name.to_string(), value.to_string())),
    );
    record
}

fn explanation_record(subject: &SubjectResult, group_by: &str) -> Record {
    let mut record = vec![(group_by.to_string(), subject.subject.clone())];
    record.extend(
        subject
            .explanations
            .iter()
            .filter(|(name, _)| name != group_by)
            .cloned(),
    );
    record
}

fn unreconciled_record(row: &Row) -> Record {
    row.fields()
        .map(|(name, value)| (name.to_string(), value.render()))
        .collect()
}
