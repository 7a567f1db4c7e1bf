use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReconcileError;
use crate::field::{ColumnType, FieldValue};

pub type ColumnTypes = BTreeMap<String, ColumnType>;

/// The flattened fields of one transcription event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    group_key: String,
    row_key: String,
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    #[must_use]
    pub fn new(group_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            row_key: row_key.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    #[must_use]
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// Adds a field; an existing key keeps its position and takes the new value.
    pub fn add_field(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// All transcriptions of one subject, in table order.
#[derive(Debug, Clone)]
pub struct SubjectGroup<'a> {
    pub subject: &'a str,
    pub rows: Vec<&'a Row>,
}

impl SubjectGroup<'_> {
    /// Field keys seen anywhere in the group, in first-seen order.
    #[must_use]
    pub fn field_keys(&self) -> Vec<&str> {
        first_seen(self.rows.iter().copied())
    }

    /// The values present for `key`; rows without the field contribute nothing.
    #[must_use]
    pub fn values(&self, key: &str) -> Vec<&FieldValue> {
        self.rows.iter().filter_map(|row| row.get(key)).collect()
    }
}

fn first_seen<'a>(rows: impl Iterator<Item = &'a Row>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    let mut keys = Vec::new();
    for row in rows {
        for (name, _) in row.fields() {
            if seen.insert(name) {
                keys.push(name);
            }
        }
    }
    keys
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sort_by_group_key(&mut self) {
        self.rows
            .sort_by(|left, right| left.group_key.cmp(&right.group_key));
    }

    /// Rows partitioned by subject, ordered by subject key.
    #[must_use]
    pub fn groups(&self) -> Vec<SubjectGroup<'_>> {
        let mut groups: BTreeMap<&str, Vec<&Row>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.group_key()).or_default().push(row);
        }

        groups
            .into_iter()
            .map(|(subject, rows)| SubjectGroup { subject, rows })
            .collect()
    }

    /// Every field key in the table, in first-seen order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        first_seen(self.rows.iter())
    }

    /// The column type of every field, taken from its values.
    ///
    /// A field holding values of different types in different rows is a
    /// validation error; all conflicts are reported together.
    pub fn column_types(&self) -> Result<ColumnTypes, ReconcileError> {
        let mut types = ColumnTypes::new();
        let mut conflicts: BTreeMap<&str, BTreeSet<ColumnType>> = BTreeMap::new();

        for row in &self.rows {
            for (name, value) in row.fields() {
                let column_type = value.column_type();
                let known = *types.entry(name.to_string()).or_insert(column_type);
                if known != column_type {
                    let entry = conflicts.entry(name).or_default();
                    entry.insert(known);
                    entry.insert(column_type);
                }
            }
        }

        if conflicts.is_empty() {
            return Ok(types);
        }

        Err(ReconcileError::Validation(
            conflicts
                .into_iter()
                .map(|(name, found)| {
                    let found = found
                        .iter()
                        .map(|column_type| column_type.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("Column '{name}' has values of several types: {found}")
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{Row, Table};
    use crate::error::ReconcileError;
    use crate::field::{ColumnType, FieldValue};

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    #[test]
    fn re_adding_a_key_overwrites_in_place() {
        let mut row = Row::new("s1", "c1");
        row.add_field("a", text("first"));
        row.add_field("b", text("other"));
        row.add_field("a", text("second"));

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("a"), Some(&text("second")));
        assert_eq!(
            row.fields().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn groups_by_subject_in_key_order() {
        let mut table = Table::new();
        for (subject, key) in [("s2", "c1"), ("s1", "c2"), ("s2", "c3")] {
            let mut row = Row::new(subject, key);
            row.add_field("a", text(key));
            table.push(row);
        }

        let groups = table.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].subject, "s1");
        assert_eq!(groups[1].subject, "s2");
        assert_eq!(
            groups[1]
                .rows
                .iter()
                .map(|row| row.row_key())
                .collect::<Vec<_>>(),
            vec!["c1", "c3"]
        );
    }

    #[test]
    fn missing_fields_contribute_no_values() {
        let mut first = Row::new("s1", "c1");
        first.add_field("a", text("x"));
        let mut second = Row::new("s1", "c2");
        second.add_field("b", text("y"));

        let mut table = Table::new();
        table.push(first);
        table.push(second);

        let groups = table.groups();
        assert_eq!(groups[0].field_keys(), vec!["a", "b"]);
        assert_eq!(groups[0].values("a"), vec![&text("x")]);
    }

    #[test]
    fn reports_every_conflicting_column_type() {
        let mut first = Row::new("s1", "c1");
        first.add_field("a", text("x"));
        first.add_field("b", FieldValue::Same("y".to_string()));
        let mut second = Row::new("s1", "c2");
        second.add_field("a", FieldValue::Select("x".to_string()));
        second.add_field("b", FieldValue::NoOp("y".to_string()));

        let mut table = Table::new();
        table.push(first);
        table.push(second);

        match table.column_types() {
            Err(ReconcileError::Validation(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn column_types_follow_values() {
        let mut row = Row::new("s1", "c1");
        row.add_field("a", FieldValue::Select("x".to_string()));
        let mut table = Table::new();
        table.push(row);

        let types = table.column_types().expect("types should resolve");
        assert_eq!(types.get("a"), Some(&ColumnType::Select));
    }
}
