use std::fmt::{Display, Formatter};

/// Attribute name whose value takes the field's own column.
pub const VALUE: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Ok,
    Empty,
}

impl CellStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Number(_) => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", (value * 100.0).round() / 100.0),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// The reconciliation of one field across one subject group.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub status: CellStatus,
    pub note: String,
    pub values: Vec<(String, Value)>,
}

impl Cell {
    #[must_use]
    pub fn ok(note: impl Into<String>) -> Self {
        Self {
            status: CellStatus::Ok,
            note: note.into(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn empty(note: impl Into<String>) -> Self {
        Self {
            status: CellStatus::Empty,
            note: note.into(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn with_text(self, value: impl Into<String>) -> Self {
        self.with_value(VALUE, Value::Text(value.into()))
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, value)| value)
    }

    /// The output columns of this cell for `field`.
    pub fn columns<'a>(&'a self, field: &'a str) -> impl Iterator<Item = (String, &'a Value)> {
        self.values
            .iter()
            .map(move |(attribute, value)| (column_name(field, attribute), value))
    }
}

/// `value` maps to the field itself, anything else to `"<field>: <attribute>"`.
#[must_use]
pub fn column_name(field: &str, attribute: &str) -> String {
    if attribute == VALUE {
        field.to_string()
    } else {
        format!("{field}: {}", attribute.replace('_', " "))
    }
}

/// The reconciled columns of one subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledRow {
    columns: Vec<(String, Value)>,
}

impl ReconciledRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.columns.iter_mut().find(|(column, _)| *column == name) {
            slot.1 = value;
        } else {
            self.columns.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, ReconciledRow, Value, column_name};

    #[test]
    fn attributes_map_to_field_columns() {
        assert_eq!(column_name("~T1~ Name", "value"), "~T1~ Name");
        assert_eq!(
            column_name("~T1~ Scale", "length_pixels"),
            "~T1~ Scale: length pixels"
        );

        let cell = Cell::ok("note").with_value("length_pixels", Value::Number(5.0));
        let columns = cell.columns("~T1~ Scale").collect::<Vec<_>>();
        assert_eq!(columns[0].0, "~T1~ Scale: length pixels");
    }

    #[test]
    fn numbers_render_with_at_most_two_decimals() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(0.3).to_string(), "0.3");
        assert_eq!(Value::Number(2.236_067_977).to_string(), "2.24");
    }

    #[test]
    fn reconciled_row_insert_overwrites() {
        let mut row = ReconciledRow::new();
        row.insert("a", Value::Number(1.0));
        row.insert("a", Value::Number(2.0));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("a"), Some(&Value::Number(2.0)));
    }
}
