use crate::cell::Cell;
use crate::field::FieldValue;

use super::votes::{Ballot, tally};
use super::{ColumnReconciler, no_records};

/// Majority pick over exact option values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectReconciler;

impl ColumnReconciler for SelectReconciler {
    fn reconcile(&self, group: &[&FieldValue]) -> Cell {
        if group.is_empty() {
            return no_records();
        }

        let ballot = Ballot::collect(group);
        match ballot.filled.as_slice() {
            [] => return Cell::empty(ballot.all_blank_note()),
            [only] => return Cell::ok(ballot.only_one_note()).with_text(*only),
            _ => {}
        }

        let Some(winner) = tally(&ballot.filled) else {
            return Cell::empty(ballot.all_blank_note());
        };
        let value = ballot.filled[winner.first_index];

        if winner.count == ballot.filled.len() {
            Cell::ok(ballot.match_note("Unanimous match", winner.count)).with_text(value)
        } else if winner.is_clear() {
            Cell::ok(ballot.match_note("Match", winner.count)).with_text(value)
        } else {
            Cell::ok(ballot.no_match_note("select")).with_text(ballot.filled[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SelectReconciler;
    use crate::cell::{CellStatus, Value};
    use crate::column_types::ColumnReconciler;
    use crate::field::FieldValue;

    fn select(value: &str) -> FieldValue {
        FieldValue::Select(value.to_string())
    }

    fn reconcile(values: &[FieldValue]) -> crate::cell::Cell {
        let group = values.iter().collect::<Vec<_>>();
        SelectReconciler.reconcile(&group)
    }

    #[test]
    fn single_row_round_trips() {
        let cell = reconcile(&[select("Mexico")]);
        assert_eq!(cell.status, CellStatus::Ok);
        assert_eq!(cell.value("value"), Some(&Value::Text("Mexico".into())));
        assert_eq!(cell.note, "Only 1 transcript in 1 record.");
    }

    #[test]
    fn majority_wins_with_blank_count() {
        let cell = reconcile(&[select("a"), select("b"), select("b"), select("")]);
        assert_eq!(cell.value("value"), Some(&Value::Text("b".into())));
        assert_eq!(cell.note, "Match, 2 of 4 records with 1 blank.");
    }

    #[test]
    fn unanimous_match() {
        let cell = reconcile(&[select("a"), select("a")]);
        assert_eq!(cell.note, "Unanimous match, 2 of 2 records with 0 blanks.");
    }

    #[test]
    fn ties_report_no_match_and_keep_first_value() {
        let cell = reconcile(&[select("x"), select("y")]);
        assert_eq!(cell.value("value"), Some(&Value::Text("x".into())));
        assert_eq!(cell.note, "No select match on 2 records with 0 blanks.");
    }

    #[test]
    fn all_blank_is_empty() {
        let cell = reconcile(&[select(""), select("  ")]);
        assert_eq!(cell.status, CellStatus::Empty);
        assert_eq!(cell.note, "All 2 records are blank.");
    }
}
