use crate::cell::{Cell, Value};
use crate::field::{FieldValue, PointGeometry};
use crate::inflect::plural;

use super::{ColumnReconciler, count_of, mean, no_records};

#[derive(Debug, Clone, Copy, Default)]
pub struct PointReconciler;

impl ColumnReconciler for PointReconciler {
    fn reconcile(&self, group: &[&FieldValue]) -> Cell {
        if group.is_empty() {
            return no_records();
        }

        let points = group
            .iter()
            .filter_map(|value| match value {
                FieldValue::Point(point) if !point.is_empty() => Some(*point),
                _ => None,
            })
            .collect::<Vec<PointGeometry>>();

        let total = group.len();
        let count = points.len();
        if count == 0 {
            return Cell::empty(format!(
                "There are no points in {}.",
                count_of(total, "record")
            ));
        }

        let note = format!(
            "There {} {} in {}.",
            plural("was", count),
            count_of(count, "point"),
            count_of(total, "record")
        );

        let x = mean(points.iter().map(|point| point.x)).round();
        let y = mean(points.iter().map(|point| point.y)).round();
        Cell::ok(note)
            .with_value("x", Value::Number(x))
            .with_value("y", Value::Number(y))
    }
}

#[cfg(test)]
mod tests {
    use super::PointReconciler;
    use crate::cell::Value;
    use crate::column_types::ColumnReconciler;
    use crate::field::{FieldValue, PointGeometry};

    #[test]
    fn averages_points() {
        let first = FieldValue::Point(PointGeometry { x: 1, y: 10 });
        let second = FieldValue::Point(PointGeometry { x: 4, y: 20 });
        let cell = PointReconciler.reconcile(&[&first, &second]);
        assert_eq!(cell.note, "There were 2 points in 2 records.");
        assert_eq!(cell.value("x"), Some(&Value::Number(3.0)));
        assert_eq!(cell.value("y"), Some(&Value::Number(15.0)));
    }
}
