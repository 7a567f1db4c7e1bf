use crate::cell::{Cell, Value};
use crate::field::{BoxGeometry, FieldValue};
use crate::inflect::plural;

use super::{ColumnReconciler, count_of, mean, no_records};

/// Mean of every box edge, rounded to whole pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxReconciler;

impl ColumnReconciler for BoxReconciler {
    fn reconcile(&self, group: &[&FieldValue]) -> Cell {
        if group.is_empty() {
            return no_records();
        }

        let boxes = group
            .iter()
            .filter_map(|value| match value {
                FieldValue::Box(geometry) if !geometry.is_empty() => Some(*geometry),
                _ => None,
            })
            .collect::<Vec<BoxGeometry>>();

        let total = group.len();
        let count = boxes.len();
        if count == 0 {
            return Cell::empty(format!(
                "There are no boxes in {}.",
                count_of(total, "record")
            ));
        }

        let note = format!(
            "There {} {} in {}.",
            plural("was", count),
            count_of(count, "box"),
            count_of(total, "record")
        );

        let edge = |select: fn(&BoxGeometry) -> i64| {
            Value::Number(mean(boxes.iter().map(select)).round())
        };

        Cell::ok(note)
            .with_value("left", edge(|geometry| geometry.left))
            .with_value("right", edge(|geometry| geometry.right))
            .with_value("top", edge(|geometry| geometry.top))
            .with_value("bottom", edge(|geometry| geometry.bottom))
    }
}
