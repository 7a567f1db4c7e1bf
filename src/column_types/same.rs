use std::collections::BTreeSet;

use crate::cell::Cell;
use crate::field::FieldValue;

use super::{ColumnReconciler, count_of, no_records};

/// Values that must agree across the group, like the subject id itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameReconciler;

impl ColumnReconciler for SameReconciler {
    fn reconcile(&self, group: &[&FieldValue]) -> Cell {
        let Some(first) = group.first() else {
            return no_records();
        };

        let distinct = group
            .iter()
            .map(|value| value.render())
            .collect::<BTreeSet<_>>()
            .len();

        let note = if distinct > 1 {
            format!(
                "Error: {} have {distinct} different values.",
                count_of(group.len(), "record")
            )
        } else {
            String::new()
        };

        Cell::ok(note).with_text(first.render())
    }
}
