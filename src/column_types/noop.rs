use crate::cell::Cell;
use crate::field::FieldValue;

use super::{ColumnReconciler, no_records};

/// Copies the first raw value verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReconciler;

impl ColumnReconciler for NoOpReconciler {
    fn reconcile(&self, group: &[&FieldValue]) -> Cell {
        match group.first() {
            Some(first) => Cell::ok("").with_text(first.render()),
            None => no_records(),
        }
    }
}
