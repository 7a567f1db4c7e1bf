//! Reconciliation strategies, one per column type.

mod box_type;
mod length;
mod noop;
mod point;
mod same;
mod select;
mod text;
mod votes;

use std::collections::BTreeMap;

use crate::cell::{Cell, ReconciledRow};
use crate::field::{ColumnType, FieldValue};
use crate::inflect::plural;

pub use box_type::BoxReconciler;
pub use length::LengthReconciler;
pub use noop::NoOpReconciler;
pub use point::PointReconciler;
pub use same::SameReconciler;
pub use select::SelectReconciler;
pub use text::TextReconciler;

pub trait ColumnReconciler: Send + Sync {
    /// Reconciles the values one field received across one subject group.
    fn reconcile(&self, group: &[&FieldValue]) -> Cell;

    /// Derives extra columns once a subject's row is fully reconciled.
    fn reconcile_row(&self, _row: &mut ReconciledRow) {}
}

/// Static mapping from column type to strategy.
pub struct Registry {
    strategies: BTreeMap<ColumnType, Box<dyn ColumnReconciler>>,
}

impl Registry {
    /// A registry holding the built-in strategy for every column type.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self {
            strategies: BTreeMap::new(),
        };
        registry.register(ColumnType::Box, BoxReconciler);
        registry.register(ColumnType::Length, LengthReconciler);
        registry.register(ColumnType::Point, PointReconciler);
        registry.register(ColumnType::Select, SelectReconciler);
        registry.register(ColumnType::Text, TextReconciler);
        registry.register(ColumnType::NoOp, NoOpReconciler);
        registry.register(ColumnType::Same, SameReconciler);
        registry
    }

    /// Adds or replaces the strategy for `column_type`.
    pub fn register(
        &mut self,
        column_type: ColumnType,
        strategy: impl ColumnReconciler + 'static,
    ) {
        self.strategies.insert(column_type, Box::new(strategy));
    }

    #[must_use]
    pub fn get(&self, column_type: ColumnType) -> Option<&dyn ColumnReconciler> {
        self.strategies.get(&column_type).map(AsRef::as_ref)
    }

    pub fn strategies(&self) -> impl Iterator<Item = &dyn ColumnReconciler> {
        self.strategies.values().map(AsRef::as_ref)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.strategies.keys()).finish()
    }
}

/// `"5 records"`, `"1 record"`.
pub(crate) fn count_of(count: usize, word: &str) -> String {
    format!("{count} {}", plural(word, count))
}

pub(crate) fn no_records() -> Cell {
    Cell::empty("There are no records.")
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: impl Iterator<Item = i64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), value| {
        (sum + value as f64, count + 1)
    });
    if count == 0 { 0.0 } else { sum / count as f64 }
}
