//! Session context for production tracking.
//!
//! The active cost code, work date, selection, and open percent picker are
//! one value passed into every tracker operation rather than ambient
//! state, so the invalidation rule — a context switch clears the selection
//! and picker — is enforced structurally. The generation counter tags
//! in-flight fetches; a response for an old generation is abandoned.

use chrono::NaiveDate;
use takeoffkit_core::CostCodeId;

use crate::selection::{SelectionKey, SelectionSet};

/// Mutable per-view production context.
#[derive(Debug, Clone)]
pub struct SessionContext {
    cost_code: Option<CostCodeId>,
    work_date: NaiveDate,
    generation: u64,
    selection: SelectionSet,
    open_picker: Option<SelectionKey>,
}

impl SessionContext {
    /// Creates a context for the given work date with no active cost code.
    pub fn new(work_date: NaiveDate) -> Self {
        Self {
            cost_code: None,
            work_date,
            generation: 0,
            selection: SelectionSet::new(),
            open_picker: None,
        }
    }

    /// The active cost code, if any.
    pub fn cost_code(&self) -> Option<CostCodeId> {
        self.cost_code
    }

    /// The active work date.
    pub fn work_date(&self) -> NaiveDate {
        self.work_date
    }

    /// Generation token for stale-response detection.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a response tagged with `generation` is still for this context.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Switches the active cost code.
    ///
    /// A stale selection under a different cost code is a correctness
    /// hazard, so any change clears the selection and picker and bumps the
    /// generation.
    pub fn set_cost_code(&mut self, cost_code: Option<CostCodeId>) {
        if self.cost_code == cost_code {
            return;
        }
        self.cost_code = cost_code;
        self.invalidate();
    }

    /// Switches the active work date, invalidating selection and picker.
    pub fn set_work_date(&mut self, work_date: NaiveDate) {
        if self.work_date == work_date {
            return;
        }
        self.work_date = work_date;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.selection.clear();
        self.open_picker = None;
        self.generation += 1;
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Adds keys to the selection (box-select is additive).
    pub fn select(&mut self, keys: impl IntoIterator<Item = SelectionKey>) {
        self.selection.extend(keys);
    }

    /// Clears the selection without touching the rest of the context.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Removes and returns the selected keys (bulk apply consumes them).
    pub fn take_selection(&mut self) -> Vec<SelectionKey> {
        self.selection.drain()
    }

    /// The open percent picker target, if any.
    pub fn picker(&self) -> Option<SelectionKey> {
        self.open_picker
    }

    /// Opens the percent picker on a click target.
    pub fn open_picker(&mut self, target: SelectionKey) {
        self.open_picker = Some(target);
    }

    /// Closes the percent picker.
    pub fn close_picker(&mut self) {
        self.open_picker = None;
    }
}
