//! Undo/redo history for measurement mutations.
//!
//! A bounded linear command log: pushing after an undo discards the redo
//! tail, and the depth is capped so pathological sessions cannot grow
//! without bound. History operations are not free — each undo/redo applies
//! a real mutation to the store and must travel the same remote-sync path
//! as a direct edit; `discard_last` exists so a failed sync can unwind
//! exactly the operation that failed.

use takeoffkit_core::{MeasurementId, Result};

use crate::measurement::{Measurement, MeasurementSnapshot};
use crate::store::MeasurementStore;

/// Default maximum history depth.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// One recorded mutation.
#[derive(Debug, Clone)]
pub enum HistoryEntry {
    /// A measurement (with any deductions drawn since) was created.
    Create { snapshot: MeasurementSnapshot },
    /// A measurement subtree was deleted.
    Delete { snapshot: MeasurementSnapshot },
    /// A measurement's fields changed.
    Update {
        id: MeasurementId,
        before: Box<Measurement>,
        after: Box<Measurement>,
    },
}

impl HistoryEntry {
    fn note_remote_id(&mut self, id: MeasurementId, remote_id: i64) {
        fn patch(m: &mut Measurement, id: MeasurementId, remote_id: i64) {
            if m.id == id {
                m.remote_id = Some(remote_id);
            }
        }
        match self {
            HistoryEntry::Create { snapshot } | HistoryEntry::Delete { snapshot } => {
                patch(&mut snapshot.measurement, id, remote_id);
                for d in &mut snapshot.deductions {
                    patch(d, id, remote_id);
                }
            }
            HistoryEntry::Update { before, after, .. } => {
                patch(before, id, remote_id);
                patch(after, id, remote_id);
            }
        }
    }
}

/// The store mutation an undo/redo just applied, for the sync path.
#[derive(Debug, Clone)]
pub enum AppliedChange {
    /// A subtree was re-inserted (undo of delete, redo of create).
    Restored(MeasurementSnapshot),
    /// A subtree was removed (undo of create, redo of delete).
    Removed(MeasurementSnapshot),
    /// A record was reverted to a previous state.
    Reverted { id: MeasurementId, now: Box<Measurement> },
}

/// Bounded undo/redo stacks over [`HistoryEntry`].
#[derive(Debug, Clone)]
pub struct MeasurementHistory {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for MeasurementHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl MeasurementHistory {
    /// Creates a history with the given maximum depth.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Records a completed mutation and clears the redo tail.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Drops the most recent entry without touching the store.
    ///
    /// Used when the mutation that produced the entry failed to persist and
    /// was rolled back by the caller.
    pub fn discard_last(&mut self) {
        self.undo_stack.pop();
    }

    /// Records a late-arriving server id in every snapshot holding this
    /// measurement, so redoing a create (or undoing a delete) keeps the
    /// reconciled identity.
    pub fn note_remote_id(&mut self, id: MeasurementId, remote_id: i64) {
        for entry in self
            .undo_stack
            .iter_mut()
            .chain(self.redo_stack.iter_mut())
        {
            entry.note_remote_id(id, remote_id);
        }
    }

    /// Whether undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of entries available to undo.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of entries available to redo.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clears both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undoes the most recent entry against the store.
    ///
    /// Returns the mutation that was applied so the caller can persist it,
    /// or `None` when there is nothing to undo. On store failure the entry
    /// stays where it was.
    pub fn undo(&mut self, store: &mut MeasurementStore) -> Result<Option<AppliedChange>> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let change = match Self::apply_inverse(&entry, store) {
            Ok(change) => change,
            Err(e) => {
                self.undo_stack.push(entry);
                return Err(e);
            }
        };
        self.redo_stack.push(entry);
        Ok(Some(change))
    }

    /// Redoes the most recently undone entry against the store.
    pub fn redo(&mut self, store: &mut MeasurementStore) -> Result<Option<AppliedChange>> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let change = match Self::apply_forward(&entry, store) {
            Ok(change) => change,
            Err(e) => {
                self.redo_stack.push(entry);
                return Err(e);
            }
        };
        self.undo_stack.push(entry);
        Ok(Some(change))
    }

    fn apply_inverse(entry: &HistoryEntry, store: &mut MeasurementStore) -> Result<AppliedChange> {
        match entry {
            HistoryEntry::Create { snapshot } => {
                let removed = store.delete(snapshot.measurement.id)?;
                Ok(AppliedChange::Removed(removed))
            }
            HistoryEntry::Delete { snapshot } => {
                store.restore(snapshot.clone())?;
                Ok(AppliedChange::Restored(snapshot.clone()))
            }
            HistoryEntry::Update { before, .. } => {
                store.apply_state((**before).clone())?;
                Ok(AppliedChange::Reverted {
                    id: before.id,
                    now: before.clone(),
                })
            }
        }
    }

    fn apply_forward(entry: &HistoryEntry, store: &mut MeasurementStore) -> Result<AppliedChange> {
        match entry {
            HistoryEntry::Create { snapshot } => {
                store.restore(snapshot.clone())?;
                Ok(AppliedChange::Restored(snapshot.clone()))
            }
            HistoryEntry::Delete { snapshot } => {
                let removed = store.delete(snapshot.measurement.id)?;
                Ok(AppliedChange::Removed(removed))
            }
            HistoryEntry::Update { after, .. } => {
                store.apply_state((**after).clone())?;
                Ok(AppliedChange::Reverted {
                    id: after.id,
                    now: after.clone(),
                })
            }
        }
    }
}
