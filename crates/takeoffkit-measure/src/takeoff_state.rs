//! Takeoff state facade.
//!
//! Owns the measurement store, the undo/redo history, and the optimistic
//! sync bookkeeping for one drawing. Every mutation applies locally first
//! (so the UI feels instantaneous), then confirms against the remote store;
//! a failure rolls back exactly the change that failed and surfaces a
//! notification event. All mutations run on the caller's event loop — the
//! engine never spawns.

use std::sync::Arc;

use takeoffkit_core::{
    DrawingId, EngineEvent, EventBus, InputError, MeasurementId, NoticeLevel, Result, Unit,
};
use tracing::debug;

use crate::bid_view::BidViewLayers;
use crate::calibration::CalibrationData;
use crate::geometry::{PixelScale, Point};
use crate::history::{AppliedChange, HistoryEntry, MeasurementHistory, DEFAULT_MAX_DEPTH};
use crate::measurement::{
    Measurement, MeasurementAttrs, MeasurementKind, MeasurementPatch, MeasurementSnapshot,
};
use crate::store::MeasurementStore;
use crate::sync::{
    CalibrationRequest, CreateMeasurementRequest, MeasurementApi, MeasurementDto,
    UpdateMeasurementRequest, VersionTracker,
};

/// Engine state for the takeoff view of one drawing.
pub struct TakeoffState {
    drawing: DrawingId,
    store: MeasurementStore,
    history: MeasurementHistory,
    versions: VersionTracker,
    api: Arc<dyn MeasurementApi>,
    events: EventBus,
    can_edit: bool,
}

impl TakeoffState {
    /// Creates an empty state for a drawing.
    ///
    /// `can_edit` is the capability flag passed in from outside; the engine
    /// does not do authorization of its own.
    pub fn new(
        drawing: DrawingId,
        scale: PixelScale,
        api: Arc<dyn MeasurementApi>,
        can_edit: bool,
    ) -> Self {
        Self {
            drawing,
            store: MeasurementStore::new(scale),
            history: MeasurementHistory::new(DEFAULT_MAX_DEPTH),
            versions: VersionTracker::new(),
            api,
            events: EventBus::default(),
            can_edit,
        }
    }

    /// Replaces the event bus (for wiring into a host application).
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// The drawing this state serves.
    pub fn drawing(&self) -> DrawingId {
        self.drawing
    }

    /// Read access to the measurement store.
    pub fn store(&self) -> &MeasurementStore {
        &self.store
    }

    /// The engine event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Whether edits are permitted.
    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    /// Whether undo is available.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is available.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Visible top-level measurements under the given bid view toggles.
    pub fn visible_measurements<'a>(&'a self, layers: &BidViewLayers) -> Vec<&'a Measurement> {
        layers.filter(&self.store)
    }

    fn ensure_edit(&self) -> Result<()> {
        if self.can_edit {
            Ok(())
        } else {
            Err(InputError::EditNotPermitted.into())
        }
    }

    fn notify_sync_failure(&self, what: &str, err: &takeoffkit_core::Error) {
        self.events
            .notify(NoticeLevel::Error, format!("Failed to {what}: {err}"));
    }

    /// Loads measurements and calibration from the remote store, replacing
    /// local state. Clears history and version counters.
    pub async fn load(&mut self) -> Result<()> {
        let api = Arc::clone(&self.api);
        let payload = api.load_drawing(self.drawing).await?;

        let scale = self.store.pixel_scale();
        self.store = MeasurementStore::new(scale);
        self.history.clear();
        self.versions = VersionTracker::new();

        if let Some(dto) = payload.calibration {
            self.store.set_calibration(dto.into_data());
        }
        for dto in payload.measurements {
            self.insert_from_dto(dto)?;
        }
        self.events.emit(EngineEvent::DrawingLoaded);
        Ok(())
    }

    fn insert_from_dto(&mut self, dto: MeasurementDto) -> Result<()> {
        let attrs = MeasurementAttrs {
            name: dto.name,
            color: dto.color,
            category: dto.category,
            condition_id: dto.takeoff_condition_id.map(takeoffkit_core::ConditionId::new),
            bid_area_id: dto.bid_area_id.map(takeoffkit_core::BidAreaId::new),
            scope: dto.scope,
            variation_id: dto.variation_id.map(takeoffkit_core::VariationId::new),
        };
        let id = self.store.create(dto.kind, dto.points, attrs)?;
        self.store.set_remote_id(id, dto.id);
        for d in dto.deductions {
            let child = self.store.add_deduction(id, d.points, Some(d.name))?;
            self.store.set_remote_id(child, d.id);
        }
        Ok(())
    }

    /// Creates a measurement when a drawing gesture completes.
    ///
    /// The record is immediately addressable under its local id; the server
    /// id is reconciled on confirmation. On failure the local entry is
    /// rolled back and a notification is emitted.
    pub async fn create_measurement(
        &mut self,
        kind: MeasurementKind,
        points: Vec<Point>,
        attrs: MeasurementAttrs,
    ) -> Result<MeasurementId> {
        self.ensure_edit()?;
        let id = self.store.create(kind, points, attrs)?;
        let record = self.store.get(id).expect("just created").clone();
        self.history.push(HistoryEntry::Create {
            snapshot: MeasurementSnapshot::single(record.clone()),
        });
        let version = self.versions.begin(id);
        self.events.emit(EngineEvent::MeasurementCreated { id });

        let request = CreateMeasurementRequest::from_measurement(&record, None);
        let api = Arc::clone(&self.api);
        match api.create_measurement(self.drawing, &request).await {
            Ok(dto) => {
                if self.versions.accept(id, version) {
                    self.store.set_remote_id(id, dto.id);
                    self.history.note_remote_id(id, dto.id);
                }
                Ok(id)
            }
            Err(e) => {
                let _ = self.store.delete(id);
                self.history.discard_last();
                self.versions.forget(id);
                self.events.emit(EngineEvent::MeasurementDeleted { id });
                self.notify_sync_failure("save measurement", &e);
                Err(e)
            }
        }
    }

    /// Creates a deduction under a parent, inheriting its kind and styling.
    pub async fn add_deduction(
        &mut self,
        parent: MeasurementId,
        points: Vec<Point>,
        name: Option<String>,
    ) -> Result<MeasurementId> {
        self.ensure_edit()?;
        let parent_remote = self
            .store
            .get(parent)
            .ok_or(InputError::MeasurementNotFound { id: parent.raw() })?
            .remote_id;
        let id = self.store.add_deduction(parent, points, name)?;
        let record = self.store.get(id).expect("just created").clone();
        self.history.push(HistoryEntry::Create {
            snapshot: MeasurementSnapshot::single(record.clone()),
        });
        let version = self.versions.begin(id);
        self.events.emit(EngineEvent::MeasurementCreated { id });
        self.events.emit(EngineEvent::MeasurementUpdated { id: parent });

        let request = CreateMeasurementRequest::from_measurement(&record, parent_remote);
        let api = Arc::clone(&self.api);
        match api.create_measurement(self.drawing, &request).await {
            Ok(dto) => {
                if self.versions.accept(id, version) {
                    self.store.set_remote_id(id, dto.id);
                    self.history.note_remote_id(id, dto.id);
                }
                Ok(id)
            }
            Err(e) => {
                let _ = self.store.delete(id);
                self.history.discard_last();
                self.versions.forget(id);
                self.events.emit(EngineEvent::MeasurementDeleted { id });
                self.events.emit(EngineEvent::MeasurementUpdated { id: parent });
                self.notify_sync_failure("save deduction", &e);
                Err(e)
            }
        }
    }

    /// Applies a patch (vertex drag, rename, restyle) atomically.
    pub async fn update_measurement(
        &mut self,
        id: MeasurementId,
        patch: MeasurementPatch,
    ) -> Result<()> {
        self.ensure_edit()?;
        let before = self
            .store
            .get(id)
            .ok_or(InputError::MeasurementNotFound { id: id.raw() })?
            .clone();
        let after = self.store.update(id, patch)?;
        self.history.push(HistoryEntry::Update {
            id,
            before: Box::new(before.clone()),
            after: Box::new(after.clone()),
        });
        let version = self.versions.begin(id);
        self.events.emit(EngineEvent::MeasurementUpdated { id });

        let Some(remote_id) = after.remote_id else {
            debug!(%id, "measurement not yet confirmed; update kept local");
            return Ok(());
        };
        let request = UpdateMeasurementRequest::from_measurement(&after);
        let api = Arc::clone(&self.api);
        match api.update_measurement(self.drawing, remote_id, &request).await {
            Ok(_dto) => {
                // Local recompute matches the server's; nothing to merge.
                let _ = self.versions.accept(id, version);
                Ok(())
            }
            Err(e) => {
                self.store.apply_state(before)?;
                self.history.discard_last();
                self.events.emit(EngineEvent::MeasurementUpdated { id });
                self.notify_sync_failure("update measurement", &e);
                Err(e)
            }
        }
    }

    /// Deletes a measurement; a parent takes its deductions with it.
    pub async fn delete_measurement(&mut self, id: MeasurementId) -> Result<()> {
        self.ensure_edit()?;
        let snapshot = self.store.delete(id)?;
        self.history.push(HistoryEntry::Delete {
            snapshot: snapshot.clone(),
        });
        self.events.emit(EngineEvent::MeasurementDeleted { id });

        let Some(remote_id) = snapshot.measurement.remote_id else {
            debug!(%id, "measurement not yet confirmed; delete kept local");
            return Ok(());
        };
        let api = Arc::clone(&self.api);
        match api.delete_measurement(self.drawing, remote_id).await {
            Ok(_echo) => {
                self.versions.forget(id);
                Ok(())
            }
            Err(e) => {
                self.store.restore(snapshot)?;
                self.history.discard_last();
                self.events.emit(EngineEvent::MeasurementCreated { id });
                self.notify_sync_failure("delete measurement", &e);
                Err(e)
            }
        }
    }

    /// Undoes the most recent mutation.
    ///
    /// History operations are real mutations: they travel the same sync
    /// path and a remote failure re-applies the undone change locally.
    pub async fn undo(&mut self) -> Result<()> {
        self.ensure_edit()?;
        let Some(change) = self.history.undo(&mut self.store)? else {
            return Ok(());
        };
        self.emit_change(&change);
        match self.sync_change(&change).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Ok(Some(reverted)) = self.history.redo(&mut self.store) {
                    self.emit_change(&reverted);
                }
                self.notify_sync_failure("undo", &e);
                Err(e)
            }
        }
    }

    /// Redoes the most recently undone mutation.
    pub async fn redo(&mut self) -> Result<()> {
        self.ensure_edit()?;
        let Some(change) = self.history.redo(&mut self.store)? else {
            return Ok(());
        };
        self.emit_change(&change);
        match self.sync_change(&change).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Ok(Some(reverted)) = self.history.undo(&mut self.store) {
                    self.emit_change(&reverted);
                }
                self.notify_sync_failure("redo", &e);
                Err(e)
            }
        }
    }

    fn emit_change(&self, change: &AppliedChange) {
        match change {
            AppliedChange::Restored(snapshot) => self.events.emit(EngineEvent::MeasurementCreated {
                id: snapshot.measurement.id,
            }),
            AppliedChange::Removed(snapshot) => self.events.emit(EngineEvent::MeasurementDeleted {
                id: snapshot.measurement.id,
            }),
            AppliedChange::Reverted { id, .. } => {
                self.events.emit(EngineEvent::MeasurementUpdated { id: *id })
            }
        }
    }

    async fn sync_change(&mut self, change: &AppliedChange) -> Result<()> {
        let api = Arc::clone(&self.api);
        match change {
            AppliedChange::Removed(snapshot) => {
                let Some(remote_id) = snapshot.measurement.remote_id else {
                    debug!("removed measurement had no server id; nothing to sync");
                    return Ok(());
                };
                api.delete_measurement(self.drawing, remote_id).await?;
                Ok(())
            }
            AppliedChange::Restored(snapshot) => {
                let Some(remote_id) = snapshot.measurement.remote_id else {
                    debug!("restored measurement had no server id; nothing to sync");
                    return Ok(());
                };
                api.restore_measurement(self.drawing, remote_id).await?;
                Ok(())
            }
            AppliedChange::Reverted { id, now } => {
                let version = self.versions.begin(*id);
                let Some(remote_id) = now.remote_id else {
                    debug!(%id, "reverted measurement had no server id; nothing to sync");
                    return Ok(());
                };
                let request = UpdateMeasurementRequest::from_measurement(now);
                api.update_measurement(self.drawing, remote_id, &request)
                    .await?;
                let _ = self.versions.accept(*id, version);
                Ok(())
            }
        }
    }

    /// Calibrates from a drawn reference line, recomputing every value.
    pub async fn calibrate_from_distance(
        &mut self,
        a: Point,
        b: Point,
        real_distance: f64,
        unit: Unit,
    ) -> Result<()> {
        self.ensure_edit()?;
        let calibration = CalibrationData::from_distance(
            a,
            b,
            real_distance,
            unit,
            self.store.pixel_scale(),
        )?;
        self.save_calibration(calibration).await
    }

    /// Calibrates from a paper size and printed scale ratio.
    pub async fn calibrate_from_scale(
        &mut self,
        paper_size: takeoffkit_core::PaperSize,
        drawing_scale: &str,
        unit: Unit,
    ) -> Result<()> {
        self.ensure_edit()?;
        let calibration = CalibrationData::from_scale(
            paper_size,
            drawing_scale,
            unit,
            self.store.pixel_scale().width_px,
        )?;
        self.save_calibration(calibration).await
    }

    async fn save_calibration(&mut self, calibration: CalibrationData) -> Result<()> {
        let previous = self.store.calibration().cloned();
        self.store.set_calibration(calibration.clone());
        self.events.emit(EngineEvent::CalibrationChanged);

        let request = CalibrationRequest::from_data(&calibration);
        let api = Arc::clone(&self.api);
        match api.save_calibration(self.drawing, &request).await {
            Ok(_saved) => Ok(()),
            Err(e) => {
                match previous {
                    Some(p) => self.store.set_calibration(p),
                    None => {
                        self.store.clear_calibration();
                    }
                }
                self.events.emit(EngineEvent::CalibrationChanged);
                self.notify_sync_failure("save calibration", &e);
                Err(e)
            }
        }
    }

    /// Deletes calibration, clearing derived quantities on every measurement.
    pub async fn delete_calibration(&mut self) -> Result<()> {
        self.ensure_edit()?;
        let Some(previous) = self.store.clear_calibration() else {
            return Ok(());
        };
        self.events.emit(EngineEvent::CalibrationCleared);

        let api = Arc::clone(&self.api);
        match api.delete_calibration(self.drawing).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.store.set_calibration(previous);
                self.events.emit(EngineEvent::CalibrationChanged);
                self.notify_sync_failure("delete calibration", &e);
                Err(e)
            }
        }
    }
}
