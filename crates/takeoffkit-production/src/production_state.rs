//! Production tracking facade.
//!
//! Owns the status board and session context for one drawing and drives
//! the optimistic status flows: click-to-pick, box-select, bulk apply, and
//! date-scoped reloads. Server responses are authoritative where they
//! carry full maps; in-flight responses for a superseded context are
//! abandoned via the session generation.

use std::sync::Arc;

use chrono::NaiveDate;
use takeoffkit_core::{
    DrawingId, EngineEvent, EventBus, InputError, MeasurementId, NoticeLevel, Result,
};
use takeoffkit_measure::geometry::{PixelScale, Point, Rect};
use takeoffkit_measure::{Measurement, MeasurementStore};
use tracing::debug;

use crate::api::{
    BulkStatusItem, BulkStatusRequest, MeasurementStatusRequest, ProductionApi,
    SegmentStatusRequest,
};
use crate::hit_test;
use crate::selection::SelectionKey;
use crate::session::SessionContext;
use crate::status::{CostCodeAssignment, CostCodeSummary, StatusBoard};

/// Engine state for the production view of one drawing.
pub struct ProductionState {
    drawing: DrawingId,
    board: StatusBoard,
    session: SessionContext,
    api: Arc<dyn ProductionApi>,
    events: EventBus,
}

impl ProductionState {
    /// Creates production state for a drawing at the given work date.
    pub fn new(drawing: DrawingId, work_date: NaiveDate, api: Arc<dyn ProductionApi>) -> Self {
        Self {
            drawing,
            board: StatusBoard::new(),
            session: SessionContext::new(work_date),
            api,
            events: EventBus::default(),
        }
    }

    /// Replaces the event bus (for wiring into a host application).
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// The status board for the active work date.
    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// The session context (cost code, date, selection, picker).
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The engine event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Switches the active cost code, clearing selection and picker.
    pub fn set_cost_code(&mut self, cost_code: Option<takeoffkit_core::CostCodeId>) {
        self.session.set_cost_code(cost_code);
    }

    /// Switches the active work date and reloads both status maps
    /// wholesale for it.
    ///
    /// A slower, older fetch that resolves after another context switch is
    /// discarded rather than applied.
    pub async fn change_work_date(
        &mut self,
        work_date: NaiveDate,
        store: &MeasurementStore,
    ) -> Result<()> {
        self.session.set_work_date(work_date);
        self.refresh(store).await
    }

    /// Reloads status maps for the current context.
    pub async fn refresh(&mut self, store: &MeasurementStore) -> Result<()> {
        let generation = self.session.generation();
        let work_date = self.session.work_date();
        let api = Arc::clone(&self.api);
        match api.fetch_statuses(self.drawing, work_date).await {
            Ok(response) => {
                self.apply_status_response(generation, &response, store);
                Ok(())
            }
            Err(e) => {
                self.events
                    .notify(NoticeLevel::Error, format!("Failed to load statuses: {e}"));
                Err(e)
            }
        }
    }

    /// Applies a fetched status payload tagged with the generation it was
    /// requested under.
    ///
    /// Returns `false` when the context has moved on since the request was
    /// issued — a late-arriving response for a stale date or cost code must
    /// not overwrite the current view.
    pub fn apply_status_response(
        &mut self,
        generation: u64,
        response: &crate::api::StatusResponse,
        store: &MeasurementStore,
    ) -> bool {
        if !self.session.is_current(generation) {
            debug!(generation, "discarding status fetch for a stale context");
            return false;
        }
        self.board
            .replace_from_response(response, |remote| store.find_by_remote(remote));
        self.events.emit(EngineEvent::StatusesReloaded);
        true
    }

    /// Resolves a click and opens the percent picker on the hit target.
    pub fn click(
        &mut self,
        visible: &[&Measurement],
        point: Point,
        tolerance_px: f64,
        scale: PixelScale,
    ) -> Option<SelectionKey> {
        let target = hit_test::hit_test_point(visible, point, tolerance_px, scale)?;
        self.session.open_picker(target);
        Some(target)
    }

    /// Adds every target intersecting the rectangle to the selection.
    ///
    /// Box-select is additive; a second overlapping box never deselects.
    /// Returns the number of selected keys afterwards.
    pub fn box_select(&mut self, visible: &[&Measurement], rect: &Rect) -> usize {
        let keys = hit_test::box_select(visible, rect);
        self.session.select(keys);
        self.session.selection().len()
    }

    /// Applies a percent to one click target, optimistically, then
    /// confirms. A failure reverts exactly that target's entry.
    pub async fn apply_percent(
        &mut self,
        store: &MeasurementStore,
        target: SelectionKey,
        percent: f64,
    ) -> Result<()> {
        let cost_code = self.session.cost_code().ok_or(InputError::NoActiveCostCode)?;
        let measurement = store
            .get(target.measurement())
            .ok_or(InputError::MeasurementNotFound {
                id: target.measurement().raw(),
            })?
            .clone();
        self.session.close_picker();

        match target {
            SelectionKey::Measurement(id) => {
                let previous = self.board.set_percent(id, cost_code, percent);
                self.events.emit(EngineEvent::StatusesReloaded);

                let Some(remote_id) = measurement.remote_id else {
                    debug!(%id, "measurement not yet confirmed; status kept local");
                    return Ok(());
                };
                let request = MeasurementStatusRequest {
                    measurement_id: remote_id,
                    labour_cost_code_id: cost_code.raw(),
                    percent_complete: percent,
                    work_date: self.session.work_date(),
                };
                let api = Arc::clone(&self.api);
                match api.update_measurement_status(self.drawing, &request).await {
                    Ok(_response) => Ok(()),
                    Err(e) => {
                        self.board.revert_percent(id, cost_code, previous);
                        self.events.emit(EngineEvent::StatusesReloaded);
                        self.events
                            .notify(NoticeLevel::Error, format!("Failed to update status: {e}"));
                        Err(e)
                    }
                }
            }
            SelectionKey::Segment(id, segment) => {
                let previous = self.board.set_segment_percent(id, segment, percent);
                let rolled = self.board.rollup_segments(&measurement, cost_code);
                self.events.emit(EngineEvent::StatusesReloaded);

                let Some(remote_id) = measurement.remote_id else {
                    debug!(%id, "measurement not yet confirmed; segment status kept local");
                    return Ok(());
                };
                let generation = self.session.generation();
                let request = SegmentStatusRequest {
                    measurement_id: remote_id,
                    labour_cost_code_id: cost_code.raw(),
                    segment_index: segment,
                    percent_complete: percent,
                    work_date: self.session.work_date(),
                };
                let api = Arc::clone(&self.api);
                match api.update_segment_status(self.drawing, &request).await {
                    Ok(response) => {
                        // The segment response carries full maps and is
                        // authoritative for this context.
                        if self.session.is_current(generation) {
                            self.board.replace_from_response(&response, |remote| {
                                store.find_by_remote(remote)
                            });
                            self.events.emit(EngineEvent::StatusesReloaded);
                        }
                        Ok(())
                    }
                    Err(e) => {
                        self.board.revert_segment_percent(id, segment, previous);
                        if rolled.is_some() {
                            self.board.rollup_segments(&measurement, cost_code);
                        }
                        self.events.emit(EngineEvent::StatusesReloaded);
                        self.events.notify(
                            NoticeLevel::Error,
                            format!("Failed to update segment status: {e}"),
                        );
                        Err(e)
                    }
                }
            }
        }
    }

    /// Applies a percent to the whole selection in one batched call.
    ///
    /// The selection is consumed; the authoritative response replaces the
    /// optimistic maps. A transport failure (the whole batch failed)
    /// reverts every optimistic entry.
    pub async fn bulk_apply(&mut self, store: &MeasurementStore, percent: f64) -> Result<usize> {
        let cost_code = self.session.cost_code().ok_or(InputError::NoActiveCostCode)?;
        let keys = self.session.take_selection();
        if keys.is_empty() {
            return Ok(0);
        }

        let mut reverts: Vec<(SelectionKey, Option<f64>)> = Vec::with_capacity(keys.len());
        let mut items: Vec<BulkStatusItem> = Vec::with_capacity(keys.len());
        for key in &keys {
            let previous = match key {
                SelectionKey::Measurement(id) => self.board.set_percent(*id, cost_code, percent),
                SelectionKey::Segment(id, segment) => {
                    self.board.set_segment_percent(*id, *segment, percent)
                }
            };
            reverts.push((*key, previous));
            if let Some(remote_id) = store.get(key.measurement()).and_then(|m| m.remote_id) {
                items.push(BulkStatusItem {
                    measurement_id: remote_id,
                    segment_index: key.segment_index(),
                });
            }
        }
        self.events.emit(EngineEvent::StatusesReloaded);

        if items.is_empty() {
            debug!("no selected targets are confirmed yet; bulk apply kept local");
            return Ok(keys.len());
        }

        let generation = self.session.generation();
        let request = BulkStatusRequest {
            items,
            labour_cost_code_id: cost_code.raw(),
            percent_complete: percent,
            work_date: self.session.work_date(),
        };
        let api = Arc::clone(&self.api);
        match api.bulk_update_status(self.drawing, &request).await {
            Ok(response) => {
                if self.session.is_current(generation) {
                    self.board
                        .replace_from_response(&response, |remote| store.find_by_remote(remote));
                    self.events.emit(EngineEvent::StatusesReloaded);
                }
                Ok(keys.len())
            }
            Err(e) => {
                for (key, previous) in reverts {
                    match key {
                        SelectionKey::Measurement(id) => {
                            self.board.revert_percent(id, cost_code, previous)
                        }
                        SelectionKey::Segment(id, segment) => {
                            self.board.revert_segment_percent(id, segment, previous)
                        }
                    }
                }
                self.events.emit(EngineEvent::StatusesReloaded);
                self.events
                    .notify(NoticeLevel::Error, format!("Failed to apply statuses: {e}"));
                Err(e)
            }
        }
    }

    /// Filters out fully completed measurements when hide-completed is on.
    pub fn visible_after_hide<'a>(
        &self,
        measurements: &[&'a Measurement],
        hide_completed: bool,
    ) -> Vec<&'a Measurement> {
        let Some(cost_code) = self.session.cost_code() else {
            return measurements.to_vec();
        };
        measurements
            .iter()
            .filter(|m| !hide_completed || !self.board.is_complete(m, cost_code))
            .copied()
            .collect()
    }

    /// Quantity-weighted summary per cost code (see [`StatusBoard::summary`]).
    pub fn summary(
        &self,
        store: &MeasurementStore,
        assignments: &[CostCodeAssignment],
    ) -> Vec<CostCodeSummary> {
        self.board.summary(store, assignments)
    }

    /// Percent badge for the renderer: value plus ramp color.
    pub fn badge(
        &self,
        measurement: &Measurement,
        cost_code: takeoffkit_core::CostCodeId,
    ) -> (f64, &'static str) {
        let percent = self.board.percent(measurement.id, cost_code);
        (percent, crate::status::percent_color(percent))
    }

    /// Segment badge for the renderer.
    pub fn segment_badge(&self, measurement: MeasurementId, segment: usize) -> (f64, &'static str) {
        let percent = self.board.segment_percent(measurement, segment);
        (percent, crate::status::percent_color(percent))
    }
}
