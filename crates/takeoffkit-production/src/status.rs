//! Production status board.
//!
//! Percent-complete state for the active work date: one map at
//! whole-measurement granularity keyed by `(measurement, cost code)`, one
//! at per-segment granularity for segmented linear measurements. Switching
//! work date swaps both maps wholesale from a reload — never a merge.
//! Percents are clamped to `[0, 100]`; fractional values are accepted.

use std::collections::HashMap;

use takeoffkit_core::{CostCodeId, MeasurementId};
use takeoffkit_measure::{Measurement, MeasurementStore};
use tracing::debug;

use crate::api::StatusResponse;

/// Ramp color for a completed target.
pub const COMPLETE_COLOR: &str = "#22c55e";
/// Ramp color for an in-progress target.
pub const IN_PROGRESS_COLOR: &str = "#3b82f6";
/// Box-select display color for unselected geometry.
pub const BOX_SELECT_BASE: &str = "#93c5fd";
/// Box-select display color for selected geometry.
pub const BOX_SELECT_ACTIVE: &str = "#1d4ed8";

/// Badge color for a percent value (fixed two-step ramp).
pub fn percent_color(percent: f64) -> &'static str {
    if percent >= 100.0 {
        COMPLETE_COLOR
    } else {
        IN_PROGRESS_COLOR
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// A measurement's cost-code assignment for summary rollups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostCodeAssignment {
    pub measurement: MeasurementId,
    pub cost_code: CostCodeId,
    /// Quantity per hour; drives budget hours when positive.
    pub production_rate: Option<f64>,
}

/// Quantity-weighted rollup per cost code.
#[derive(Debug, Clone, PartialEq)]
pub struct CostCodeSummary {
    pub cost_code: CostCodeId,
    pub total_qty: f64,
    pub budget_hours: f64,
    pub weighted_percent: f64,
    pub earned_hours: f64,
    pub measurement_count: u32,
}

/// Date-scoped percent-complete maps.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    statuses: HashMap<(MeasurementId, CostCodeId), f64>,
    segment_statuses: HashMap<(MeasurementId, usize), f64>,
}

impl StatusBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole-measurement percent; unset targets read as zero.
    pub fn percent(&self, measurement: MeasurementId, cost_code: CostCodeId) -> f64 {
        self.statuses
            .get(&(measurement, cost_code))
            .copied()
            .unwrap_or(0.0)
    }

    /// Segment percent; unset targets read as zero.
    pub fn segment_percent(&self, measurement: MeasurementId, segment: usize) -> f64 {
        self.segment_statuses
            .get(&(measurement, segment))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sets a whole-measurement percent (clamped); returns the previous
    /// entry so an optimistic write can be reverted exactly.
    pub fn set_percent(
        &mut self,
        measurement: MeasurementId,
        cost_code: CostCodeId,
        percent: f64,
    ) -> Option<f64> {
        self.statuses
            .insert((measurement, cost_code), clamp_percent(percent))
    }

    /// Sets a segment percent (clamped); returns the previous entry.
    pub fn set_segment_percent(
        &mut self,
        measurement: MeasurementId,
        segment: usize,
        percent: f64,
    ) -> Option<f64> {
        self.segment_statuses
            .insert((measurement, segment), clamp_percent(percent))
    }

    /// Reverts a whole-measurement entry to its previous state
    /// (`None` removes it).
    pub fn revert_percent(
        &mut self,
        measurement: MeasurementId,
        cost_code: CostCodeId,
        previous: Option<f64>,
    ) {
        match previous {
            Some(value) => {
                self.statuses.insert((measurement, cost_code), value);
            }
            None => {
                self.statuses.remove(&(measurement, cost_code));
            }
        }
    }

    /// Reverts a segment entry to its previous state.
    pub fn revert_segment_percent(
        &mut self,
        measurement: MeasurementId,
        segment: usize,
        previous: Option<f64>,
    ) {
        match previous {
            Some(value) => {
                self.segment_statuses.insert((measurement, segment), value);
            }
            None => {
                self.segment_statuses.remove(&(measurement, segment));
            }
        }
    }

    /// Number of whole-measurement entries.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Whether the board has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() && self.segment_statuses.is_empty()
    }

    /// Replaces both maps wholesale from an authoritative server response.
    ///
    /// `resolve` maps server measurement ids back to local arena ids;
    /// entries for unknown measurements are dropped.
    pub fn replace_from_response(
        &mut self,
        response: &StatusResponse,
        resolve: impl Fn(i64) -> Option<MeasurementId>,
    ) {
        self.statuses.clear();
        self.segment_statuses.clear();
        for (remote, cost_code, percent) in response.parsed_statuses() {
            if let Some(id) = resolve(remote) {
                self.statuses
                    .insert((id, CostCodeId::new(cost_code)), clamp_percent(percent));
            }
        }
        for (remote, segment, percent) in response.parsed_segment_statuses() {
            if let Some(id) = resolve(remote) {
                self.segment_statuses
                    .insert((id, segment), clamp_percent(percent));
            }
        }
        debug!(
            statuses = self.statuses.len(),
            segment_statuses = self.segment_statuses.len(),
            "replaced status maps"
        );
    }

    /// Whether a measurement counts as fully complete for hide-completed
    /// filtering.
    ///
    /// A segmented measurement is complete only when every segment is at
    /// 100; a partially complete segmented measurement is never hidden.
    pub fn is_complete(&self, measurement: &Measurement, cost_code: CostCodeId) -> bool {
        if measurement.is_segmented() {
            (0..measurement.segment_count())
                .all(|segment| self.segment_percent(measurement.id, segment) >= 100.0)
        } else {
            self.percent(measurement.id, cost_code) >= 100.0
        }
    }

    /// Length-weighted rollup of segment statuses into the
    /// whole-measurement map.
    ///
    /// Weights come from normalized segment lengths, so no calibration is
    /// needed. Returns the rounded percent written, or `None` when the
    /// measurement is not segmented or degenerate.
    pub fn rollup_segments(
        &mut self,
        measurement: &Measurement,
        cost_code: CostCodeId,
    ) -> Option<f64> {
        if !measurement.is_segmented() {
            return None;
        }
        let points = &measurement.points;
        let mut total_length = 0.0;
        let mut weighted = 0.0;
        for segment in 0..measurement.segment_count() {
            let dx = points[segment + 1].x - points[segment].x;
            let dy = points[segment + 1].y - points[segment].y;
            let length = (dx * dx + dy * dy).sqrt();
            total_length += length;
            weighted += length * self.segment_percent(measurement.id, segment);
        }
        if total_length <= 0.0 {
            return None;
        }
        let average = (weighted / total_length).round();
        self.set_percent(measurement.id, cost_code, average);
        Some(average)
    }

    /// Quantity-weighted summary per cost code.
    ///
    /// Weighted percent is `Σ qty·pct / Σ qty`; budget hours accumulate
    /// `qty / production_rate` and earned hours apply the weighted percent.
    pub fn summary(
        &self,
        store: &MeasurementStore,
        assignments: &[CostCodeAssignment],
    ) -> Vec<CostCodeSummary> {
        struct Acc {
            total_qty: f64,
            budget_hours: f64,
            weighted_qty_percent: f64,
            measurement_count: u32,
        }
        let mut accumulators: HashMap<CostCodeId, Acc> = HashMap::new();

        for assignment in assignments {
            let Some(qty) = store
                .get(assignment.measurement)
                .and_then(|m| m.computed_value)
                .filter(|qty| *qty > 0.0)
            else {
                continue;
            };
            let percent = self.percent(assignment.measurement, assignment.cost_code);
            let rate = assignment.production_rate.unwrap_or(0.0);
            let acc = accumulators.entry(assignment.cost_code).or_insert(Acc {
                total_qty: 0.0,
                budget_hours: 0.0,
                weighted_qty_percent: 0.0,
                measurement_count: 0,
            });
            acc.total_qty += qty;
            if rate > 0.0 {
                acc.budget_hours += qty / rate;
            }
            acc.weighted_qty_percent += qty * percent;
            acc.measurement_count += 1;
        }

        let mut rows: Vec<CostCodeSummary> = accumulators
            .into_iter()
            .map(|(cost_code, acc)| {
                let weighted_percent = if acc.total_qty > 0.0 {
                    (acc.weighted_qty_percent / acc.total_qty * 10.0).round() / 10.0
                } else {
                    0.0
                };
                let budget_hours = (acc.budget_hours * 100.0).round() / 100.0;
                let earned_hours =
                    (acc.budget_hours * weighted_percent / 100.0 * 100.0).round() / 100.0;
                CostCodeSummary {
                    cost_code,
                    total_qty: acc.total_qty,
                    budget_hours,
                    weighted_percent,
                    earned_hours,
                    measurement_count: acc.measurement_count,
                }
            })
            .collect();
        rows.sort_by_key(|row| row.cost_code);
        rows
    }
}
