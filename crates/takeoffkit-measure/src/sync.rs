//! Remote sync: wire contracts and optimistic-confirmation tracking.
//!
//! Mutations apply locally first and confirm against the remote store
//! afterwards. Each submitted write bumps a per-identity version counter;
//! a confirmation is applied only when no newer local edit has superseded
//! it, otherwise it is silently discarded (stale responses must not clobber
//! fresher state). Transport details live behind [`MeasurementApi`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use takeoffkit_core::{DrawingId, MeasurementId, Result, Unit};
use tracing::debug;

use crate::calibration::{CalibrationData, CalibrationMethod};
use crate::geometry::Point;
use crate::measurement::{BidScope, Measurement, MeasurementKind};

/// Per-identity monotonically increasing version counters.
///
/// `begin` records a submitted write; `is_current` decides whether a
/// later confirmation still speaks for the latest local edit.
#[derive(Debug, Clone, Default)]
pub struct VersionTracker {
    versions: HashMap<MeasurementId, u64>,
}

impl VersionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new submitted write and returns its version.
    pub fn begin(&mut self, id: MeasurementId) -> u64 {
        let v = self.versions.entry(id).or_insert(0);
        *v += 1;
        *v
    }

    /// The latest submitted version for an identity (0 if never written).
    pub fn current(&self, id: MeasurementId) -> u64 {
        self.versions.get(&id).copied().unwrap_or(0)
    }

    /// Whether a confirmation for `version` may still be applied.
    ///
    /// True when the version matches or exceeds the latest submitted one;
    /// a stale confirmation (older version) must be discarded.
    pub fn is_current(&self, id: MeasurementId, version: u64) -> bool {
        version >= self.current(id)
    }

    /// Logs and reports whether a confirmation should be applied.
    pub fn accept(&self, id: MeasurementId, version: u64) -> bool {
        let current = self.is_current(id, version);
        if !current {
            debug!(%id, version, latest = self.current(id), "discarding stale confirmation");
        }
        current
    }

    /// Drops the counter for a deleted identity.
    pub fn forget(&mut self, id: MeasurementId) {
        self.versions.remove(&id);
    }
}

/// Measurement as it crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementDto {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MeasurementKind,
    pub color: String,
    #[serde(default)]
    pub category: Option<String>,
    pub points: Vec<Point>,
    #[serde(default)]
    pub computed_value: Option<f64>,
    #[serde(default)]
    pub perimeter_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub takeoff_condition_id: Option<i64>,
    #[serde(default)]
    pub bid_area_id: Option<i64>,
    #[serde(default)]
    pub parent_measurement_id: Option<i64>,
    #[serde(default)]
    pub scope: BidScope,
    #[serde(default)]
    pub variation_id: Option<i64>,
    #[serde(default)]
    pub deductions: Vec<MeasurementDto>,
}

/// Calibration as it crosses the wire (flattened reference points).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationDto {
    pub method: CalibrationMethod,
    #[serde(default)]
    pub point_a_x: Option<f64>,
    #[serde(default)]
    pub point_a_y: Option<f64>,
    #[serde(default)]
    pub point_b_x: Option<f64>,
    #[serde(default)]
    pub point_b_y: Option<f64>,
    #[serde(default)]
    pub real_distance: Option<f64>,
    pub unit: Unit,
    #[serde(default)]
    pub paper_size: Option<String>,
    #[serde(default)]
    pub drawing_scale: Option<String>,
    pub pixels_per_unit: f64,
}

impl CalibrationDto {
    /// Converts the wire form into engine calibration state.
    pub fn into_data(self) -> CalibrationData {
        let reference_points = match (self.point_a_x, self.point_a_y, self.point_b_x, self.point_b_y)
        {
            (Some(ax), Some(ay), Some(bx), Some(by)) => {
                Some((Point::new(ax, ay), Point::new(bx, by)))
            }
            _ => None,
        };
        CalibrationData {
            method: self.method,
            reference_points,
            real_distance: self.real_distance,
            unit: self.unit,
            paper_size: self.paper_size.and_then(|p| p.parse().ok()),
            drawing_scale: self.drawing_scale,
            pixels_per_unit: self.pixels_per_unit,
        }
    }

    /// Builds the wire form from engine calibration state.
    pub fn from_data(data: &CalibrationData) -> Self {
        let (a, b) = match data.reference_points {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };
        Self {
            method: data.method,
            point_a_x: a.map(|p| p.x),
            point_a_y: a.map(|p| p.y),
            point_b_x: b.map(|p| p.x),
            point_b_y: b.map(|p| p.y),
            real_distance: data.real_distance,
            unit: data.unit,
            paper_size: data.paper_size.map(|p| p.to_string()),
            drawing_scale: data.drawing_scale.clone(),
            pixels_per_unit: data.pixels_per_unit,
        }
    }
}

/// Initial load payload for a drawing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingPayload {
    #[serde(default)]
    pub measurements: Vec<MeasurementDto>,
    #[serde(default)]
    pub calibration: Option<CalibrationDto>,
}

/// Create request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMeasurementRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MeasurementKind,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub takeoff_condition_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_area_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_measurement_id: Option<i64>,
    pub scope: BidScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<i64>,
}

impl CreateMeasurementRequest {
    /// Builds the request for a freshly created record.
    ///
    /// `parent_remote_id` must be the parent's server id when the record is
    /// a deduction.
    pub fn from_measurement(m: &Measurement, parent_remote_id: Option<i64>) -> Self {
        Self {
            name: m.name.clone(),
            kind: m.kind,
            color: m.color.clone(),
            category: m.category.clone(),
            points: m.points.clone(),
            takeoff_condition_id: m.condition_id.map(|c| c.raw()),
            bid_area_id: m.bid_area_id.map(|b| b.raw()),
            parent_measurement_id: parent_remote_id,
            scope: m.scope,
            variation_id: m.variation_id.map(|v| v.raw()),
        }
    }
}

/// Update (patch) request body; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMeasurementRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub takeoff_condition_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_area_id: Option<i64>,
}

impl UpdateMeasurementRequest {
    /// Builds a full-state update from a record (history revert path).
    pub fn from_measurement(m: &Measurement) -> Self {
        Self {
            name: Some(m.name.clone()),
            color: Some(m.color.clone()),
            category: m.category.clone(),
            points: Some(m.points.clone()),
            takeoff_condition_id: m.condition_id.map(|c| c.raw()),
            bid_area_id: m.bid_area_id.map(|b| b.raw()),
        }
    }
}

/// Calibration save request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum CalibrationRequest {
    Manual {
        point_a_x: f64,
        point_a_y: f64,
        point_b_x: f64,
        point_b_y: f64,
        real_distance: f64,
        unit: Unit,
    },
    Preset {
        paper_size: String,
        drawing_scale: String,
        unit: Unit,
    },
}

impl CalibrationRequest {
    /// Builds the request from engine calibration state.
    pub fn from_data(data: &CalibrationData) -> Self {
        match (data.method, data.reference_points) {
            (CalibrationMethod::Manual, Some((a, b))) => CalibrationRequest::Manual {
                point_a_x: a.x,
                point_a_y: a.y,
                point_b_x: b.x,
                point_b_y: b.y,
                real_distance: data.real_distance.unwrap_or_default(),
                unit: data.unit,
            },
            _ => CalibrationRequest::Preset {
                paper_size: data
                    .paper_size
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                drawing_scale: data.drawing_scale.clone().unwrap_or_default(),
                unit: data.unit,
            },
        }
    }
}

/// Calibration save response: the saved calibration plus every measurement
/// recomputed under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSaved {
    pub calibration: CalibrationDto,
    #[serde(default)]
    pub measurements: Vec<MeasurementDto>,
}

/// Remote persistence boundary for measurements and calibration.
///
/// The engine owns optimistic state and rollback; implementations own the
/// transport. Delete echoes the deleted entity so undo can re-insert it.
#[async_trait]
pub trait MeasurementApi: Send + Sync {
    /// Initial load of measurements and calibration for a drawing.
    async fn load_drawing(&self, drawing: DrawingId) -> Result<DrawingPayload>;

    /// Persists a new measurement; returns the server-issued record.
    async fn create_measurement(
        &self,
        drawing: DrawingId,
        request: &CreateMeasurementRequest,
    ) -> Result<MeasurementDto>;

    /// Applies a patch to an existing measurement.
    async fn update_measurement(
        &self,
        drawing: DrawingId,
        id: i64,
        request: &UpdateMeasurementRequest,
    ) -> Result<MeasurementDto>;

    /// Deletes a measurement; the response echoes the deleted entity.
    async fn delete_measurement(&self, drawing: DrawingId, id: i64) -> Result<MeasurementDto>;

    /// Restores a soft-deleted measurement (undo of delete).
    async fn restore_measurement(&self, drawing: DrawingId, id: i64) -> Result<MeasurementDto>;

    /// Saves calibration; the server recomputes and echoes all measurements.
    async fn save_calibration(
        &self,
        drawing: DrawingId,
        request: &CalibrationRequest,
    ) -> Result<CalibrationSaved>;

    /// Deletes calibration; derived values are cleared server-side.
    async fn delete_calibration(&self, drawing: DrawingId) -> Result<()>;
}
