//! Measurement records.
//!
//! Measurements live in a flat arena keyed by local id; parents hold the
//! ids of their deduction children rather than embedded records, so the
//! history stack can detach and reattach a child without aliasing hazards.

use serde::{Deserialize, Serialize};
use takeoffkit_core::{BidAreaId, ConditionId, MeasurementId, VariationId};

use crate::geometry::Point;

/// Kind of quantity a measurement derives from its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Polyline length.
    Linear,
    /// Polygon area (net of deductions).
    Area,
    /// Item count.
    Count,
}

impl MeasurementKind {
    /// Minimum number of points for a valid measurement of this kind.
    pub fn min_points(self) -> usize {
        match self {
            MeasurementKind::Linear => 2,
            MeasurementKind::Area => 3,
            MeasurementKind::Count => 1,
        }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementKind::Linear => write!(f, "linear"),
            MeasurementKind::Area => write!(f, "area"),
            MeasurementKind::Count => write!(f, "count"),
        }
    }
}

/// Which bid a measurement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BidScope {
    /// Base bid takeoff.
    #[default]
    Takeoff,
    /// A priced variation (change order).
    Variation,
}

/// A single measurement record in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Local arena id; stable across undo/redo.
    pub id: MeasurementId,
    /// Server-issued id, filled in by the create confirmation.
    pub remote_id: Option<i64>,
    pub name: String,
    pub kind: MeasurementKind,
    /// Hex color for the renderer ("#3b82f6").
    pub color: String,
    pub category: Option<String>,
    /// Normalized image-fraction coordinates.
    pub points: Vec<Point>,
    /// Net quantity in real units; `None` while uncalibrated.
    pub computed_value: Option<f64>,
    /// Closed-ring perimeter for area measurements.
    pub perimeter_value: Option<f64>,
    /// Unit label ("m", "sq m", "ea"); `None` while uncalibrated.
    pub unit: Option<String>,
    pub condition_id: Option<ConditionId>,
    pub bid_area_id: Option<BidAreaId>,
    /// Set iff this record is a deduction owned by that parent.
    pub parent: Option<MeasurementId>,
    /// Ids of owned deduction children, in creation order.
    pub deductions: Vec<MeasurementId>,
    pub scope: BidScope,
    pub variation_id: Option<VariationId>,
}

impl Measurement {
    /// Whether this record is a deduction owned by a parent.
    pub fn is_deduction(&self) -> bool {
        self.parent.is_some()
    }

    /// Whether this measurement supports per-segment statusing
    /// (linear with at least two segments).
    pub fn is_segmented(&self) -> bool {
        self.kind == MeasurementKind::Linear && self.points.len() >= 3
    }

    /// Number of polyline segments.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Attributes supplied when creating a measurement.
#[derive(Debug, Clone, Default)]
pub struct MeasurementAttrs {
    pub name: String,
    pub color: String,
    pub category: Option<String>,
    pub condition_id: Option<ConditionId>,
    pub bid_area_id: Option<BidAreaId>,
    pub scope: BidScope,
    pub variation_id: Option<VariationId>,
}

/// Partial update applied atomically by the store.
///
/// Outer `Option` means "leave unchanged"; the nested `Option` on nullable
/// fields distinguishes clearing from leaving alone.
#[derive(Debug, Clone, Default)]
pub struct MeasurementPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub category: Option<Option<String>>,
    pub points: Option<Vec<Point>>,
    pub condition_id: Option<Option<ConditionId>>,
    pub bid_area_id: Option<Option<BidAreaId>>,
}

impl MeasurementPatch {
    /// Patch that only replaces the point list.
    pub fn points(points: Vec<Point>) -> Self {
        Self {
            points: Some(points),
            ..Self::default()
        }
    }

    /// Whether applying this patch changes geometry.
    pub fn touches_points(&self) -> bool {
        self.points.is_some()
    }
}

/// A measurement together with its owned deduction records.
///
/// Used as the unit of deletion and restoration so a parent and its
/// deductions always move together.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSnapshot {
    pub measurement: Measurement,
    pub deductions: Vec<Measurement>,
}

impl MeasurementSnapshot {
    /// Snapshot of a measurement with no children.
    pub fn single(measurement: Measurement) -> Self {
        Self {
            measurement,
            deductions: Vec::new(),
        }
    }
}
