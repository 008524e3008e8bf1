//! Measurement store.
//!
//! Owns the authoritative in-memory tree: a flat arena of measurement
//! records keyed by local id, with top-level draw order and parent-held
//! child id lists. Keeps computed values in sync with calibration and
//! enforces the structural invariants (point counts, one-level deductions,
//! atomic parent/child deletion).

use std::collections::HashMap;

use takeoffkit_core::{InputError, MeasurementId, Result};
use tracing::debug;

use crate::calibration::CalibrationData;
use crate::geometry::{self, PixelScale, Point};
use crate::measurement::{
    Measurement, MeasurementAttrs, MeasurementKind, MeasurementPatch, MeasurementSnapshot,
};

/// In-memory measurement arena for one drawing.
#[derive(Debug, Clone, Default)]
pub struct MeasurementStore {
    records: HashMap<MeasurementId, Measurement>,
    /// Top-level ids in draw (creation) order.
    order: Vec<MeasurementId>,
    next_id: u64,
    calibration: Option<CalibrationData>,
    scale: PixelScale,
}

impl MeasurementStore {
    /// Creates an empty store for a drawing with the given pixel dimensions.
    pub fn new(scale: PixelScale) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// The drawing's pixel dimensions.
    pub fn pixel_scale(&self) -> PixelScale {
        self.scale
    }

    /// Replaces the pixel dimensions and re-derives every computed value.
    pub fn set_pixel_scale(&mut self, scale: PixelScale) {
        self.scale = scale;
        self.recalibrate_all();
    }

    /// Current calibration, if any.
    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.calibration.as_ref()
    }

    fn ppu(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.pixels_per_unit)
    }

    /// Installs calibration and re-derives every computed value.
    pub fn set_calibration(&mut self, calibration: CalibrationData) {
        self.calibration = Some(calibration);
        self.recalibrate_all();
    }

    /// Removes calibration and clears derived quantities.
    ///
    /// Count measurements keep their `ea` values; counting needs no scale.
    pub fn clear_calibration(&mut self) -> Option<CalibrationData> {
        let previous = self.calibration.take();
        for m in self.records.values_mut() {
            if m.kind != MeasurementKind::Count {
                m.computed_value = None;
                m.perimeter_value = None;
                m.unit = None;
            }
        }
        previous
    }

    /// Allocates the next local id.
    pub fn generate_id(&mut self) -> MeasurementId {
        self.next_id += 1;
        MeasurementId::new(self.next_id)
    }

    /// Number of records, deductions included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets a record by id.
    pub fn get(&self, id: MeasurementId) -> Option<&Measurement> {
        self.records.get(&id)
    }

    /// Top-level measurements in draw order.
    pub fn top_level(&self) -> impl Iterator<Item = &Measurement> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// All records in arbitrary order, deductions included.
    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.records.values()
    }

    /// Resolves a server id back to the local record.
    pub fn find_by_remote(&self, remote_id: i64) -> Option<MeasurementId> {
        self.records
            .values()
            .find(|m| m.remote_id == Some(remote_id))
            .map(|m| m.id)
    }

    /// Records the server-issued id from a create confirmation.
    pub fn set_remote_id(&mut self, id: MeasurementId, remote_id: i64) {
        if let Some(m) = self.records.get_mut(&id) {
            m.remote_id = Some(remote_id);
        }
    }

    fn validate_points(kind: MeasurementKind, points: &[Point]) -> Result<()> {
        let required = kind.min_points();
        if points.len() < required {
            return Err(InputError::NotEnoughPoints {
                kind: kind.to_string(),
                required,
                actual: points.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Creates a top-level measurement.
    ///
    /// The record gets a locally generated id that is immediately usable for
    /// UI addressing; the server id arrives later on confirmation.
    pub fn create(
        &mut self,
        kind: MeasurementKind,
        points: Vec<Point>,
        attrs: MeasurementAttrs,
    ) -> Result<MeasurementId> {
        Self::validate_points(kind, &points)?;
        let id = self.generate_id();
        let record = Measurement {
            id,
            remote_id: None,
            name: attrs.name,
            kind,
            color: attrs.color,
            category: attrs.category,
            points,
            computed_value: None,
            perimeter_value: None,
            unit: None,
            condition_id: attrs.condition_id,
            bid_area_id: attrs.bid_area_id,
            parent: None,
            deductions: Vec::new(),
            scope: attrs.scope,
            variation_id: attrs.variation_id,
        };
        self.records.insert(id, record);
        self.order.push(id);
        self.recompute(id);
        Ok(id)
    }

    /// Creates a deduction under a parent measurement.
    ///
    /// The deduction inherits the parent's kind, color, and category, and
    /// defaults its name to `Deduction #N`. Triggers parent recomputation.
    pub fn add_deduction(
        &mut self,
        parent_id: MeasurementId,
        points: Vec<Point>,
        name: Option<String>,
    ) -> Result<MeasurementId> {
        let parent = self
            .records
            .get(&parent_id)
            .ok_or(InputError::MeasurementNotFound {
                id: parent_id.raw(),
            })?;
        if parent.is_deduction() {
            return Err(InputError::NestedDeduction.into());
        }
        if parent.kind == MeasurementKind::Count {
            return Err(InputError::InvalidParent {
                reason: "count measurements cannot have deductions".to_string(),
            }
            .into());
        }
        Self::validate_points(parent.kind, &points)?;

        let kind = parent.kind;
        let color = parent.color.clone();
        let category = parent.category.clone();
        let scope = parent.scope;
        let variation_id = parent.variation_id;
        let name = name.unwrap_or_else(|| format!("Deduction #{}", parent.deductions.len() + 1));

        let id = self.generate_id();
        let record = Measurement {
            id,
            remote_id: None,
            name,
            kind,
            color,
            category,
            points,
            computed_value: None,
            perimeter_value: None,
            unit: None,
            condition_id: None,
            bid_area_id: None,
            parent: Some(parent_id),
            deductions: Vec::new(),
            scope,
            variation_id,
        };
        self.records.insert(id, record);
        self.records
            .get_mut(&parent_id)
            .expect("parent checked above")
            .deductions
            .push(id);
        self.recompute(id);
        self.recompute(parent_id);
        Ok(id)
    }

    /// Applies a patch atomically and re-derives affected computed values.
    ///
    /// Returns a clone of the updated record.
    pub fn update(&mut self, id: MeasurementId, patch: MeasurementPatch) -> Result<Measurement> {
        let touches_points = patch.touches_points();
        {
            let m = self
                .records
                .get_mut(&id)
                .ok_or(InputError::MeasurementNotFound { id: id.raw() })?;
            if let Some(points) = &patch.points {
                Self::validate_points(m.kind, points)?;
            }
            if let Some(name) = patch.name {
                m.name = name;
            }
            if let Some(color) = patch.color {
                m.color = color;
            }
            if let Some(category) = patch.category {
                m.category = category;
            }
            if let Some(points) = patch.points {
                m.points = points;
            }
            if let Some(condition_id) = patch.condition_id {
                m.condition_id = condition_id;
            }
            if let Some(bid_area_id) = patch.bid_area_id {
                m.bid_area_id = bid_area_id;
            }
        }
        if touches_points {
            self.recompute(id);
            if let Some(parent_id) = self.records.get(&id).and_then(|m| m.parent) {
                self.recompute(parent_id);
            }
        }
        Ok(self.records.get(&id).expect("updated above").clone())
    }

    /// Replaces a record's fields wholesale (history revert path), keeping
    /// the arena relations intact, then re-derives computed values.
    pub fn apply_state(&mut self, state: Measurement) -> Result<()> {
        let id = state.id;
        if !self.records.contains_key(&id) {
            return Err(InputError::MeasurementNotFound { id: id.raw() }.into());
        }
        let parent = state.parent;
        self.records.insert(id, state);
        self.recompute(id);
        if let Some(parent_id) = parent {
            self.recompute(parent_id);
        }
        Ok(())
    }

    /// Deletes a measurement.
    ///
    /// Deleting a parent removes its deductions in the same logical
    /// operation; deleting a deduction splices it out of the parent's list
    /// and re-nets the parent. Returns the removed subtree for history.
    pub fn delete(&mut self, id: MeasurementId) -> Result<MeasurementSnapshot> {
        let record = self
            .records
            .remove(&id)
            .ok_or(InputError::MeasurementNotFound { id: id.raw() })?;

        if let Some(parent_id) = record.parent {
            if let Some(parent) = self.records.get_mut(&parent_id) {
                parent.deductions.retain(|d| *d != id);
            }
            self.recompute(parent_id);
            return Ok(MeasurementSnapshot::single(record));
        }

        self.order.retain(|m| *m != id);
        let deductions = record
            .deductions
            .iter()
            .filter_map(|d| self.records.remove(d))
            .collect();
        Ok(MeasurementSnapshot {
            measurement: record,
            deductions,
        })
    }

    /// Re-inserts a previously deleted subtree under its original identity.
    ///
    /// A deduction snapshot is restored into its original parent's list; a
    /// top-level snapshot is appended to the draw order with its deductions.
    pub fn restore(&mut self, snapshot: MeasurementSnapshot) -> Result<()> {
        let id = snapshot.measurement.id;
        self.bump_next_id(id);

        if let Some(parent_id) = snapshot.measurement.parent {
            if !self.records.contains_key(&parent_id) {
                return Err(InputError::MeasurementNotFound {
                    id: parent_id.raw(),
                }
                .into());
            }
            self.records.insert(id, snapshot.measurement);
            let parent = self.records.get_mut(&parent_id).expect("checked above");
            if !parent.deductions.contains(&id) {
                parent.deductions.push(id);
            }
            self.recompute(id);
            self.recompute(parent_id);
            return Ok(());
        }

        for d in snapshot.deductions {
            self.bump_next_id(d.id);
            self.records.insert(d.id, d);
        }
        self.records.insert(id, snapshot.measurement);
        if !self.order.contains(&id) {
            self.order.push(id);
        }
        let children = self.records.get(&id).expect("inserted above").deductions.clone();
        for child in children {
            self.recompute(child);
        }
        self.recompute(id);
        Ok(())
    }

    fn bump_next_id(&mut self, id: MeasurementId) {
        if id.raw() > self.next_id {
            self.next_id = id.raw();
        }
    }

    /// Re-derives computed value, perimeter, and unit for every record
    /// without altering stored points.
    pub fn recalibrate_all(&mut self) {
        let ids: Vec<MeasurementId> = self.records.keys().copied().collect();
        for id in ids {
            self.recompute(id);
        }
        debug!(count = self.records.len(), "recalibrated all measurements");
    }

    /// Re-derives computed value, perimeter, and unit for one record.
    pub fn recompute(&mut self, id: MeasurementId) {
        let Some(m) = self.records.get(&id) else {
            return;
        };
        let kind = m.kind;
        let points = m.points.clone();
        let is_deduction = m.is_deduction();
        let child_points: Vec<Vec<Point>> = m
            .deductions
            .iter()
            .filter_map(|d| self.records.get(d))
            .map(|d| d.points.clone())
            .collect();
        let child_refs: Vec<&[Point]> = child_points.iter().map(|p| p.as_slice()).collect();
        let ppu = self.ppu();
        let unit = self.calibration.as_ref().map(|c| c.unit);
        let scale = self.scale;

        let (computed, perimeter, unit_label) = match kind {
            MeasurementKind::Count => (geometry::count(&points), None, Some("ea".to_string())),
            MeasurementKind::Linear => {
                let value = if is_deduction {
                    geometry::polyline_length(&points, scale, ppu)
                } else {
                    geometry::net_length(&points, &child_refs, scale, ppu)
                };
                (value, None, value.and(unit.map(|u| u.to_string())))
            }
            MeasurementKind::Area => {
                let value = if is_deduction {
                    geometry::polygon_area(&points, scale, ppu)
                } else {
                    geometry::net_area(&points, &child_refs, scale, ppu)
                };
                let perimeter = geometry::polygon_perimeter(&points, scale, ppu);
                (value, perimeter, value.and(unit.map(|u| u.area_label())))
            }
        };

        let m = self.records.get_mut(&id).expect("checked above");
        m.computed_value = computed;
        m.perimeter_value = perimeter;
        m.unit = unit_label;
    }
}
