//! In-memory MeasurementApi double for engine tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use takeoffkit_core::{DrawingId, Result, SyncError, Unit};
use takeoffkit_measure::{
    CalibrationDto, CalibrationMethod, CalibrationRequest, CalibrationSaved,
    CreateMeasurementRequest, DrawingPayload, MeasurementApi, MeasurementDto,
    UpdateMeasurementRequest,
};

pub struct MockApi {
    next_id: AtomicI64,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
    pub payload: Mutex<DrawingPayload>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            payload: Mutex::new(DrawingPayload {
                measurements: Vec::new(),
                calibration: None,
            }),
        }
    }

    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn succeed(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.failing.lock().unwrap().contains(op) {
            return Err(SyncError::RequestFailed {
                reason: format!("{op} refused by test"),
            }
            .into());
        }
        Ok(())
    }

    fn echo_create(&self, request: &CreateMeasurementRequest) -> MeasurementDto {
        MeasurementDto {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: request.name.clone(),
            kind: request.kind,
            color: request.color.clone(),
            category: request.category.clone(),
            points: request.points.clone(),
            computed_value: None,
            perimeter_value: None,
            unit: None,
            takeoff_condition_id: request.takeoff_condition_id,
            bid_area_id: request.bid_area_id,
            parent_measurement_id: request.parent_measurement_id,
            scope: request.scope,
            variation_id: request.variation_id,
            deductions: Vec::new(),
        }
    }

    fn echo_existing(&self, id: i64) -> MeasurementDto {
        MeasurementDto {
            id,
            name: "echo".to_string(),
            kind: takeoffkit_measure::MeasurementKind::Linear,
            color: "#000000".to_string(),
            category: None,
            points: Vec::new(),
            computed_value: None,
            perimeter_value: None,
            unit: None,
            takeoff_condition_id: None,
            bid_area_id: None,
            parent_measurement_id: None,
            scope: takeoffkit_measure::BidScope::Takeoff,
            variation_id: None,
            deductions: Vec::new(),
        }
    }
}

#[async_trait]
impl MeasurementApi for MockApi {
    async fn load_drawing(&self, _drawing: DrawingId) -> Result<DrawingPayload> {
        self.check("load")?;
        Ok(self.payload.lock().unwrap().clone())
    }

    async fn create_measurement(
        &self,
        _drawing: DrawingId,
        request: &CreateMeasurementRequest,
    ) -> Result<MeasurementDto> {
        self.check("create")?;
        Ok(self.echo_create(request))
    }

    async fn update_measurement(
        &self,
        _drawing: DrawingId,
        id: i64,
        _request: &UpdateMeasurementRequest,
    ) -> Result<MeasurementDto> {
        self.check("update")?;
        Ok(self.echo_existing(id))
    }

    async fn delete_measurement(&self, _drawing: DrawingId, id: i64) -> Result<MeasurementDto> {
        self.check("delete")?;
        Ok(self.echo_existing(id))
    }

    async fn restore_measurement(&self, _drawing: DrawingId, id: i64) -> Result<MeasurementDto> {
        self.check("restore")?;
        Ok(self.echo_existing(id))
    }

    async fn save_calibration(
        &self,
        _drawing: DrawingId,
        request: &CalibrationRequest,
    ) -> Result<CalibrationSaved> {
        self.check("save_calibration")?;
        let calibration = match request {
            CalibrationRequest::Manual {
                point_a_x,
                point_a_y,
                point_b_x,
                point_b_y,
                real_distance,
                unit,
            } => CalibrationDto {
                method: CalibrationMethod::Manual,
                point_a_x: Some(*point_a_x),
                point_a_y: Some(*point_a_y),
                point_b_x: Some(*point_b_x),
                point_b_y: Some(*point_b_y),
                real_distance: Some(*real_distance),
                unit: *unit,
                paper_size: None,
                drawing_scale: None,
                pixels_per_unit: 1.0,
            },
            CalibrationRequest::Preset {
                paper_size,
                drawing_scale,
                unit,
            } => CalibrationDto {
                method: CalibrationMethod::Preset,
                point_a_x: None,
                point_a_y: None,
                point_b_x: None,
                point_b_y: None,
                real_distance: None,
                unit: *unit,
                paper_size: Some(paper_size.clone()),
                drawing_scale: Some(drawing_scale.clone()),
                pixels_per_unit: 1.0,
            },
        };
        Ok(CalibrationSaved {
            calibration,
            measurements: Vec::new(),
        })
    }

    async fn delete_calibration(&self, _drawing: DrawingId) -> Result<()> {
        self.check("delete_calibration")?;
        Ok(())
    }
}

/// A manual calibration DTO used to seed load payloads.
pub fn seed_calibration(pixels_per_unit: f64) -> CalibrationDto {
    CalibrationDto {
        method: CalibrationMethod::Manual,
        point_a_x: Some(0.0),
        point_a_y: Some(0.0),
        point_b_x: Some(0.1),
        point_b_y: Some(0.0),
        real_distance: Some(10.0),
        unit: Unit::M,
        paper_size: None,
        drawing_scale: None,
        pixels_per_unit,
    }
}
