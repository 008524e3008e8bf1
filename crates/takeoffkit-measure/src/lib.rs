//! # TakeoffKit Measure
//!
//! The takeoff measurement engine: scale calibration, the geometry kernel,
//! the measurement store with deduction netting, undo/redo history,
//! bid-view filtering, and optimistic remote sync.

pub mod bid_view;
pub mod calibration;
pub mod geometry;
pub mod history;
pub mod measurement;
pub mod store;
pub mod sync;
pub mod takeoff_state;

pub use bid_view::BidViewLayers;
pub use calibration::{CalibrationData, CalibrationMethod};
pub use geometry::{PixelScale, Point, Rect};
pub use history::{AppliedChange, HistoryEntry, MeasurementHistory, DEFAULT_MAX_DEPTH};
pub use measurement::{
    BidScope, Measurement, MeasurementAttrs, MeasurementKind, MeasurementPatch,
    MeasurementSnapshot,
};
pub use store::MeasurementStore;
pub use sync::{
    CalibrationDto, CalibrationRequest, CalibrationSaved, CreateMeasurementRequest,
    DrawingPayload, MeasurementApi, MeasurementDto, UpdateMeasurementRequest, VersionTracker,
};
pub use takeoff_state::TakeoffState;
