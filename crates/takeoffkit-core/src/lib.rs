//! # TakeoffKit Core
//!
//! Shared ids, units, error taxonomy, and the engine event bus.
//! Provides the fundamental abstractions the measurement and production
//! crates build on.

pub mod error;
pub mod events;
pub mod ids;
pub mod units;

pub use error::{Error, InputError, Result, SyncError};
pub use events::{EngineEvent, EventBus, NoticeLevel};
pub use ids::{BidAreaId, ConditionId, CostCodeId, DrawingId, MeasurementId, VariationId};
pub use units::{parse_scale_denominator, PaperSize, Unit};
