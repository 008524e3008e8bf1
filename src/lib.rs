//! # TakeoffKit
//!
//! A takeoff measurement and production-tracking engine for calibrated
//! construction drawings:
//! - Scale calibration from a drawn reference distance or a paper size and
//!   printed scale ratio
//! - Linear, area, and count measurements with deduction netting
//! - Undo/redo command history over the measurement tree
//! - Optimistic remote sync with stale-confirmation detection
//! - Per-measurement and per-segment production statusing with geometric
//!   hit-testing (click and box-select)
//! - Bid-view scoping over base bid and variations
//!
//! ## Architecture
//!
//! TakeoffKit is organized as a workspace with multiple crates:
//!
//! 1. **takeoffkit-core** - Shared ids, units, errors, engine events
//! 2. **takeoffkit-measure** - Calibration, geometry kernel, measurement
//!    store, history, bid views, measurement sync
//! 3. **takeoffkit-production** - Status board, session context,
//!    hit-testing, selection, debounced writes, status sync
//! 4. **takeoffkit** - Re-export hub for host applications
//!
//! The engine renders nothing and performs no authorization: it hands
//! filtered geometry, badges, and selection keys to an external renderer
//! and trusts the `can_edit` capability flag passed in from outside.

pub use takeoffkit_measure as measure;
pub use takeoffkit_production as production;

pub use takeoffkit_core::{
    BidAreaId, ConditionId, CostCodeId, DrawingId, EngineEvent, Error, EventBus, InputError,
    MeasurementId, NoticeLevel, PaperSize, Result, SyncError, Unit, VariationId,
};

pub use takeoffkit_measure::{
    BidScope, BidViewLayers, CalibrationData, CalibrationMethod, Measurement, MeasurementApi,
    MeasurementAttrs, MeasurementHistory, MeasurementKind, MeasurementPatch, MeasurementStore,
    PixelScale, Point, Rect, TakeoffState,
};

pub use takeoffkit_production::{
    percent_color, CostCodeAssignment, CostCodeSummary, Debouncer, ProductionApi,
    ProductionState, SelectionKey, SelectionSet, SessionContext, StatusBoard,
};

/// Initialize tracing for host applications.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}

/// Build timestamp injected by the build script.
pub fn build_date() -> &'static str {
    env!("BUILD_DATE")
}
