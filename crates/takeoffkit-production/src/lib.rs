//! # TakeoffKit Production
//!
//! Field-production tracking over takeoff measurements: percent-complete
//! statusing at whole-measurement and per-segment granularity, geometric
//! hit-testing for click and box-select gestures, the transient selection
//! set, debounced numeric writes, and the date-scoped status sync.

pub mod api;
pub mod debounce;
pub mod production_state;
pub mod selection;
pub mod session;
pub mod status;

pub use api::{
    BulkStatusItem, BulkStatusRequest, CostCodeSummaryRow, MeasurementStatusRequest,
    ProductionApi, SegmentStatusRequest, StatusResponse,
};
pub use debounce::{Debouncer, WRITE_QUIET_PERIOD};
pub use hit_test::{box_select, hit_test_point};
pub use production_state::ProductionState;
pub use selection::{SelectionKey, SelectionSet};
pub use session::SessionContext;
pub use status::{
    percent_color, CostCodeAssignment, CostCodeSummary, StatusBoard, BOX_SELECT_ACTIVE,
    BOX_SELECT_BASE, COMPLETE_COLOR, IN_PROGRESS_COLOR,
};
