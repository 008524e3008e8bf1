//! Identity newtypes shared across the engine.
//!
//! Measurements carry a locally generated arena id that is immediately
//! usable for UI addressing; the server-issued identity arrives later on
//! create confirmation and is tracked separately on the record. All other
//! ids are server-issued and opaque to the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Local arena id for a measurement.
///
/// Stable across undo/redo: re-inserting a deleted measurement reuses the
/// id recorded in its history snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementId(u64);

impl MeasurementId {
    /// Wraps a raw arena id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw arena id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! wire_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a server-issued id.
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw server-issued id.
            pub fn raw(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

wire_id!(
    /// Server id of the drawing the engine is operating on.
    DrawingId
);
wire_id!(
    /// Server id of a labour cost code.
    CostCodeId
);
wire_id!(
    /// Server id of a bid variation (change order).
    VariationId
);
wire_id!(
    /// Server id of a bid area.
    BidAreaId
);
wire_id!(
    /// Server id of a takeoff condition.
    ConditionId
);
