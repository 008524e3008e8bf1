//! Remote persistence boundary for production statuses.
//!
//! Status maps cross the wire keyed by server measurement ids:
//! `"{measurement}-{cost_code}"` for whole-measurement statuses and
//! `"{measurement}-{segment}"` for segment statuses. Responses are
//! authoritative: the engine replaces its optimistic maps with them rather
//! than merging.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use takeoffkit_core::{DrawingId, Result};
use tracing::warn;

/// Whole-measurement status write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementStatusRequest {
    pub measurement_id: i64,
    pub labour_cost_code_id: i64,
    pub percent_complete: f64,
    pub work_date: NaiveDate,
}

/// Per-segment status write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentStatusRequest {
    pub measurement_id: i64,
    pub labour_cost_code_id: i64,
    pub segment_index: usize,
    pub percent_complete: f64,
    pub work_date: NaiveDate,
}

/// One target of a bulk status write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusItem {
    pub measurement_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<usize>,
}

/// Batched status write for a selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusRequest {
    pub items: Vec<BulkStatusItem>,
    pub labour_cost_code_id: i64,
    pub percent_complete: f64,
    pub work_date: NaiveDate,
}

/// Quantity-weighted summary row per labour cost code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCodeSummaryRow {
    pub labour_cost_code_id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub total_qty: f64,
    pub budget_hours: f64,
    pub weighted_percent: f64,
    pub earned_hours: f64,
    pub measurement_count: u32,
}

/// Date-scoped status payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub statuses: HashMap<String, f64>,
    #[serde(default)]
    pub segment_statuses: HashMap<String, f64>,
    #[serde(default)]
    pub lcc_summary: Vec<CostCodeSummaryRow>,
}

fn parse_pair(key: &str) -> Option<(i64, i64)> {
    let (a, b) = key.rsplit_once('-')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

impl StatusResponse {
    /// Decodes `"{measurement}-{cost_code}" -> percent` entries.
    ///
    /// Malformed keys are dropped with a warning rather than failing the
    /// whole reload.
    pub fn parsed_statuses(&self) -> Vec<(i64, i64, f64)> {
        self.statuses
            .iter()
            .filter_map(|(key, percent)| match parse_pair(key) {
                Some((measurement, cost_code)) => Some((measurement, cost_code, *percent)),
                None => {
                    warn!(%key, "dropping malformed status key");
                    None
                }
            })
            .collect()
    }

    /// Decodes `"{measurement}-{segment}" -> percent` entries.
    pub fn parsed_segment_statuses(&self) -> Vec<(i64, usize, f64)> {
        self.segment_statuses
            .iter()
            .filter_map(|(key, percent)| match parse_pair(key) {
                Some((measurement, segment)) if segment >= 0 => {
                    Some((measurement, segment as usize, *percent))
                }
                _ => {
                    warn!(%key, "dropping malformed segment status key");
                    None
                }
            })
            .collect()
    }
}

/// Remote persistence boundary for production statuses.
#[async_trait]
pub trait ProductionApi: Send + Sync {
    /// Writes one whole-measurement status.
    async fn update_measurement_status(
        &self,
        drawing: DrawingId,
        request: &MeasurementStatusRequest,
    ) -> Result<StatusResponse>;

    /// Writes one segment status.
    async fn update_segment_status(
        &self,
        drawing: DrawingId,
        request: &SegmentStatusRequest,
    ) -> Result<StatusResponse>;

    /// Writes a batched status for a selection in one call.
    async fn bulk_update_status(
        &self,
        drawing: DrawingId,
        request: &BulkStatusRequest,
    ) -> Result<StatusResponse>;

    /// Fetches the full status maps for a work date.
    async fn fetch_statuses(&self, drawing: DrawingId, work_date: NaiveDate)
        -> Result<StatusResponse>;
}
