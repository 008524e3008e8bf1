//! Bid view filtering.
//!
//! A pure projection deciding which measurements are visible given the
//! base-bid toggle and per-variation toggles. Presets are convenience
//! mutators over the toggle map and carry no extra state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use takeoffkit_core::VariationId;

use crate::measurement::{BidScope, Measurement};
use crate::store::MeasurementStore;

/// Visibility toggles for base bid and variations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidViewLayers {
    base_bid: bool,
    variations: HashMap<VariationId, bool>,
}

impl Default for BidViewLayers {
    fn default() -> Self {
        Self {
            base_bid: true,
            variations: HashMap::new(),
        }
    }
}

impl BidViewLayers {
    /// Whether the base bid layer is shown.
    pub fn base_bid(&self) -> bool {
        self.base_bid
    }

    /// Toggles the base bid layer.
    pub fn set_base_bid(&mut self, enabled: bool) {
        self.base_bid = enabled;
    }

    /// Whether a variation layer is shown. Unknown variations are hidden.
    pub fn variation(&self, id: VariationId) -> bool {
        self.variations.get(&id).copied().unwrap_or(false)
    }

    /// Toggles one variation layer.
    pub fn set_variation(&mut self, id: VariationId, enabled: bool) {
        self.variations.insert(id, enabled);
    }

    /// Preset: base bid plus every known variation.
    pub fn show_all(&mut self, variations: &[VariationId]) {
        self.base_bid = true;
        for id in variations {
            self.variations.insert(*id, true);
        }
    }

    /// Preset: base bid only.
    pub fn base_only(&mut self) {
        self.base_bid = true;
        for enabled in self.variations.values_mut() {
            *enabled = false;
        }
    }

    /// Preset: every known variation, no base bid.
    pub fn variations_only(&mut self, variations: &[VariationId]) {
        self.base_bid = false;
        for id in variations {
            self.variations.insert(*id, true);
        }
    }

    /// Visibility of a single measurement under these toggles.
    pub fn is_visible(&self, measurement: &Measurement) -> bool {
        match measurement.scope {
            BidScope::Variation => measurement
                .variation_id
                .map(|id| self.variation(id))
                .unwrap_or(false),
            _ => self.base_bid,
        }
    }

    /// The visible top-level measurements in draw order.
    ///
    /// This is the list handed to the external renderer.
    pub fn filter<'a>(&self, store: &'a MeasurementStore) -> Vec<&'a Measurement> {
        store
            .top_level()
            .filter(|m| self.is_visible(m))
            .collect()
    }
}
