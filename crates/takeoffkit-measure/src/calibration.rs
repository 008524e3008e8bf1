//! Scale calibration
//!
//! Converts a drawn reference distance, or a known paper size and printed
//! scale, into a pixels-per-real-unit factor. Calibration is a global
//! multiplier: any change triggers recomputation of every measurement's
//! computed value (see the store's `recalibrate_all`).

use serde::{Deserialize, Serialize};
use takeoffkit_core::{parse_scale_denominator, InputError, PaperSize, Result, Unit};

use crate::geometry::{PixelScale, Point};

/// How the calibration factor was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMethod {
    /// A drawn reference line with a known real distance.
    Manual,
    /// A standard paper size and printed scale ratio.
    Preset,
}

/// Pixel-to-real-unit conversion state for a drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    pub method: CalibrationMethod,
    /// Reference line endpoints for manual calibration.
    pub reference_points: Option<(Point, Point)>,
    /// Real-world length of the reference line.
    pub real_distance: Option<f64>,
    pub unit: Unit,
    pub paper_size: Option<PaperSize>,
    /// Printed scale ratio as entered ("1:50").
    pub drawing_scale: Option<String>,
    /// Pixels per one real unit. Always positive once set.
    pub pixels_per_unit: f64,
}

impl CalibrationData {
    /// Calibrates from a drawn reference line.
    ///
    /// `pixels_per_unit = pixel_distance(a, b) / real_distance`. Fails if
    /// the distance is not positive or the points coincide.
    pub fn from_distance(
        a: Point,
        b: Point,
        real_distance: f64,
        unit: Unit,
        scale: PixelScale,
    ) -> Result<Self> {
        if !(real_distance > 0.0) || !real_distance.is_finite() {
            return Err(InputError::InvalidDistance {
                value: real_distance,
            }
            .into());
        }
        let pixel_distance = scale.distance(a, b);
        if pixel_distance <= 0.0 {
            return Err(InputError::DegenerateReference.into());
        }
        Ok(Self {
            method: CalibrationMethod::Manual,
            reference_points: Some((a, b)),
            real_distance: Some(real_distance),
            unit,
            paper_size: None,
            drawing_scale: None,
            pixels_per_unit: pixel_distance / real_distance,
        })
    }

    /// Calibrates from a paper size and printed scale ratio.
    ///
    /// One paper millimeter covers `image_width_px / paper_width_mm` pixels;
    /// the scale denominator maps paper millimeters to real millimeters, and
    /// the unit factor converts to the target unit.
    pub fn from_scale(
        paper_size: PaperSize,
        drawing_scale: &str,
        unit: Unit,
        image_width_px: f64,
    ) -> Result<Self> {
        if !(image_width_px > 0.0) || !image_width_px.is_finite() {
            return Err(InputError::InvalidImageWidth {
                width_px: image_width_px,
            }
            .into());
        }
        let denominator = parse_scale_denominator(drawing_scale)?;
        let pixels_per_paper_mm = image_width_px / paper_size.landscape_width_mm();
        let pixels_per_real_mm = pixels_per_paper_mm / denominator;
        Ok(Self {
            method: CalibrationMethod::Preset,
            reference_points: None,
            real_distance: None,
            unit,
            paper_size: Some(paper_size),
            drawing_scale: Some(drawing_scale.trim().to_string()),
            pixels_per_unit: pixels_per_real_mm * unit.mm_per_unit(),
        })
    }

    /// The pixels-per-unit factor.
    pub fn ppu(&self) -> f64 {
        self.pixels_per_unit
    }
}
