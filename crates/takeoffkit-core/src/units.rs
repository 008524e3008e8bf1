//! Unit and paper-size handling
//!
//! Real-world units supported by calibration, standard paper sizes for
//! preset calibration, and parsing of printed scale ratios ("1:50").

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Real-world measurement unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Millimeters
    Mm,
    /// Centimeters
    Cm,
    /// Meters
    M,
    /// Inches
    In,
    /// Feet
    Ft,
}

impl Unit {
    /// Millimeters per one of this unit.
    pub fn mm_per_unit(self) -> f64 {
        match self {
            Unit::Mm => 1.0,
            Unit::Cm => 10.0,
            Unit::M => 1000.0,
            Unit::In => 25.4,
            Unit::Ft => 304.8,
        }
    }

    /// Unit label for an area derived from this unit ("sq m").
    pub fn area_label(self) -> String {
        format!("sq {}", self)
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::M
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Mm => write!(f, "mm"),
            Unit::Cm => write!(f, "cm"),
            Unit::M => write!(f, "m"),
            Unit::In => write!(f, "in"),
            Unit::Ft => write!(f, "ft"),
        }
    }
}

impl FromStr for Unit {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "m" => Ok(Self::M),
            "in" | "inch" => Ok(Self::In),
            "ft" | "feet" => Ok(Self::Ft),
            other => Err(InputError::UnknownUnit {
                unit: other.to_string(),
            }),
        }
    }
}

/// ISO A-series paper size
///
/// Construction drawings are assumed landscape, so the larger dimension
/// is the sheet width used for preset calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    A4,
}

impl PaperSize {
    /// Landscape sheet width in millimeters.
    pub fn landscape_width_mm(self) -> f64 {
        match self {
            PaperSize::A0 => 1189.0,
            PaperSize::A1 => 841.0,
            PaperSize::A2 => 594.0,
            PaperSize::A3 => 420.0,
            PaperSize::A4 => 297.0,
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::A0 => write!(f, "A0"),
            PaperSize::A1 => write!(f, "A1"),
            PaperSize::A2 => write!(f, "A2"),
            PaperSize::A3 => write!(f, "A3"),
            PaperSize::A4 => write!(f, "A4"),
        }
    }
}

impl FromStr for PaperSize {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A0" => Ok(Self::A0),
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "A3" => Ok(Self::A3),
            "A4" => Ok(Self::A4),
            other => Err(InputError::UnknownPaperSize {
                size: other.to_string(),
            }),
        }
    }
}

/// Parse the denominator of a printed scale ratio.
///
/// Accepts `1:N` where N is a positive number, possibly fractional
/// ("1:50", "1:2.5"). Returns an error for anything else.
pub fn parse_scale_denominator(scale: &str) -> Result<f64, InputError> {
    let err = || InputError::UnknownScale {
        scale: scale.to_string(),
    };

    let rest = scale.trim().strip_prefix("1:").ok_or_else(err)?;
    let denom: f64 = rest.trim().parse().map_err(|_| err())?;
    if denom > 0.0 && denom.is_finite() {
        Ok(denom)
    } else {
        Err(err())
    }
}
