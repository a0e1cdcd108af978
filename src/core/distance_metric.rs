use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OutbreakError;
use crate::metrics::acf::AcfDistance;
use crate::metrics::correlation::CorrelationDistance;
use crate::metrics::dtw::DtwDistance;
use crate::metrics::euclidean::TruncatedEuclidean;
use crate::metrics::spatial::PlanarSpatial;

/// Pairwise distance between two hospitals' feature vectors.
///
/// Designed for static dispatch: each metric is a unit struct and the matrix
/// builder is monomorphized per metric. For series metrics the inputs are the
/// hospitals' normalized case series; for the spatial metric they are
/// `[latitude, longitude]` pairs.
///
/// Implementations must be total: degenerate input (empty, constant, or
/// mismatched-length slices) resolves to a defined finite value, never NaN
/// and never a panic.
pub trait SeriesDistance: Clone + Send + Sync {
    fn distance(a: &[f64], b: &[f64]) -> f64;
}

/// Closed set of distance metrics a clustering run can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Planar distance between (lat, lon) coordinates, in degrees.
    #[default]
    Spatial,
    /// `sqrt(2 * (1 - pearson))` over normalized series.
    #[serde(alias = "cor")]
    Correlation,
    /// Dynamic time warping with absolute local cost.
    Dtw,
    /// Euclidean distance between autocorrelation vectors.
    Acf,
    /// Plain Euclidean distance over the common prefix.
    Euclidean,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Spatial,
        Metric::Correlation,
        Metric::Dtw,
        Metric::Acf,
        Metric::Euclidean,
    ];

    /// Whether the metric compares coordinates instead of case series.
    pub fn uses_coordinates(self) -> bool {
        matches!(self, Metric::Spatial)
    }

    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Spatial => PlanarSpatial::distance(a, b),
            Metric::Correlation => CorrelationDistance::distance(a, b),
            Metric::Dtw => DtwDistance::distance(a, b),
            Metric::Acf => AcfDistance::distance(a, b),
            Metric::Euclidean => TruncatedEuclidean::distance(a, b),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Spatial => "spatial",
            Metric::Correlation => "correlation",
            Metric::Dtw => "dtw",
            Metric::Acf => "acf",
            Metric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = OutbreakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spatial" => Ok(Metric::Spatial),
            "cor" | "correlation" => Ok(Metric::Correlation),
            "dtw" => Ok(Metric::Dtw),
            "acf" => Ok(Metric::Acf),
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(OutbreakError::InvalidConfig(format!(
                "unknown distance metric '{other}'"
            ))),
        }
    }
}
