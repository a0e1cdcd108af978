use crate::algorithms::common::pearson;
use crate::core::distance_metric::SeriesDistance;

/// Correlation distance: `d = sqrt(2 * (1 - r))` with `r` the Pearson
/// correlation of the two series.
///
/// Edge cases:
/// - Undefined correlation (constant series, fewer than 2 points) → r = 0,
///   so d = sqrt(2)
/// - Mismatched lengths → compared over the common prefix
/// - `r` is clamped to [-1, 1], so d lies in [0, 2]
#[derive(Debug, Clone)]
pub struct CorrelationDistance;

impl SeriesDistance for CorrelationDistance {
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let n = a.len().min(b.len());
        let r = pearson(&a[..n], &b[..n]).unwrap_or(0.0);
        (2.0 * (1.0 - r)).max(0.0).sqrt()
    }
}
