use crate::core::distance_metric::SeriesDistance;

/// Plain Euclidean distance between two series.
///
/// Series of different lengths are truncated to the shorter one first, so the
/// comparison covers only the common prefix.
///
/// Edge cases:
/// - Either series empty → d = 0
/// - Non-finite result → d = 0
#[derive(Debug, Clone)]
pub struct TruncatedEuclidean;

impl SeriesDistance for TruncatedEuclidean {
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let n = a.len().min(b.len());
        let ss: f64 = a[..n]
            .iter()
            .zip(&b[..n])
            .map(|(x, y)| (x - y) * (x - y))
            .sum();
        let d = ss.sqrt();
        if d.is_finite() {
            d
        } else {
            0.0
        }
    }
}
