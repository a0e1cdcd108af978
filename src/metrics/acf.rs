use crate::algorithms::common::autocovariance;
use crate::core::distance_metric::SeriesDistance;

/// Autocorrelation function of a series out to `nlags`.
///
/// `acf[k] = acov[k] / acov[0]`, so `acf[0] = 1`. A constant series has no
/// defined autocorrelation; it resolves to `[1, 0, 0, ...]`.
pub fn acf(xs: &[f64], nlags: usize) -> Vec<f64> {
    let acov = autocovariance(xs, nlags);
    let c0 = acov[0];
    if c0 <= 1e-24 || !c0.is_finite() {
        let mut out = vec![0.0; nlags + 1];
        out[0] = 1.0;
        return out;
    }
    acov.iter().map(|c| c / c0).collect()
}

/// Euclidean distance between the autocorrelation vectors of two series.
///
/// Lags run out to `min(len_a, len_b) / 2`, so both vectors have the same
/// length. Series shorter than two points compare only lag 0, giving d = 0.
#[derive(Debug, Clone)]
pub struct AcfDistance;

impl SeriesDistance for AcfDistance {
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let nlags = a.len().min(b.len()) / 2;
        let acf_a = acf(a, nlags);
        let acf_b = acf(b, nlags);
        let d = acf_a
            .iter()
            .zip(&acf_b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt();
        if d.is_finite() {
            d
        } else {
            0.0
        }
    }
}
