use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

/// Size threshold (n * nlags) above which autocovariance goes through the FFT path.
/// Below this, the naive O(n*nlags) loop wins due to lower constant overhead.
const FFT_THRESHOLD: usize = 64 * 1024;

/// Fewest aligned points a lagged correlation is computed over. Two points
/// always correlate at ±1.
pub const MIN_OVERLAP: usize = 3;

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (ddof = 1). `None` when fewer than two samples.
pub fn sample_std(xs: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 {
        return None;
    }
    let mu = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - mu) * (x - mu)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Pearson correlation of two equal-length slices.
///
/// Returns `None` when the correlation is undefined: fewer than two points,
/// a constant input, or a non-finite result.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mu_a = mean(a);
    let mu_b = mean(b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mu_a;
        let dy = y - mu_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    // Constant after centering → correlation undefined
    if var_a < 1e-24 || var_b < 1e-24 {
        return None;
    }
    let r = cov / (var_a.sqrt() * var_b.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Align two series for a given lag, dropping the non-overlapping tails.
///
/// - `lag > 0`: pairs `a[t + lag]` with `b[t]`
/// - `lag < 0`: pairs `a[t]` with `b[t - lag]`
/// - `lag == 0`: pairs the common prefix
///
/// Both returned slices have the same length (possibly 0).
pub fn align_at_lag<'a>(a: &'a [f64], b: &'a [f64], lag: isize) -> (&'a [f64], &'a [f64]) {
    let n = a.len().min(b.len());
    let shift = lag.unsigned_abs();
    if shift >= n {
        return (&a[..0], &b[..0]);
    }
    if lag > 0 {
        (&a[shift..n], &b[..n - shift])
    } else if lag < 0 {
        (&a[..n - shift], &b[shift..n])
    } else {
        (&a[..n], &b[..n])
    }
}

/// Pearson correlation at a lag, with undefined values resolved to 0.
///
/// Overlaps shorter than [`MIN_OVERLAP`] also resolve to 0.
pub fn lagged_correlation(a: &[f64], b: &[f64], lag: isize) -> f64 {
    let (x, y) = align_at_lag(a, b, lag);
    if x.len() < MIN_OVERLAP {
        return 0.0;
    }
    pearson(x, y).unwrap_or(0.0)
}

/// Unnormalized autocovariance of the mean-centered series for lags `0..=nlags`.
///
/// Element `k` is `sum_t (x_t - mu)(x_{t+k} - mu)`. Lags at or beyond the
/// series length are 0. Adaptively dispatches to an FFT implementation for
/// large inputs.
pub fn autocovariance(xs: &[f64], nlags: usize) -> Vec<f64> {
    let n = xs.len();
    if n == 0 {
        return vec![0.0; nlags + 1];
    }
    if n * (nlags + 1) > FFT_THRESHOLD {
        if let Some(acov) = autocovariance_fft(xs, nlags) {
            return acov;
        }
    }
    autocovariance_naive(xs, nlags)
}

/// Naive O(n * nlags) autocovariance.
pub fn autocovariance_naive(xs: &[f64], nlags: usize) -> Vec<f64> {
    let n = xs.len();
    let mu = mean(xs);
    let centered: Vec<f64> = xs.iter().map(|x| x - mu).collect();
    (0..=nlags)
        .map(|k| {
            if k >= n {
                0.0
            } else {
                centered[..n - k]
                    .iter()
                    .zip(&centered[k..])
                    .map(|(a, b)| a * b)
                    .sum()
            }
        })
        .collect()
}

/// FFT-based O(n log n) autocovariance via the power spectrum.
///
/// Zero-pads to at least `2n` so the circular correlation equals the linear
/// one. Returns `None` if the FFT backend rejects the buffers.
pub fn autocovariance_fft(xs: &[f64], nlags: usize) -> Option<Vec<f64>> {
    let n = xs.len();
    if n == 0 {
        return Some(vec![0.0; nlags + 1]);
    }
    let fft_len = (2 * n).next_power_of_two();
    let mu = mean(xs);

    let mut planner = RealFftPlanner::<f64>::new();
    let fft_forward = planner.plan_fft_forward(fft_len);
    let fft_inverse = planner.plan_fft_inverse(fft_len);

    let mut padded = vec![0.0; fft_len];
    for (dst, x) in padded.iter_mut().zip(xs) {
        *dst = x - mu;
    }

    let mut spectrum = fft_forward.make_output_vec();
    fft_forward.process(&mut padded, &mut spectrum).ok()?;

    // Power spectrum is real-valued
    for c in spectrum.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }

    let mut result = vec![0.0; fft_len];
    fft_inverse.process(&mut spectrum, &mut result).ok()?;

    // realfft inverse is unnormalized; divide by fft_len
    let norm = 1.0 / fft_len as f64;
    Some(
        (0..=nlags)
            .map(|k| if k < n { result[k] * norm } else { 0.0 })
            .collect(),
    )
}

/// Index of the maximum value, treating NaN as 0. Ties keep the first index.
pub fn argmax_nan_safe(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let v = if v.is_nan() { 0.0 } else { v };
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_std_hand_computed() {
        // [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, sum sq dev 32, ddof=1 → sqrt(32/7)
        let xs = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = sample_std(&xs).unwrap();
        assert!((s - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_pearson_perfect_and_anti() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![2.0, 4.0, 6.0, 8.0];
        let c = vec![4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &c).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_undefined() {
        let a = vec![3.0; 5];
        let b = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(pearson(&a, &b).is_none());
        assert!(pearson(&[1.0], &[2.0]).is_none());
    }

    #[test]
    fn test_align_at_lag() {
        let a = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let b = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let (x, y) = align_at_lag(&a, &b, 2);
        assert_eq!(x, &[2.0, 3.0, 4.0]);
        assert_eq!(y, &[10.0, 11.0, 12.0]);
        let (x, y) = align_at_lag(&a, &b, -2);
        assert_eq!(x, &[0.0, 1.0, 2.0]);
        assert_eq!(y, &[12.0, 13.0, 14.0]);
        let (x, y) = align_at_lag(&a, &b, 7);
        assert!(x.is_empty() && y.is_empty());
    }

    #[test]
    fn test_lagged_correlation_short_overlap_is_zero() {
        let a = vec![1.0, 3.0, 2.0, 5.0, 4.0];
        let b = vec![3.0, 4.0, 1.0, 2.0, 5.0];
        // Lag -3 pairs [1, 3] with [2, 5]: a 2-point overlap, which pearson calls 1
        let (x, y) = align_at_lag(&a, &b, -3);
        assert!((pearson(x, y).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(lagged_correlation(&a, &b, -3), 0.0);
        // Lag -2 keeps 3 points and is computed normally
        assert!(lagged_correlation(&a, &b, -2) != 0.0);
    }

    #[test]
    fn test_autocovariance_hand_computed() {
        // x = [1, 2, 3], centered [-1, 0, 1]
        // lag0 = 2, lag1 = (-1*0 + 0*1) = 0, lag2 = -1*1 = -1, lag3 = 0
        let acov = autocovariance_naive(&[1.0, 2.0, 3.0], 3);
        assert_eq!(acov.len(), 4);
        assert!((acov[0] - 2.0).abs() < 1e-12);
        assert!(acov[1].abs() < 1e-12);
        assert!((acov[2] + 1.0).abs() < 1e-12);
        assert_eq!(acov[3], 0.0);
    }

    #[test]
    fn test_fft_vs_naive_equivalence() {
        for (n, nlags) in [(10, 5), (200, 100), (1000, 500)] {
            let xs: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin() + 0.01 * i as f64).collect();
            let naive = autocovariance_naive(&xs, nlags);
            let fft = autocovariance_fft(&xs, nlags).unwrap();
            for (k, (a, b)) in naive.iter().zip(&fft).enumerate() {
                assert!(
                    (a - b).abs() < 1e-6,
                    "Mismatch at lag {k} (n={n}): naive={a}, fft={b}"
                );
            }
        }
    }

    #[test]
    fn test_argmax_nan_safe() {
        assert_eq!(argmax_nan_safe(&[0.1, f64::NAN, 0.7, 0.7]), Some(2));
        // NaN counts as 0, which beats negatives
        assert_eq!(argmax_nan_safe(&[-0.5, f64::NAN]), Some(1));
        assert_eq!(argmax_nan_safe(&[]), None);
    }
}
