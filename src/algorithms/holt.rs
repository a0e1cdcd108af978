use crate::error::{OutbreakError, Result};

/// Holt's linear-trend exponential smoothing (additive trend, no season).
///
/// Recursion, for `t >= 1`:
/// - one-step forecast `f_t = l_{t-1} + b_{t-1}`
/// - level `l_t = alpha * y_t + (1 - alpha) * (l_{t-1} + b_{t-1})`
/// - trend `b_t = beta * (l_t - l_{t-1}) + (1 - beta) * b_{t-1}`
///
/// initialized with `l_0 = y_0`, `b_0 = y_1 - y_0`. The `h`-step forecast is
/// `l_n + h * b_n`.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltModel {
    pub alpha: f64,
    pub beta: f64,
    pub level: f64,
    pub trend: f64,
    /// Sum of squared one-step-ahead errors over the fitted series.
    pub sse: f64,
}

impl HoltModel {
    /// Fit with fixed smoothing parameters.
    pub fn fit_with(ys: &[f64], alpha: f64, beta: f64) -> Result<Self> {
        if ys.len() < 2 {
            return Err(OutbreakError::ForecastDiverged(format!(
                "need at least 2 observations, got {}",
                ys.len()
            )));
        }
        if ys.iter().any(|y| !y.is_finite()) {
            return Err(OutbreakError::ForecastDiverged(
                "non-finite observation".to_string(),
            ));
        }

        let mut level = ys[0];
        let mut trend = ys[1] - ys[0];
        let mut sse = 0.0;
        for &y in &ys[1..] {
            let predicted = level + trend;
            let err = y - predicted;
            sse += err * err;
            let new_level = alpha * y + (1.0 - alpha) * predicted;
            trend = beta * (new_level - level) + (1.0 - beta) * trend;
            level = new_level;
        }

        if !(level.is_finite() && trend.is_finite() && sse.is_finite()) {
            return Err(OutbreakError::ForecastDiverged(format!(
                "state diverged at alpha={alpha}, beta={beta}"
            )));
        }

        Ok(Self {
            alpha,
            beta,
            level,
            trend,
            sse,
        })
    }

    /// Fit by minimizing one-step SSE over (alpha, beta).
    ///
    /// A coarse 0.05 grid over (0, 1)² locates the basin, then a 0.01 grid
    /// refines around the best coarse point.
    pub fn fit(ys: &[f64]) -> Result<Self> {
        let coarse: Vec<f64> = (1..20).map(|k| k as f64 * 0.05).collect();
        let best = Self::search(ys, &coarse, &coarse)?;

        let refine = |center: f64| -> Vec<f64> {
            (-5..=5)
                .map(|k| (center + k as f64 * 0.01).clamp(0.01, 0.99))
                .collect()
        };
        let refined = Self::search(ys, &refine(best.alpha), &refine(best.beta))?;
        Ok(if refined.sse < best.sse { refined } else { best })
    }

    fn search(ys: &[f64], alphas: &[f64], betas: &[f64]) -> Result<Self> {
        let mut best: Option<Self> = None;
        let mut last_err = None;
        for &alpha in alphas {
            for &beta in betas {
                match Self::fit_with(ys, alpha, beta) {
                    Ok(model) => {
                        if best.as_ref().map_or(true, |b| model.sse < b.sse) {
                            best = Some(model);
                        }
                    }
                    Err(e) => last_err = Some(e),
                }
            }
        }
        best.ok_or_else(|| {
            last_err.unwrap_or_else(|| {
                OutbreakError::ForecastDiverged("empty parameter grid".to_string())
            })
        })
    }

    /// Point forecasts for steps `1..=horizon`.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| self.level + h as f64 * self.trend)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_series_extrapolates_exactly() {
        // A perfect line has zero one-step error for any parameters
        let ys: Vec<f64> = (0..10).map(|t| 3.0 + 2.0 * t as f64).collect();
        let model = HoltModel::fit(&ys).unwrap();
        assert!(model.sse < 1e-18);
        let fc = model.forecast(3);
        assert!((fc[0] - 23.0).abs() < 1e-9);
        assert!((fc[2] - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_with_hand_computed() {
        // y = [1, 3, 4], alpha = 0.5, beta = 0.5
        // l0=1, b0=2
        // t=1: f=3, e=0, l=3, b=0.5*2+0.5*2=2
        // t=2: f=5, e=-1, l=0.5*4+0.5*5=4.5, b=0.5*1.5+0.5*2=1.75
        let m = HoltModel::fit_with(&[1.0, 3.0, 4.0], 0.5, 0.5).unwrap();
        assert!((m.level - 4.5).abs() < 1e-12);
        assert!((m.trend - 1.75).abs() < 1e-12);
        assert!((m.sse - 1.0).abs() < 1e-12);
        assert!((m.forecast(2)[1] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(HoltModel::fit(&[1.0, f64::NAN, 2.0]).is_err());
        assert!(HoltModel::fit(&[1.0]).is_err());
    }

    #[test]
    fn test_fit_beats_arbitrary_parameters() {
        let ys = vec![2.0, 5.0, 3.0, 8.0, 6.0, 11.0, 9.0, 14.0];
        let fitted = HoltModel::fit(&ys).unwrap();
        let fixed = HoltModel::fit_with(&ys, 0.9, 0.9).unwrap();
        assert!(fitted.sse <= fixed.sse);
        assert!(fitted.alpha > 0.0 && fitted.alpha < 1.0);
    }
}
