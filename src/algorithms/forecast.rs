use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::algorithms::common::mean;
use crate::algorithms::holt::HoltModel;
use crate::error::Result;

/// Series shorter than this use the flat mean projection.
pub const MIN_OBSERVATIONS: usize = 3;

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_count: f64,
}

/// Which path produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastMethod {
    MeanFallback,
    Holt,
}

/// Project a raw daily series `horizon` days past `last_date`.
///
/// Series with fewer than `min_observations` points repeat their historical
/// mean; longer ones use a fitted [`HoltModel`]. Every value is clamped to
/// `>= 0` and rounded to one decimal. Fit failures are returned as errors so
/// the caller can decide on the fallback.
pub fn forecast_series(
    series: &[f64],
    last_date: NaiveDate,
    horizon: usize,
    min_observations: usize,
) -> Result<(ForecastMethod, Vec<ForecastPoint>)> {
    let (method, values) = if series.len() < min_observations.max(2) {
        (ForecastMethod::MeanFallback, vec![mean(series); horizon])
    } else {
        let model = HoltModel::fit(series)?;
        (ForecastMethod::Holt, model.forecast(horizon))
    };

    let points = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let date = last_date.checked_add_days(Days::new(i as u64 + 1))?;
            let v = if v.is_finite() { v.max(0.0) } else { 0.0 };
            Some(ForecastPoint {
                date,
                predicted_count: (v * 10.0).round() / 10.0,
            })
        })
        .collect();

    Ok((method, points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_short_series_uses_mean() {
        let (method, fc) = forecast_series(&[4.0, 6.0], d(2024, 3, 30), 3, MIN_OBSERVATIONS).unwrap();
        assert_eq!(method, ForecastMethod::MeanFallback);
        assert_eq!(fc.len(), 3);
        assert_eq!(fc[0].date, d(2024, 3, 31));
        assert_eq!(fc[2].date, d(2024, 4, 2));
        assert!(fc.iter().all(|p| (p.predicted_count - 5.0).abs() < 1e-12));
    }

    #[test]
    fn test_declining_series_clamped() {
        let series: Vec<f64> = (0..10).map(|t| 50.0 - 6.0 * t as f64).collect();
        let (method, fc) = forecast_series(&series, d(2024, 1, 10), 14, MIN_OBSERVATIONS).unwrap();
        assert_eq!(method, ForecastMethod::Holt);
        assert_eq!(fc.len(), 14);
        assert!(fc.iter().all(|p| p.predicted_count >= 0.0));
        assert_eq!(fc.last().unwrap().predicted_count, 0.0);
    }

    #[test]
    fn test_rounding_one_decimal() {
        let (_, fc) = forecast_series(&[1.0, 1.0, 1.33], d(2024, 1, 1), 1, 5).unwrap();
        // Mean of [1, 1, 1.33] = 1.11 → 1.1
        assert!((fc[0].predicted_count - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_horizon() {
        let (_, fc) = forecast_series(&[1.0, 2.0, 3.0], d(2024, 1, 1), 0, MIN_OBSERVATIONS).unwrap();
        assert!(fc.is_empty());
    }
}
