use crate::core::distance_metric::SeriesDistance;

/// Planar distance between two `[latitude, longitude]` points, in degrees.
///
/// Coordinates are treated as a flat plane, so cluster thresholds are in
/// degrees (0.05° ≈ 5.5 km of latitude). Missing components read as 0;
/// non-finite coordinates yield 0.
#[derive(Debug, Clone)]
pub struct PlanarSpatial;

impl SeriesDistance for PlanarSpatial {
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let coord = |p: &[f64], i: usize| p.get(i).copied().unwrap_or(0.0);
        let dlat = coord(a, 0) - coord(b, 0);
        let dlon = coord(a, 1) - coord(b, 1);
        let d = dlat.hypot(dlon);
        if d.is_finite() {
            d
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_four_five() {
        let d = PlanarSpatial::distance(&[43.0, -79.0], &[46.0, -75.0]);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let a = [43.65, -79.38];
        let b = [45.42, -75.69];
        assert_eq!(PlanarSpatial::distance(&a, &b), PlanarSpatial::distance(&b, &a));
    }

    #[test]
    fn test_nan_coordinates_resolve_to_zero() {
        assert_eq!(PlanarSpatial::distance(&[f64::NAN, 0.0], &[1.0, 1.0]), 0.0);
    }
}
