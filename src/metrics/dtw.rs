use crate::core::distance_metric::SeriesDistance;

/// Dynamic time warping distance with absolute-difference local cost.
///
/// Exact O(n*m) dynamic program over the full series using two rolling rows.
/// The result is the cost of the cheapest monotone alignment path from
/// `(0, 0)` to `(n-1, m-1)`.
///
/// Edge cases:
/// - Either series empty → d = 0
#[derive(Debug, Clone)]
pub struct DtwDistance;

impl SeriesDistance for DtwDistance {
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let m = b.len();
        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];
        prev[0] = 0.0;

        for &x in a {
            curr[0] = f64::INFINITY;
            for j in 1..=m {
                let cost = (x - b[j - 1]).abs();
                let best = prev[j].min(curr[j - 1]).min(prev[j - 1]);
                curr[j] = cost + best;
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        let d = prev[m];
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
    fn test_identical_is_zero() {
        let a = vec![0.0, 1.0, 2.0, 1.0, 0.0];
        assert_eq!(DtwDistance::distance(&a, &a), 0.0);
    }

    #[test]
    fn test_warping_absorbs_stretch() {
        // b repeats a's middle point; DTW can align it at no cost
        let a = vec![0.0, 1.0, 2.0];
        let b = vec![0.0, 1.0, 1.0, 2.0];
        assert_eq!(DtwDistance::distance(&a, &b), 0.0);
    }

    #[test]
    fn test_hand_computed() {
        // a = [0, 0], b = [1]: both points of a must align to b[0] → 1 + 1
        assert!((DtwDistance::distance(&[0.0, 0.0], &[1.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        assert_eq!(DtwDistance::distance(&[], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = vec![0.3, -1.2, 0.8, 2.0];
        let b = vec![1.0, 0.0, -0.5];
        assert!((DtwDistance::distance(&a, &b) - DtwDistance::distance(&b, &a)).abs() < 1e-12);
    }
}
