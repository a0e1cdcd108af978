#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::distance_matrix::DistanceMatrix;
use crate::core::distance_metric::{Metric, SeriesDistance};
use crate::core::series::{HospitalId, HospitalNode, NormalizedMatrix};
use crate::metrics::acf::AcfDistance;
use crate::metrics::correlation::CorrelationDistance;
use crate::metrics::dtw::DtwDistance;
use crate::metrics::euclidean::TruncatedEuclidean;
use crate::metrics::spatial::PlanarSpatial;

/// Compute the hospital × hospital distance matrix under `metric`.
///
/// `hospitals` and the columns of `normalized` must share the same order.
/// The spatial metric reads coordinates from `hospitals`; every other metric
/// reads the normalized case series. Only pairs `i < j` are evaluated.
pub fn compute_distance_matrix(
    metric: Metric,
    hospitals: &[HospitalNode],
    normalized: &NormalizedMatrix,
) -> DistanceMatrix {
    let ids: Vec<_> = hospitals.iter().map(|h| h.id).collect();
    let dm = if metric.uses_coordinates() {
        let coords: Vec<Vec<f64>> = hospitals
            .iter()
            .map(|h| vec![h.latitude, h.longitude])
            .collect();
        pairwise::<PlanarSpatial>(&ids, &coords)
    } else {
        assert_eq!(
            normalized.columns.len(),
            hospitals.len(),
            "Normalized matrix must have one column per hospital"
        );
        match metric {
            Metric::Correlation => pairwise::<CorrelationDistance>(&ids, &normalized.columns),
            Metric::Dtw => pairwise::<DtwDistance>(&ids, &normalized.columns),
            Metric::Acf => pairwise::<AcfDistance>(&ids, &normalized.columns),
            Metric::Euclidean | Metric::Spatial => {
                pairwise::<TruncatedEuclidean>(&ids, &normalized.columns)
            }
        }
    };
    tracing::debug!(%metric, hospitals = ids.len(), "Computed distance matrix");
    dm
}

/// Fill a distance matrix from per-hospital feature vectors.
pub fn pairwise<D: SeriesDistance>(
    ids: &[HospitalId],
    features: &[Vec<f64>],
) -> DistanceMatrix {
    let n = ids.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    #[cfg(feature = "parallel")]
    let values: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| D::distance(&features[i], &features[j]))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let values: Vec<f64> = pairs
        .iter()
        .map(|&(i, j)| D::distance(&features[i], &features[j]))
        .collect();

    DistanceMatrix::from_condensed(ids, &values)
}
