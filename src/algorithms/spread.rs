use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algorithms::common::{argmax_nan_safe, lagged_correlation};
use crate::core::partition::{ClusterId, Partition};
use crate::core::series::NormalizedMatrix;

/// Default maximum lag, in days, scanned in each direction.
pub const DEFAULT_MAX_LAG: usize = 14;

/// Peak correlation a cluster pair must exceed before an edge is claimed.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.5;

/// Mean normalized case series per cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSeries {
    pub ids: Vec<ClusterId>,
    pub series: Vec<Vec<f64>>,
}

impl ClusterSeries {
    pub fn new(ids: Vec<ClusterId>, series: Vec<Vec<f64>>) -> Self {
        assert_eq!(ids.len(), series.len(), "One series per cluster id");
        Self { ids, series }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, id: ClusterId) -> Option<&[f64]> {
        self.ids
            .iter()
            .position(|&c| c == id)
            .map(|k| self.series[k].as_slice())
    }
}

/// Average each cluster's member columns row by row.
///
/// `normalized` must have its columns in the partition's hospital order.
pub fn cluster_series(partition: &Partition, normalized: &NormalizedMatrix) -> ClusterSeries {
    let n_dates = normalized.columns.first().map_or(0, |c| c.len());
    let mut ids = Vec::with_capacity(partition.len());
    let mut series = Vec::with_capacity(partition.len());

    for cluster in partition.clusters() {
        let mut acc = vec![0.0; n_dates];
        for &idx in &cluster.members {
            for (a, v) in acc.iter_mut().zip(normalized.column(idx)) {
                *a += v;
            }
        }
        let k = cluster.members.len().max(1) as f64;
        acc.iter_mut().for_each(|a| *a /= k);
        ids.push(cluster.id);
        series.push(acc);
    }

    ClusterSeries { ids, series }
}

/// How the source cluster relates to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Source's outbreak curve appears `lag_days` before the target's.
    Precedes,
    /// Best alignment at lag 0; direction carries no meaning.
    Synchronous,
}

/// Directed, weighted link in the spread network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source_cluster: ClusterId,
    pub target_cluster: ClusterId,
    pub lag_days: usize,
    /// Peak Pearson correlation at the chosen lag, in [-1, 1].
    pub strength: f64,
    pub relation: Relation,
}

/// Best lag and its correlation for an ordered series pair.
///
/// Scans `-max_lag..=max_lag` with [`lagged_correlation`]; undefined
/// correlations and overlaps shorter than three points count as 0, and ties
/// keep the most negative lag.
pub fn best_lag(a: &[f64], b: &[f64], max_lag: usize) -> (isize, f64) {
    let max_lag = max_lag as isize;
    let lags: Vec<isize> = (-max_lag..=max_lag).collect();
    let corrs: Vec<f64> = lags.iter().map(|&l| lagged_correlation(a, b, l)).collect();
    match argmax_nan_safe(&corrs) {
        Some(k) => (lags[k], corrs[k]),
        None => (0, 0.0),
    }
}

/// Build the spread network with the default significance threshold.
pub fn predict_spread(series: &ClusterSeries, max_lag: usize) -> Vec<NetworkEdge> {
    predict_spread_with(series, max_lag, DEFAULT_SIGNIFICANCE)
}

/// Build the directed spread network from cluster series.
///
/// For every ordered pair `(i, j)`, finds the lag maximizing the correlation of
/// `s_i[t + lag]` with `s_j[t]`. A positive best lag means `s_i` is a delayed
/// copy of `s_j`, so `j` is the source; a negative lag makes `i` the source.
/// The earlier outbreak is always the source and `lag_days` is the absolute
/// lag. A pair is linked only if its peak correlation exceeds `significance`.
///
/// The ordered pair `(j, i)` is the mirror of `(i, j)` and yields the same
/// edge, so each unordered pair contributes at most one edge (the stronger if
/// the two scans disagree). Lag 0 gives a [`Relation::Synchronous`] edge from
/// the lower cluster id to the higher.
pub fn predict_spread_with(
    series: &ClusterSeries,
    max_lag: usize,
    significance: f64,
) -> Vec<NetworkEdge> {
    let mut edges: BTreeMap<(ClusterId, ClusterId), NetworkEdge> = BTreeMap::new();

    for i in 0..series.len() {
        for j in 0..series.len() {
            if i == j {
                continue;
            }
            let (lag, corr) = best_lag(&series.series[i], &series.series[j], max_lag);
            if corr <= significance {
                continue;
            }

            let (ci, cj) = (series.ids[i], series.ids[j]);
            let (source, target, relation) = if lag > 0 {
                (cj, ci, Relation::Precedes)
            } else if lag < 0 {
                (ci, cj, Relation::Precedes)
            } else {
                (ci.min(cj), ci.max(cj), Relation::Synchronous)
            };
            let edge = NetworkEdge {
                source_cluster: source,
                target_cluster: target,
                lag_days: lag.unsigned_abs(),
                strength: corr,
                relation,
            };

            let key = (ci.min(cj), ci.max(cj));
            match edges.get(&key) {
                Some(existing) if existing.strength >= edge.strength => {}
                _ => {
                    edges.insert(key, edge);
                }
            }
        }
    }

    let edges: Vec<NetworkEdge> = edges.into_values().collect();
    tracing::debug!(
        clusters = series.len(),
        edges = edges.len(),
        max_lag,
        "Computed spread network"
    );
    edges
}
