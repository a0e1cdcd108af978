//! Spatio-temporal outbreak mining over hospital case counts.
//!
//! The pipeline turns daily flu-positive counts into a normalized
//! date × hospital matrix, groups hospitals by a chosen distance metric with
//! average-linkage clustering, and links clusters into a directed spread
//! network by lagged cross-correlation. Around it sit a per-hospital
//! forecaster, capacity and velocity alerts, community report scoring and an
//! SIR projection.

pub mod algorithms;
pub mod config;
pub mod core;
pub mod error;
pub mod metrics;
pub mod surveillance;

use std::collections::BTreeMap;

pub use crate::algorithms::forecast::{forecast_series, ForecastMethod, ForecastPoint};
pub use crate::algorithms::holt::HoltModel;
pub use crate::algorithms::sir::{SirModel, SirSnapshot, SirState};
pub use crate::algorithms::spread::{ClusterSeries, NetworkEdge, Relation};
pub use crate::config::{AnalysisConfig, ForecastConfig};
pub use crate::core::cache::{Snapshot, SnapshotCache};
pub use crate::core::distance_matrix::DistanceMatrix;
pub use crate::core::distance_metric::{Metric, SeriesDistance};
pub use crate::core::partition::{Cluster, ClusterId, Partition};
pub use crate::core::series::{
    DailyObservation, HospitalId, HospitalNode, NormalizedMatrix, TimeSeriesMatrix,
    TimeSeriesStore,
};
pub use crate::error::{OutbreakError, Result};
pub use crate::surveillance::alerts::{
    Alert, AlertEngine, AlertRun, AlertStore, ClusterRisk, InMemoryAlertStore, RiskLevel,
    Severity,
};
pub use crate::surveillance::integrity::{
    hash_source, CommunityReport, InMemoryReportLog, IncomingReport, IntegrityEngine, ReportLog,
    ValidationOutcome,
};

/// Result of one full mining cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub partition: Partition,
    pub clusters: BTreeMap<ClusterId, Vec<HospitalId>>,
    pub network: Vec<NetworkEdge>,
}

impl Analysis {
    fn empty() -> Self {
        Self {
            partition: Partition::from_labels(&[], &[]),
            clusters: BTreeMap::new(),
            network: Vec::new(),
        }
    }
}

/// Facade over one immutable snapshot of the registry and its case matrix.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use outbreak_rs::{DailyObservation, HospitalNode, Metric, OutbreakMiner};
///
/// let hospitals = vec![
///     HospitalNode::new(1, 43.65, -79.38),
///     HospitalNode::new(2, 43.66, -79.39),
///     HospitalNode::new(3, 45.42, -75.69),
/// ];
/// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let obs = vec![DailyObservation::new(1, day, 4), DailyObservation::new(3, day, 2)];
///
/// let miner = OutbreakMiner::new(hospitals, &obs);
/// let dm = miner.distance_matrix(Metric::Spatial);
/// let partition = miner.cluster(&dm, 0.05);
/// assert_eq!(partition.len(), 2);
/// assert_eq!(partition.cluster_of(1), partition.cluster_of(2));
/// ```
#[derive(Debug, Clone)]
pub struct OutbreakMiner {
    hospitals: Vec<HospitalNode>,
    store: TimeSeriesStore,
}

impl OutbreakMiner {
    /// Snapshot the registry and observations. Every hospital becomes a
    /// column, in registry order.
    pub fn new(hospitals: Vec<HospitalNode>, observations: &[DailyObservation]) -> Self {
        let ids: Vec<HospitalId> = hospitals.iter().map(|h| h.id).collect();
        let store = TimeSeriesStore::build(observations, &ids);
        Self { hospitals, store }
    }

    pub fn hospitals(&self) -> &[HospitalNode] {
        &self.hospitals
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn distance_matrix(&self, metric: Metric) -> DistanceMatrix {
        algorithms::distance::compute_distance_matrix(
            metric,
            &self.hospitals,
            self.store.normalized(),
        )
    }

    pub fn cluster(&self, dm: &DistanceMatrix, threshold: f64) -> Partition {
        algorithms::linkage::cluster(dm, threshold)
    }

    pub fn cluster_series(&self, partition: &Partition) -> ClusterSeries {
        algorithms::spread::cluster_series(partition, self.store.normalized())
    }

    pub fn predict_spread(&self, series: &ClusterSeries, max_lag: usize) -> Vec<NetworkEdge> {
        algorithms::spread::predict_spread(series, max_lag)
    }

    /// Forecast with the default minimum series length.
    ///
    /// Never fails: an unknown hospital, an empty matrix or a model failure
    /// all give an empty forecast.
    pub fn forecast(&self, hospital_id: HospitalId, horizon: usize) -> Vec<ForecastPoint> {
        self.forecast_with(hospital_id, horizon, algorithms::forecast::MIN_OBSERVATIONS)
    }

    /// Forecast with the horizon and minimum series length from `cfg`.
    pub fn forecast_configured(
        &self,
        hospital_id: HospitalId,
        cfg: &ForecastConfig,
    ) -> Vec<ForecastPoint> {
        self.forecast_with(hospital_id, cfg.horizon, cfg.min_observations)
    }

    pub fn forecast_with(
        &self,
        hospital_id: HospitalId,
        horizon: usize,
        min_observations: usize,
    ) -> Vec<ForecastPoint> {
        match self.try_forecast(hospital_id, horizon, min_observations) {
            Ok(points) => points,
            Err(err) => {
                tracing::warn!(hospital = hospital_id, error = %err, "Forecast failed");
                Vec::new()
            }
        }
    }

    /// Forecast that reports why it could not produce values.
    pub fn try_forecast(
        &self,
        hospital_id: HospitalId,
        horizon: usize,
        min_observations: usize,
    ) -> Result<Vec<ForecastPoint>> {
        let raw = self.store.raw();
        let idx = raw
            .index_of(hospital_id)
            .ok_or(OutbreakError::UnknownHospital(hospital_id))?;
        let Some(last_date) = raw.last_date() else {
            return Ok(Vec::new());
        };
        let (method, points) =
            forecast_series(raw.column(idx), last_date, horizon, min_observations)?;
        if method == ForecastMethod::MeanFallback {
            tracing::debug!(hospital = hospital_id, "Short series, using mean forecast");
        }
        Ok(points)
    }

    /// Distance, clustering, cluster series and spread in one pass.
    pub fn analyze(&self, cfg: &AnalysisConfig) -> Analysis {
        if self.store.is_empty() {
            tracing::info!("No observations, skipping analysis");
            return Analysis::empty();
        }
        let dm = self.distance_matrix(cfg.clustering.metric);
        let partition = self.cluster(&dm, cfg.clustering.threshold);
        let series = self.cluster_series(&partition);
        let network = algorithms::spread::predict_spread_with(
            &series,
            cfg.spread.max_lag,
            cfg.spread.significance,
        );
        tracing::info!(
            metric = %cfg.clustering.metric,
            clusters = partition.len(),
            edges = network.len(),
            "Analysis complete"
        );
        Analysis {
            clusters: partition.to_map(),
            partition,
            network,
        }
    }

    /// Partition under `cfg`, for feeding a [`SnapshotCache`].
    pub fn partition(&self, cfg: &AnalysisConfig) -> Partition {
        let dm = self.distance_matrix(cfg.clustering.metric);
        self.cluster(&dm, cfg.clustering.threshold)
    }
}
