use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algorithms::forecast::MIN_OBSERVATIONS;
use crate::algorithms::spread::{DEFAULT_MAX_LAG, DEFAULT_SIGNIFICANCE};
use crate::core::distance_metric::Metric;
use crate::error::{OutbreakError, Result};

/// Top-level tuning for one deployment.
///
/// Every field has a default, so a partial JSON document only overrides what
/// it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub clustering: ClusteringConfig,
    pub spread: SpreadConfig,
    pub forecast: ForecastConfig,
    pub alerts: AlertConfig,
    pub integrity: IntegrityConfig,
    pub simulation: SimulationConfig,
    /// Lifetime of a cached clustering result.
    pub cache_ttl_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            spread: SpreadConfig::default(),
            forecast: ForecastConfig::default(),
            alerts: AlertConfig::default(),
            integrity: IntegrityConfig::default(),
            simulation: SimulationConfig::default(),
            cache_ttl_secs: 300,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(OutbreakError::InvalidConfig(msg.to_string()));
        if !(self.clustering.threshold >= 0.0) {
            return fail("clustering.threshold must be >= 0");
        }
        if !(-1.0..=1.0).contains(&self.spread.significance) {
            return fail("spread.significance must lie in [-1, 1]");
        }
        if self.alerts.warning_occupancy > self.alerts.critical_occupancy {
            return fail("alerts.warning_occupancy must not exceed critical_occupancy");
        }
        self.integrity.check()?;
        self.simulation.check()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub metric: Metric,
    /// Dendrogram cut height, in the metric's units.
    pub threshold: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Spatial,
            threshold: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    pub max_lag: usize,
    pub significance: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            max_lag: DEFAULT_MAX_LAG,
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizon: usize,
    pub min_observations: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 7,
            min_observations: MIN_OBSERVATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Occupancy at or above this fraction is CRITICAL (inclusive: 90/100 beds qualifies).
    pub critical_occupancy: f64,
    /// Occupancy at or above this fraction, and below critical, is WARNING.
    pub warning_occupancy: f64,
    /// Recent flu cases as a fraction of total beds that counts as a surge.
    pub surge_fraction: f64,
    pub window_days: u64,
    pub velocity_multiplier: f64,
    pub velocity_floor: f64,
    /// Recent cases across a hospital's cluster above which risk is high.
    pub cluster_risk_cases: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            critical_occupancy: 0.90,
            warning_occupancy: 0.80,
            surge_fraction: 0.20,
            window_days: 7,
            velocity_multiplier: 2.0,
            velocity_floor: 10.0,
            cluster_risk_cases: 5.0,
        }
    }
}

/// Latitude/longitude rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }

    pub fn is_valid(&self) -> bool {
        self.min_lat <= self.max_lat && self.min_lon <= self.max_lon
    }
}

impl Default for BoundingBox {
    /// Southern Ontario through Hudson Bay.
    fn default() -> Self {
        Self {
            min_lat: 41.0,
            max_lat: 57.0,
            min_lon: -96.0,
            max_lon: -74.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    pub region: BoundingBox,
    pub window_secs: i64,
    /// More reports than this in the window are rejected.
    pub reject_above: usize,
    /// More reports than this in the window are down-weighted.
    pub suspicious_above: usize,
    pub baseline_trust: f64,
    pub suspicious_trust: f64,
    pub out_of_region_trust: f64,
}

/// Longest rate-limit window `chrono` can represent, in seconds.
pub const MAX_WINDOW_SECS: i64 = i64::MAX / 1000;

impl IntegrityConfig {
    pub fn check(&self) -> Result<()> {
        let fail = |msg: &str| Err(OutbreakError::InvalidConfig(msg.to_string()));
        if !(1..=MAX_WINDOW_SECS).contains(&self.window_secs) {
            return fail("integrity.window_secs must lie in [1, i64::MAX / 1000]");
        }
        if self.suspicious_above > self.reject_above {
            return fail("integrity.suspicious_above must not exceed reject_above");
        }
        if !self.region.is_valid() {
            return fail("integrity.region bounds are inverted");
        }
        Ok(())
    }
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            region: BoundingBox::default(),
            window_secs: 3600,
            reject_above: 5,
            suspicious_above: 2,
            baseline_trust: 0.5,
            suspicious_trust: 0.1,
            out_of_region_trust: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Baseline transmission rate per day.
    pub beta: f64,
    /// Recovery rate per day (1 / infectious days).
    pub gamma: f64,
    /// Largest fraction of `beta` an intervention can remove.
    pub max_reduction: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            beta: 0.3,
            gamma: 0.1,
            max_reduction: 0.7,
        }
    }
}

impl SimulationConfig {
    pub fn check(&self) -> Result<()> {
        if !(self.beta >= 0.0 && self.gamma >= 0.0) {
            return Err(OutbreakError::InvalidConfig(
                "simulation.beta and simulation.gamma must be >= 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_reduction) {
            return Err(OutbreakError::InvalidConfig(
                "simulation.max_reduction must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
