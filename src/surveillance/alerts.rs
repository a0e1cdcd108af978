use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AlertConfig;
use crate::core::cache::SnapshotCache;
use crate::core::partition::{ClusterId, Partition};
use crate::core::series::{DailyObservation, HospitalId, HospitalNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Critical,
}

/// Operational alert. `hospital_id == None` means system-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub hospital_id: Option<HospitalId>,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Persistence seam for raised alerts.
///
/// Alerts are identified by (hospital, message, calendar day); `contains`
/// answers whether one with that identity is already stored.
pub trait AlertStore {
    fn contains(&self, hospital_id: Option<HospitalId>, message: &str, day: NaiveDate) -> bool;
    fn insert(&mut self, alert: Alert);
    fn alerts(&self) -> &[Alert];
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAlertStore {
    alerts: Vec<Alert>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl AlertStore for InMemoryAlertStore {
    fn contains(&self, hospital_id: Option<HospitalId>, message: &str, day: NaiveDate) -> bool {
        self.alerts
            .iter()
            .any(|a| a.hospital_id == hospital_id && a.message == message && a.day() == day)
    }

    fn insert(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    fn alerts(&self) -> &[Alert] {
        &self.alerts
    }
}

/// Outcome of one alert cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRun {
    /// Every alert the checks raised this cycle, duplicates included.
    pub candidates: Vec<Alert>,
    /// How many candidates were new and got stored.
    pub inserted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Low,
    Unassigned,
}

/// Hospital-facing view of its cluster's recent activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRisk {
    pub hospital_id: HospitalId,
    pub cluster_id: Option<ClusterId>,
    pub level: RiskLevel,
    pub recent_cases: f64,
    pub message: String,
}

/// Rule evaluator for capacity stress and outbreak velocity.
#[derive(Debug, Clone, Default)]
pub struct AlertEngine {
    pub cfg: AlertConfig,
}

impl AlertEngine {
    pub fn new(cfg: AlertConfig) -> Self {
        Self { cfg }
    }

    /// First day of the trailing window ending at `now`'s date.
    fn window_start(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = now.date_naive();
        today
            .checked_sub_days(Days::new(self.cfg.window_days))
            .unwrap_or(NaiveDate::MIN)
    }

    fn in_window(&self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        date >= self.window_start(now) && date <= now.date_naive()
    }

    /// Flu-positive cases per hospital inside the trailing window.
    pub fn recent_cases(
        &self,
        observations: &[DailyObservation],
        now: DateTime<Utc>,
    ) -> BTreeMap<HospitalId, f64> {
        let mut out = BTreeMap::new();
        for obs in observations.iter().filter(|o| self.in_window(o.date, now)) {
            *out.entry(obs.hospital_id).or_insert(0.0) += obs.flu_positive_count as f64;
        }
        out
    }

    /// Bed occupancy and flu-surge checks, per hospital.
    ///
    /// Occupancy at or above `critical_occupancy` is CRITICAL, else at or above
    /// `warning_occupancy` is WARNING. Independently, recent flu cases above
    /// `surge_fraction` of total beds raise a CRITICAL surge alert. Hospitals
    /// reporting zero beds are skipped.
    pub fn check_capacity_stress(
        &self,
        hospitals: &[HospitalNode],
        observations: &[DailyObservation],
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let recent = self.recent_cases(observations, now);
        let mut alerts = Vec::new();

        for h in hospitals {
            let Some(occupancy) = h.occupancy() else {
                continue;
            };
            let pct = (occupancy * 100.0).floor() as i64;
            if occupancy >= self.cfg.critical_occupancy - 1e-12 {
                alerts.push(Alert {
                    hospital_id: Some(h.id),
                    severity: Severity::Critical,
                    message: format!("Critical Overcrowding: hospital {} at {pct}% capacity.", h.id),
                    created_at: now,
                });
            } else if occupancy >= self.cfg.warning_occupancy - 1e-12 {
                alerts.push(Alert {
                    hospital_id: Some(h.id),
                    severity: Severity::Warning,
                    message: format!("High Occupancy: hospital {} at {pct}% capacity.", h.id),
                    created_at: now,
                });
            }

            let flu = recent.get(&h.id).copied().unwrap_or(0.0);
            if flu / h.total_beds as f64 > self.cfg.surge_fraction {
                alerts.push(Alert {
                    hospital_id: Some(h.id),
                    severity: Severity::Critical,
                    message: format!(
                        "Surge Detected: flu patients exceed {:.0}% of capacity at hospital {}.",
                        self.cfg.surge_fraction * 100.0,
                        h.id
                    ),
                    created_at: now,
                });
            }
        }

        alerts
    }

    /// System-wide doubling check over the trailing window.
    ///
    /// Uses the days in the window that recorded any positive cases. With at
    /// least three such days, the latest day's total is compared against the
    /// earliest: more than `velocity_multiplier` times it, and above
    /// `velocity_floor`, raises a system-wide WARNING.
    pub fn check_outbreak_velocity(
        &self,
        observations: &[DailyObservation],
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for obs in observations.iter().filter(|o| self.in_window(o.date, now)) {
            *daily.entry(obs.date).or_insert(0.0) += obs.flu_positive_count as f64;
        }
        let counts: Vec<f64> = daily.into_values().filter(|&c| c > 0.0).collect();
        if counts.len() < 3 {
            return vec![];
        }

        let past = counts[0];
        let latest = counts[counts.len() - 1];
        if latest > past * self.cfg.velocity_multiplier && latest > self.cfg.velocity_floor {
            vec![Alert {
                hospital_id: None,
                severity: Severity::Warning,
                message: format!(
                    "Rapid Spread Alert: total daily cases doubled in last {} days ({past} -> {latest}).",
                    self.cfg.window_days
                ),
                created_at: now,
            }]
        } else {
            vec![]
        }
    }

    /// Store candidates that are not already present for the same
    /// (hospital, message, day). Returns how many were inserted.
    pub fn persist(&self, candidates: &[Alert], store: &mut impl AlertStore) -> usize {
        let mut inserted = 0;
        for alert in candidates {
            if store.contains(alert.hospital_id, &alert.message, alert.day()) {
                tracing::debug!(hospital = ?alert.hospital_id, "Alert already raised today");
                continue;
            }
            tracing::info!(
                hospital = ?alert.hospital_id,
                severity = ?alert.severity,
                message = %alert.message,
                "Alert raised"
            );
            store.insert(alert.clone());
            inserted += 1;
        }
        inserted
    }

    /// Run every check and persist the new alerts.
    pub fn run_checks(
        &self,
        hospitals: &[HospitalNode],
        observations: &[DailyObservation],
        now: DateTime<Utc>,
        store: &mut impl AlertStore,
    ) -> AlertRun {
        let mut candidates = self.check_capacity_stress(hospitals, observations, now);
        candidates.extend(self.check_outbreak_velocity(observations, now));
        let inserted = self.persist(&candidates, store);
        AlertRun {
            candidates,
            inserted,
        }
    }

    /// Risk level of the cluster a hospital belongs to.
    ///
    /// Reads the cached partition while it is fresh, otherwise recomputes it
    /// with `compute` and swaps the new snapshot into `cache`. Recent cases are
    /// summed over every member of the hospital's cluster.
    pub fn assess_cluster_risk(
        &self,
        hospital_id: HospitalId,
        cache: &SnapshotCache<Partition>,
        observations: &[DailyObservation],
        now: DateTime<Utc>,
        compute: impl FnOnce() -> Partition,
    ) -> ClusterRisk {
        let (snapshot, _hit) = cache.get_or_refresh(now, compute);
        let partition = &snapshot.payload;

        let Some(cluster) = partition.cluster_of(hospital_id) else {
            return ClusterRisk {
                hospital_id,
                cluster_id: None,
                level: RiskLevel::Unassigned,
                recent_cases: 0.0,
                message: "Not in any cluster".to_string(),
            };
        };

        let members = partition.member_ids(cluster);
        let recent = self.recent_cases(observations, now);
        let recent_cases: f64 = members.iter().filter_map(|m| recent.get(m)).sum();

        if recent_cases > self.cfg.cluster_risk_cases {
            ClusterRisk {
                hospital_id,
                cluster_id: Some(cluster.id),
                level: RiskLevel::High,
                recent_cases,
                message: format!(
                    "High Risk: Your facility is in Active Cluster {} ({recent_cases} recent cases in area).",
                    cluster.id
                ),
            }
        } else {
            ClusterRisk {
                hospital_id,
                cluster_id: Some(cluster.id),
                level: RiskLevel::Low,
                recent_cases,
                message: "Monitoring - Low Risk".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        now().date_naive() - Days::new(n)
    }

    #[test]
    fn test_ninety_percent_is_critical_once() {
        let engine = AlertEngine::default();
        let hospitals = vec![HospitalNode::new(1, 43.0, -79.0).with_capacity(100, 10, 90)];
        let mut store = InMemoryAlertStore::new();

        let run = engine.run_checks(&hospitals, &[], now(), &mut store);
        assert_eq!(run.candidates.len(), 1);
        assert_eq!(run.candidates[0].severity, Severity::Critical);
        assert_eq!(run.inserted, 1);

        let later = now() + chrono::Duration::hours(3);
        let run = engine.run_checks(&hospitals, &[], later, &mut store);
        assert_eq!(run.candidates.len(), 1);
        assert_eq!(run.inserted, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_condition_next_day_is_new() {
        let engine = AlertEngine::default();
        let hospitals = vec![HospitalNode::new(1, 43.0, -79.0).with_capacity(100, 10, 95)];
        let mut store = InMemoryAlertStore::new();
        engine.run_checks(&hospitals, &[], now(), &mut store);
        engine.run_checks(&hospitals, &[], now() + chrono::Duration::days(1), &mut store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_occupancy_bands() {
        let engine = AlertEngine::default();
        let hospitals = vec![
            HospitalNode::new(1, 0.0, 0.0).with_capacity(100, 0, 85),
            HospitalNode::new(2, 0.0, 0.0).with_capacity(100, 0, 50),
            HospitalNode::new(3, 0.0, 0.0).with_capacity(0, 0, 50),
        ];
        let alerts = engine.check_capacity_stress(&hospitals, &[], now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].hospital_id, Some(1));
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert!(alerts[0].message.contains("85%"));
    }

    #[test]
    fn test_band_boundaries_inclusive() {
        let engine = AlertEngine::default();
        let hospitals = vec![
            HospitalNode::new(1, 0.0, 0.0).with_capacity(100, 0, 90),
            HospitalNode::new(2, 0.0, 0.0).with_capacity(100, 0, 80),
            HospitalNode::new(3, 0.0, 0.0).with_capacity(100, 0, 79),
        ];
        let alerts = engine.check_capacity_stress(&hospitals, &[], now());
        let bands: Vec<_> = alerts.iter().map(|a| (a.hospital_id, a.severity)).collect();
        assert_eq!(
            bands,
            vec![(Some(1), Severity::Critical), (Some(2), Severity::Warning)]
        );
    }

    #[test]
    fn test_surge_independent_of_occupancy() {
        let engine = AlertEngine::default();
        let hospitals = vec![HospitalNode::new(1, 0.0, 0.0).with_capacity(50, 5, 10)];
        let obs = vec![
            DailyObservation::new(1, days_ago(1), 6),
            DailyObservation::new(1, days_ago(3), 5),
            // Outside the window
            DailyObservation::new(1, days_ago(30), 100),
        ];
        let alerts = engine.check_capacity_stress(&hospitals, &obs, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert!(alerts[0].message.starts_with("Surge Detected"));
    }

    #[test]
    fn test_velocity_doubling() {
        let engine = AlertEngine::default();
        let obs = vec![
            DailyObservation::new(1, days_ago(6), 4),
            DailyObservation::new(2, days_ago(6), 1),
            DailyObservation::new(1, days_ago(3), 8),
            DailyObservation::new(1, days_ago(0), 12),
        ];
        let alerts = engine.check_outbreak_velocity(&obs, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].hospital_id, None);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn test_velocity_below_floor_or_too_few_days() {
        let engine = AlertEngine::default();
        let small = vec![
            DailyObservation::new(1, days_ago(6), 1),
            DailyObservation::new(1, days_ago(3), 3),
            DailyObservation::new(1, days_ago(0), 9),
        ];
        assert!(engine.check_outbreak_velocity(&small, now()).is_empty());
        let two_days = vec![
            DailyObservation::new(1, days_ago(6), 1),
            DailyObservation::new(1, days_ago(0), 50),
        ];
        assert!(engine.check_outbreak_velocity(&two_days, now()).is_empty());
    }

    #[test]
    fn test_system_wide_dedup() {
        let engine = AlertEngine::default();
        let obs = vec![
            DailyObservation::new(1, days_ago(5), 2),
            DailyObservation::new(1, days_ago(2), 5),
            DailyObservation::new(1, days_ago(0), 20),
        ];
        let mut store = InMemoryAlertStore::new();
        engine.run_checks(&[], &obs, now(), &mut store);
        engine.run_checks(&[], &obs, now(), &mut store);
        assert_eq!(store.len(), 1);
        assert!(store.contains(None, &store.alerts()[0].message.clone(), now().date_naive()));
    }

    #[test]
    fn test_cluster_risk_uses_cache() {
        let engine = AlertEngine::default();
        let cache = SnapshotCache::with_ttl_secs(300);
        let obs = vec![
            DailyObservation::new(1, days_ago(1), 3),
            DailyObservation::new(2, days_ago(2), 4),
            DailyObservation::new(3, days_ago(1), 50),
        ];
        let partition = || Partition::from_labels(&[1, 2, 3], &[0, 0, 1]);

        let risk = engine.assess_cluster_risk(1, &cache, &obs, now(), partition);
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.cluster_id, Some(1));
        assert_eq!(risk.recent_cases, 7.0);

        // Fresh cache: the closure must not run
        let risk = engine.assess_cluster_risk(9, &cache, &obs, now(), || {
            panic!("cache should have been used")
        });
        assert_eq!(risk.level, RiskLevel::Unassigned);
    }

    #[test]
    fn test_cluster_risk_low() {
        let engine = AlertEngine::default();
        let cache = SnapshotCache::with_ttl_secs(300);
        let obs = vec![DailyObservation::new(1, days_ago(1), 2)];
        let risk = engine.assess_cluster_risk(1, &cache, &obs, now(), || {
            Partition::singletons(&[1, 2])
        });
        assert_eq!(risk.level, RiskLevel::Low);
        assert_eq!(risk.message, "Monitoring - Low Risk");
    }
}
