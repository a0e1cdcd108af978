use std::collections::BTreeMap;
use std::fs;

use chrono::{DateTime, Utc};
use outbreak_rs::{
    AlertEngine, AnalysisConfig, ClusterId, DailyObservation, HospitalId, HospitalNode,
    InMemoryAlertStore, Metric, OutbreakMiner, Relation, RiskLevel, Severity, SnapshotCache,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct Scenario {
    #[allow(dead_code)]
    description: String,
    hospitals: Vec<HospitalNode>,
    observations: Vec<DailyObservation>,
    expected: Expected,
}

#[derive(Deserialize)]
struct Expected {
    clusters: BTreeMap<ClusterId, Vec<HospitalId>>,
    edges: Vec<ExpectedEdge>,
    alerts: ExpectedAlerts,
    high_risk_hospital: HospitalId,
}

#[derive(Deserialize)]
struct ExpectedEdge {
    source_cluster: ClusterId,
    target_cluster: ClusterId,
    lag_days: usize,
}

#[derive(Deserialize)]
struct ExpectedAlerts {
    now: DateTime<Utc>,
    critical: Vec<HospitalId>,
    warning: Vec<HospitalId>,
}

fn load_scenario(filename: &str) -> Scenario {
    let path = format!("tests/fixtures/{filename}");
    let data = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Fixture not found: {path}"));
    serde_json::from_str(&data).unwrap()
}

#[test]
fn test_two_city_clusters() {
    let sc = load_scenario("two_city_wave.json");
    let miner = OutbreakMiner::new(sc.hospitals, &sc.observations);
    let analysis = miner.analyze(&AnalysisConfig::default());

    assert_eq!(analysis.clusters, sc.expected.clusters);
    assert!(analysis.partition.is_strict());
}

#[test]
fn test_two_city_spread_edge() {
    let sc = load_scenario("two_city_wave.json");
    let miner = OutbreakMiner::new(sc.hospitals, &sc.observations);
    let analysis = miner.analyze(&AnalysisConfig::default());

    assert_eq!(analysis.network.len(), sc.expected.edges.len());
    for (got, want) in analysis.network.iter().zip(&sc.expected.edges) {
        assert_eq!(got.source_cluster, want.source_cluster);
        assert_eq!(got.target_cluster, want.target_cluster);
        assert_eq!(got.lag_days, want.lag_days);
        assert_eq!(got.relation, Relation::Precedes);
        assert!(got.strength > 0.99, "strength = {}", got.strength);
    }
}

#[test]
fn test_distance_matrix_all_metrics() {
    let sc = load_scenario("two_city_wave.json");
    let miner = OutbreakMiner::new(sc.hospitals, &sc.observations);

    for metric in Metric::ALL {
        let dm = miner.distance_matrix(metric);
        assert_eq!(dm.len(), 4, "{metric}");
        assert!(dm.is_symmetric(), "{metric}");
        for i in 0..dm.len() {
            assert_eq!(dm.get(i, i), 0.0, "{metric}: diagonal");
            assert!(dm.row(i).iter().all(|d| d.is_finite() && *d >= 0.0), "{metric}");
        }
    }

    // Hospital 2 reports exactly twice hospital 1: identical after normalization
    let cor = miner.distance_matrix(Metric::Correlation);
    assert!(cor.get(0, 1) < 1e-6);
}

#[test]
fn test_two_city_forecasts() {
    let sc = load_scenario("two_city_wave.json");
    let last = sc.observations.iter().map(|o| o.date).max().unwrap();
    let miner = OutbreakMiner::new(sc.hospitals, &sc.observations);

    for id in [1, 2, 3, 4] {
        let fc = miner.forecast(id, 7);
        assert_eq!(fc.len(), 7, "hospital {id}");
        assert!(fc[0].date > last);
        assert!(fc.iter().all(|p| p.predicted_count >= 0.0));
        assert!(fc.windows(2).all(|w| w[1].date > w[0].date));
    }
}

#[test]
fn test_two_city_alerts() {
    let sc = load_scenario("two_city_wave.json");
    let engine = AlertEngine::default();
    let mut store = InMemoryAlertStore::new();
    let now = sc.expected.alerts.now;

    let run = engine.run_checks(&sc.hospitals, &sc.observations, now, &mut store);
    let ids = |sev: Severity| -> Vec<HospitalId> {
        run.candidates
            .iter()
            .filter(|a| a.severity == sev)
            .filter_map(|a| a.hospital_id)
            .collect()
    };
    assert_eq!(ids(Severity::Critical), sc.expected.alerts.critical);
    assert_eq!(ids(Severity::Warning), sc.expected.alerts.warning);
    assert_eq!(run.inserted, run.candidates.len());

    let again = engine.run_checks(&sc.hospitals, &sc.observations, now, &mut store);
    assert_eq!(again.inserted, 0);
}

#[test]
fn test_cluster_risk_from_cached_partition() {
    let sc = load_scenario("two_city_wave.json");
    let cfg = AnalysisConfig::default();
    let now = sc.expected.alerts.now;
    let miner = OutbreakMiner::new(sc.hospitals.clone(), &sc.observations);
    let cache = SnapshotCache::with_ttl_secs(cfg.cache_ttl_secs);
    let engine = AlertEngine::new(cfg.alerts.clone());

    let risk = engine.assess_cluster_risk(
        sc.expected.high_risk_hospital,
        &cache,
        &sc.observations,
        now,
        || miner.partition(&cfg),
    );
    assert_eq!(risk.level, RiskLevel::High);
    assert_eq!(risk.cluster_id, Some(2));
    assert!(cache.get_fresh(now).is_some());
}
