//! End-to-end run over the bundled two-city scenario.
//!
//! ```text
//! RUST_LOG=outbreak_rs=debug cargo run --example outbreak_pipeline
//! ```

use chrono::{TimeZone, Utc};
use outbreak_rs::config::SimulationConfig;
use outbreak_rs::{
    AlertEngine, AnalysisConfig, DailyObservation, HospitalNode, InMemoryAlertStore,
    InMemoryReportLog, IncomingReport, IntegrityEngine, OutbreakMiner, SirModel, SnapshotCache,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct Scenario {
    hospitals: Vec<HospitalNode>,
    observations: Vec<DailyObservation>,
}

fn main() -> outbreak_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("outbreak_rs=info")),
        )
        .init();

    let text = std::fs::read_to_string("tests/fixtures/two_city_wave.json")?;
    let scenario: Scenario = serde_json::from_str(&text)?;
    let cfg = AnalysisConfig::default();
    let now = Utc.with_ymd_and_hms(2024, 2, 9, 12, 0, 0).unwrap();

    let miner = OutbreakMiner::new(scenario.hospitals.clone(), &scenario.observations);
    let analysis = miner.analyze(&cfg);
    println!("Clusters:");
    for (id, members) in &analysis.clusters {
        println!("  {id}: {members:?}");
    }
    println!("Spread network:");
    for e in &analysis.network {
        println!(
            "  {} -> {} ({:?}, lag {} days, r = {:.3})",
            e.source_cluster, e.target_cluster, e.relation, e.lag_days, e.strength
        );
    }

    println!("Forecast for hospital 1:");
    for p in miner.forecast_configured(1, &cfg.forecast) {
        println!("  {}  {:.1}", p.date, p.predicted_count);
    }

    let alerts = AlertEngine::new(cfg.alerts.clone());
    let mut store = InMemoryAlertStore::new();
    let run = alerts.run_checks(&scenario.hospitals, &scenario.observations, now, &mut store);
    println!("Alerts ({} new):", run.inserted);
    for a in &run.candidates {
        println!("  [{:?}] {}", a.severity, a.message);
    }

    let cache = SnapshotCache::with_ttl_secs(cfg.cache_ttl_secs);
    for h in &scenario.hospitals {
        let risk = alerts.assess_cluster_risk(h.id, &cache, &scenario.observations, now, || {
            miner.partition(&cfg)
        });
        println!("  hospital {}: {}", h.id, risk.message);
    }

    let integrity = IntegrityEngine::new(cfg.integrity.clone());
    let mut log = InMemoryReportLog::new();
    let report = IncomingReport {
        latitude: 43.7,
        longitude: -79.4,
        symptoms: "fever, cough".to_string(),
    };
    for k in 0..6 {
        let at = now + chrono::Duration::minutes(k);
        let outcome = integrity.submit(&report, "203.0.113.7", at, &mut log);
        println!(
            "Report {}: accepted={} trust={} {}",
            k + 1,
            outcome.accepted,
            outcome.trust_score,
            outcome.reason.unwrap_or_default()
        );
    }

    let sir = SirModel::new(1_000.0, 0.0, 1_000_000.0, SimulationConfig::default())?;
    for factor in [0.0, 0.5, 1.0] {
        let peak = sir
            .project(180, factor)
            .into_iter()
            .max_by_key(|s| s.infected);
        if let Some(peak) = peak {
            println!(
                "Intervention {factor:.1}: peak {} infected on day {}",
                peak.infected, peak.day
            );
        }
    }

    Ok(())
}
