use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::IntegrityConfig;

pub const RATE_LIMIT_REASON: &str = "Rate Limit Exceeded (Too many reports from this source)";
pub const OUT_OF_REGION_REASON: &str = "Location Out of Expected Region";

/// Anonymous symptom report as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingReport {
    pub latitude: f64,
    pub longitude: f64,
    pub symptoms: String,
}

/// Accepted report as stored, with its trust score and hashed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityReport {
    pub latitude: f64,
    pub longitude: f64,
    pub symptoms: String,
    pub trust_score: f64,
    pub ip_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub trust_score: f64,
    pub reason: Option<String>,
}

impl ValidationOutcome {
    fn rejected(reason: &str) -> Self {
        Self {
            accepted: false,
            trust_score: 0.0,
            reason: Some(reason.to_string()),
        }
    }
}

/// Hex-encoded SHA-256 of a source identifier. Raw identifiers are never stored.
pub fn hash_source(source_identifier: &str) -> String {
    hex::encode(Sha256::digest(source_identifier.as_bytes()))
}

/// Storage seam for accepted reports.
pub trait ReportLog {
    /// Reports from `ip_hash` created at or after `since`.
    fn count_since(&self, ip_hash: &str, since: DateTime<Utc>) -> usize;
    fn record(&mut self, report: CommunityReport);
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryReportLog {
    reports: Vec<CommunityReport>,
}

impl InMemoryReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[CommunityReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl ReportLog for InMemoryReportLog {
    fn count_since(&self, ip_hash: &str, since: DateTime<Utc>) -> usize {
        self.reports
            .iter()
            .filter(|r| r.ip_hash == ip_hash && r.created_at >= since)
            .count()
    }

    fn record(&mut self, report: CommunityReport) {
        self.reports.push(report);
    }
}

/// Scores community reports against rate and location signals.
#[derive(Debug, Clone, Default)]
pub struct IntegrityEngine {
    pub cfg: IntegrityConfig,
}

impl IntegrityEngine {
    pub fn new(cfg: IntegrityConfig) -> Self {
        Self { cfg }
    }

    /// Start of the rolling window ending at `now`.
    ///
    /// A non-positive window counts only reports at `now`; a window reaching
    /// past the representable range counts every report.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_seconds(self.cfg.window_secs.max(0))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Score a report without recording it.
    ///
    /// The rolling-window count includes the report being scored. Above
    /// `reject_above` the report is rejected with trust 0. Otherwise trust
    /// starts at the baseline and each triggered signal can only lower it.
    pub fn validate(
        &self,
        report: &IncomingReport,
        source_identifier: &str,
        now: DateTime<Utc>,
        log: &impl ReportLog,
    ) -> ValidationOutcome {
        let ip_hash = hash_source(source_identifier);
        let since = self.window_start(now);
        let recent = log.count_since(&ip_hash, since) + 1;

        if recent > self.cfg.reject_above {
            tracing::warn!(source = %ip_hash, recent, "Report rejected by rate limit");
            return ValidationOutcome::rejected(RATE_LIMIT_REASON);
        }

        let mut trust = self.cfg.baseline_trust;
        let mut reason = None;

        if recent > self.cfg.suspicious_above {
            trust = trust.min(self.cfg.suspicious_trust);
        }

        if !self.cfg.region.contains(report.latitude, report.longitude) {
            trust = trust.min(self.cfg.out_of_region_trust);
            reason = Some(OUT_OF_REGION_REASON.to_string());
        }

        tracing::debug!(recent, trust, "Report scored");
        ValidationOutcome {
            accepted: true,
            trust_score: trust,
            reason,
        }
    }

    /// Validate and, if accepted, record the report in `log`.
    pub fn submit(
        &self,
        report: &IncomingReport,
        source_identifier: &str,
        now: DateTime<Utc>,
        log: &mut impl ReportLog,
    ) -> ValidationOutcome {
        let outcome = self.validate(report, source_identifier, now, log);
        if outcome.accepted {
            log.record(CommunityReport {
                latitude: report.latitude,
                longitude: report.longitude,
                symptoms: report.symptoms.clone(),
                trust_score: outcome.trust_score,
                ip_hash: hash_source(source_identifier),
                created_at: now,
            });
        }
        outcome
    }
}
