//! ASSA Scorer — bounded composite risk score per store.
//!
//! total = exposure (0–40) + vulnerability (0–30) + criticality (0–30)
//!
//! RULES:
//!   - Only stores present in the transaction table are scored.
//!   - A store with no security events scores 0 vulnerability and 0 criticality.
//!   - Every ratio has an explicit zero-denominator branch.
//!   - A store with an invalid record is reported as a failure; the
//!     remaining stores are still scored.

use crate::{
    config::{CriticalityConfig, ExposureConfig, RiskThresholds, ScoringConfig, VulnerabilityConfig},
    dataset::{Dataset, StoreFailure},
    error::{AssaError, AssaResult},
    record::{SecurityEvent, Severity, Transaction},
    types::StoreId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Thresholds are inclusive lower bounds.
    pub fn classify(total: f64, thresholds: &RiskThresholds) -> Self {
        if total >= thresholds.critical {
            Self::Critical
        } else if total >= thresholds.high {
            Self::High
        } else if total >= thresholds.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssaScore {
    pub store_id: StoreId,
    pub exposure: f64,
    pub vulnerability: f64,
    pub criticality: f64,
    pub total: f64,
    pub risk_level: RiskLevel,
    pub incident_count: usize,
    pub event_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoringOutcome {
    pub scores: BTreeMap<StoreId, AssaScore>,
    pub failures: Vec<StoreFailure>,
}

// ── Sub-scores ───────────────────────────────────────────────────────────────

/// Exposure (0–40): volume, average ticket and payment-method diversity.
pub fn exposure(txns: &[&Transaction], max_tx_count: usize, cfg: &ExposureConfig) -> f64 {
    let count = txns.len();

    // max_tx_count == 0 means no store has transactions: volume is 0.
    let volume = if max_tx_count > 0 {
        count as f64 / max_tx_count as f64 * cfg.volume_weight
    } else {
        0.0
    };

    let value = if count > 0 {
        let mean = txns.iter().map(|t| t.amount).sum::<f64>() / count as f64;
        (mean / cfg.reference_ticket).min(1.0) * cfg.value_weight
    } else {
        0.0
    };

    let methods: BTreeSet<&str> = txns.iter().map(|t| t.payment_method.as_str()).collect();
    let diversity = (methods.len() as f64 / cfg.reference_payment_methods as f64).min(1.0)
        * cfg.diversity_weight;

    volume + value + diversity
}

/// Vulnerability (0–30): incident rate and share of after-hours trading.
pub fn vulnerability(
    txns: &[&Transaction],
    events: &[&SecurityEvent],
    cfg: &VulnerabilityConfig,
) -> f64 {
    if events.is_empty() {
        return 0.0;
    }

    let incidents = events.iter().filter(|e| e.is_incident).count();
    let incident_term = incidents as f64 / events.len() as f64 * cfg.incident_weight;

    let after_hours_term = if txns.is_empty() {
        0.0
    } else {
        let after_hours = txns.iter().filter(|t| cfg.is_after_hours(t.hour())).count();
        after_hours as f64 / txns.len() as f64 * cfg.after_hours_weight
    };

    incident_term + after_hours_term
}

/// Criticality (0–30): severity-weighted share of events, capped.
pub fn criticality(events: &[&SecurityEvent], cfg: &CriticalityConfig) -> f64 {
    if events.is_empty() {
        return 0.0;
    }

    let total = events.len() as f64;
    let weighted: f64 = [
        (Severity::Critical, cfg.critical_weight),
        (Severity::High, cfg.high_weight),
        (Severity::Medium, cfg.medium_weight),
    ]
    .iter()
    .map(|(severity, weight)| {
        let n = events.iter().filter(|e| e.severity == *severity).count();
        n as f64 / total * weight
    })
    .sum();

    (weighted / cfg.divisor).min(cfg.cap)
}

// ── Scorer ───────────────────────────────────────────────────────────────────

pub fn score_store(
    store_id: &str,
    txns: &[&Transaction],
    events: &[&SecurityEvent],
    max_tx_count: usize,
    config: &ScoringConfig,
) -> AssaScore {
    let exposure = exposure(txns, max_tx_count, &config.exposure);
    let vulnerability = vulnerability(txns, events, &config.vulnerability);
    let criticality = criticality(events, &config.criticality);
    let total = exposure + vulnerability + criticality;

    AssaScore {
        store_id: store_id.to_string(),
        exposure,
        vulnerability,
        criticality,
        total,
        risk_level: RiskLevel::classify(total, &config.thresholds),
        incident_count: events.iter().filter(|e| e.is_incident).count(),
        event_count: events.len(),
    }
}

/// Score every store in the transaction table.
///
/// Fails when the config is invalid or the transaction table is empty. Per-store
/// precondition violations land in `ScoringOutcome::failures`.
pub fn score_stores(dataset: &Dataset, config: &ScoringConfig) -> AssaResult<ScoringOutcome> {
    config.validate()?;
    if dataset.transactions.is_empty() {
        return Err(AssaError::MissingInput {
            table: "transactions",
        });
    }

    let txns_by_store = dataset.transactions_by_store();
    let events_by_store = dataset.events_by_store();
    let max_tx_count = txns_by_store.values().map(Vec::len).max().unwrap_or(0);

    let failures = dataset.store_failures();
    let failed: BTreeSet<&str> = failures.iter().map(|f| f.store_id.as_str()).collect();
    for failure in &failures {
        log::warn!("store={} not scored: {}", failure.store_id, failure.reason);
    }

    let mut scores = BTreeMap::new();
    for (store_id, txns) in &txns_by_store {
        if failed.contains(store_id) {
            continue;
        }
        let events = events_by_store.get(store_id).map(Vec::as_slice).unwrap_or(&[]);
        let score = score_store(store_id, txns, events, max_tx_count, config);

        log::debug!(
            "store={store_id} exposure={:.2} vulnerability={:.2} criticality={:.2} total={:.2} level={}",
            score.exposure,
            score.vulnerability,
            score.criticality,
            score.total,
            score.risk_level
        );
        scores.insert(store_id.to_string(), score);
    }

    log::info!(
        "Scored {} stores ({} failures, max tx count {max_tx_count})",
        scores.len(),
        failures.len()
    );

    Ok(ScoringOutcome { scores, failures })
}
