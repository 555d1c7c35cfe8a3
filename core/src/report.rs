//! Aggregate Reporter — summary statistics across scored stores.
//! Presentation is left to the caller.

use crate::{
    dataset::StoreFailure,
    scorer::{AssaScore, RiskLevel, ScoringOutcome},
    types::StoreId,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1). `None` for a single store.
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub store_count: usize,
    /// `None` when no store was scored.
    pub totals: Option<TotalStats>,
    /// Every level is present, with 0 for unused levels.
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    /// Pearson r between incident count and total. `None` when either
    /// series has zero variance or fewer than two stores were scored.
    pub incident_correlation: Option<f64>,
    pub failures: Vec<StoreFailure>,
}

impl AggregateReport {
    pub fn from_outcome(outcome: &ScoringOutcome) -> Self {
        Self::from_scores(&outcome.scores, outcome.failures.clone())
    }

    pub fn from_scores(scores: &BTreeMap<StoreId, AssaScore>, failures: Vec<StoreFailure>) -> Self {
        let totals: Vec<f64> = scores.values().map(|s| s.total).collect();
        let incidents: Vec<f64> = scores.values().map(|s| s.incident_count as f64).collect();

        let mut risk_distribution: BTreeMap<RiskLevel, usize> =
            RiskLevel::ALL.iter().map(|level| (*level, 0)).collect();
        for score in scores.values() {
            *risk_distribution.entry(score.risk_level).or_insert(0) += 1;
        }

        let incident_correlation = pearson(&incidents, &totals);
        if incident_correlation.is_none() && totals.len() > 1 {
            log::info!("Incident/score correlation undefined: zero-variance input");
        }

        Self {
            store_count: scores.len(),
            totals: total_stats(&totals),
            risk_distribution,
            incident_correlation,
            failures,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn total_stats(totals: &[f64]) -> Option<TotalStats> {
    if totals.is_empty() {
        return None;
    }
    let mean = mean(totals);
    let min = totals.iter().copied().fold(f64::INFINITY, f64::min);
    let max = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std_dev = if totals.len() > 1 {
        let ss: f64 = totals.iter().map(|t| (t - mean).powi(2)).sum();
        Some((ss / (totals.len() - 1) as f64).sqrt())
    } else {
        None
    };
    Some(TotalStats { mean, min, max, std_dev })
}

/// Pearson correlation coefficient; `None` for degenerate input.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let (mx, my) = (mean(xs), mean(ys));
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
