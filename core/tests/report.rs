//! Aggregate reporter tests.

use assa_core::{
    dataset::{FailureReason, StoreFailure},
    report::AggregateReport,
    scorer::{AssaScore, RiskLevel},
};
use std::collections::BTreeMap;

fn score(store: &str, total: f64, level: RiskLevel, incidents: usize) -> (String, AssaScore) {
    (
        store.to_string(),
        AssaScore {
            store_id: store.to_string(),
            exposure: total,
            vulnerability: 0.0,
            criticality: 0.0,
            total,
            risk_level: level,
            incident_count: incidents,
            event_count: incidents * 2,
        },
    )
}

#[test]
fn summary_statistics() {
    let scores: BTreeMap<_, _> = [
        score("a", 20.0, RiskLevel::Low, 1),
        score("b", 40.0, RiskLevel::Medium, 3),
        score("c", 60.0, RiskLevel::High, 5),
        score("d", 80.0, RiskLevel::Critical, 7),
    ]
    .into_iter()
    .collect();

    let report = AggregateReport::from_scores(&scores, Vec::new());
    assert_eq!(report.store_count, 4);

    let totals = report.totals.as_ref().unwrap();
    assert_eq!(totals.mean, 50.0);
    assert_eq!(totals.min, 20.0);
    assert_eq!(totals.max, 80.0);
    // Sample std dev of 20,40,60,80 = sqrt(2000/3)
    let expected_sd = (2000.0_f64 / 3.0).sqrt();
    assert!((totals.std_dev.unwrap() - expected_sd).abs() < 1e-9);

    for level in RiskLevel::ALL {
        assert_eq!(report.risk_distribution[&level], 1);
    }
    let r = report.incident_correlation.unwrap();
    assert!((r - 1.0).abs() < 1e-9, "expected perfect correlation, got {r}");
}

#[test]
fn distribution_lists_unused_levels() {
    let scores: BTreeMap<_, _> = [
        score("a", 31.0, RiskLevel::Medium, 1),
        score("b", 35.0, RiskLevel::Medium, 2),
    ]
    .into_iter()
    .collect();
    let report = AggregateReport::from_scores(&scores, Vec::new());
    assert_eq!(report.risk_distribution.len(), 4);
    assert_eq!(report.risk_distribution[&RiskLevel::Medium], 2);
    assert_eq!(report.risk_distribution[&RiskLevel::Critical], 0);
}

#[test]
fn constant_incident_counts_omit_correlation() {
    let scores: BTreeMap<_, _> = [
        score("a", 10.0, RiskLevel::Low, 4),
        score("b", 55.0, RiskLevel::High, 4),
        score("c", 75.0, RiskLevel::Critical, 4),
    ]
    .into_iter()
    .collect();
    let report = AggregateReport::from_scores(&scores, Vec::new());
    assert_eq!(report.incident_correlation, None);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["incident_correlation"].is_null());
}

#[test]
fn empty_scores_and_failures_pass_through() {
    let failures = vec![StoreFailure {
        store_id: "x".into(),
        reason: FailureReason::NonFiniteAmount {
            transaction_id: "t1".into(),
        },
    }];
    let report = AggregateReport::from_scores(&BTreeMap::new(), failures.clone());
    assert_eq!(report.store_count, 0);
    assert!(report.totals.is_none());
    assert_eq!(report.incident_correlation, None);
    assert_eq!(report.failures, failures);
}
