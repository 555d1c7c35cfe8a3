//! Scoring calibration.
//!
//! The defaults are the thesis calibration values. A JSON file may
//! override any subset of them; omitted fields keep their default.

use crate::{
    error::{AssaError, AssaResult},
    types::Hour,
};
use serde::{Deserialize, Serialize};

/// Component ceilings; together they bound the total at 100.
pub const MAX_EXPOSURE: f64 = 40.0;
pub const MAX_VULNERABILITY: f64 = 30.0;
pub const MAX_CRITICALITY: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    pub volume_weight: f64,
    pub value_weight: f64,
    pub diversity_weight: f64,
    /// Reference ticket size (EUR) at which the value term saturates.
    pub reference_ticket: f64,
    /// Payment-method count at which the diversity term saturates.
    pub reference_payment_methods: usize,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            volume_weight: 20.0,
            value_weight: 10.0,
            diversity_weight: 10.0,
            reference_ticket: 50.0,
            reference_payment_methods: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityConfig {
    pub incident_weight: f64,
    pub after_hours_weight: f64,
    /// Transactions with hour < opening_hour are after-hours.
    pub opening_hour: Hour,
    /// Transactions with hour > closing_hour are after-hours.
    pub closing_hour: Hour,
}

impl Default for VulnerabilityConfig {
    fn default() -> Self {
        Self {
            incident_weight: 20.0,
            after_hours_weight: 10.0,
            opening_hour: 8,
            closing_hour: 21,
        }
    }
}

impl VulnerabilityConfig {
    pub fn is_after_hours(&self, hour: Hour) -> bool {
        hour < self.opening_hour || hour > self.closing_hour
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalityConfig {
    pub critical_weight: f64,
    pub high_weight: f64,
    pub medium_weight: f64,
    pub divisor: f64,
    pub cap: f64,
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            critical_weight: 100.0,
            high_weight: 50.0,
            medium_weight: 20.0,
            divisor: 5.0,
            cap: 30.0,
        }
    }
}

/// Lower bounds (inclusive) of each risk level above LOW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 30.0,
            high: 50.0,
            critical: 70.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub exposure: ExposureConfig,
    pub vulnerability: VulnerabilityConfig,
    pub criticality: CriticalityConfig,
    pub thresholds: RiskThresholds,
}

impl ScoringConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ScoringConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject calibrations that would divide by zero, leave the risk
    /// partition unordered, or let a component leave its range
    /// (exposure 0..=40, vulnerability 0..=30, criticality 0..=30).
    pub fn validate(&self) -> AssaResult<()> {
        let invalid = |reason: &str| -> AssaResult<()> {
            Err(AssaError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        let e = &self.exposure;
        let v = &self.vulnerability;
        let c = &self.criticality;
        let weights = [
            ("exposure.volume_weight", e.volume_weight),
            ("exposure.value_weight", e.value_weight),
            ("exposure.diversity_weight", e.diversity_weight),
            ("vulnerability.incident_weight", v.incident_weight),
            ("vulnerability.after_hours_weight", v.after_hours_weight),
            ("criticality.critical_weight", c.critical_weight),
            ("criticality.high_weight", c.high_weight),
            ("criticality.medium_weight", c.medium_weight),
        ];
        for (name, weight) in weights {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(AssaError::InvalidConfig {
                    reason: format!("{name} must be finite and >= 0, got {weight}"),
                });
            }
        }
        if e.volume_weight + e.value_weight + e.diversity_weight > MAX_EXPOSURE {
            return invalid("exposure weights must sum to at most 40");
        }
        if v.incident_weight + v.after_hours_weight > MAX_VULNERABILITY {
            return invalid("vulnerability weights must sum to at most 30");
        }
        if !(0.0..=MAX_CRITICALITY).contains(&c.cap) {
            return invalid("criticality.cap must be in 0..=30");
        }
        if !(e.reference_ticket.is_finite() && e.reference_ticket > 0.0) {
            return invalid("exposure.reference_ticket must be > 0");
        }
        if e.reference_payment_methods == 0 {
            return invalid("exposure.reference_payment_methods must be > 0");
        }
        if !(c.divisor.is_finite() && c.divisor > 0.0) {
            return invalid("criticality.divisor must be > 0");
        }
        if v.opening_hour > 23 || v.closing_hour > 23 {
            return invalid("after-hours window must use hours in 0..=23");
        }
        let t = &self.thresholds;
        if !(t.medium < t.high && t.high < t.critical) {
            return invalid("thresholds must satisfy medium < high < critical");
        }
        if !(t.medium >= 0.0 && t.critical <= 100.0) {
            return invalid("thresholds must lie within 0..=100");
        }
        Ok(())
    }
}
