//! Input records: one row of the transactions table and one row of the
//! security-events table. Both are immutable once loaded.

use crate::types::{Hour, StoreId};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp formats accepted from the data source, tried in order.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Storage format for timestamps written back to the data source.
pub const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub store_id: StoreId,
    pub amount: f64,
    pub payment_method: String,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn hour(&self) -> Hour {
        self.timestamp.hour()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityEvent {
    pub event_id: String,
    pub store_id: StoreId,
    pub severity: Severity,
    /// Severity label exactly as supplied by the source, kept so an
    /// export writes back `low` and other non-scoring labels unchanged.
    pub severity_label: Option<String>,
    pub is_incident: bool,
    pub timestamp: NaiveDateTime,
}

/// Event severity. Parsing is case-sensitive; anything outside
/// `critical` / `high` / `medium` (including a missing value) is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Other,
}

impl Severity {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("critical") => Self::Critical,
            Some("high") => Self::High,
            Some("medium") => Self::Medium,
            _ => Self::Other,
        }
    }

    /// Canonical label; `None` for `Other`, which is stored as NULL.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Critical => Some("critical"),
            Self::High => Some("high"),
            Self::Medium => Some("medium"),
            Self::Other => None,
        }
    }
}

impl SecurityEvent {
    pub fn new(
        event_id: String,
        store_id: StoreId,
        severity_label: Option<String>,
        is_incident: bool,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            event_id,
            store_id,
            severity: Severity::parse(severity_label.as_deref()),
            severity_label,
            is_incident,
            timestamp,
        }
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        Self::parse(Some(raw.as_str()))
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.label().unwrap_or("other").to_string()
    }
}
