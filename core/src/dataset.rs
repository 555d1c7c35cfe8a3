//! The two input tables, held in memory, plus per-store grouping.
//!
//! RULE: Records are never mutated after a Dataset is built.
//! Profile builder, scorer and reporter all take `&Dataset`.

use crate::{
    record::{SecurityEvent, Transaction},
    types::StoreId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Why a store was left out of scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    NegativeAmount { transaction_id: String, amount: f64 },
    NonFiniteAmount { transaction_id: String },
    /// Amount column held something other than a number.
    InvalidAmount { transaction_id: String, raw: String },
    /// Incident flag column held something other than an integer.
    InvalidIncidentFlag { event_id: String, raw: String },
    /// Row carries no store id; reported under `UNATTRIBUTED_STORE`.
    MissingStoreId { table: &'static str, record_id: String },
    UnparseableTimestamp { table: &'static str, record_id: String, raw: String },
}

/// Store id used for failures on rows that name no store.
pub const UNATTRIBUTED_STORE: &str = "<unattributed>";

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeAmount { transaction_id, amount } => {
                write!(f, "transaction {transaction_id} has negative amount {amount}")
            }
            Self::NonFiniteAmount { transaction_id } => {
                write!(f, "transaction {transaction_id} has a non-finite amount")
            }
            Self::InvalidAmount { transaction_id, raw } => {
                write!(f, "transaction {transaction_id} has non-numeric amount '{raw}'")
            }
            Self::InvalidIncidentFlag { event_id, raw } => {
                write!(f, "security event {event_id} has non-integer incident flag '{raw}'")
            }
            Self::MissingStoreId { table, record_id } => {
                write!(f, "{table} row {record_id} has no store id")
            }
            Self::UnparseableTimestamp { table, record_id, raw } => {
                write!(f, "{table} row {record_id} has unparseable timestamp '{raw}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreFailure {
    pub store_id: StoreId,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    pub events: Vec<SecurityEvent>,
    /// Rows the loader could not turn into records.
    pub load_failures: Vec<StoreFailure>,
}

impl Dataset {
    pub fn new(transactions: Vec<Transaction>, events: Vec<SecurityEvent>) -> Self {
        Self {
            transactions,
            events,
            load_failures: Vec::new(),
        }
    }

    pub fn with_load_failures(mut self, failures: Vec<StoreFailure>) -> Self {
        self.load_failures = failures;
        self
    }

    /// Union of store ids present in either table, in id order.
    pub fn store_ids(&self) -> BTreeSet<&str> {
        self.transactions
            .iter()
            .map(|t| t.store_id.as_str())
            .chain(self.events.iter().map(|e| e.store_id.as_str()))
            .collect()
    }

    pub fn transactions_by_store(&self) -> BTreeMap<&str, Vec<&Transaction>> {
        let mut grouped: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for txn in &self.transactions {
            grouped.entry(txn.store_id.as_str()).or_default().push(txn);
        }
        grouped
    }

    pub fn events_by_store(&self) -> BTreeMap<&str, Vec<&SecurityEvent>> {
        let mut grouped: BTreeMap<&str, Vec<&SecurityEvent>> = BTreeMap::new();
        for event in &self.events {
            grouped.entry(event.store_id.as_str()).or_default().push(event);
        }
        grouped
    }

    /// Every per-store precondition violation: loader rejections plus
    /// amounts that are negative or not finite.
    pub fn store_failures(&self) -> Vec<StoreFailure> {
        let mut failures = self.load_failures.clone();
        for txn in &self.transactions {
            let reason = if !txn.amount.is_finite() {
                FailureReason::NonFiniteAmount {
                    transaction_id: txn.transaction_id.clone(),
                }
            } else if txn.amount < 0.0 {
                FailureReason::NegativeAmount {
                    transaction_id: txn.transaction_id.clone(),
                    amount: txn.amount,
                }
            } else {
                continue;
            };
            failures.push(StoreFailure {
                store_id: txn.store_id.clone(),
                reason,
            });
        }
        failures
    }
}
