//! Store Profile Builder — descriptive, non-risk statistics per store.

use crate::{
    dataset::Dataset,
    record::Transaction,
    types::{Hour, StoreId},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreProfile {
    pub store_id: StoreId,
    pub transaction_count: usize,
    /// `None` when the store has no transactions.
    pub mean_amount: Option<f64>,
    pub total_revenue: f64,
    pub distinct_payment_methods: usize,
    /// Busiest hour of day; ties go to the lowest hour.
    /// `None` when the store has no transactions.
    pub peak_hour: Option<Hour>,
}

impl StoreProfile {
    pub fn from_transactions(store_id: &str, txns: &[&Transaction]) -> Self {
        let count = txns.len();
        let total_revenue: f64 = txns.iter().map(|t| t.amount).sum();
        let methods: BTreeSet<&str> = txns.iter().map(|t| t.payment_method.as_str()).collect();

        let mean_amount = if count > 0 {
            Some(total_revenue / count as f64)
        } else {
            None
        };

        Self {
            store_id: store_id.to_string(),
            transaction_count: count,
            mean_amount,
            total_revenue,
            distinct_payment_methods: methods.len(),
            peak_hour: peak_hour(txns),
        }
    }
}

/// Hour with the most transactions, lowest hour on ties.
pub fn peak_hour(txns: &[&Transaction]) -> Option<Hour> {
    if txns.is_empty() {
        return None;
    }
    let mut per_hour = [0usize; 24];
    for txn in txns {
        per_hour[txn.hour() as usize] += 1;
    }
    let mut best: Hour = 0;
    for hour in 1..24 {
        if per_hour[hour] > per_hour[best as usize] {
            best = hour as Hour;
        }
    }
    Some(best)
}

/// Profile every store in the dataset, including stores that only
/// appear in the security-event table.
pub fn build_profiles(dataset: &Dataset) -> BTreeMap<StoreId, StoreProfile> {
    let by_store = dataset.transactions_by_store();
    let profiles: BTreeMap<StoreId, StoreProfile> = dataset
        .store_ids()
        .into_iter()
        .map(|store_id| {
            let txns = by_store.get(store_id).map(Vec::as_slice).unwrap_or(&[]);
            (store_id.to_string(), StoreProfile::from_transactions(store_id, txns))
        })
        .collect();

    log::debug!("Built {} store profiles", profiles.len());
    profiles
}
