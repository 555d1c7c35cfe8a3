//! Synthetic retail dataset generator.
//!
//! Produces a deterministic transactions table and security-event table
//! for a set of stores. Each store draws a small set of traits
//! (traffic, ticket size, payment mix, after-hours share, event rate)
//! and then emits daily records from them.
//!
//! Same seed + same config = identical dataset, record for record.

use crate::{
    dataset::Dataset,
    error::AssaResult,
    record::{SecurityEvent, Transaction},
    rng::{DataRng, RngBank, StreamSlot},
    types::{Hour, StoreId},
};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::{Builder, Uuid};

// ── Constants ────────────────────────────────────────────────────────────────

pub const PAYMENT_METHODS: &[&str] = &[
    "card", "cash", "contactless", "mobile_wallet", "voucher", "bank_transfer",
];

/// Raw severity labels as a data source would supply them.
/// `None` is a missing severity.
const SEVERITY_LABELS: [Option<&str>; 5] =
    [Some("critical"), Some("high"), Some("medium"), Some("low"), None];
/// Relative incident likelihood per severity label above.
const INCIDENT_FACTOR: [f64; 5] = [2.0, 1.5, 1.0, 0.5, 0.2];

const MIN_TICKET: f64 = 5.0;
const MAX_TICKET: f64 = 800.0;

// ── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub store_count: usize,
    pub days: u64,
    pub start_date: NaiveDate,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            store_count: 12,
            days: 30,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

/// Per-store behaviour drawn once from the StoreTraits stream.
#[derive(Debug, Clone)]
struct StoreTraits {
    daily_txn_mean: f64,
    ticket_x_min: f64,
    ticket_alpha: f64,
    payment_methods: Vec<&'static str>,
    after_hours_share: f64,
    daily_event_rate: f64,
    incident_probability: f64,
    severity_weights: [f64; 5],
}

impl StoreTraits {
    fn draw(rng: &mut DataRng) -> Self {
        let method_count = 1 + rng.next_u64_below(PAYMENT_METHODS.len() as u64) as usize;
        let mut methods: Vec<&'static str> = PAYMENT_METHODS.to_vec();
        // Partial Fisher-Yates: first `method_count` slots are the pick.
        for i in 0..method_count {
            let j = i + rng.next_u64_below((methods.len() - i) as u64) as usize;
            methods.swap(i, j);
        }
        methods.truncate(method_count);

        Self {
            daily_txn_mean: 10.0 + rng.next_f64() * 70.0,
            ticket_x_min: 8.0 + rng.next_f64() * 30.0,
            ticket_alpha: 1.6 + rng.next_f64() * 1.2,
            payment_methods: methods,
            after_hours_share: rng.next_f64() * 0.10,
            daily_event_rate: rng.next_f64() * 1.5,
            incident_probability: 0.05 + rng.next_f64() * 0.30,
            severity_weights: [
                0.02 + rng.next_f64() * 0.10,
                0.05 + rng.next_f64() * 0.20,
                0.10 + rng.next_f64() * 0.30,
                0.30,
                0.05,
            ],
        }
    }
}

// ── Generation ───────────────────────────────────────────────────────────────

pub fn store_id(index: usize) -> StoreId {
    format!("store-{:03}", index + 1)
}

pub fn generate(config: &SyntheticConfig) -> AssaResult<Dataset> {
    let bank = RngBank::new(config.seed);
    let mut transactions = Vec::new();
    let mut events = Vec::new();

    for index in 0..config.store_count {
        let store = store_id(index);
        let traits = StoreTraits::draw(&mut bank.for_store(StreamSlot::StoreTraits, index as u64));

        let mut txn_rng = bank.for_store(StreamSlot::Transactions, index as u64);
        let mut event_rng = bank.for_store(StreamSlot::SecurityEvents, index as u64);
        let before = (transactions.len(), events.len());

        for day in 0..config.days {
            generate_day_transactions(&store, &traits, config, day, &mut txn_rng, &mut transactions)?;
            generate_day_events(&store, &traits, config, day, &mut event_rng, &mut events)?;
        }

        log::debug!(
            "{store}: {} txns, {} security events, methods={:?}",
            transactions.len() - before.0,
            events.len() - before.1,
            traits.payment_methods
        );
    }

    log::info!(
        "Generated {} transactions and {} security events for {} stores over {} days (seed {})",
        transactions.len(),
        events.len(),
        config.store_count,
        config.days,
        config.seed
    );

    Ok(Dataset::new(transactions, events))
}

fn generate_day_transactions(
    store: &str,
    traits: &StoreTraits,
    config: &SyntheticConfig,
    day: u64,
    rng: &mut DataRng,
    out: &mut Vec<Transaction>,
) -> AssaResult<()> {
    // Daily traffic jitters ±30% around the store's mean.
    let expected = traits.daily_txn_mean * (0.7 + rng.next_f64() * 0.6);
    let count = poisson_approx(expected, rng);

    for _ in 0..count {
        let hour = if rng.chance(traits.after_hours_share) {
            after_hours_hour(rng)
        } else {
            8 + rng.next_u64_below(14) as Hour // 08:00–21:59
        };
        let amount = rng.pareto(traits.ticket_x_min, traits.ticket_alpha).clamp(MIN_TICKET, MAX_TICKET);
        let method = traits.payment_methods[rng.next_u64_below(traits.payment_methods.len() as u64) as usize];

        out.push(Transaction {
            transaction_id: record_id(rng).to_string(),
            store_id: store.to_string(),
            amount: (amount * 100.0).round() / 100.0,
            payment_method: method.to_string(),
            timestamp: timestamp(config.start_date, day, hour, rng)?,
        });
    }
    Ok(())
}

fn generate_day_events(
    store: &str,
    traits: &StoreTraits,
    config: &SyntheticConfig,
    day: u64,
    rng: &mut DataRng,
    out: &mut Vec<SecurityEvent>,
) -> AssaResult<()> {
    let count = poisson_approx(traits.daily_event_rate, rng);

    for _ in 0..count {
        let idx = rng.weighted_index(&traits.severity_weights);
        let p_incident = (traits.incident_probability * INCIDENT_FACTOR[idx]).min(1.0);
        let hour = rng.next_u64_below(24) as Hour;

        let event_id = record_id(rng).to_string();
        let is_incident = rng.chance(p_incident);
        out.push(SecurityEvent::new(
            event_id,
            store.to_string(),
            SEVERITY_LABELS[idx].map(String::from),
            is_incident,
            timestamp(config.start_date, day, hour, rng)?,
        ));
    }
    Ok(())
}

/// floor(expected) certain draws, the fractional part probabilistic.
fn poisson_approx(expected: f64, rng: &mut DataRng) -> u64 {
    let certain = expected.floor() as u64;
    let extra = u64::from(rng.chance(expected.fract()));
    certain + extra
}

fn after_hours_hour(rng: &mut DataRng) -> Hour {
    // 00:00–07:59 or 22:00–23:59
    let slot = rng.next_u64_below(10) as Hour;
    if slot < 8 {
        slot
    } else {
        slot + 14
    }
}

fn record_id(rng: &mut DataRng) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&rng.next_u64().to_le_bytes());
    bytes[8..].copy_from_slice(&rng.next_u64().to_le_bytes());
    Builder::from_random_bytes(bytes).into_uuid()
}

fn timestamp(
    start: NaiveDate,
    day: u64,
    hour: Hour,
    rng: &mut DataRng,
) -> anyhow::Result<NaiveDateTime> {
    let second_of_day = hour * 3600 + rng.next_u64_below(3600) as u32;
    let date = start
        .checked_add_days(Days::new(day))
        .ok_or_else(|| anyhow::anyhow!("day {day} past the calendar range"))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(second_of_day, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid second of day {second_of_day}"))?;
    Ok(date.and_time(time))
}
