//! SQLite data loader.
//!
//! RULE: Only store.rs talks to the database.
//! Everything downstream works on the in-memory `Dataset`.

use crate::{
    dataset::{Dataset, FailureReason, StoreFailure, UNATTRIBUTED_STORE},
    error::{AssaError, AssaResult},
    record::{parse_timestamp, SecurityEvent, Transaction, TIMESTAMP_WRITE_FORMAT},
};
use rusqlite::{params, types::Value, Connection};

const TRANSACTION_TABLE: &str = "store_transaction";
const EVENT_TABLE: &str = "security_event";

pub struct DataStore {
    conn: Connection,
}

impl DataStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> AssaResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: readers never block the exporter.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AssaResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Wrap a connection the caller has already opened and populated.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create the input tables if they are not there yet.
    pub fn migrate(&self) -> AssaResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_tables.sql"))?;
        Ok(())
    }

    pub fn table_exists(&self, table: &str) -> AssaResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Writes ────────────────────────────────────────────────────

    pub fn insert_transaction(&self, txn: &Transaction) -> AssaResult<()> {
        self.conn.execute(
            "INSERT INTO store_transaction (transaction_id, store_id, amount, payment_method, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                txn.transaction_id,
                txn.store_id,
                txn.amount,
                txn.payment_method,
                txn.timestamp.format(TIMESTAMP_WRITE_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_security_event(&self, event: &SecurityEvent) -> AssaResult<()> {
        self.conn.execute(
            "INSERT INTO security_event (event_id, store_id, severity, is_incident, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.event_id,
                event.store_id,
                event.severity_label,
                event.is_incident as i32,
                event.timestamp.format(TIMESTAMP_WRITE_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// Write both tables in one SQLite transaction.
    pub fn save_dataset(&self, dataset: &Dataset) -> AssaResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for txn in &dataset.transactions {
            self.insert_transaction(txn)?;
        }
        for event in &dataset.events {
            self.insert_security_event(event)?;
        }
        tx.commit()?;
        log::info!(
            "Saved {} transactions and {} security events",
            dataset.transactions.len(),
            dataset.events.len()
        );
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────

    /// Load both tables. A missing table is an error; a row with a
    /// malformed value becomes a failure for its store and loading
    /// carries on with the remaining rows.
    pub fn load_dataset(&self) -> AssaResult<Dataset> {
        let mut failures = Vec::new();
        let transactions = self.load_transactions(&mut failures)?;
        let events = self.load_security_events(&mut failures)?;

        log::info!(
            "Loaded {} transactions, {} security events ({} rejected rows)",
            transactions.len(),
            events.len(),
            failures.len()
        );
        Ok(Dataset::new(transactions, events).with_load_failures(failures))
    }

    fn require_table(&self, table: &'static str) -> AssaResult<()> {
        if self.table_exists(table)? {
            Ok(())
        } else {
            Err(AssaError::MissingInput { table })
        }
    }

    fn load_transactions(&self, failures: &mut Vec<StoreFailure>) -> AssaResult<Vec<Transaction>> {
        self.require_table(TRANSACTION_TABLE)?;
        let mut stmt = self.conn.prepare(
            "SELECT transaction_id, store_id, amount, payment_method, occurred_at
             FROM store_transaction
             ORDER BY store_id, occurred_at, transaction_id",
        )?;
        // Columns are read untyped so one malformed row fails only its store.
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Value>(0)?,
                    row.get::<_, Value>(1)?,
                    row.get::<_, Value>(2)?,
                    row.get::<_, Value>(3)?,
                    row.get::<_, Value>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut transactions = Vec::with_capacity(rows.len());
        for (index, (id, store_id, amount, method, raw_ts)) in rows.into_iter().enumerate() {
            let transaction_id = as_text(&id).unwrap_or_else(|| format!("row {index}"));
            let Some(store_id) = as_text(&store_id) else {
                failures.push(StoreFailure {
                    store_id: UNATTRIBUTED_STORE.to_string(),
                    reason: FailureReason::MissingStoreId {
                        table: TRANSACTION_TABLE,
                        record_id: transaction_id,
                    },
                });
                continue;
            };
            let amount = match amount {
                Value::Real(a) => a,
                Value::Integer(a) => a as f64,
                other => {
                    failures.push(StoreFailure {
                        store_id,
                        reason: FailureReason::InvalidAmount {
                            transaction_id,
                            raw: describe(&other),
                        },
                    });
                    continue;
                }
            };
            let Some(timestamp) = as_text(&raw_ts).as_deref().and_then(parse_timestamp) else {
                failures.push(StoreFailure {
                    store_id,
                    reason: FailureReason::UnparseableTimestamp {
                        table: TRANSACTION_TABLE,
                        record_id: transaction_id,
                        raw: describe(&raw_ts),
                    },
                });
                continue;
            };

            transactions.push(Transaction {
                transaction_id,
                store_id,
                amount,
                // Payment method is free-form; a missing one is its own category.
                payment_method: as_text(&method).unwrap_or_default(),
                timestamp,
            });
        }
        Ok(transactions)
    }

    fn load_security_events(&self, failures: &mut Vec<StoreFailure>) -> AssaResult<Vec<SecurityEvent>> {
        self.require_table(EVENT_TABLE)?;
        let mut stmt = self.conn.prepare(
            "SELECT event_id, store_id, severity, is_incident, occurred_at
             FROM security_event
             ORDER BY store_id, occurred_at, event_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Value>(0)?,
                    row.get::<_, Value>(1)?,
                    row.get::<_, Value>(2)?,
                    row.get::<_, Value>(3)?,
                    row.get::<_, Value>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut events = Vec::with_capacity(rows.len());
        for (index, (id, store_id, severity, flag, raw_ts)) in rows.into_iter().enumerate() {
            let event_id = as_text(&id).unwrap_or_else(|| format!("row {index}"));
            let Some(store_id) = as_text(&store_id) else {
                failures.push(StoreFailure {
                    store_id: UNATTRIBUTED_STORE.to_string(),
                    reason: FailureReason::MissingStoreId {
                        table: EVENT_TABLE,
                        record_id: event_id,
                    },
                });
                continue;
            };
            let is_incident = match flag {
                Value::Integer(i) => i != 0,
                other => {
                    failures.push(StoreFailure {
                        store_id,
                        reason: FailureReason::InvalidIncidentFlag {
                            event_id,
                            raw: describe(&other),
                        },
                    });
                    continue;
                }
            };
            let Some(timestamp) = as_text(&raw_ts).as_deref().and_then(parse_timestamp) else {
                failures.push(StoreFailure {
                    store_id,
                    reason: FailureReason::UnparseableTimestamp {
                        table: EVENT_TABLE,
                        record_id: event_id,
                        raw: describe(&raw_ts),
                    },
                });
                continue;
            };

            events.push(SecurityEvent::new(
                event_id,
                store_id,
                as_text(&severity),
                is_incident,
                timestamp,
            ));
        }
        Ok(events)
    }

    // ── Summary helpers ───────────────────────────────────────────

    pub fn transaction_count(&self) -> AssaResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM store_transaction", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Text view of a cell; numbers are rendered, NULL and blobs are `None`.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Null | Value::Blob(_) => None,
    }
}

/// Cell rendered for failure messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Blob(b) => format!("<{} byte blob>", b.len()),
        other => as_text(other).unwrap_or_default(),
    }
}
