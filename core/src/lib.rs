//! ASSA: per-store retail risk scoring over transaction and
//! security-event tables.
//!
//! Pipeline: `store` (or `generator`) produces a `Dataset`;
//! `profile` and `scorer` derive per-store views from it;
//! `report` aggregates the scores.

pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod profile;
pub mod record;
pub mod report;
pub mod rng;
pub mod scorer;
pub mod store;
pub mod types;
