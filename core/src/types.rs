//! Shared primitive types used across the scoring pipeline.

/// A retail store identifier. Stores are not entities of their own;
/// the id is the grouping key shared by both input tables.
pub type StoreId = String;

/// Hour of day, 0..=23.
pub type Hour = u32;
