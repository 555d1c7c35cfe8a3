//! Deterministic random number generation for synthetic datasets.
//!
//! RULE: The generator never calls a platform RNG.
//! Every stream is derived from (master_seed, stream slot, store index),
//! so adding a store never changes the records of existing stores.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct DataRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl DataRng {
    pub fn new(master_seed: u64, stream: u64) -> Self {
        let derived_seed = master_seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Simplified Pareto sample with minimum `x_min` and shape `alpha`.
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }

    /// Index into `weights`, chosen proportionally. Weights must not all be 0.
    pub fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut roll = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                return i;
            }
            roll -= w;
        }
        weights.len() - 1
    }
}

/// All streams for one generated dataset.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_store(&self, slot: StreamSlot, store_index: u64) -> DataRng {
        let stream = ((slot as u64) << 32) | store_index;
        DataRng::new(self.master_seed, stream).with_name(slot.name())
    }
}

/// Stable stream assignments. Append only; reordering changes every stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    StoreTraits = 1,
    Transactions = 2,
    SecurityEvents = 3,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StoreTraits => "store_traits",
            Self::Transactions => "transactions",
            Self::SecurityEvents => "security_events",
        }
    }
}
