//! Table sizing and probing configuration.

use crate::error::{Error, Result};

/// Default bucket count for [`TableConfig::default`].
pub const DEFAULT_NUM_BUCKETS: usize = 64;
/// Default initial entry-log capacity for [`TableConfig::default`].
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Factor applied to the entry-log capacity whenever an append finds it full.
///
/// Expressed as a ratio so growth stays in integer arithmetic. The new
/// capacity is `capacity * numerator / denominator`, and always at least
/// `capacity + 1` so a zero or tiny capacity still makes progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Growth {
    pub numerator: usize,
    pub denominator: usize,
}

impl Growth {
    /// 1.5x, the classic scale factor.
    pub const ONE_AND_A_HALF: Growth = Growth {
        numerator: 3,
        denominator: 2,
    };
    pub const DOUBLE: Growth = Growth {
        numerator: 2,
        denominator: 1,
    };

    pub const fn new(numerator: usize, denominator: usize) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.denominator == 0 || self.numerator <= self.denominator {
            return Err(Error::InvalidGrowth {
                numerator: self.numerator,
                denominator: self.denominator,
            });
        }
        Ok(())
    }

    /// Capacity after one growth step from `capacity`.
    pub fn next_capacity(&self, capacity: usize) -> usize {
        let scaled = capacity.saturating_mul(self.numerator) / self.denominator;
        scaled.max(capacity.saturating_add(1))
    }
}

impl Default for Growth {
    fn default() -> Self {
        Growth::ONE_AND_A_HALF
    }
}

/// How a lookup walks from a bucket's recorded offset to the matching entry.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Probe {
    /// The bucket records the first entry ever appended through it; lookups
    /// scan the entry log forward from there. Collisions from other buckets
    /// that landed in between are stepped over.
    #[default]
    LinearScan,
    /// The bucket records the most recent entry appended through it, and each
    /// entry links to the previous one of its bucket. Lookups only visit
    /// entries of their own bucket.
    Chained,
}

/// Parameters fixed at table creation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableConfig {
    pub num_buckets: usize,
    pub initial_capacity: usize,
    pub growth: Growth,
    pub probe: Probe,
}

impl TableConfig {
    pub fn new(num_buckets: usize, initial_capacity: usize) -> Self {
        Self {
            num_buckets,
            initial_capacity,
            growth: Growth::default(),
            probe: Probe::default(),
        }
    }

    pub fn with_growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probe = probe;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            return Err(Error::ZeroBuckets);
        }
        self.growth.validate()
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_BUCKETS, DEFAULT_INITIAL_CAPACITY)
    }
}
