//! Error types for the `loghash` crate

use core::fmt;
use std::collections::TryReserveError;

/// Errors reported by [`crate::LogHashTable`].
///
/// A missing key is not an error; lookups return `Option`.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The table was configured with zero buckets.
    #[error("a hash table needs at least one bucket")]
    ZeroBuckets,

    /// The growth factor would not increase capacity.
    #[error("growth factor {numerator}/{denominator} must be greater than one")]
    InvalidGrowth {
        /// Numerator of the rejected factor.
        numerator: usize,
        /// Denominator of the rejected factor.
        denominator: usize,
    },

    /// The bucket index could not be allocated.
    #[error("failed to allocate bucket index of {num_buckets} buckets: {source}")]
    BucketIndexAlloc {
        /// Requested bucket count.
        num_buckets: usize,
        #[source]
        source: TryReserveError,
    },

    /// The initial entry log could not be allocated. Nothing stays allocated.
    #[error("failed to allocate entry log of {capacity} slots: {source}")]
    EntryLogAlloc {
        /// Requested initial capacity.
        capacity: usize,
        #[source]
        source: TryReserveError,
    },

    /// The entry log needed to grow on insert and could not.
    ///
    /// The table is left exactly as it was before the call.
    #[error("failed to grow entry log from {capacity} to {requested} slots: {source}")]
    Grow {
        /// Capacity before the failed attempt.
        capacity: usize,
        /// Capacity that was requested.
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

pub type Result<T> = core::result::Result<T, Error>;

/// A failed [`crate::LogHashTable::insert_or_update`].
///
/// Carries the key and value back to the caller untouched, so the insert can
/// be retried or the payload released.
#[derive(thiserror::Error)]
#[error("{source}")]
pub struct InsertError<V> {
    #[source]
    pub source: Error,
    pub key: Box<[u8]>,
    pub value: V,
}

impl<V> InsertError<V> {
    pub fn error(&self) -> &Error {
        &self.source
    }

    pub fn into_parts(self) -> (Box<[u8]>, V) {
        (self.key, self.value)
    }
}

impl<V> fmt::Debug for InsertError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("source", &self.source)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<V> From<InsertError<V>> for Error {
    fn from(err: InsertError<V>) -> Self {
        err.source
    }
}
