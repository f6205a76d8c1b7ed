//! loghash: a single-threaded, append-only hash table from byte-string keys
//! to values.
//!
//! Internal Design:
//!
//! Summary
//! - Two arrays: an entry log holding `(key, value)` pairs densely in
//!   insertion order, and a bucket index of fixed size holding 1-based
//!   offsets into the log (0 = empty bucket).
//! - Lookups hash the key (djb2 by default), read the bucket's offset and
//!   probe the log from there. An empty bucket answers "absent" without
//!   touching the log.
//! - Inserts append to the log, growing it by a configurable factor (1.5x by
//!   default) when full. The bucket index never grows.
//!
//! Probing
//! - `Probe::LinearScan` records the first offset seen by each bucket and
//!   scans the log forward from it, stepping over entries of other buckets.
//!   Recording the first offset (rather than the latest) keeps older entries
//!   of a bucket reachable.
//! - `Probe::Chained` records the latest offset and links each entry to the
//!   previous one in its bucket.
//!
//! Constraints
//! - No removal. Callers tombstone entries (`Entry::tombstone`) or swap in a
//!   sentinel value; tombstoned slots stay in the log.
//! - No shrinking, no thread safety, byte-string keys only.
//! - Lookups return `EntryIndex` handles instead of references, so they
//!   survive log growth.
//!
//! Ownership
//! - The table owns its two arrays and the stored keys/values. Replaced values
//!   are returned from `insert_or_update`; `for_each_mut`, `iter_mut` and
//!   `into_entries` let callers move payloads out before `destroy`.
//!
//! Failure
//! - Allocation failures surface as `Error` values from `create` and
//!   `insert_or_update`; a failed insert leaves the table untouched.

pub mod config;
pub mod entry;
pub mod error;
pub mod hash;
pub mod table;
mod table_proptest;

// Public surface
pub use config::{Growth, Probe, TableConfig};
pub use entry::{Entry, EntryIndex};
pub use error::{Error, InsertError, Result};
pub use hash::{string_hash, BuildDjb2, Djb2Hasher};
pub use table::LogHashTable;
