//! LogHashTable: fixed bucket index over an append-only entry log.

use crate::config::{Probe, TableConfig};
use crate::entry::{Entry, EntryIndex};
use crate::error::{Error, InsertError, Result};
use crate::hash::BuildDjb2;
use core::hash::{BuildHasher, Hasher};
use core::ops::ControlFlow;
use tracing::{debug, trace};

/// Hash table from byte-string keys to `V`.
///
/// Entries live in insertion order in a growable entry log. A bucket index of
/// fixed size, chosen at creation, maps `hash(key) % num_buckets` to a 1-based
/// offset into the log (0 for a bucket nothing was ever inserted through).
/// There is no removal; see [`Entry::tombstone`].
#[derive(Debug)]
pub struct LogHashTable<V, S = BuildDjb2> {
    hasher: S,
    config: TableConfig,
    capacity: usize,
    buckets: Vec<usize>,
    entries: Vec<Entry<V>>,
}

impl<V> LogHashTable<V> {
    /// Create a table with `num_buckets` buckets and room for
    /// `initial_capacity` entries before the first growth.
    pub fn create(num_buckets: usize, initial_capacity: usize) -> Result<Self> {
        Self::with_config(TableConfig::new(num_buckets, initial_capacity))
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, BuildDjb2)
    }

    /// Destroy a table that may not exist. `None` is a no-op.
    pub fn destroy_opt(table: Option<Self>) {
        if let Some(t) = table {
            t.destroy();
        }
    }
}

/// Iterator over live entries in insertion order.
pub struct Iter<'a, V> {
    it: core::iter::Enumerate<core::slice::Iter<'a, Entry<V>>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (EntryIndex, &'a [u8], &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for (i, e) in self.it.by_ref() {
            if let Some(k) = e.key() {
                return Some((EntryIndex::new(i), k, e.value()));
            }
        }
        None
    }
}

/// Iterator over live entries in insertion order, with mutable values.
pub struct IterMut<'a, V> {
    it: core::iter::Enumerate<core::slice::IterMut<'a, Entry<V>>>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (EntryIndex, &'a [u8], &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for (i, e) in self.it.by_ref() {
            let (key, value) = e.key_and_value_mut();
            if let Some(k) = key {
                return Some((EntryIndex::new(i), k, value));
            }
        }
        None
    }
}

/// Owning iterator over live `(key, value)` pairs in insertion order.
pub struct IntoEntries<V> {
    it: std::vec::IntoIter<Entry<V>>,
}

impl<V> Iterator for IntoEntries<V> {
    type Item = (Box<[u8]>, V);
    fn next(&mut self) -> Option<Self::Item> {
        for e in self.it.by_ref() {
            if let (Some(k), v) = e.into_parts() {
                return Some((k, v));
            }
        }
        None
    }
}

impl<V, S> LogHashTable<V, S>
where
    S: BuildHasher,
{
    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        config.validate()?;

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(config.num_buckets)
            .map_err(|source| Error::BucketIndexAlloc {
                num_buckets: config.num_buckets,
                source,
            })?;
        buckets.resize(config.num_buckets, 0);

        // On failure `buckets` is dropped here, so nothing stays allocated.
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(config.initial_capacity)
            .map_err(|source| Error::EntryLogAlloc {
                capacity: config.initial_capacity,
                source,
            })?;

        debug!(
            num_buckets = config.num_buckets,
            capacity = config.initial_capacity,
            probe = ?config.probe,
            "created hash table"
        );

        Ok(Self {
            hasher,
            capacity: config.initial_capacity,
            config,
            buckets,
            entries,
        })
    }

    fn make_hash(&self, key: &[u8]) -> u64 {
        let mut h = self.hasher.build_hasher();
        h.write(key);
        h.finish()
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Number of entry-log slots in use, tombstones included. Never decreases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that are not tombstoned. Walks the whole log.
    pub fn count_live(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_tombstone()).count()
    }

    /// Entry-log slots available before the next growth.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Entry-log position recorded for `bucket`, or `None` if the bucket is
    /// empty or out of range.
    pub fn bucket_offset(&self, bucket: usize) -> Option<EntryIndex> {
        match self.buckets.get(bucket) {
            Some(&offset) if offset != 0 => Some(EntryIndex::new(offset - 1)),
            _ => None,
        }
    }

    /// Bucket that `key` hashes to.
    pub fn bucket_for<Q>(&self, key: &Q) -> usize
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.bucket_of(self.make_hash(key.as_ref()))
    }

    /// Find the entry holding `key`.
    ///
    /// The returned index stays meaningful until the table is dropped, but the
    /// entry it names can be tombstoned by the caller in the meantime.
    pub fn lookup<Q>(&self, key: &Q) -> Option<EntryIndex>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        self.lookup_hashed(key, self.make_hash(key))
            .map(EntryIndex::new)
    }

    fn lookup_hashed(&self, key: &[u8], hash: u64) -> Option<usize> {
        let (found, probe_len) = self.probe(key, hash);
        if probe_len > 1 {
            trace!(
                probe_len,
                hit = found.is_some(),
                probe = ?self.config.probe,
                "multi-step probe"
            );
        }
        found
    }

    /// Position of `key` in the entry log, and how many entries were compared
    /// to decide.
    fn probe(&self, key: &[u8], hash: u64) -> (Option<usize>, usize) {
        let offset = self.buckets[self.bucket_of(hash)];
        if offset == 0 {
            // Nothing was ever inserted through this bucket.
            return (None, 0);
        }
        match self.config.probe {
            Probe::LinearScan => {
                let tail = &self.entries[offset - 1..];
                match tail.iter().position(|e| e.matches(key)) {
                    Some(steps) => (Some(offset - 1 + steps), steps + 1),
                    None => (None, tail.len()),
                }
            }
            Probe::Chained => {
                let mut at = offset;
                let mut visited = 0usize;
                while at != 0 {
                    let e = &self.entries[at - 1];
                    visited += 1;
                    if e.matches(key) {
                        return (Some(at - 1), visited);
                    }
                    at = e.next;
                }
                (None, visited)
            }
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.lookup(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.lookup(key).map(|i| self.entries[i.get()].value())
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let i = self.lookup(key)?;
        Some(self.entries[i.get()].value_mut())
    }

    pub fn entry(&self, index: EntryIndex) -> Option<&Entry<V>> {
        self.entries.get(index.get())
    }

    pub fn entry_mut(&mut self, index: EntryIndex) -> Option<&mut Entry<V>> {
        self.entries.get_mut(index.get())
    }

    /// Tombstone the entry at `index`, returning its key if it was live.
    pub fn tombstone(&mut self, index: EntryIndex) -> Option<Box<[u8]>> {
        self.entries.get_mut(index.get())?.tombstone()
    }

    /// Insert `key`, or overwrite its value if already present.
    ///
    /// Returns the previous value on update; the passed key is dropped and the
    /// stored one kept. On append the entry log may grow; if that fails the
    /// table is unchanged and an [`InsertError`] wrapping [`Error::Grow`]
    /// hands `key` and `value` back.
    pub fn insert_or_update<K>(
        &mut self,
        key: K,
        value: V,
    ) -> core::result::Result<Option<V>, InsertError<V>>
    where
        K: Into<Vec<u8>>,
    {
        let key: Vec<u8> = key.into();
        let hash = self.make_hash(&key);
        if let Some(i) = self.lookup_hashed(&key, hash) {
            return Ok(Some(self.entries[i].replace_value(value)));
        }

        if let Err(source) = self.reserve_one() {
            return Err(InsertError {
                source,
                key: key.into_boxed_slice(),
                value,
            });
        }

        let bucket = self.bucket_of(hash);
        let offset = self.entries.len() + 1;
        let next = match self.config.probe {
            Probe::LinearScan => 0,
            Probe::Chained => self.buckets[bucket],
        };
        self.entries
            .push(Entry::new(key.into_boxed_slice(), value, next));
        match self.config.probe {
            // Keep the smallest offset so every later entry of the bucket is
            // ahead of it in the log.
            Probe::LinearScan => {
                if self.buckets[bucket] == 0 {
                    self.buckets[bucket] = offset;
                }
            }
            Probe::Chained => self.buckets[bucket] = offset,
        }
        Ok(None)
    }

    fn reserve_one(&mut self) -> Result<()> {
        if self.entries.len() < self.capacity {
            return Ok(());
        }
        let requested = self.config.growth.next_capacity(self.capacity);
        self.entries
            .try_reserve_exact(requested - self.entries.len())
            .map_err(|source| Error::Grow {
                capacity: self.capacity,
                requested,
                source,
            })?;
        debug!(
            from = self.capacity,
            to = requested,
            slots_used = self.entries.len(),
            "grew entry log"
        );
        self.capacity = requested;
        Ok(())
    }

    /// Visit live entries in insertion order until `visit` breaks.
    ///
    /// Returns the number of entries visited, not counting the one that broke.
    pub fn for_each<F>(&self, mut visit: F) -> usize
    where
        F: FnMut(EntryIndex, &Entry<V>) -> ControlFlow<()>,
    {
        let mut visited = 0;
        for (i, e) in self.entries.iter().enumerate() {
            if e.is_tombstone() {
                continue;
            }
            if visit(EntryIndex::new(i), e).is_break() {
                break;
            }
            visited += 1;
        }
        visited
    }

    /// Like [`for_each`](Self::for_each), with mutable access to each entry.
    ///
    /// This is the place to move payloads out or tombstone entries before
    /// destroying the table.
    pub fn for_each_mut<F>(&mut self, mut visit: F) -> usize
    where
        F: FnMut(EntryIndex, &mut Entry<V>) -> ControlFlow<()>,
    {
        let mut visited = 0;
        for (i, e) in self.entries.iter_mut().enumerate() {
            if e.is_tombstone() {
                continue;
            }
            if visit(EntryIndex::new(i), e).is_break() {
                break;
            }
            visited += 1;
        }
        visited
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.entries.iter().enumerate(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            it: self.entries.iter_mut().enumerate(),
        }
    }

    /// Consume the table, yielding owned live `(key, value)` pairs.
    pub fn into_entries(self) -> IntoEntries<V> {
        IntoEntries {
            it: self.entries.into_iter(),
        }
    }

    /// Release the bucket index and entry log.
    ///
    /// Values still stored are dropped along with the log.
    pub fn destroy(self) {
        debug!(
            slots_used = self.entries.len(),
            capacity = self.capacity,
            "destroying hash table"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Growth;
    use crate::hash::string_hash;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // force all keys into the same bucket
    }

    fn letters() -> impl Iterator<Item = String> {
        (b'A'..=b'J').map(|c| (c as char).to_string())
    }

    /// Invariant: with 5 buckets and capacity 5, inserting "A".."J" grows the
    /// log and every key stays reachable, for both probe strategies.
    #[test]
    fn ten_keys_survive_growth() {
        for probe in [Probe::LinearScan, Probe::Chained] {
            let mut t = LogHashTable::with_config(TableConfig::new(5, 5).with_probe(probe)).unwrap();
            for (i, k) in letters().enumerate() {
                assert_eq!(t.insert_or_update(k, i).unwrap(), None);
            }
            assert_eq!(t.len(), 10);
            assert!(t.capacity() > 5);
            assert!(t.capacity() >= t.len());
            for (i, k) in letters().enumerate() {
                assert_eq!(t.get(&k), Some(&i), "{probe:?} lost {k}");
            }
            assert!(t.lookup("nonexistent").is_none());
        }
    }

    /// Invariant: growth follows the configured factor (5 -> 7 -> 10 at 1.5x).
    #[test]
    fn growth_uses_scale_factor() {
        let mut t = LogHashTable::create(5, 5).unwrap();
        for (i, k) in letters().take(5).enumerate() {
            t.insert_or_update(k, i).unwrap();
        }
        assert_eq!(t.capacity(), 5);
        t.insert_or_update("F", 5).unwrap();
        assert_eq!(t.capacity(), 7);
        t.insert_or_update("G", 6).unwrap();
        t.insert_or_update("H", 7).unwrap();
        assert_eq!(t.capacity(), 10);
    }

    /// Invariant: "A" and "F" share bucket 3 of 5 under djb2. Linear scan
    /// keeps the first offset, chaining records the latest; both find "A".
    #[test]
    fn shared_bucket_offsets() {
        let mut scan = LogHashTable::create(5, 5).unwrap();
        let mut chain =
            LogHashTable::with_config(TableConfig::new(5, 5).with_probe(Probe::Chained)).unwrap();
        for (i, k) in letters().enumerate() {
            scan.insert_or_update(k.clone(), i).unwrap();
            chain.insert_or_update(k, i).unwrap();
        }
        assert_eq!(scan.bucket_for("A"), 3);
        assert_eq!(scan.bucket_for("F"), 3);
        assert_eq!(scan.bucket_offset(3), Some(EntryIndex::new(0)));
        assert_eq!(chain.bucket_offset(3), Some(EntryIndex::new(5)));
        assert_eq!(scan.get("A"), Some(&0));
        assert_eq!(chain.get("A"), Some(&0));
        assert_eq!(scan.get("F"), Some(&5));
        assert_eq!(chain.get("F"), Some(&5));
    }

    /// Invariant: updating a key replaces the value in place, returns the old
    /// one and does not append.
    #[test]
    fn update_returns_previous_value() {
        let mut t = LogHashTable::create(5, 5).unwrap();
        for k in letters() {
            t.insert_or_update(k.clone(), k).unwrap();
        }
        let before = t.len();
        let old = t.insert_or_update("J", "?".to_string()).unwrap();
        assert_eq!(old.as_deref(), Some("J"));
        assert_eq!(t.len(), before);
        assert_eq!(t.get("J").map(String::as_str), Some("?"));
    }

    /// Invariant: probe length counts compared entries on hits and misses.
    /// "K" shares bucket 3 with "A" and "F" but was never inserted.
    #[test]
    fn probe_length_on_hit_and_miss() {
        let mut scan = LogHashTable::create(5, 5).unwrap();
        let mut chain =
            LogHashTable::with_config(TableConfig::new(5, 5).with_probe(Probe::Chained)).unwrap();
        assert_eq!(scan.probe(b"A", string_hash(b"A")), (None, 0));
        for (i, k) in letters().enumerate() {
            scan.insert_or_update(k.clone(), i).unwrap();
            chain.insert_or_update(k, i).unwrap();
        }
        let h = |k: &[u8]| string_hash(k);
        assert_eq!(scan.bucket_for("K"), 3);

        // Linear scan from "A" (slot 0) runs to the end of the log on a miss.
        assert_eq!(scan.probe(b"A", h(b"A")), (Some(0), 1));
        assert_eq!(scan.probe(b"F", h(b"F")), (Some(5), 6));
        assert_eq!(scan.probe(b"K", h(b"K")), (None, 10));

        // The chain for bucket 3 is F -> A.
        assert_eq!(chain.probe(b"F", h(b"F")), (Some(5), 1));
        assert_eq!(chain.probe(b"A", h(b"A")), (Some(0), 2));
        assert_eq!(chain.probe(b"K", h(b"K")), (None, 2));

        assert!(scan.lookup("K").is_none());
        assert!(chain.lookup("K").is_none());
    }

    /// Invariant: an empty bucket short-circuits lookup.
    #[test]
    fn empty_bucket_is_not_found() {
        let mut t = LogHashTable::create(5, 5).unwrap();
        t.insert_or_update("A", 1).unwrap(); // bucket 3
        let other = (b'A'..=b'Z')
            .map(|c| [c])
            .find(|k| t.bucket_for(k) != 3)
            .unwrap();
        assert_eq!(t.bucket_offset(t.bucket_for(&other)), None);
        assert!(t.lookup(&other).is_none());
    }

    /// Invariant: under total collision every key resolves by equality.
    #[test]
    fn collision_handling_with_const_hasher() {
        for probe in [Probe::LinearScan, Probe::Chained] {
            let mut t: LogHashTable<i32, ConstBuildHasher> = LogHashTable::with_config_and_hasher(
                TableConfig::new(8, 2).with_probe(probe),
                ConstBuildHasher,
            )
            .unwrap();
            for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
                t.insert_or_update(*k, i as i32).unwrap();
            }
            assert_eq!(t.get("a"), Some(&0));
            assert_eq!(t.get("d"), Some(&3));
            assert!(t.get("e").is_none());
            assert_eq!(t.num_buckets(), 8);
        }
    }

    /// Invariant: keys are compared as whole byte strings, not prefixes.
    #[test]
    fn prefix_keys_are_distinct() {
        let mut t: LogHashTable<i32, ConstBuildHasher> =
            LogHashTable::with_config_and_hasher(TableConfig::new(1, 1), ConstBuildHasher).unwrap();
        t.insert_or_update("ab", 1).unwrap();
        t.insert_or_update("a", 2).unwrap();
        t.insert_or_update("", 3).unwrap();
        t.insert_or_update(&b"a\0"[..], 4).unwrap();
        assert_eq!(t.get("ab"), Some(&1));
        assert_eq!(t.get("a"), Some(&2));
        assert_eq!(t.get(""), Some(&3));
        assert_eq!(t.get(b"a\0"), Some(&4));
        assert_eq!(t.len(), 4);
    }

    /// Invariant: a failed growth leaves the table unchanged.
    #[test]
    fn failed_growth_is_atomic() {
        let growth = Growth::new(usize::MAX, 1);
        let mut t = LogHashTable::with_config(TableConfig::new(4, 1).with_growth(growth)).unwrap();
        t.insert_or_update("first", 1u64).unwrap();
        match t.insert_or_update("second", 2) {
            Err(InsertError {
                source:
                    Error::Grow {
                        capacity: 1,
                        requested,
                        ..
                    },
                key,
                value,
            }) => {
                assert_eq!(requested, usize::MAX);
                assert_eq!(&*key, b"second");
                assert_eq!(value, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(t.len(), 1);
        assert_eq!(t.capacity(), 1);
        assert!(t.lookup("second").is_none());
        assert_eq!(t.iter().count(), 1);
        // Updates never need room.
        assert_eq!(t.insert_or_update("first", 10).unwrap(), Some(1));
    }

    /// Invariant: a failed growth hands the value back without dropping it,
    /// so the caller can retry or release it.
    #[test]
    fn failed_growth_returns_value_intact() {
        let drops = Rc::new(Cell::new(0));
        struct Payload(Rc<Cell<usize>>, u32);
        impl Drop for Payload {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let growth = Growth::new(usize::MAX, 1);
        let mut t = LogHashTable::with_config(TableConfig::new(4, 1).with_growth(growth)).unwrap();
        t.insert_or_update("first", Payload(drops.clone(), 1)).unwrap();
        let err = match t.insert_or_update("second", Payload(drops.clone(), 2)) {
            Err(err) => err,
            Ok(_) => panic!("growth to usize::MAX slots must fail"),
        };
        assert_eq!(drops.get(), 0, "value dropped on failed growth");
        assert!(matches!(err.error(), Error::Grow { .. }));
        assert!(err.to_string().contains("failed to grow entry log"));

        let (key, value) = err.into_parts();
        assert_eq!(&*key, b"second");
        assert_eq!(value.1, 2);
        assert_eq!(drops.get(), 0);

        // The returned pair can be retried as-is.
        let as_error: Error = match t.insert_or_update(key, value) {
            Err(err) => err.into(),
            Ok(_) => panic!("retry must fail the same way"),
        };
        assert!(matches!(as_error, Error::Grow { .. }));
        assert_eq!(drops.get(), 1);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn create_rejects_bad_parameters() {
        assert!(matches!(
            LogHashTable::<()>::create(0, 4),
            Err(Error::ZeroBuckets)
        ));
        assert!(matches!(
            LogHashTable::<()>::with_config(TableConfig::new(4, 4).with_growth(Growth::new(2, 2))),
            Err(Error::InvalidGrowth { .. })
        ));
        assert!(matches!(
            LogHashTable::<u64>::create(usize::MAX, 1),
            Err(Error::BucketIndexAlloc { .. })
        ));
        assert!(matches!(
            LogHashTable::<u64>::create(1, usize::MAX),
            Err(Error::EntryLogAlloc { .. })
        ));
    }

    /// Invariant: a zero initial capacity grows on the first insert.
    #[test]
    fn zero_initial_capacity_grows() {
        let mut t = LogHashTable::create(3, 0).unwrap();
        assert_eq!(t.capacity(), 0);
        t.insert_or_update("k", ()).unwrap();
        assert_eq!(t.capacity(), 1);
        assert!(t.contains_key("k"));
    }

    /// Invariant: for_each visits in insertion order and stops before the
    /// entry that breaks, which is not counted.
    #[test]
    fn for_each_order_and_early_stop() {
        let mut t = LogHashTable::create(5, 5).unwrap();
        for (i, k) in letters().enumerate() {
            t.insert_or_update(k, i).unwrap();
        }
        let mut seen = Vec::new();
        let n = t.for_each(|_, e| {
            seen.push(*e.value());
            ControlFlow::Continue(())
        });
        assert_eq!(n, 10);
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        let mut calls = 0;
        let n = t.for_each(|_, _| {
            calls += 1;
            if calls == 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(calls, 4);
        assert_eq!(n, 3);
    }

    /// Invariant: every visited entry is the one lookup finds for its key.
    #[test]
    fn for_each_entries_match_lookup() {
        let mut t = LogHashTable::create(5, 5).unwrap();
        for (i, k) in letters().enumerate() {
            t.insert_or_update(k, i).unwrap();
        }
        let n = t.for_each(|idx, e| {
            assert_eq!(t.lookup(e.key().unwrap()), Some(idx));
            ControlFlow::Continue(())
        });
        assert_eq!(n, 10);
    }

    /// Invariant: tombstones are skipped by iteration and lookup but keep
    /// their slot; reinserting the key appends a new entry.
    #[test]
    fn tombstones() {
        let mut t = LogHashTable::create(5, 5).unwrap();
        for (i, k) in letters().enumerate() {
            t.insert_or_update(k, i).unwrap();
        }
        let c = t.lookup("C").unwrap();
        assert_eq!(t.tombstone(c).as_deref(), Some(&b"C"[..]));
        assert!(t.tombstone(c).is_none());
        assert!(c.key(&t).is_none());
        assert_eq!(c.value(&t), Some(&2));

        assert!(t.lookup("C").is_none());
        assert_eq!(t.len(), 10);
        assert_eq!(t.count_live(), 9);
        assert_eq!(t.for_each(|_, _| ControlFlow::Continue(())), 9);
        assert_eq!(t.iter().count(), 9);

        assert_eq!(t.insert_or_update("C", 20).unwrap(), None);
        assert_eq!(t.len(), 11);
        assert_eq!(t.get("C"), Some(&20));
    }

    /// Invariant: payloads can be moved out through for_each_mut before the
    /// table is destroyed, and nothing else drops them.
    #[test]
    fn release_payloads_before_destroy() {
        let drops = Rc::new(Cell::new(0));
        struct Payload(Rc<Cell<usize>>);
        impl Drop for Payload {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let mut t = LogHashTable::create(5, 5).unwrap();
        for k in letters() {
            t.insert_or_update(k, Some(Payload(drops.clone()))).unwrap();
        }
        let mut released = Vec::new();
        let n = t.for_each_mut(|_, e| {
            released.extend(e.value_mut().take());
            e.tombstone();
            ControlFlow::Continue(())
        });
        assert_eq!(n, 10);
        assert_eq!(t.count_live(), 0);
        t.destroy();
        assert_eq!(drops.get(), 0);
        drop(released);
        assert_eq!(drops.get(), 10);
    }

    #[test]
    fn destroy_absent_table_is_noop() {
        LogHashTable::<u8>::destroy_opt(None);
        LogHashTable::destroy_opt(Some(LogHashTable::<u8>::create(1, 1).unwrap()));
    }

    /// Invariant: a table re-created with the same parameters carries no
    /// residual state.
    #[test]
    fn recreate_has_no_residual_state() {
        let build = || {
            let mut t = LogHashTable::create(5, 5).unwrap();
            for (i, k) in letters().enumerate() {
                t.insert_or_update(k, i).unwrap();
            }
            t
        };
        let first = build();
        let snapshot: Vec<_> = first.iter().map(|(i, k, v)| (i, k.to_vec(), *v)).collect();
        first.destroy();

        let fresh = LogHashTable::<usize>::create(5, 5).unwrap();
        assert!(fresh.is_empty());
        assert!(fresh.lookup("A").is_none());
        assert_eq!((0..5).filter_map(|b| fresh.bucket_offset(b)).count(), 0);

        let second = build();
        let again: Vec<_> = second.iter().map(|(i, k, v)| (i, k.to_vec(), *v)).collect();
        assert_eq!(snapshot, again);
        assert_eq!(second.capacity(), 10);
    }

    #[test]
    fn handle_accessors_and_iter_mut() {
        let mut t = LogHashTable::create(4, 2).unwrap();
        let k1 = {
            t.insert_or_update("k1", 10).unwrap();
            t.lookup("k1").unwrap()
        };
        t.insert_or_update("k2", 20).unwrap();
        t.insert_or_update("k3", 30).unwrap(); // grows; k1 stays valid
        assert_eq!(k1.key(&t), Some(&b"k1"[..]));
        *k1.value_mut(&mut t).unwrap() += 5;
        assert_eq!(t.get("k1"), Some(&15));

        for (_, _, v) in t.iter_mut() {
            *v *= 2;
        }
        *t.get_mut("k3").unwrap() += 1;
        let pairs: Vec<_> = t.into_entries().collect();
        assert_eq!(
            pairs,
            vec![
                (b"k1".to_vec().into_boxed_slice(), 30),
                (b"k2".to_vec().into_boxed_slice(), 40),
                (b"k3".to_vec().into_boxed_slice(), 61),
            ]
        );
    }
}
