//! Entry-log records and the index handles that point at them.

use crate::table::LogHashTable;
use core::hash::BuildHasher;

/// Position of an entry in a table's entry log.
///
/// Handles stay valid across growth because entries are never moved or
/// removed; they only mean something for the table that produced them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EntryIndex(usize);

impl EntryIndex {
    pub(crate) fn new(i: usize) -> Self {
        EntryIndex(i)
    }

    /// Zero-based position in the entry log.
    pub fn get(&self) -> usize {
        self.0
    }

    /// Key of the entry, or `None` if tombstoned or out of range.
    pub fn key<'a, V, S>(&self, table: &'a LogHashTable<V, S>) -> Option<&'a [u8]>
    where
        S: BuildHasher,
    {
        table.entry(*self).and_then(Entry::key)
    }

    pub fn value<'a, V, S>(&self, table: &'a LogHashTable<V, S>) -> Option<&'a V>
    where
        S: BuildHasher,
    {
        table.entry(*self).map(Entry::value)
    }

    pub fn value_mut<'a, V, S>(&self, table: &'a mut LogHashTable<V, S>) -> Option<&'a mut V>
    where
        S: BuildHasher,
    {
        table.entry_mut(*self).map(Entry::value_mut)
    }
}

/// One slot of the entry log.
#[derive(Debug)]
pub struct Entry<V> {
    key: Option<Box<[u8]>>, // None marks a tombstone
    value: V,
    // 1-based offset of the previous entry in this entry's bucket; only
    // maintained under `Probe::Chained`.
    pub(crate) next: usize,
}

impl<V> Entry<V> {
    pub(crate) fn new(key: Box<[u8]>, value: V, next: usize) -> Self {
        Self {
            key: Some(key),
            value,
            next,
        }
    }

    /// The key, or `None` for a tombstone.
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Swap in a new value, returning the old one.
    pub fn replace_value(&mut self, value: V) -> V {
        core::mem::replace(&mut self.value, value)
    }

    pub fn is_tombstone(&self) -> bool {
        self.key.is_none()
    }

    /// Mark the entry as logically deleted and hand back its key.
    ///
    /// The slot stays in the entry log. Iteration and lookup skip it; a later
    /// insert of the same key appends a fresh entry.
    pub fn tombstone(&mut self) -> Option<Box<[u8]>> {
        self.key.take()
    }

    pub(crate) fn matches(&self, key: &[u8]) -> bool {
        self.key.as_deref() == Some(key)
    }

    pub(crate) fn key_and_value_mut(&mut self) -> (Option<&[u8]>, &mut V) {
        (self.key.as_deref(), &mut self.value)
    }

    pub(crate) fn into_parts(self) -> (Option<Box<[u8]>>, V) {
        (self.key, self.value)
    }
}
