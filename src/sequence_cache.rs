use crate::MemoError;
use rustc_hash::FxHashMap;
use std::sync::RwLock;

#[derive(Default, Debug)]
struct Table {
    values: FxHashMap<usize, u64>,
    /// Largest k with 0..=k all present, or None before seeding.
    contiguous: Option<usize>,
}

impl Table {
    fn advance_contiguous(&mut self) {
        let mut next = self.contiguous.map_or(0, |k| k + 1);
        while self.values.contains_key(&next) {
            self.contiguous = Some(next);
            next += 1;
        }
    }
}

/// Result of a write-once `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// The index was already present; carries the stored value.
    Present(u64),
}

/// Result of [`SequenceCache::fill_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// This call computed and stored the value.
    Computed(u64),
    /// Another filler (or an earlier request) stored it first.
    Cached(u64),
}

impl Slot {
    pub fn value(self) -> u64 {
        match self {
            Slot::Computed(v) | Slot::Cached(v) => v,
        }
    }
}

/// Shared index -> value table for one recurrence.
///
/// Readers share the lock; writers take it exclusively for a single index at a
/// time, so concurrent fillers interleave at index boundaries. Entries are
/// never removed or overwritten.
#[derive(Debug, Default)]
pub struct SequenceCache {
    table: RwLock<Table>,
}

impl SequenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Result<Option<u64>, MemoError> {
        let table = self.table.read()?;
        Ok(table.values.get(&index).copied())
    }

    /// Write `value` at `index` unless something is already there.
    pub fn put(&self, index: usize, value: u64) -> Result<PutOutcome, MemoError> {
        let mut table = self.table.write()?;
        if let Some(existing) = table.values.get(&index) {
            return Ok(PutOutcome::Present(*existing));
        }
        table.values.insert(index, value);
        table.advance_contiguous();
        Ok(PutOutcome::Inserted)
    }

    /// Return the value at `index`, computing and storing it with `compute` if absent.
    ///
    /// `compute` runs with no lock held, so a failing or panicking recurrence
    /// leaves the table untouched and usable. Two racing callers may both
    /// compute; the store is re-checked under the write lock and only the first
    /// value is kept. The loser gets `Cached` with the stored value.
    pub fn fill_with<F>(&self, index: usize, compute: F) -> Result<Slot, MemoError>
    where
        F: FnOnce() -> Result<u64, MemoError>,
    {
        if let Some(value) = self.get(index)? {
            return Ok(Slot::Cached(value));
        }

        let value = compute()?;

        let mut table = self.table.write()?;
        if let Some(existing) = table.values.get(&index) {
            return Ok(Slot::Cached(*existing));
        }
        table.values.insert(index, value);
        table.advance_contiguous();
        Ok(Slot::Computed(value))
    }

    /// Idempotently store the base values at indices 0 and 1.
    pub fn seed_base(&self, base: [u64; 2]) -> Result<(), MemoError> {
        let mut table = self.table.write()?;
        table.values.entry(0).or_insert(base[0]);
        table.values.entry(1).or_insert(base[1]);
        table.advance_contiguous();
        Ok(())
    }

    pub fn highest_contiguous_index(&self) -> Result<Option<usize>, MemoError> {
        Ok(self.table.read()?.contiguous)
    }

    pub fn len(&self) -> Result<usize, MemoError> {
        Ok(self.table.read()?.values.len())
    }

    pub fn is_empty(&self) -> Result<bool, MemoError> {
        Ok(self.len()? == 0)
    }

    /// All entries ordered by index.
    pub fn snapshot(&self) -> Result<Vec<(usize, u64)>, MemoError> {
        let table = self.table.read()?;
        let mut entries: Vec<(usize, u64)> = table.values.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        Ok(entries)
    }
}
