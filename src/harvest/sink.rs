//! Aggregation of stage results
//!
//! - `LinkSet`: discovery results, a set keyed on the full
//!   `(page_number, link, category)` tuple
//! - `RecordSink`: detail results, plain accumulation across passes

use crate::work::LinkRecord;
use std::collections::{BTreeSet, HashSet};

/// Deduplicated set of discovered links
///
/// Merging is a set union, so merging the same records again is a no-op.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    links: BTreeSet<LinkRecord>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges records into the set, returning how many were new
    pub fn merge<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = LinkRecord>,
    {
        let before = self.links.len();
        self.links.extend(records);
        self.links.len() - before
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, record: &LinkRecord) -> bool {
        self.links.contains(record)
    }

    /// Iterates all merged records sorted by `(page_number, link, category)`
    pub fn iter(&self) -> impl Iterator<Item = &LinkRecord> {
        self.links.iter()
    }

    /// Records ready to be persisted
    ///
    /// Sorted by `(page_number, link)`, without unknown-category records,
    /// holding each link at most once (its first occurrence in sort order),
    /// and skipping links listed in `already_persisted`.
    pub fn persistable(&self, already_persisted: &HashSet<String>) -> Vec<LinkRecord> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut persistable = Vec::new();

        for record in &self.links {
            if record.has_unknown_category() || already_persisted.contains(&record.link) {
                continue;
            }
            if seen.insert(record.link.as_str()) {
                persistable.push(record.clone());
            }
        }

        persistable
    }
}

/// Append-only accumulation of detail records across passes
///
/// No dedup key is applied; duplicate inputs produce duplicate records.
#[derive(Debug, Clone)]
pub struct RecordSink<T> {
    records: Vec<T>,
}

impl<T> Default for RecordSink<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T> RecordSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}
