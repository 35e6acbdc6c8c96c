use std::collections::HashSet;

use crate::digest::{DigestEntry, DigestSource};
use crate::util::time::cmp_timestamps_desc;

/// Canonical ordered list of digest entries. Manual insertions and polled
/// snapshots meet here; the list stays deduplicated and sorted by timestamp
/// descending (stable, so ties keep insertion order).
#[derive(Default)]
pub struct FeedReconciler {
    entries: Vec<DigestEntry>,
}

impl FeedReconciler {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[DigestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend a manual-origin entry and re-sort. Entries with an id already
    /// in the feed are ignored, keeping ids unique.
    pub fn insert_manual(&mut self, entry: DigestEntry) {
        if self.entries.iter().any(|e| e.id == entry.id) {
            return;
        }
        self.entries.insert(0, entry);
        self.resort();
    }

    /// Replace every scheduled-origin entry with the freshly fetched snapshot;
    /// manual entries survive untouched. Full replacement (not patching) makes
    /// the merge idempotent and safe under out-of-order poll completion.
    pub fn merge_scheduled(&mut self, snapshot: Vec<DigestEntry>) {
        let mut merged: Vec<DigestEntry> = self
            .entries
            .iter()
            .filter(|e| e.source == DigestSource::Manual)
            .cloned()
            .collect();
        let mut seen: HashSet<String> = merged.iter().map(|e| e.id.clone()).collect();
        for entry in snapshot {
            if entry.source != DigestSource::Scheduled {
                continue;
            }
            if seen.insert(entry.id.clone()) {
                merged.push(entry);
            }
        }
        self.entries = merged;
        self.resort();
    }

    fn resort(&mut self) {
        self.entries
            .sort_by(|a, b| cmp_timestamps_desc(&a.timestamp, &b.timestamp));
    }
}
