//! Set arithmetic over per-source contact keys.

use std::collections::{BTreeSet, HashSet};

use rostermerge_core::{ContactKey, ContactRecord};

use crate::model::{BestSource, SourceContacts};

pub fn key_set(records: &[ContactRecord]) -> HashSet<ContactKey> {
    records.iter().map(ContactRecord::key).collect()
}

/// For each source, the number of its raw records whose key appears in no
/// other source.
pub fn unique_counts(sources: &[SourceContacts], sets: &[HashSet<ContactKey>]) -> Vec<usize> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            source
                .records
                .iter()
                .filter(|record| {
                    let key = record.key();
                    sets.iter()
                        .enumerate()
                        .all(|(j, other)| j == i || !other.contains(&key))
                })
                .count()
        })
        .collect()
}

pub fn merged_keys(sets: &[HashSet<ContactKey>]) -> BTreeSet<ContactKey> {
    sets.iter().flat_map(|set| set.iter().cloned()).collect()
}

pub fn coverage_pct(distinct: usize, merged_total: usize) -> f64 {
    if merged_total == 0 {
        return 0.0;
    }
    distinct as f64 / merged_total as f64 * 100.0
}

/// Highest raw record count; the first source wins a tie.
pub fn best_source(sources: &[SourceContacts]) -> Option<BestSource> {
    let mut best: Option<&SourceContacts> = None;
    for source in sources {
        if best.map_or(true, |b| source.records.len() > b.records.len()) {
            best = Some(source);
        }
    }
    best.map(|s| BestSource {
        name: s.name.clone(),
        records: s.records.len(),
    })
}
