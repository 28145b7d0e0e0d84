//! Exact, key-based deduplication.
//!
//! A record's key is the ordered tuple of its named field values;
//! a missing field contributes an empty string. The first record
//! with a given key is kept and later ones are dropped, so output
//! order is input order minus duplicates. One hash-set probe per
//! record keeps the pass linear.

use std::collections::HashSet;

use crate::domain::traits::FieldLookup;

pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    pub fn dedupe<R: FieldLookup>(&self, records: Vec<R>, key_fields: &[String]) -> Vec<R> {
        let total = records.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(total);

        let unique: Vec<R> = records
            .into_iter()
            .filter(|record| seen.insert(composite_key(record, key_fields)))
            .collect();

        tracing::info!("Deduplicated {} → {} records.", total, unique.len());
        unique
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

fn composite_key<R: FieldLookup>(record: &R, key_fields: &[String]) -> Vec<String> {
    key_fields
        .iter()
        .map(|f| record.field(f).map(|v| v.into_owned()).unwrap_or_default())
        .collect()
}
