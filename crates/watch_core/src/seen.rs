use std::collections::BTreeSet;

use crate::ListingRecord;

/// Listing ids that have already been announced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeenSet {
    ids: BTreeSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` when the id was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Keeps the candidates whose id has not been seen, marking each one as
    /// seen on first occurrence. Candidate order is preserved.
    pub fn partition_new(&mut self, candidates: Vec<ListingRecord>) -> Vec<ListingRecord> {
        candidates
            .into_iter()
            .filter(|record| self.ids.insert(record.id.clone()))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Pure form of [`SeenSet::partition_new`]: consumes the set and hands back
/// the new records together with the updated set.
pub fn partition_new(
    candidates: Vec<ListingRecord>,
    mut seen: SeenSet,
) -> (Vec<ListingRecord>, SeenSet) {
    let fresh = seen.partition_new(candidates);
    (fresh, seen)
}
