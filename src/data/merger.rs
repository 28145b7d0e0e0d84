//! Combines same-role partitions from several sources.
//!
//! `merge_and_shuffle` uses the thread RNG on purpose: it only
//! intermixes block-ordered sources, and its output is not
//! reproducible across runs. Persist the result if you need the
//! same order twice.

use rand::seq::SliceRandom;

pub struct DatasetMerger;

impl DatasetMerger {
    pub fn new() -> Self {
        Self
    }

    /// Flatten each role's groups, then shuffle each role independently.
    pub fn merge_and_shuffle<T>(
        &self,
        train_groups: Vec<Vec<T>>,
        val_groups:   Vec<Vec<T>>,
        test_groups:  Vec<Vec<T>>,
    ) -> (Vec<T>, Vec<T>, Vec<T>) {
        let mut rng = rand::thread_rng();

        let mut train = flatten(train_groups);
        let mut val   = flatten(val_groups);
        let mut test  = flatten(test_groups);

        train.shuffle(&mut rng);
        val.shuffle(&mut rng);
        test.shuffle(&mut rng);

        (train, val, test)
    }

    /// Concatenate groups in order, skipping empty ones. No shuffle.
    pub fn merge_lists<T>(&self, groups: Vec<Vec<T>>) -> Vec<T> {
        groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .flatten()
            .collect()
    }
}

impl Default for DatasetMerger {
    fn default() -> Self {
        Self::new()
    }
}

fn flatten<T>(groups: Vec<Vec<T>>) -> Vec<T> {
    groups.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_shuffle_keeps_every_item() {
        let m = DatasetMerger::new();
        let (mut train, val, test) = m.merge_and_shuffle(
            vec![vec![1, 2, 3], vec![4, 5]],
            vec![vec![6], vec![]],
            vec![vec![], vec![7, 8]],
        );
        train.sort_unstable();
        assert_eq!(train, vec![1, 2, 3, 4, 5]);
        assert_eq!(val, vec![6]);
        assert_eq!(test.len(), 2);
        assert!(test.contains(&7) && test.contains(&8));
    }

    #[test]
    fn test_merge_lists_preserves_order() {
        let m = DatasetMerger::new();
        let merged = m.merge_lists(vec![vec!["a", "b"], vec![], vec!["c"]]);
        assert_eq!(merged, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_lists_all_empty() {
        let m = DatasetMerger::new();
        let merged: Vec<u8> = m.merge_lists(vec![vec![], vec![]]);
        assert!(merged.is_empty());
    }
}
