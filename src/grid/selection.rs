//! Ordered multi-selection with dense 1-based ranks.

/// One picked item and its display rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEntry<K> {
    pub key: K,
    pub rank: usize,
}

/// An insertion-ordered set of picks.
///
/// The rank of the entry at index `i` is always `i + 1`; removing an entry
/// shifts everything after it down by one.
#[derive(Debug, Clone)]
pub struct SelectionModel<K> {
    order: Vec<K>,
}

impl<K: Copy + PartialEq> SelectionModel<K> {
    pub fn new() -> Self {
        Self { order: Vec::new() }
    }

    /// Append `key` and return its rank. Selecting a present key changes nothing.
    pub fn select(&mut self, key: K) -> usize {
        if let Some(rank) = self.rank_of(key) {
            return rank;
        }
        self.order.push(key);
        self.debug_check();
        self.order.len()
    }

    /// Remove `key`, renumbering later entries. Returns the rank it had.
    pub fn deselect(&mut self, key: K) -> Option<usize> {
        let index = self.order.iter().position(|k| *k == key)?;
        self.order.remove(index);
        self.debug_check();
        Some(index + 1)
    }

    pub fn rank_of(&self, key: K) -> Option<usize> {
        self.order.iter().position(|k| *k == key).map(|i| i + 1)
    }

    pub fn contains(&self, key: K) -> bool {
        self.order.contains(&key)
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Keep only the keys for which `keep` holds; ranks stay dense.
    pub fn retain(&mut self, mut keep: impl FnMut(K) -> bool) -> usize {
        let before = self.order.len();
        self.order.retain(|k| keep(*k));
        before - self.order.len()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in rank order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = SelectionEntry<K>> + '_ {
        self.order
            .iter()
            .enumerate()
            .map(|(i, key)| SelectionEntry { key: *key, rank: i + 1 })
    }

    fn debug_check(&self) {
        debug_assert!(
            self.order
                .iter()
                .enumerate()
                .all(|(i, k)| !self.order[i + 1..].contains(k)),
            "selection holds a duplicate entry"
        );
    }
}

impl<K: Copy + PartialEq> Default for SelectionModel<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_dense(model: &SelectionModel<u32>) {
        for (i, entry) in model.entries().enumerate() {
            assert_eq!(entry.rank, i + 1);
            assert_eq!(model.rank_of(entry.key), Some(i + 1));
        }
    }

    #[test]
    fn test_select_assigns_increasing_ranks() {
        let mut model = SelectionModel::new();
        assert_eq!(model.select(7), 1);
        assert_eq!(model.select(3), 2);
        assert_eq!(model.select(9), 3);
        assert_eq!(model.iter().collect::<Vec<_>>(), vec![7, 3, 9]);
    }

    #[test]
    fn test_select_existing_is_noop() {
        let mut model = SelectionModel::new();
        model.select(1);
        model.select(2);
        assert_eq!(model.select(1), 1);
        assert_eq!(model.len(), 2);
        assert_eq!(model.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_deselect_renumbers() {
        let mut model = SelectionModel::new();
        for key in [10, 20, 30, 40] {
            model.select(key);
        }
        assert_eq!(model.deselect(20), Some(2));
        assert_eq!(model.rank_of(10), Some(1));
        assert_eq!(model.rank_of(30), Some(2));
        assert_eq!(model.rank_of(40), Some(3));
        assert_eq!(model.rank_of(20), None);
        assert_dense(&model);
    }

    #[test]
    fn test_deselect_missing_is_noop() {
        let mut model = SelectionModel::new();
        model.select(1);
        assert_eq!(model.deselect(5), None);
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_clear_and_retain() {
        let mut model = SelectionModel::new();
        for key in 1..=6 {
            model.select(key);
        }
        assert_eq!(model.retain(|k| k % 2 == 0), 3);
        assert_eq!(model.iter().collect::<Vec<_>>(), vec![2, 4, 6]);
        assert_dense(&model);

        model.clear();
        assert!(model.is_empty());
        assert!(!model.contains(2));
    }

    #[test]
    fn test_random_operation_sequences_keep_ranks_dense() {
        // Small deterministic LCG so the sequence is reproducible.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as u32
        };

        let mut model = SelectionModel::new();
        let mut mirror: Vec<u32> = Vec::new();

        for _ in 0..2_000 {
            let key = next() % 24;
            if next() % 3 == 0 {
                model.deselect(key);
                mirror.retain(|k| *k != key);
            } else {
                let rank = model.select(key);
                if !mirror.contains(&key) {
                    mirror.push(key);
                }
                assert_eq!(rank, mirror.iter().position(|k| *k == key).unwrap() + 1);
            }
            assert_eq!(model.iter().collect::<Vec<_>>(), mirror);
            assert_dense(&model);
        }
    }
}
