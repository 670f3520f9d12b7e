//! Bucketed index over a frozen prefix of a game's ko-hash log.
//!
//! Search code that explores many continuations of the same game builds one
//! table for the shared history and passes it to
//! [`BoardHistory::make_board_move_assume_legal`](crate::history::BoardHistory::make_board_move_assume_legal),
//! turning each superko query over the prefix into a bucket lookup. The table
//! is never patched: call [`KoHashTable::recompute`] when the prefix changes.

use tracing::trace;

use crate::constants::{KO_TABLE_MASK, KO_TABLE_SIZE};
use crate::hash::Hash128;
use crate::history::BoardHistory;

#[derive(Clone, Debug)]
pub struct KoHashTable {
    /// Sorted by bucket bits, then by full hash.
    sorted: Vec<Hash128>,
    /// `idx_table[b]` is the first index in `sorted` whose bucket is `>= b`.
    idx_table: Vec<u32>,
    pub(crate) first_turn_idx_with_ko_history: usize,
}

impl Default for KoHashTable {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bucket(hash: &Hash128) -> u64 {
    hash.hash0 & KO_TABLE_MASK
}

impl KoHashTable {
    pub fn new() -> Self {
        Self {
            sorted: Vec::new(),
            idx_table: vec![0; KO_TABLE_SIZE],
            first_turn_idx_with_ko_history: 0,
        }
    }

    /// Number of hashes indexed.
    pub fn size(&self) -> usize {
        self.sorted.len()
    }

    pub fn first_turn_idx_with_ko_history(&self) -> usize {
        self.first_turn_idx_with_ko_history
    }

    /// Rebuild from the full ko-hash log of `history`.
    pub fn recompute(&mut self, history: &BoardHistory) {
        self.sorted.clear();
        self.sorted.extend_from_slice(history.ko_hash_history());
        self.first_turn_idx_with_ko_history = history.first_turn_idx_with_ko_history();
        self.rebuild_index();
        trace!(
            target: "hexgo::ko_table",
            size = self.sorted.len(),
            first_turn = self.first_turn_idx_with_ko_history,
            "ko hash table rebuilt"
        );
    }

    fn rebuild_index(&mut self) {
        self.sorted.sort_unstable_by(|a, b| bucket(a).cmp(&bucket(b)).then(a.cmp(b)));
        let mut idx = 0usize;
        for (bits, slot) in self.idx_table.iter_mut().enumerate() {
            while idx < self.sorted.len() && bucket(&self.sorted[idx]) < bits as u64 {
                idx += 1;
            }
            *slot = idx as u32;
        }
    }

    fn bucket_entries(&self, hash: Hash128) -> impl Iterator<Item = &Hash128> {
        let bits = bucket(&hash);
        let start = self.idx_table[bits as usize] as usize;
        self.sorted[start..]
            .iter()
            .take_while(move |h| bucket(h) == bits)
    }

    pub fn contains_hash(&self, hash: Hash128) -> bool {
        self.bucket_entries(hash).any(|h| *h == hash)
    }

    pub fn number_of_occurrences_of_hash(&self, hash: Hash128) -> usize {
        self.bucket_entries(hash).filter(|h| **h == hash).count()
    }
}
