use std::collections::HashSet;

use crate::model::board::Board;
use crate::model::cell::Cell;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Order-sensitive digest of a whole board.
///
/// Gaps hash by identity, so two boards that differ only in which gap sits
/// where still count as distinct positions.
pub fn fingerprint(board: &Board) -> u64 {
    let mut hash = FNV_OFFSET;
    for cell in board.cells() {
        let code = match cell {
            Cell::Gap(gap) => gap.index() as u64,
            Cell::Card(card) => card.id() as u64 + 4,
        };
        hash ^= code;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Every position a game has passed through, in visit order.
///
/// Entries survive undo on purpose: a position stays burned once reached,
/// which is what stops move selection from walking in circles.
#[derive(Debug, Clone, Default)]
pub struct SeenBoards {
    order: Vec<u64>,
    seen: HashSet<u64>,
}

impl SeenBoards {
    pub fn new() -> Self {
        SeenBoards::default()
    }

    /// Records a fingerprint; returns `false` if it was already known.
    pub fn record(&mut self, hash: u64) -> bool {
        if self.seen.insert(hash) {
            self.order.push(hash);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.seen.contains(&hash)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn order(&self) -> &[u64] {
        &self.order
    }
}
