use core::fmt;

use cardfall_core::game::history::{self, SeenBoards};
use cardfall_core::model::board::Board;
use cardfall_core::model::card::Card;
use cardfall_core::model::cell::GapId;

use crate::finder;
use crate::graph::{DependencyGraph, PeelOutcome};

const FEATURE_COUNT: usize = 6;

/// The move the resolver settled on for this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMove {
    pub gap: GapId,
    pub card: Card,
    pub from: usize,
    pub to: usize,
}

impl fmt::Display for PlannedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}->{} into {}", self.card, self.from, self.to, self.gap)
    }
}

/// Result of scoring one resolution cycle.
#[derive(Debug, Clone)]
pub struct Choice {
    pub best: Option<PlannedMove>,
    /// Candidates dropped because their outcome was already on the table
    /// earlier this game.
    pub filtered: usize,
}

/// A candidate with its lazily computed feature vector. Features are
/// expensive in ascending order, so a decision at an early feature never
/// pays for the later ones.
struct ScoredCandidate {
    mv: PlannedMove,
    priority: u32,
    accepting: Card,
    after: Board,
    memo: [Option<i64>; FEATURE_COUNT],
}

impl ScoredCandidate {
    fn feature(&mut self, index: usize) -> i64 {
        if let Some(value) = self.memo[index] {
            return value;
        }
        let value = self.compute(index);
        self.memo[index] = Some(value);
        value
    }

    /// Feature values are oriented so that bigger is always better.
    fn compute(&self, index: usize) -> i64 {
        let layout = self.after.layout();
        let offset = layout.offset_in_column(self.mv.to) as i64;
        match index {
            // Accumulated slot priority plus this candidate's own chain.
            0 => i64::from(self.priority),
            // Distance from the card's final resting row, negated.
            1 => -(i64::from(self.mv.card.rank()) - i64::from(layout.top_rank()) + offset).abs(),
            // Higher ranks sit closer to the headers; settle them first.
            2 => i64::from(self.mv.card.rank()),
            // Prefer extending stacks that are already well anchored.
            3 => i64::from(self.accepting.rank()) * 10 - offset,
            // One-move lookahead: how much play does the board keep?
            4 => finder::legal_moves(&self.after).len() as i64,
            // All else equal, fill the higher cell.
            _ => -offset,
        }
    }

    /// Lexicographic comparison over the feature cascade. A full tie keeps
    /// the incumbent, so candidate order settles otherwise equal moves.
    fn beats(&mut self, incumbent: &mut ScoredCandidate) -> bool {
        for index in 0..FEATURE_COUNT {
            let mine = self.feature(index);
            let theirs = incumbent.feature(index);
            if mine != theirs {
                return mine > theirs;
            }
        }
        false
    }
}

/// Scores every candidate of every eligible slot and picks the winner.
///
/// Each candidate is tried on a scratch board first; moves that reproduce
/// a position already seen this game are filtered out rather than scored,
/// which is what starves repetition loops.
pub fn choose(
    board: &Board,
    graph: &DependencyGraph,
    peel: &PeelOutcome,
    seen: &SeenBoards,
) -> Choice {
    let mut best: Option<ScoredCandidate> = None;
    let mut filtered = 0;
    for slot in graph.slots() {
        if !peel.eligible[slot.gap.index()] {
            continue;
        }
        let Some(accepting) = slot.accepting else {
            continue;
        };
        for candidate in &slot.candidates {
            let mut after = board.clone();
            if after.apply_move(candidate.card, slot.gap).is_err() {
                continue;
            }
            if seen.contains(history::fingerprint(&after)) {
                filtered += 1;
                continue;
            }
            let mut challenger = ScoredCandidate {
                mv: PlannedMove {
                    gap: slot.gap,
                    card: candidate.card,
                    from: candidate.from,
                    to: slot.position,
                },
                priority: graph.incoming(slot.gap) + candidate.chain,
                accepting,
                after,
                memo: [None; FEATURE_COUNT],
            };
            match best.as_mut() {
                Some(incumbent) => {
                    if challenger.beats(incumbent) {
                        *incumbent = challenger;
                    }
                }
                None => best = Some(challenger),
            }
        }
    }
    Choice {
        best: best.map(|candidate| candidate.mv),
        filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::{PlannedMove, choose};
    use crate::graph::DependencyGraph;
    use cardfall_core::game::history::{self, SeenBoards};
    use cardfall_core::model::board::Board;
    use cardfall_core::model::card::{Card, Suit};
    use cardfall_core::model::cell::{Cell, GapId};
    use cardfall_core::model::layout::{Layout, MatchMode};

    fn card(rank: u16, suit: Suit) -> Cell {
        Cell::Card(Card::from_parts(rank, suit))
    }

    fn gap(index: usize) -> Cell {
        Cell::Gap(GapId::ALL[index])
    }

    fn board(ranks: u16, mode: MatchMode, cells: Vec<Cell>) -> Board {
        Board::from_cells(Layout::new(ranks, mode).expect("valid layout"), cells)
            .expect("valid board")
    }

    fn pick(board: &Board, seen: &SeenBoards) -> (Option<PlannedMove>, usize) {
        let graph = DependencyGraph::build(board);
        let peel = graph.peel();
        let choice = choose(board, &graph, &peel, seen);
        (choice.best, choice.filtered)
    }

    #[test]
    fn deepest_chain_wins_on_priority() {
        let board = board(
            2,
            MatchMode::AnySuit,
            vec![
                card(1, Suit::Clubs),
                gap(0),
                card(0, Suit::Diamonds),
                card(1, Suit::Diamonds),
                card(0, Suit::Clubs),
                gap(1),
                card(1, Suit::Spades),
                card(0, Suit::Spades),
                gap(2),
                card(1, Suit::Hearts),
                card(0, Suit::Hearts),
                gap(3),
            ],
        );
        let (best, filtered) = pick(&board, &SeenBoards::new());
        assert_eq!(
            best,
            Some(PlannedMove {
                gap: GapId::ALL[0],
                card: Card::from_parts(0, Suit::Clubs),
                from: 4,
                to: 1,
            })
        );
        assert_eq!(filtered, 0);
    }

    #[test]
    fn distance_to_final_row_breaks_priority_ties() {
        // Two lone candidates of equal rank and chain; the club gap sits
        // on its card's final row, the diamond gap one row below it.
        let board = board(
            3,
            MatchMode::ExactSuit,
            vec![
                card(2, Suit::Clubs),
                card(1, Suit::Clubs),
                gap(0),
                card(1, Suit::Spades),
                card(2, Suit::Diamonds),
                card(1, Suit::Hearts),
                card(1, Suit::Diamonds),
                gap(1),
                card(2, Suit::Spades),
                card(0, Suit::Hearts),
                card(0, Suit::Clubs),
                card(0, Suit::Diamonds),
                card(2, Suit::Hearts),
                card(0, Suit::Spades),
                gap(2),
                gap(3),
            ],
        );
        let (best, _) = pick(&board, &SeenBoards::new());
        assert_eq!(
            best,
            Some(PlannedMove {
                gap: GapId::ALL[0],
                card: Card::from_parts(0, Suit::Clubs),
                from: 10,
                to: 2,
            })
        );
    }

    #[test]
    fn lookahead_prefers_the_move_opening_more_followups() {
        // Every gap sits under its header with a chain-1 candidate, but
        // only the club and spade moves leave a live gap behind them.
        let board = board(
            3,
            MatchMode::ExactSuit,
            vec![
                card(2, Suit::Clubs),
                gap(0),
                card(1, Suit::Clubs),
                card(0, Suit::Clubs),
                card(2, Suit::Diamonds),
                gap(1),
                card(0, Suit::Diamonds),
                card(1, Suit::Diamonds),
                card(2, Suit::Spades),
                gap(2),
                card(1, Suit::Spades),
                card(0, Suit::Spades),
                card(2, Suit::Hearts),
                gap(3),
                card(0, Suit::Hearts),
                card(1, Suit::Hearts),
            ],
        );
        let (best, _) = pick(&board, &SeenBoards::new());
        assert_eq!(
            best,
            Some(PlannedMove {
                gap: GapId::ALL[0],
                card: Card::from_parts(1, Suit::Clubs),
                from: 2,
                to: 1,
            })
        );
    }

    #[test]
    fn repeated_positions_are_filtered() {
        let board = board(
            2,
            MatchMode::ExactSuit,
            vec![
                card(1, Suit::Clubs),
                gap(0),
                card(0, Suit::Clubs),
                card(1, Suit::Diamonds),
                gap(1),
                card(0, Suit::Diamonds),
                card(1, Suit::Spades),
                gap(2),
                card(0, Suit::Spades),
                card(1, Suit::Hearts),
                gap(3),
                card(0, Suit::Hearts),
            ],
        );
        // Pretend the club move's outcome already happened this game.
        let mut after = board.clone();
        after
            .apply_move(Card::from_parts(0, Suit::Clubs), GapId::ALL[0])
            .expect("legal move");
        let mut seen = SeenBoards::new();
        seen.record(history::fingerprint(&after));

        let (best, filtered) = pick(&board, &seen);
        assert_eq!(filtered, 1);
        assert_eq!(
            best,
            Some(PlannedMove {
                gap: GapId::ALL[1],
                card: Card::from_parts(0, Suit::Diamonds),
                from: 5,
                to: 4,
            })
        );
    }

    #[test]
    fn ineligible_slots_never_win() {
        // The club and diamond slots depend on each other, so only the
        // spade and heart slots may act even though the club candidate
        // carries the higher priority.
        let board = board(
            2,
            MatchMode::ExactSuit,
            vec![
                card(1, Suit::Clubs),
                gap(0),
                card(0, Suit::Diamonds),
                card(1, Suit::Diamonds),
                gap(1),
                card(0, Suit::Clubs),
                card(1, Suit::Spades),
                gap(2),
                card(0, Suit::Spades),
                card(1, Suit::Hearts),
                gap(3),
                card(0, Suit::Hearts),
            ],
        );
        let (best, filtered) = pick(&board, &SeenBoards::new());
        assert_eq!(filtered, 0);
        assert_eq!(
            best,
            Some(PlannedMove {
                gap: GapId::ALL[2],
                card: Card::from_parts(0, Suit::Spades),
                from: 8,
                to: 7,
            })
        );
    }
}
