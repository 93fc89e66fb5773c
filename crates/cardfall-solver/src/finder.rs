use cardfall_core::model::board::Board;
use cardfall_core::model::card::{Card, Suit};
use cardfall_core::model::cell::GapId;
use cardfall_core::model::layout::Layout;

/// Direction of a one-rank hop within a suit group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankStep {
    /// One rank up: the cards `card` could be stacked under.
    Above,
    /// One rank down: the cards that could be stacked under `card`.
    Below,
}

/// A card that could legally fill some gap, together with where it sits now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub card: Card,
    pub from: usize,
}

/// Every card exactly one rank away from `card` in its own suit group, in
/// suit order. Empty at the rank boundaries.
pub fn rank_neighbors(layout: Layout, card: Card, step: RankStep) -> Vec<Card> {
    let rank = match step {
        RankStep::Above => {
            if card.rank() >= layout.top_rank() {
                return Vec::new();
            }
            card.rank() + 1
        }
        RankStep::Below => {
            if card.rank() == 0 {
                return Vec::new();
            }
            card.rank() - 1
        }
    };
    let mode = layout.match_mode();
    let group = card.group(mode);
    Suit::ALL
        .iter()
        .filter(|suit| (suit.index() as u8) % mode.group_count() == group)
        .map(|suit| Card::from_parts(rank, *suit))
        .collect()
}

/// The card directly above `position` in its column, which is what defines
/// a gap's demands. `None` when the cell above is a gap or out of column.
pub fn accepting_card(board: &Board, position: usize) -> Option<Card> {
    if board.layout().offset_in_column(position) == 0 {
        return None;
    }
    board.cell(position - 1).card()
}

/// All cards that could move into the gap at `gap_position` right now.
pub fn fill_candidates(board: &Board, gap_position: usize) -> Vec<Candidate> {
    let Some(accepting) = accepting_card(board, gap_position) else {
        return Vec::new();
    };
    rank_neighbors(board.layout(), accepting, RankStep::Below)
        .into_iter()
        .filter_map(|card| board.position_of(card).map(|from| Candidate { card, from }))
        .collect()
}

/// Whether `card` has anywhere to go: some one-rank-up group member with a
/// gap directly beneath it.
pub fn can_move(board: &Board, card: Card) -> bool {
    let layout = board.layout();
    rank_neighbors(layout, card, RankStep::Above)
        .into_iter()
        .any(|anchor| match board.position_of(anchor) {
            Some(position) => {
                layout.offset_in_column(position) + 1 < layout.column_len()
                    && board.cell(position + 1).is_gap()
            }
            None => false,
        })
}

/// Every legal move on the board, gap by gap in id order.
pub fn legal_moves(board: &Board) -> Vec<(GapId, Candidate)> {
    let gaps = board.gap_positions();
    let mut moves = Vec::new();
    for gap in GapId::ALL {
        for candidate in fill_candidates(board, gaps[gap.index()]) {
            moves.push((gap, candidate));
        }
    }
    moves
}

pub fn has_legal_move(board: &Board) -> bool {
    let gaps = board.gap_positions();
    GapId::ALL
        .iter()
        .any(|gap| !fill_candidates(board, gaps[gap.index()]).is_empty())
}
