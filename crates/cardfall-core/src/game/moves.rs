use crate::model::board::Board;
use crate::model::card::Card;
use crate::model::cell::{Cell, GapId};

/// A completed move, with enough context to revert it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub card: Card,
    pub gap: GapId,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The cell above the gap is another gap, so nothing defines what the
    /// gap accepts.
    NoAcceptingCard { gap: GapId },
    CardNotFound { card: Card },
    RankMismatch { card: Card, accepting: Card },
    GroupMismatch { card: Card, accepting: Card },
    NothingToUndo,
    UndoMismatch,
}

impl Board {
    /// Moves `card` into the cell currently held by `gap`, leaving the gap
    /// where the card came from.
    ///
    /// Legal only when the card's rank is one below the card sitting
    /// directly above the gap and both share a suit group. Top-rank cards
    /// can never satisfy the rank test, which is what keeps headers pinned.
    pub fn apply_move(&mut self, card: Card, gap: GapId) -> Result<MoveRecord, MoveError> {
        let to = self.gap_positions()[gap.index()];
        let accepting = match self.cell(to - 1) {
            Cell::Card(above) => above,
            Cell::Gap(_) => return Err(MoveError::NoAcceptingCard { gap }),
        };
        let from = self
            .position_of(card)
            .ok_or(MoveError::CardNotFound { card })?;
        if card.rank() + 1 != accepting.rank() {
            return Err(MoveError::RankMismatch { card, accepting });
        }
        let mode = self.layout().match_mode();
        if card.group(mode) != accepting.group(mode) {
            return Err(MoveError::GroupMismatch { card, accepting });
        }
        self.swap(from, to);
        Ok(MoveRecord { card, gap, from, to })
    }

    /// Reverts a move previously returned by [`Board::apply_move`].
    pub fn undo_move(&mut self, record: &MoveRecord) -> Result<(), MoveError> {
        let landed = self.cell(record.to) == Cell::Card(record.card);
        let vacated = self.cell(record.from) == Cell::Gap(record.gap);
        if !landed || !vacated {
            return Err(MoveError::UndoMismatch);
        }
        self.swap(record.to, record.from);
        Ok(())
    }
}
