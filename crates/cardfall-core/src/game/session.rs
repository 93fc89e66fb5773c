use crate::game::history::{SeenBoards, fingerprint};
use crate::game::moves::{MoveError, MoveRecord};
use crate::model::board::Board;
use crate::model::card::Card;
use crate::model::cell::GapId;
use crate::model::layout::Layout;

/// One game in progress: the live board plus everything remembered about
/// how it got there.
#[derive(Debug, Clone)]
pub struct GameSession {
    seed: u64,
    board: Board,
    seen: SeenBoards,
    moves: Vec<MoveRecord>,
}

impl GameSession {
    pub fn deal(layout: Layout, seed: u64) -> Self {
        GameSession::from_board(Board::deal(layout, seed), seed)
    }

    /// Wraps an existing board, burning its position as already seen.
    pub fn from_board(board: Board, seed: u64) -> Self {
        let mut seen = SeenBoards::new();
        seen.record(fingerprint(&board));
        GameSession {
            seed,
            board,
            seen,
            moves: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn layout(&self) -> Layout {
        self.board.layout()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn seen(&self) -> &SeenBoards {
        &self.seen
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Plays one move and burns the resulting position.
    pub fn apply(&mut self, card: Card, gap: GapId) -> Result<MoveRecord, MoveError> {
        let record = self.board.apply_move(card, gap)?;
        self.seen.record(fingerprint(&self.board));
        self.moves.push(record);
        Ok(record)
    }

    /// Takes back the latest move. The reverted position stays burned.
    pub fn undo(&mut self) -> Result<MoveRecord, MoveError> {
        let record = *self.moves.last().ok_or(MoveError::NothingToUndo)?;
        self.board.undo_move(&record)?;
        self.moves.pop();
        Ok(record)
    }
}
