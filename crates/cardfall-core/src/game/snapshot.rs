use serde::{Deserialize, Serialize};

use crate::game::session::GameSession;
use crate::model::board::{Board, BoardError};
use crate::model::cell::Cell;
use crate::model::layout::{Layout, LayoutError, MatchMode};

/// Serializable image of a session, precise enough to resume play.
///
/// Only the current cells travel; move history and the seen set start
/// over on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub seed: u64,
    pub ranks: u16,
    pub match_mode: MatchMode,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotError {
    Layout(LayoutError),
    Board(BoardError),
}

impl From<LayoutError> for SnapshotError {
    fn from(err: LayoutError) -> Self {
        SnapshotError::Layout(err)
    }
}

impl From<BoardError> for SnapshotError {
    fn from(err: BoardError) -> Self {
        SnapshotError::Board(err)
    }
}

impl BoardSnapshot {
    pub fn capture(session: &GameSession) -> Self {
        let layout = session.layout();
        BoardSnapshot {
            seed: session.seed(),
            ranks: layout.ranks(),
            match_mode: layout.match_mode(),
            cells: session.board().cells().to_vec(),
        }
    }

    /// Rebuilds a session, re-running every structural check a fresh deal
    /// would satisfy.
    pub fn restore(self) -> Result<GameSession, SnapshotError> {
        let layout = Layout::new(self.ranks, self.match_mode)?;
        let board = Board::from_cells(layout, self.cells)?;
        Ok(GameSession::from_board(board, self.seed))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
