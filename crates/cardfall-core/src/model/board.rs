use core::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::model::card::{Card, Suit};
use crate::model::cell::{Cell, GapId};
use crate::model::layout::{COLUMNS, Layout};

/// Full playing field: every cell of every column, headers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    layout: Layout,
    cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    WrongLength { expected: usize, actual: usize },
    DuplicateGap { gap: GapId },
    DuplicateCard { card: Card },
    CardOutOfRange { id: u16 },
    HeaderMismatch { column: usize },
}

impl Board {
    /// Deals a fresh board from `seed`.
    ///
    /// Headers take the top card of their column's suit up front; the rest
    /// of the deck lands shuffled below them. The shuffled copy of each top
    /// card then turns into that suit's gap, which is what leaves exactly
    /// one open cell per column on a fresh board.
    pub fn deal(layout: Layout, seed: u64) -> Board {
        let mut deck: Vec<Card> = Vec::with_capacity(layout.card_count());
        for rank in 0..layout.ranks() {
            for suit in Suit::ALL {
                deck.push(Card::from_parts(rank, suit));
            }
        }
        let mut rng = StdRng::seed_from_u64(seed);
        deck.shuffle(&mut rng);

        let mut cells = Vec::with_capacity(layout.board_len());
        let mut next = 0;
        for column in 0..COLUMNS {
            let header = Card::from_parts(layout.top_rank(), Suit::ALL[column]);
            cells.push(Cell::Card(header));
            for _ in 0..layout.ranks() {
                cells.push(Cell::Card(deck[next]));
                next += 1;
            }
        }
        for suit in Suit::ALL {
            let top = Cell::Card(Card::from_parts(layout.top_rank(), suit));
            for position in 0..cells.len() {
                if !layout.is_header_position(position) && cells[position] == top {
                    cells[position] = Cell::Gap(GapId::ALL[suit.index()]);
                    break;
                }
            }
        }
        Board { layout, cells }
    }

    /// Builds a board from explicit cells, checking every structural
    /// invariant a dealt board guarantees.
    pub fn from_cells(layout: Layout, cells: Vec<Cell>) -> Result<Board, BoardError> {
        if cells.len() != layout.board_len() {
            return Err(BoardError::WrongLength {
                expected: layout.board_len(),
                actual: cells.len(),
            });
        }
        let mut gap_seen = [false; 4];
        let mut card_seen = vec![false; layout.card_count()];
        for cell in &cells {
            match cell {
                Cell::Gap(gap) => {
                    if gap_seen[gap.index()] {
                        return Err(BoardError::DuplicateGap { gap: *gap });
                    }
                    gap_seen[gap.index()] = true;
                }
                Cell::Card(card) => {
                    let id = card.id() as usize;
                    if id >= card_seen.len() {
                        return Err(BoardError::CardOutOfRange { id: card.id() });
                    }
                    if card_seen[id] {
                        return Err(BoardError::DuplicateCard { card: *card });
                    }
                    card_seen[id] = true;
                }
            }
        }
        // Counts force the rest: four distinct gaps leave exactly one slot
        // per card, so no card can be absent once duplicates are ruled out.
        for column in 0..COLUMNS {
            let ok = match cells[layout.column_start(column)] {
                Cell::Card(card) => {
                    card.rank() == layout.top_rank()
                        && card.group(layout.match_mode()) == layout.column_group(column)
                }
                Cell::Gap(_) => false,
            };
            if !ok {
                return Err(BoardError::HeaderMismatch { column });
            }
        }
        Ok(Board { layout, cells })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, position: usize) -> Cell {
        self.cells[position]
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.cells.swap(a, b);
    }

    /// Current position of each gap, indexed by gap id.
    pub fn gap_positions(&self) -> [usize; 4] {
        let mut positions = [0; 4];
        for (position, cell) in self.cells.iter().enumerate() {
            if let Cell::Gap(gap) = cell {
                positions[gap.index()] = position;
            }
        }
        positions
    }

    pub fn position_of(&self, card: Card) -> Option<usize> {
        self.cells.iter().position(|cell| *cell == Cell::Card(card))
    }

    /// Number of cards already sitting on their final cell.
    pub fn placed_count(&self) -> usize {
        let mut placed = 0;
        for (position, cell) in self.cells.iter().enumerate() {
            if let Cell::Card(card) = cell {
                if self.is_placed(position, *card) {
                    placed += 1;
                }
            }
        }
        placed
    }

    fn is_placed(&self, position: usize, card: Card) -> bool {
        let column = self.layout.column_of(position);
        self.layout.expected_rank(position) == Some(card.rank())
            && card.group(self.layout.match_mode()) == self.layout.column_group(column)
    }

    pub fn is_column_complete(&self, column: usize) -> bool {
        let start = self.layout.column_start(column);
        (0..self.layout.ranks() as usize).all(|offset| match self.cells[start + offset] {
            Cell::Card(card) => self.is_placed(start + offset, card),
            Cell::Gap(_) => false,
        })
    }

    pub fn is_won(&self) -> bool {
        (0..COLUMNS).all(|column| self.is_column_complete(column))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for column in 0..COLUMNS {
            if column > 0 {
                writeln!(f)?;
            }
            let start = self.layout.column_start(column);
            for offset in 0..self.layout.column_len() {
                if offset > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.cells[start + offset])?;
            }
        }
        Ok(())
    }
}
