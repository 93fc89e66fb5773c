use core::fmt;

use serde::{Deserialize, Serialize};

use crate::model::card::Card;

/// Identity of one of the four movable gaps.
///
/// A gap keeps its id for the whole game even as moves shuffle it across
/// columns, so dependency bookkeeping can key on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GapId(u8);

impl GapId {
    pub const ALL: [GapId; 4] = [GapId(0), GapId(1), GapId(2), GapId(3)];

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 4 { Some(GapId(index as u8)) } else { None }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// One board cell: either a card or one of the four gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Card(Card),
    Gap(GapId),
}

impl Cell {
    pub const fn card(self) -> Option<Card> {
        match self {
            Cell::Card(card) => Some(card),
            Cell::Gap(_) => None,
        }
    }

    pub const fn gap(self) -> Option<GapId> {
        match self {
            Cell::Card(_) => None,
            Cell::Gap(id) => Some(id),
        }
    }

    pub const fn is_gap(self) -> bool {
        matches!(self, Cell::Gap(_))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Card(card) => write!(f, "{card}"),
            Cell::Gap(id) => write!(f, "[{id}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, GapId};
    use crate::model::card::{Card, Suit};

    #[test]
    fn gap_index_round_trip() {
        for (index, gap) in GapId::ALL.iter().enumerate() {
            assert_eq!(GapId::from_index(index), Some(*gap));
            assert_eq!(gap.index(), index);
        }
        assert_eq!(GapId::from_index(4), None);
    }

    #[test]
    fn cell_accessors_split_variants() {
        let card = Card::from_parts(3, Suit::Spades);
        let filled = Cell::Card(card);
        let open = Cell::Gap(GapId::ALL[2]);

        assert_eq!(filled.card(), Some(card));
        assert_eq!(filled.gap(), None);
        assert!(!filled.is_gap());

        assert_eq!(open.card(), None);
        assert_eq!(open.gap(), Some(GapId::ALL[2]));
        assert!(open.is_gap());
    }

    #[test]
    fn display_marks_gaps() {
        assert_eq!(Cell::Gap(GapId::ALL[0]).to_string(), "[g0]");
    }
}
