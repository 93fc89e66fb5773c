use core::fmt;

use serde::{Deserialize, Serialize};

use crate::model::layout::MatchMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Spades = 2,
    Hearts = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Spades, Suit::Hearts];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Suit::Clubs),
            1 => Some(Suit::Diamonds),
            2 => Some(Suit::Spades),
            3 => Some(Suit::Hearts),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Clubs and Spades occupy the even indices, so `index % 2` doubles as
    /// the colour class used by the two-group match mode.
    pub const fn is_black(self) -> bool {
        matches!(self, Suit::Clubs | Suit::Spades)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Suit::Clubs => "C",
            Suit::Diamonds => "D",
            Suit::Spades => "S",
            Suit::Hearts => "H",
        };
        f.write_str(symbol)
    }
}

/// One playing card, identified by its dense id.
///
/// `rank = id >> 2` and `suit = id % 4`, so consecutive ids cycle through
/// the four suits of one rank before moving to the next rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card(u16);

impl Card {
    pub const fn new(id: u16) -> Self {
        Card(id)
    }

    pub const fn from_parts(rank: u16, suit: Suit) -> Self {
        Card((rank << 2) | suit as u16)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    pub const fn rank(self) -> u16 {
        self.0 >> 2
    }

    pub const fn suit(self) -> Suit {
        match self.0 & 3 {
            0 => Suit::Clubs,
            1 => Suit::Diamonds,
            2 => Suit::Spades,
            _ => Suit::Hearts,
        }
    }

    /// Suit-equivalence class under the given match mode.
    pub const fn group(self, mode: MatchMode) -> u8 {
        (self.suit() as u8) % mode.group_count()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit())
    }
}
