use core::fmt;

use serde::{Deserialize, Serialize};

/// Hard cap keeping card ids comfortably inside `u16`.
pub const MAX_RANKS: u16 = 4096;

/// How coarsely suits are merged when deciding which cards may stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum MatchMode {
    /// Any suit continues any run.
    AnySuit = 1,
    /// Black continues black, red continues red.
    ColorPair = 2,
    /// Runs must stay within one suit.
    ExactSuit = 4,
}

impl MatchMode {
    pub const ALL: [MatchMode; 3] = [MatchMode::AnySuit, MatchMode::ColorPair, MatchMode::ExactSuit];

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(MatchMode::AnySuit),
            2 => Some(MatchMode::ColorPair),
            4 => Some(MatchMode::ExactSuit),
            _ => None,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Number of distinct suit groups under this mode.
    pub const fn group_count(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMatchMode(pub u8);

impl fmt::Display for InvalidMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match mode must be 1, 2 or 4, got {}", self.0)
    }
}

impl TryFrom<u8> for MatchMode {
    type Error = InvalidMatchMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        MatchMode::from_value(value).ok_or(InvalidMatchMode(value))
    }
}

impl From<MatchMode> for u8 {
    fn from(mode: MatchMode) -> u8 {
        mode.value()
    }
}

/// Fixed board geometry: four columns of `ranks + 1` cells each.
///
/// Position arithmetic lives here so the board, the finder and the graph
/// builder all agree on what a column is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    ranks: u16,
    match_mode: MatchMode,
}

pub const COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    ZeroRanks,
    TooManyRanks { requested: u16, max: u16 },
}

impl Layout {
    pub const fn new(ranks: u16, match_mode: MatchMode) -> Result<Self, LayoutError> {
        if ranks == 0 {
            return Err(LayoutError::ZeroRanks);
        }
        if ranks > MAX_RANKS {
            return Err(LayoutError::TooManyRanks {
                requested: ranks,
                max: MAX_RANKS,
            });
        }
        Ok(Layout { ranks, match_mode })
    }

    pub const fn ranks(self) -> u16 {
        self.ranks
    }

    pub const fn match_mode(self) -> MatchMode {
        self.match_mode
    }

    pub const fn top_rank(self) -> u16 {
        self.ranks - 1
    }

    pub const fn column_len(self) -> usize {
        self.ranks as usize + 1
    }

    pub const fn board_len(self) -> usize {
        COLUMNS * self.column_len()
    }

    pub const fn card_count(self) -> usize {
        COLUMNS * self.ranks as usize
    }

    pub const fn column_of(self, position: usize) -> usize {
        position / self.column_len()
    }

    pub const fn offset_in_column(self, position: usize) -> usize {
        position % self.column_len()
    }

    pub const fn column_start(self, column: usize) -> usize {
        column * self.column_len()
    }

    pub const fn is_header_position(self, position: usize) -> bool {
        self.offset_in_column(position) == 0
    }

    /// Rank a card must hold to sit correctly at `position`; `None` for the
    /// final offset of a column, which a complete column leaves to its gap.
    pub const fn expected_rank(self, position: usize) -> Option<u16> {
        let offset = self.offset_in_column(position) as u16;
        if offset > self.top_rank() {
            None
        } else {
            Some(self.top_rank() - offset)
        }
    }

    /// Group a column accepts, induced by the header suit anchored there.
    pub const fn column_group(self, column: usize) -> u8 {
        (column as u8) % self.match_mode.group_count()
    }
}

#[cfg(test)]
mod tests {
    use super::{COLUMNS, Layout, LayoutError, MatchMode};

    fn layout(ranks: u16, mode: MatchMode) -> Layout {
        Layout::new(ranks, mode).expect("valid layout")
    }

    #[test]
    fn rejects_zero_ranks() {
        assert_eq!(
            Layout::new(0, MatchMode::AnySuit),
            Err(LayoutError::ZeroRanks)
        );
    }

    #[test]
    fn geometry_matches_rank_count() {
        let l = layout(2, MatchMode::AnySuit);
        assert_eq!(l.column_len(), 3);
        assert_eq!(l.board_len(), 12);
        assert_eq!(l.card_count(), 8);
        assert_eq!(l.top_rank(), 1);
    }

    #[test]
    fn position_arithmetic_round_trips() {
        let l = layout(3, MatchMode::ExactSuit);
        for column in 0..COLUMNS {
            for offset in 0..l.column_len() {
                let pos = l.column_start(column) + offset;
                assert_eq!(l.column_of(pos), column);
                assert_eq!(l.offset_in_column(pos), offset);
            }
        }
        assert!(l.is_header_position(8));
        assert!(!l.is_header_position(9));
    }

    #[test]
    fn expected_rank_descends_to_none() {
        let l = layout(2, MatchMode::AnySuit);
        assert_eq!(l.expected_rank(0), Some(1));
        assert_eq!(l.expected_rank(1), Some(0));
        assert_eq!(l.expected_rank(2), None);
    }

    #[test]
    fn column_groups_wrap_by_mode() {
        let pairs = layout(2, MatchMode::ColorPair);
        assert_eq!(pairs.column_group(0), 0);
        assert_eq!(pairs.column_group(1), 1);
        assert_eq!(pairs.column_group(2), 0);
        assert_eq!(pairs.column_group(3), 1);

        let any = layout(2, MatchMode::AnySuit);
        for column in 0..COLUMNS {
            assert_eq!(any.column_group(column), 0);
        }
    }

    #[test]
    fn match_mode_values_round_trip() {
        for mode in MatchMode::ALL {
            assert_eq!(MatchMode::from_value(mode.value()), Some(mode));
        }
        assert_eq!(MatchMode::from_value(3), None);
    }
}
