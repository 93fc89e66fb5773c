use core::fmt;
use std::sync::OnceLock;

use cardfall_core::game::session::GameSession;
use tracing::{Level, event};

use crate::graph::DependencyGraph;
use crate::score::{PlannedMove, choose};

/// What one resolution cycle concluded about the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Play this move now.
    Move(PlannedMove),
    /// Every column is complete.
    Won,
    /// No move exists and no slot retains any potential.
    Lost,
    /// No move is available this cycle, but slots still hold potential
    /// or moves were only held back by the repetition guard.
    Stalled,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Move(planned) => write!(f, "move {planned}"),
            Verdict::Won => write!(f, "won"),
            Verdict::Lost => write!(f, "lost"),
            Verdict::Stalled => write!(f, "stalled"),
        }
    }
}

/// One resolution cycle's verdict plus the analysis behind it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub verdict: Verdict,
    pub slot_priorities: [u32; 4],
    pub eligible: [bool; 4],
    pub edge_count: usize,
    pub broken_edges: usize,
    pub filtered: usize,
}

/// Runs one full resolution cycle against the session's current board:
/// build the slot dependency graph, peel it, score the eligible
/// candidates, and classify the outcome.
pub fn resolve(session: &GameSession) -> Resolution {
    let board = session.board();
    let graph = DependencyGraph::build(board);
    let peel = graph.peel();
    let slot_priorities = graph.slot_priorities();
    let choice = choose(board, &graph, &peel, session.seen());

    let verdict = match choice.best {
        Some(planned) => Verdict::Move(planned),
        None if board.is_won() => Verdict::Won,
        None if choice.filtered > 0 || slot_priorities.iter().any(|p| *p > 0) => Verdict::Stalled,
        None => Verdict::Lost,
    };
    let resolution = Resolution {
        verdict,
        slot_priorities,
        eligible: peel.eligible,
        edge_count: graph.edges().len(),
        broken_edges: peel.broken_edges,
        filtered: choice.filtered,
    };
    log_resolution(session, &resolution);
    resolution
}

fn log_resolution(session: &GameSession, resolution: &Resolution) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }
    event!(
        target: "cardfall_solver::resolve",
        Level::INFO,
        seed = session.seed(),
        moves = session.moves().len(),
        verdict = %resolution.verdict,
        "cycle resolved"
    );
    if detail_logging() {
        event!(
            target: "cardfall_solver::resolve",
            Level::INFO,
            priorities = ?resolution.slot_priorities,
            eligible = ?resolution.eligible,
            edges = resolution.edge_count,
            broken = resolution.broken_edges,
            filtered = resolution.filtered,
            "cycle detail"
        );
    }
}

/// Per-cycle graph detail is noisy, so it stays off unless asked for.
fn detail_logging() -> bool {
    static DETAILS: OnceLock<bool> = OnceLock::new();
    *DETAILS.get_or_init(|| details_from_reader(|key| std::env::var(key).ok()))
}

fn details_from_reader(read: impl Fn(&str) -> Option<String>) -> bool {
    read("CARDFALL_RESOLVE_DETAILS")
        .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{Verdict, details_from_reader, resolve};
    use crate::score::PlannedMove;
    use cardfall_core::game::session::GameSession;
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

    fn session(ranks: u16, mode: MatchMode, cells: Vec<Cell>) -> GameSession {
        let board = Board::from_cells(Layout::new(ranks, mode).expect("valid layout"), cells)
            .expect("valid board");
        GameSession::from_board(board, 0)
    }

    #[test]
    fn live_board_resolves_to_a_move() {
        let session = session(
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
        let resolution = resolve(&session);
        assert_eq!(
            resolution.verdict,
            Verdict::Move(PlannedMove {
                gap: GapId::ALL[0],
                card: Card::from_parts(0, Suit::Clubs),
                from: 4,
                to: 1,
            })
        );
        assert_eq!(resolution.edge_count, 0);
        assert_eq!(resolution.eligible, [true, true, true, true]);
    }

    #[test]
    fn complete_board_resolves_to_won() {
        let session = session(
            1,
            MatchMode::ExactSuit,
            vec![
                card(0, Suit::Clubs),
                gap(0),
                card(0, Suit::Diamonds),
                gap(1),
                card(0, Suit::Spades),
                gap(2),
                card(0, Suit::Hearts),
                gap(3),
            ],
        );
        assert_eq!(resolve(&session).verdict, Verdict::Won);
    }

    #[test]
    fn dead_misplaced_bottom_rows_resolve_to_lost() {
        // Every lowest-rank card rests on its final row but under the
        // wrong header, and nothing can ever move again.
        let session = session(
            2,
            MatchMode::ExactSuit,
            vec![
                card(1, Suit::Clubs),
                card(0, Suit::Diamonds),
                gap(0),
                card(1, Suit::Diamonds),
                card(0, Suit::Clubs),
                gap(1),
                card(1, Suit::Spades),
                card(0, Suit::Hearts),
                gap(2),
                card(1, Suit::Hearts),
                card(0, Suit::Spades),
                gap(3),
            ],
        );
        let resolution = resolve(&session);
        assert_eq!(resolution.verdict, Verdict::Lost);
        assert_eq!(resolution.slot_priorities, [0, 0, 0, 0]);
        assert_eq!(resolution.filtered, 0);
    }

    #[test]
    fn exhausted_moves_resolve_to_stalled() {
        let cells = vec![
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
        ];
        let board = Board::from_cells(
            Layout::new(2, MatchMode::ExactSuit).expect("valid layout"),
            cells,
        )
        .expect("valid board");
        let mut session = GameSession::from_board(board, 0);

        // Burn every reachable position into the repetition guard.
        let moves = [
            (Card::from_parts(0, Suit::Clubs), GapId::ALL[0]),
            (Card::from_parts(0, Suit::Diamonds), GapId::ALL[1]),
            (Card::from_parts(0, Suit::Spades), GapId::ALL[2]),
            (Card::from_parts(0, Suit::Hearts), GapId::ALL[3]),
        ];
        for (card, gap) in moves {
            session.apply(card, gap).expect("legal move");
            session.undo().expect("move to undo");
        }

        let resolution = resolve(&session);
        assert_eq!(resolution.verdict, Verdict::Stalled);
        assert_eq!(resolution.filtered, 4);
    }

    #[test]
    fn mutually_blocked_slots_resolve_to_stalled() {
        // The only slots with candidates hold each other hostage; the
        // free slots have nothing to play.
        let session = session(
            3,
            MatchMode::ExactSuit,
            vec![
                card(2, Suit::Clubs),
                gap(0),
                card(1, Suit::Diamonds),
                card(0, Suit::Clubs),
                card(2, Suit::Diamonds),
                card(1, Suit::Hearts),
                card(0, Suit::Diamonds),
                gap(1),
                card(2, Suit::Spades),
                card(1, Suit::Spades),
                card(0, Suit::Spades),
                gap(2),
                card(2, Suit::Hearts),
                gap(3),
                card(1, Suit::Clubs),
                card(0, Suit::Hearts),
            ],
        );
        let resolution = resolve(&session);
        assert_eq!(resolution.verdict, Verdict::Stalled);
        assert_eq!(resolution.slot_priorities, [3, 1, 0, 4]);
        assert_eq!(resolution.eligible, [false, true, true, false]);
        assert_eq!(resolution.edge_count, 3);
        assert_eq!(resolution.broken_edges, 2);
    }

    #[test]
    fn detail_flag_accepts_common_truthy_spellings() {
        assert!(!details_from_reader(|_| None));
        assert!(details_from_reader(|_| Some("1".to_string())));
        assert!(details_from_reader(|_| Some(" true ".to_string())));
        assert!(details_from_reader(|_| Some("ON".to_string())));
        assert!(!details_from_reader(|_| Some("0".to_string())));
        assert!(!details_from_reader(|_| Some("off".to_string())));
    }
}
