pub mod finder;
pub mod graph;
pub mod resolve;
pub mod score;

pub use finder::{
    Candidate, RankStep, can_move, fill_candidates, has_legal_move, legal_moves, rank_neighbors,
};
pub use graph::{CandidateChain, DependencyGraph, Edge, PeelOutcome, SlotAnalysis};
pub use resolve::{Resolution, Verdict, resolve};
pub use score::{Choice, PlannedMove, choose};
