use std::collections::HashSet;

use cardfall_core::model::board::Board;
use cardfall_core::model::card::Card;
use cardfall_core::model::cell::{Cell, GapId};

use crate::finder::{self, Candidate, RankStep};

/// A chain discovered for slot `from` that bottoms out at slot `to`.
///
/// `to` must stay put while `from` works through the chain, so `to` is
/// held back from move selection until `from` resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: GapId,
    pub to: GapId,
    pub depth: u32,
}

/// One immediately playable card for a slot, scored by how many chained
/// moves playing it would unblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateChain {
    pub card: Card,
    pub from: usize,
    pub chain: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAnalysis {
    pub gap: GapId,
    pub position: usize,
    pub accepting: Option<Card>,
    pub candidates: Vec<CandidateChain>,
    pub forward_chain: u32,
}

/// Outcome of one full four-slot traversal of a board.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    slots: Vec<SlotAnalysis>,
    edges: Vec<Edge>,
    incoming: [u32; 4],
    indegree: [u32; 4],
}

/// Result of the topological peel over the slot graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeelOutcome {
    /// All four slots in resolution order.
    pub order: Vec<GapId>,
    /// Slots free to act in the first wave; only these feed the scorer.
    pub eligible: [bool; 4],
    /// Edges dropped to break cycles.
    pub broken_edges: usize,
}

impl DependencyGraph {
    pub fn build(board: &Board) -> Self {
        let gap_positions = board.gap_positions();
        let mut edges = Vec::new();
        let mut incoming = [0u32; 4];
        let mut indegree = [0u32; 4];
        let mut slots = Vec::with_capacity(4);
        for gap in GapId::ALL {
            let walker = Walker {
                board,
                slot: gap,
                position: gap_positions[gap.index()],
                visited: HashSet::new(),
                edges: &mut edges,
                incoming: &mut incoming,
                indegree: &mut indegree,
            };
            slots.push(walker.analyze());
        }
        DependencyGraph {
            slots,
            edges,
            incoming,
            indegree,
        }
    }

    pub fn slots(&self) -> &[SlotAnalysis] {
        &self.slots
    }

    pub fn slot(&self, gap: GapId) -> &SlotAnalysis {
        &self.slots[gap.index()]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Priority weight carried into slot `gap` by chains ending there.
    pub fn incoming(&self, gap: GapId) -> u32 {
        self.incoming[gap.index()]
    }

    pub fn indegree(&self, gap: GapId) -> u32 {
        self.indegree[gap.index()]
    }

    /// Accumulated priority of a slot: weight carried in by other slots'
    /// chains plus the best chain the slot can start itself.
    pub fn slot_priority(&self, gap: GapId) -> u32 {
        let slot = self.slot(gap);
        let best_chain = slot
            .candidates
            .iter()
            .map(|candidate| candidate.chain)
            .max()
            .unwrap_or(0);
        self.incoming[gap.index()] + best_chain.max(slot.forward_chain)
    }

    pub fn slot_priorities(&self) -> [u32; 4] {
        let mut priorities = [0; 4];
        for gap in GapId::ALL {
            priorities[gap.index()] = self.slot_priority(gap);
        }
        priorities
    }

    /// Peels the slot graph in dependency order.
    ///
    /// Four rounds, one slot per round: take the lowest-id slot nobody
    /// still depends on, retire its outgoing edges, repeat. When every
    /// remaining slot is depended upon, the slots form a cycle; the walk
    /// in [`break_cycle`] removes one cycle's edges and the peel resumes.
    pub fn peel(&self) -> PeelOutcome {
        let mut edges = self.edges.clone();
        let mut indegree = self.indegree;
        let mut remaining = [true; 4];
        let mut order = Vec::with_capacity(4);
        let mut eligible = [false; 4];
        let mut broken_edges = 0;

        for round in 0..4 {
            let slot = loop {
                if let Some(slot) = next_unblocked(&remaining, &indegree) {
                    break slot;
                }
                broken_edges += break_cycle(&mut edges, &mut indegree, &remaining);
            };
            if round == 0 {
                for gap in GapId::ALL {
                    eligible[gap.index()] = remaining[gap.index()] && indegree[gap.index()] == 0;
                }
            }
            remaining[slot.index()] = false;
            order.push(slot);
            edges.retain(|edge| {
                if edge.from == slot {
                    indegree[edge.to.index()] -= 1;
                    false
                } else {
                    true
                }
            });
        }
        PeelOutcome {
            order,
            eligible,
            broken_edges,
        }
    }
}

fn next_unblocked(remaining: &[bool; 4], indegree: &[u32; 4]) -> Option<GapId> {
    GapId::ALL
        .into_iter()
        .find(|gap| remaining[gap.index()] && indegree[gap.index()] == 0)
}

/// Removes one cycle from the edge set, lowest ids first.
///
/// Starting at the lowest-id remaining slot, repeatedly steps to the
/// lowest-id (then shallowest) slot with an edge into the current one;
/// the first revisit closes a cycle, and exactly that cycle's edges are
/// dropped. Returns the number of edges removed.
fn break_cycle(edges: &mut Vec<Edge>, indegree: &mut [u32; 4], remaining: &[bool; 4]) -> usize {
    let start = GapId::ALL
        .into_iter()
        .find(|gap| remaining[gap.index()])
        .expect("peel keeps at least one slot in play");
    let mut path = vec![start];
    let mut taken: Vec<Edge> = Vec::new();
    loop {
        let current = path[path.len() - 1];
        let step = edges
            .iter()
            .filter(|edge| edge.to == current)
            .min_by_key(|edge| (edge.from.index(), edge.depth))
            .copied()
            .expect("blocked slot has an incoming edge");
        if let Some(entry) = path.iter().position(|gap| *gap == step.from) {
            let mut dropped: Vec<Edge> = taken.split_off(entry);
            dropped.push(step);
            for edge in &dropped {
                indegree[edge.to.index()] -= 1;
                if let Some(found) = edges.iter().position(|e| e == edge) {
                    edges.remove(found);
                }
            }
            return dropped.len();
        }
        path.push(step.from);
        taken.push(step);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Placement,
    Relocation,
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    /// A gap (real or unlocked mid-chain) waiting for the right card.
    Place,
    /// A blocking card that must move out of the way.
    Relocate,
}

struct Frame {
    kind: NodeKind,
    depth: u32,
    pending: Vec<Card>,
    best: Option<u32>,
}

impl Frame {
    fn offer(&mut self, value: u32) {
        if self.best.is_none_or(|best| value > best) {
            self.best = Some(value);
        }
    }

    fn close(self) -> Option<u32> {
        match self.kind {
            NodeKind::Place => Some(self.best.unwrap_or(self.depth)),
            NodeKind::Relocate => self.best,
        }
    }
}

enum Step {
    Value(u32),
    Descend(Frame),
    Skip,
}

/// Per-slot traversal state. The visited set is fresh for every slot so
/// one slot's exploration never starves another's.
struct Walker<'a> {
    board: &'a Board,
    slot: GapId,
    position: usize,
    visited: HashSet<(u16, Direction)>,
    edges: &'a mut Vec<Edge>,
    incoming: &'a mut [u32; 4],
    indegree: &'a mut [u32; 4],
}

impl Walker<'_> {
    fn analyze(mut self) -> SlotAnalysis {
        let Some(accepting) = finder::accepting_card(self.board, self.position) else {
            return SlotAnalysis {
                gap: self.slot,
                position: self.position,
                accepting: None,
                candidates: Vec::new(),
                forward_chain: 0,
            };
        };
        let mut candidates = Vec::new();
        for found in finder::fill_candidates(self.board, self.position) {
            let chain = self.candidate_chain(found);
            candidates.push(CandidateChain {
                card: found.card,
                from: found.from,
                chain,
            });
        }
        let forward_chain = self.forward_chain(accepting);
        SlotAnalysis {
            gap: self.slot,
            position: self.position,
            accepting: Some(accepting),
            candidates,
            forward_chain,
        }
    }

    /// Depth credit for playing one immediate candidate into this slot.
    fn candidate_chain(&mut self, found: Candidate) -> u32 {
        if !self.mark(found.card, Direction::Placement) {
            // an earlier branch already walked this card's cascade
            return 1;
        }
        match self.board.cell(found.from - 1) {
            Cell::Gap(gap) => self.record_terminal(gap, 0),
            Cell::Card(next) => {
                let root = self.place_frame(next, 1);
                self.chain(root).unwrap_or(1)
            }
        }
    }

    /// Credit for the run already stacked above this slot: how much work
    /// would extend it past its current top.
    fn forward_chain(&mut self, accepting: Card) -> u32 {
        let layout = self.board.layout();
        let mode = layout.match_mode();
        let mut run_top = self.position - 1;
        let mut card = accepting;
        loop {
            if layout.offset_in_column(run_top) == 0 {
                // anchored at the header, nothing left to chase
                return 0;
            }
            match self.board.cell(run_top - 1) {
                Cell::Card(above)
                    if above.rank() == card.rank() + 1 && above.group(mode) == card.group(mode) =>
                {
                    run_top -= 1;
                    card = above;
                }
                Cell::Card(above) if above.group(mode) == card.group(mode) => {
                    let root = self.place_frame(above, 0);
                    return self.chain(root).unwrap_or(0);
                }
                Cell::Card(above) => {
                    if !self.mark(above, Direction::Relocation) {
                        return 0;
                    }
                    let root = self.relocate_frame(above, 0);
                    return self.chain(root).unwrap_or(0);
                }
                Cell::Gap(gap) => {
                    return self.record_terminal(gap, 0);
                }
            }
        }
    }

    /// Iterative depth-first walk from `root`, one pending card stepped at
    /// a time so deeper cascades claim shared cards first.
    fn chain(&mut self, root: Frame) -> Option<u32> {
        let mut stack = vec![root];
        let mut result = None;
        while !stack.is_empty() {
            let top = stack.len() - 1;
            match stack[top].pending.pop() {
                Some(card) => {
                    let depth = stack[top].depth;
                    let step = match stack[top].kind {
                        NodeKind::Place => self.step_place(card, depth),
                        NodeKind::Relocate => self.step_relocate(card, depth),
                    };
                    match step {
                        Step::Value(value) => stack[top].offer(value),
                        Step::Descend(frame) => stack.push(frame),
                        Step::Skip => {}
                    }
                }
                None => {
                    let Some(frame) = stack.pop() else { break };
                    let value = frame.close();
                    match stack.last_mut() {
                        Some(parent) => {
                            if let Some(value) = value {
                                parent.offer(value);
                            }
                        }
                        None => result = value,
                    }
                }
            }
        }
        result
    }

    /// One candidate of a placement node: where would the cascade go after
    /// this card moves down into the open cell?
    fn step_place(&mut self, card: Card, depth: u32) -> Step {
        if !self.mark(card, Direction::Placement) {
            return Step::Skip;
        }
        let Some(position) = self.board.position_of(card) else {
            return Step::Skip;
        };
        match self.board.cell(position - 1) {
            Cell::Gap(gap) => Step::Value(self.record_terminal(gap, depth)),
            Cell::Card(next) => Step::Descend(self.place_frame(next, depth + 1)),
        }
    }

    /// One anchor of a relocation node: can the blocker settle below this
    /// one-rank-up group member, or is someone else in the way?
    fn step_relocate(&mut self, anchor: Card, depth: u32) -> Step {
        let layout = self.board.layout();
        let Some(position) = self.board.position_of(anchor) else {
            return Step::Skip;
        };
        if layout.offset_in_column(position) + 1 >= layout.column_len() {
            // bottom of the column, nothing trails the anchor
            return Step::Skip;
        }
        match self.board.cell(position + 1) {
            Cell::Gap(gap) => Step::Value(self.record_terminal(gap, depth)),
            Cell::Card(blocker) => {
                if self.mark(blocker, Direction::Relocation) {
                    Step::Descend(self.relocate_frame(blocker, depth + 1))
                } else {
                    Step::Skip
                }
            }
        }
    }

    /// Chain terminus at a gap: credit the depth and, when the gap belongs
    /// to another slot, record the cross-slot dependency.
    fn record_terminal(&mut self, to: GapId, depth: u32) -> u32 {
        if to != self.slot {
            self.edges.push(Edge {
                from: self.slot,
                to,
                depth,
            });
            self.incoming[to.index()] += depth + 1;
            self.indegree[to.index()] += 1;
        }
        depth + 1
    }

    fn mark(&mut self, card: Card, direction: Direction) -> bool {
        self.visited.insert((card.id(), direction))
    }

    fn place_frame(&self, accepting: Card, depth: u32) -> Frame {
        let mut pending = finder::rank_neighbors(self.board.layout(), accepting, RankStep::Below);
        pending.reverse();
        Frame {
            kind: NodeKind::Place,
            depth,
            pending,
            best: None,
        }
    }

    fn relocate_frame(&self, card: Card, depth: u32) -> Frame {
        let mut pending = finder::rank_neighbors(self.board.layout(), card, RankStep::Above);
        pending.reverse();
        Frame {
            kind: NodeKind::Relocate,
            depth,
            pending,
            best: None,
        }
    }
}
