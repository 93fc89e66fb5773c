use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use cardfall_core::game::session::GameSession;
use cardfall_core::model::layout::{Layout, MatchMode};
use cardfall_solver::resolve::{Verdict, resolve};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ResolvedOutputs, RunConfig, ValidationError};

/// Primary entry point for orchestrating batch auto-play runs.
pub struct BatchRunner {
    config: RunConfig,
    outputs: ResolvedOutputs,
    layout: Layout,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub run_id: String,
    pub ranks: u16,
    pub match_mode: MatchMode,
    pub games_played: usize,
    pub won: usize,
    pub lost: usize,
    pub stalled: usize,
    pub total_moves: usize,
    pub avg_ms_per_decision: f64,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

impl BatchRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: RunConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let layout = config.puzzle.layout()?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            layout,
        })
    }

    /// Execute the batch, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut tally = OutcomeTally::default();
        let mut total_moves = 0usize;
        let mut decision_ms = 0.0f64;
        let mut decisions = 0u32;

        for game_index in 0..self.config.games.count {
            let deal_seed = rng.next_u64();
            let report = self.play_game(game_index, deal_seed)?;

            tally.record(report.outcome);
            total_moves += report.moves;
            decision_ms += report.metrics.total_ms;
            decisions += report.metrics.decisions;

            write_game_row(&mut writer, &self.config, game_index, &report)?;
            rows_written += 1;
        }

        writer.flush()?;

        let summary = RunSummary {
            run_id: self.config.run_id.clone(),
            ranks: self.config.puzzle.ranks,
            match_mode: self.config.puzzle.match_mode,
            games_played: self.config.games.count,
            won: tally.won,
            lost: tally.lost,
            stalled: tally.stalled,
            total_moves,
            avg_ms_per_decision: if decisions == 0 {
                0.0
            } else {
                decision_ms / f64::from(decisions)
            },
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        };
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(summary)
    }

    fn play_game(&self, game_index: usize, deal_seed: u64) -> Result<GameReport, RunnerError> {
        let mut session = GameSession::deal(self.layout, deal_seed);
        let mut metrics = DecisionMetrics::default();
        let delay = Duration::from_millis(self.config.run.step_delay_ms);

        for cycle in 0..self.config.run.max_cycles {
            let start = Instant::now();
            let resolution = resolve(&session);
            let elapsed_ms = metrics.record(start.elapsed());

            if self.logging_enabled && tracing::enabled!(Level::INFO) {
                event!(
                    target: "cardfall_cli::game",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    game_index = game_index as u32,
                    deal_seed,
                    cycle,
                    verdict = %resolution.verdict,
                    elapsed_ms
                );
            }

            let outcome = match resolution.verdict {
                Verdict::Move(planned) => {
                    if let Err(err) = session.apply(planned.card, planned.gap) {
                        event!(
                            target: "cardfall_cli::game",
                            Level::WARN,
                            run_id = %self.config.run_id,
                            game_index = game_index as u32,
                            cycle,
                            planned = %planned,
                            error = ?err,
                            "move rejected"
                        );
                        return Err(RunnerError::game(format!(
                            "resolved move rejected by the board: {:?} (game {}, cycle {}, move {})",
                            err, game_index, cycle, planned
                        )));
                    }
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    continue;
                }
                Verdict::Won => GameOutcome::Won,
                Verdict::Lost => GameOutcome::Lost,
                Verdict::Stalled => GameOutcome::Stalled,
            };

            return Ok(GameReport {
                outcome,
                deal_seed,
                moves: session.moves().len(),
                cycles: cycle + 1,
                filtered: resolution.filtered,
                broken_edges: resolution.broken_edges,
                metrics: metrics.finalize(),
            });
        }

        Err(RunnerError::CycleCap {
            game_index,
            max_cycles: self.config.run.max_cycles,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    config: &RunConfig,
    game_index: usize,
    report: &GameReport,
) -> Result<(), RunnerError> {
    let row = GameLogRow {
        run_id: config.run_id.clone(),
        game_id: format!("G{game_index:05}"),
        game_index,
        deal_seed: report.deal_seed,
        ranks: config.puzzle.ranks,
        match_mode: config.puzzle.match_mode.value(),
        outcome: report.outcome.label().to_string(),
        moves: report.moves,
        cycles: report.cycles,
        filtered: report.filtered,
        broken_edges: report.broken_edges,
        speed_ms_cycle: report.metrics.avg_ms_per_decision,
        decisions: report.metrics.decisions,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

impl RunSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), RunnerError> {
        let avg_moves = if self.games_played == 0 {
            0.0
        } else {
            self.total_moves as f64 / self.games_played as f64
        };

        let mut rows = String::new();
        rows.push_str("# Cardfall Run Summary\n\n");
        rows.push_str(&format!(
            "Run '{}': {} games at {} ranks, match mode {}\n\n",
            self.run_id, self.games_played, self.ranks, self.match_mode
        ));
        rows.push_str("| Outcome | Games | Share |\n");
        rows.push_str("|---------|-------|-------|\n");

        for (label, count) in [
            ("Won", self.won),
            ("Lost", self.lost),
            ("Stalled", self.stalled),
        ] {
            let share = if self.games_played == 0 {
                0.0
            } else {
                count as f64 / self.games_played as f64
            };
            rows.push_str(&format!(
                "| {label} | {count} | {share:.1}% |\n",
                share = share * 100.0
            ));
        }

        rows.push_str(&format!("\nAverage moves per game: {avg_moves:.2}\n"));
        rows.push_str(&format!(
            "Average ms per decision: {:.2}\n",
            self.avg_ms_per_decision
        ));

        fs::write(path.as_ref(), rows)?;
        Ok(())
    }
}

/// Terminal state a finished game settled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
    Stalled,
}

impl GameOutcome {
    fn label(self) -> &'static str {
        match self {
            GameOutcome::Won => "won",
            GameOutcome::Lost => "lost",
            GameOutcome::Stalled => "stalled",
        }
    }
}

pub struct GameReport {
    pub outcome: GameOutcome,
    pub deal_seed: u64,
    pub moves: usize,
    pub cycles: u32,
    pub filtered: usize,
    pub broken_edges: usize,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct OutcomeTally {
    won: usize,
    lost: usize,
    stalled: usize,
}

impl OutcomeTally {
    fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Won => self.won += 1,
            GameOutcome::Lost => self.lost += 1,
            GameOutcome::Stalled => self.stalled += 1,
        }
    }
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    deal_seed: u64,
    ranks: u16,
    match_mode: u8,
    outcome: String,
    moves: usize,
    cycles: u32,
    filtered: usize,
    broken_edges: usize,
    speed_ms_cycle: f64,
    decisions: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Config(#[from] ValidationError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("game {game_index} exceeded the cycle cap of {max_cycles}")]
    CycleCap { game_index: usize, max_cycles: u32 },
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}
