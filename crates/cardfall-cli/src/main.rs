use std::path::PathBuf;

use clap::Parser;

use cardfall_cli::config::{ResolvedOutputs, RunConfig, ValidationError};
use cardfall_cli::logging::init_logging;
use cardfall_cli::runner::BatchRunner;
use cardfall_core::model::layout::MatchMode;

/// Batch auto-play harness for the cardfall resolver.
#[derive(Debug, Parser)]
#[command(
    name = "cardfall",
    author,
    version,
    about = "Deterministic cardfall auto-play harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "runs/cardfall.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for dealing.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of ranks per column.
    #[arg(long, value_name = "RANKS")]
    ranks: Option<u16>,

    /// Override the match mode (1 = any suit, 2 = color pair, 4 = exact suit).
    #[arg(long, value_name = "MODE")]
    match_mode: Option<u8>,

    /// Exit after validating the configuration (no games are run).
    #[arg(long)]
    validate_only: bool,

    /// Enable detailed resolver telemetry regardless of config (forces CARDFALL_RESOLVE_DETAILS=1).
    #[arg(long)]
    log_resolve_details: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = RunConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(ranks) = cli.ranks {
        config.puzzle.ranks = ranks;
    }

    if let Some(mode) = cli.match_mode {
        config.puzzle.match_mode =
            MatchMode::from_value(mode).ok_or_else(|| ValidationError::InvalidField {
                field: "puzzle.match_mode".to_string(),
                message: format!("match mode must be 1, 2 or 4, got {mode}"),
            })?;
    }

    if cli.log_resolve_details {
        config.logging.resolve_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let ranks = config.puzzle.ranks;
    let match_mode = config.puzzle.match_mode;

    println!(
        "Loaded configuration '{run_id}' ({games} game{}, {ranks} ranks, match mode {match_mode})",
        if games == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    if let Some(guard) = _logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }
    let runner = BatchRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: no games were run.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!(
        "  won {} / lost {} / stalled {}",
        summary.won, summary.lost, summary.stalled
    );
    println!("Summary table: {}", summary.summary_path.display());

    Ok(())
}
