use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

use cardfall_core::model::layout::{Layout, LayoutError, MatchMode};

const DEFAULT_MAX_CYCLES: u32 = 10_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root run configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RunConfig {
    pub run_id: String,
    pub puzzle: PuzzleConfig,
    pub games: GamesConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub run: RunControlConfig,
}

impl RunConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: RunConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.puzzle.validate()?;
        self.games.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.run.validate()?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// Board geometry block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PuzzleConfig {
    pub ranks: u16,
    pub match_mode: MatchMode,
}

impl PuzzleConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.layout().map(|_| ())
    }

    /// Geometry described by this block, with field context on failure.
    pub fn layout(&self) -> Result<Layout, ValidationError> {
        Layout::new(self.ranks, self.match_mode).map_err(|err| ValidationError::InvalidField {
            field: "puzzle.ranks".to_string(),
            message: match err {
                LayoutError::ZeroRanks => "ranks must be greater than zero".to_string(),
                LayoutError::TooManyRanks { requested, max } => {
                    format!("{requested} ranks exceeds the maximum of {max}")
                }
            },
        })
    }
}

/// Batch sizing configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub count: usize,
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "games.count".to_string(),
                message: "number of games must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub resolve_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            resolve_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

/// Auto-step loop controls: inter-cycle pacing and the runaway-game cap.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RunControlConfig {
    #[serde(default)]
    pub step_delay_ms: u64,
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
}

impl Default for RunControlConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 0,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

impl RunControlConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_cycles == 0 {
            return Err(ValidationError::InvalidField {
                field: "run.max_cycles".to_string(),
                message: "cycle cap must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_max_cycles() -> u32 {
    DEFAULT_MAX_CYCLES
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "stage0_resolver"
puzzle:
  ranks: 7
  match_mode: 4
games:
  seed: 123
  count: 16
outputs:
  jsonl: "runs/out/{run_id}/games.jsonl"
  summary_md: "runs/out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: RunConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.run.max_cycles, DEFAULT_MAX_CYCLES);
        assert_eq!(cfg.run.step_delay_ms, 0);
        assert!(cfg.logging.enable_structured);
        assert_eq!(cfg.puzzle.match_mode, MatchMode::ExactSuit);
        assert_eq!(cfg.puzzle.layout().expect("layout").ranks(), 7);

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("runs/out/stage0_resolver/games.jsonl")
        );
    }

    #[test]
    fn rejects_zero_games() {
        let yaml = BASIC_YAML.replace("count: 16", "count: 0");
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "games.count"
        ));
    }

    #[test]
    fn rejects_unknown_match_mode() {
        let yaml = BASIC_YAML.replace("match_mode: 4", "match_mode: 3");
        let err = serde_yaml::from_str::<RunConfig>(&yaml).expect_err("unsupported mode");
        assert!(err.to_string().contains("match mode must be 1, 2 or 4"));
    }

    #[test]
    fn rejects_oversized_ranks() {
        let yaml = BASIC_YAML.replace("ranks: 7", "ranks: 5000");
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("too many ranks");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "puzzle.ranks"
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("stage0_resolver", "stage 0 resolver");
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn rejects_empty_output_path() {
        let yaml = BASIC_YAML.replace("runs/out/{run_id}/games.jsonl", "   ");
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("blank path");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "outputs.jsonl"
        ));
    }

    #[test]
    fn blank_tracing_level_normalizes_to_info() {
        let yaml = BASIC_YAML.replace("tracing_level: \"debug\"", "tracing_level: \"\"");
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("validate");
        assert_eq!(cfg.logging.tracing_level, "info");
        assert_eq!(cfg.logging.level(), Some(Level::INFO));
    }

    #[test]
    fn outputs_resolve_template_multiple_occurrences() {
        let yaml = BASIC_YAML.replace(
            "runs/out/{run_id}/summary.md",
            "runs/out/{run_id}/{run_id}/summary.md",
        );
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.summary_md,
            PathBuf::from("runs/out/stage0_resolver/stage0_resolver/summary.md")
        );
    }
}
