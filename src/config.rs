// Configuration loading and parsing (settings.toml, weights.toml).

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use chrono::Datelike;

use crate::schema::{SourceKind, GAME_OUTCOMES};

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.toml";
pub const DEFAULT_WEIGHTS_PATH: &str = "config/weights.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// settings.toml structs
// ---------------------------------------------------------------------------

/// Run settings: which stat files to ingest, where the game schedule lives,
/// and where output goes.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Source label -> stats CSV path. Only sources listed here are loaded;
    /// keys must match a declared source schema.
    #[serde(default)]
    pub stats_paths: HashMap<String, PathBuf>,

    /// Game schedule settings. Omit the table to run without game outcomes.
    #[serde(default)]
    pub games: Option<GamesSettings>,

    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GamesSettings {
    pub data_dir: PathBuf,

    /// Season year. Defaults to the current calendar year when omitted.
    #[serde(default)]
    pub season: Option<i32>,

    #[serde(default = "default_season_type")]
    pub season_type: String,
}

impl GamesSettings {
    pub fn resolve_season(&self) -> i32 {
        self.season.unwrap_or_else(|| chrono::Local::now().year())
    }

    /// Path of the schedule file for the configured season, e.g.
    /// `data/games/2025_regular_games.csv`.
    pub fn games_file(&self) -> PathBuf {
        self.data_dir.join(format!(
            "{}_{}_games.csv",
            self.resolve_season(),
            self.season_type
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// How many teams the console ranking shows.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            dir: default_output_dir(),
            top_n: default_top_n(),
        }
    }
}

fn default_season_type() -> String {
    "regular".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/out")
}

fn default_top_n() -> usize {
    5
}

// ---------------------------------------------------------------------------
// weights.toml structs
// ---------------------------------------------------------------------------

/// Scoring weights and the tier assignment rule.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightConfig {
    /// Weight-group key -> multiplier for that group's normalized score.
    /// Groups left out score with weight 0.0 (collected but not scored).
    #[serde(default)]
    pub stats_weights: HashMap<String, f64>,

    #[serde(default)]
    pub tiers: TierRule,
}

/// How composite scores map to tiers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TierRule {
    /// Rank teams by composite score and split the ranking into quartiles.
    #[default]
    RankQuartile,

    /// Fixed score cutoffs: >= `elite` is Elite, >= `strong` is Strong,
    /// >= `average` is Average, anything below is Weak.
    Thresholds {
        elite: f64,
        strong: f64,
        average: f64,
    },
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = read_file(path)?;
    let settings: Settings = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn load_weights(path: &Path) -> Result<WeightConfig, ConfigError> {
    let text = read_file(path)?;
    let weights: WeightConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate_weights(&weights)?;
    Ok(weights)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        // If config/ also doesn't exist, loading is going to fail anyway.
        // Report the missing defaults directory with a clear message.
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        // Skip .example template files
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, leave it alone
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Every weight-group key a declared schema publishes.
fn known_groups() -> HashSet<&'static str> {
    let mut groups: HashSet<&'static str> = SourceKind::ALL
        .iter()
        .flat_map(|k| k.schema().metrics.iter().map(|m| m.group))
        .collect();
    groups.extend(GAME_OUTCOMES.metrics.iter().map(|m| m.group));
    groups
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let known_labels: HashSet<&'static str> =
        SourceKind::ALL.iter().map(|k| k.schema().label).collect();

    for key in settings.stats_paths.keys() {
        if !known_labels.contains(key.as_str()) {
            return Err(ConfigError::ValidationError {
                field: format!("stats_paths.{key}"),
                message: format!(
                    "unknown source; expected one of: {}",
                    SourceKind::ALL.map(|k| k.schema().label).join(", ")
                ),
            });
        }
    }

    if let Some(games) = &settings.games {
        let st = games.season_type.as_str();
        if st != "regular" && st != "postseason" {
            return Err(ConfigError::ValidationError {
                field: "games.season_type".into(),
                message: format!("must be \"regular\" or \"postseason\", got \"{st}\""),
            });
        }
    }

    if settings.output.top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "output.top_n".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

fn validate_weights(weights: &WeightConfig) -> Result<(), ConfigError> {
    let groups = known_groups();

    for (key, val) in &weights.stats_weights {
        if !groups.contains(key.as_str()) {
            return Err(ConfigError::ValidationError {
                field: format!("stats_weights.{key}"),
                message: "unknown metric group; not declared by any source".into(),
            });
        }
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: format!("stats_weights.{key}"),
                message: format!("must be finite and >= 0, got {val}"),
            });
        }
    }

    if let TierRule::Thresholds {
        elite,
        strong,
        average,
    } = &weights.tiers
    {
        for (name, val) in [
            ("tiers.elite", elite),
            ("tiers.strong", strong),
            ("tiers.average", average),
        ] {
            if !val.is_finite() {
                return Err(ConfigError::ValidationError {
                    field: name.into(),
                    message: format!("must be finite, got {val}"),
                });
            }
        }
        if !(elite >= strong && strong >= average) {
            return Err(ConfigError::ValidationError {
                field: "tiers".into(),
                message: format!(
                    "cutoffs must satisfy elite >= strong >= average, \
                     got {elite} / {strong} / {average}"
                ),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
