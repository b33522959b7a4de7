// Stat source loading.
//
// Player-level stat files are plain CSV. Each file is read against its
// declared schema: identity and weight columns must exist, metric cells may
// be blank. Rows that cannot be parsed are skipped with a warning rather
// than failing the whole file.

pub mod games;

use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::schema::{SourceKind, SourceSchema};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One player row from a stat file.
///
/// `values` is parallel to the schema's metric list; `None` marks a cell
/// that was blank or unparseable.
#[derive(Debug, Clone)]
pub struct PlayerRow {
    pub player: String,
    pub player_id: String,
    pub position: String,
    pub team_name: String,
    /// Row weight for aggregation, usually games played. Missing weights
    /// aggregate as zero.
    pub weight: Option<f64>,
    pub values: Vec<Option<f64>>,
}

/// All rows loaded from one source, tied to the schema they satisfy.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub schema: &'static SourceSchema,
    pub rows: Vec<PlayerRow>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {label}: {source}")]
    Csv {
        label: &'static str,
        source: csv::Error,
    },

    #[error("{label}: missing required columns: {columns:?}")]
    MissingColumns {
        label: &'static str,
        columns: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lenient numeric cell parse. Blank cells and the "-" placeholder are
/// missing; thousands separators are stripped; non-finite values are
/// rejected.
fn parse_cell(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    s.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_source_from_reader<R: Read>(
    schema: &'static SourceSchema,
    rdr: R,
) -> Result<SourceTable, SourceError> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader
        .headers()
        .map_err(|e| SourceError::Csv {
            label: schema.label,
            source: e,
        })?
        .clone();

    let col = |name: &str| headers.iter().position(|h| h.trim() == name);

    // Identity and weight columns are hard requirements.
    let mut missing: Vec<String> = Vec::new();
    let team_idx = col(schema.team_column);
    if team_idx.is_none() {
        missing.push(schema.team_column.to_string());
    }
    for name in schema.identity_columns {
        if col(name).is_none() {
            missing.push(name.to_string());
        }
    }
    let weight_idx = match schema.weight_column {
        Some(name) => {
            let idx = col(name);
            if idx.is_none() {
                missing.push(name.to_string());
            }
            idx
        }
        None => None,
    };
    if !missing.is_empty() {
        return Err(SourceError::MissingColumns {
            label: schema.label,
            columns: missing,
        });
    }
    let team_idx = team_idx.unwrap_or(0);

    // Metric columns are soft: a missing column means the metric is absent
    // for every row, it does not reject the file.
    let metric_idx: Vec<Option<usize>> = schema
        .metrics
        .iter()
        .map(|m| {
            let idx = col(m.column);
            if idx.is_none() {
                warn!(
                    "{}: metric column '{}' not in file; treating as missing",
                    schema.label, m.column
                );
            }
            idx
        })
        .collect();

    let player_idx = col("player");
    let player_id_idx = col("player_id");
    let position_idx = col("position");

    let field = |record: &csv::StringRecord, idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    let mut rows = Vec::new();
    let mut blank_teams = 0usize;
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed {} row: {}", schema.label, e);
                continue;
            }
        };

        let team_name = record.get(team_idx).unwrap_or("").trim().to_string();
        if team_name.is_empty() {
            blank_teams += 1;
            continue;
        }

        let weight = weight_idx
            .and_then(|i| record.get(i))
            .and_then(parse_cell)
            .map(|w| {
                if w < 0.0 {
                    warn!(
                        "{}: negative weight {} for team '{}' clamped to 0",
                        schema.label, w, team_name
                    );
                    0.0
                } else {
                    w
                }
            });

        let values = metric_idx
            .iter()
            .map(|idx| idx.and_then(|i| record.get(i)).and_then(parse_cell))
            .collect();

        rows.push(PlayerRow {
            player: field(&record, player_idx),
            player_id: field(&record, player_id_idx),
            position: field(&record, position_idx),
            team_name,
            weight,
            values,
        });
    }

    if blank_teams > 0 {
        debug!(
            "{}: dropped {} rows with blank team name",
            schema.label, blank_teams
        );
    }

    Ok(SourceTable { schema, rows })
}

// ---------------------------------------------------------------------------
// Public loaders
// ---------------------------------------------------------------------------

/// Load one player stat file against its declared schema.
pub fn load_player_source(
    schema: &'static SourceSchema,
    path: &Path,
) -> Result<SourceTable, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_source_from_reader(schema, file)
}

/// Load every source listed in the settings. A source that fails to load is
/// logged and skipped; the remaining sources still flow through the
/// pipeline.
pub fn load_enabled(settings: &Settings) -> Vec<SourceTable> {
    let mut tables = Vec::new();
    for kind in SourceKind::ALL {
        let schema = kind.schema();
        let Some(path) = settings.stats_paths.get(schema.label) else {
            continue;
        };
        match load_player_source(schema, path) {
            Ok(table) => {
                tracing::info!(
                    "loaded {} player rows from {} ({})",
                    table.rows.len(),
                    path.display(),
                    schema.label
                );
                tables.push(table);
            }
            Err(e) => {
                warn!("skipping source {}: {e}", schema.label);
            }
        }
    }
    tables
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
