// Output artifacts: per-source team tables, the unified summary CSV, and
// the console ranking.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::pipeline::aggregate::AggregateTable;
use crate::pipeline::score::SummaryTable;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |e| ReportError::Io {
        path: path.display().to_string(),
        source: e,
    }
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> ReportError + '_ {
    move |e| ReportError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Per-source team tables
// ---------------------------------------------------------------------------

/// Write one `team_<label>.csv` per aggregate table. Player-backed tables
/// carry their contribution counts; derived tables (game outcomes) carry
/// metrics only.
pub fn write_team_tables(
    dir: &Path,
    tables: &[AggregateTable],
) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("team_{}.csv", table.schema.label));
        let file = File::create(&path).map_err(io_err(&path))?;
        let mut writer = csv::Writer::from_writer(file);

        let counted = table.schema.weight_column.is_some();
        let mut header: Vec<String> = vec![table.schema.team_column.to_string()];
        header.extend(table.schema.metrics.iter().map(|m| m.column.to_string()));
        if counted {
            header.push("player_count".to_string());
            header.push("player_game_count_total".to_string());
        }
        writer.write_record(&header).map_err(csv_err(&path))?;

        for team in &table.teams {
            let mut record: Vec<String> = vec![team.team_name.clone()];
            record.extend(team.values.iter().map(|v| cell(*v)));
            if counted {
                record.push(team.player_count.to_string());
                record.push(format!("{}", team.weight_total));
            }
            writer.write_record(&record).map_err(csv_err(&path))?;
        }

        writer.flush().map_err(io_err(&path))?;
        written.push(path);
    }
    Ok(written)
}

// ---------------------------------------------------------------------------
// Unified summary
// ---------------------------------------------------------------------------

/// Write `team_summary.csv`: raw metric columns, their `_score` shadows,
/// the composite, and the tier, rows already in best-first order.
pub fn write_summary(dir: &Path, summary: &SummaryTable) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let path = dir.join("team_summary.csv");
    let file = File::create(&path).map_err(io_err(&path))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header: Vec<String> = vec!["team_name".to_string()];
    header.extend(summary.columns.iter().map(|c| c.name.clone()));
    header.extend(summary.columns.iter().map(|c| format!("{}_score", c.name)));
    header.push("mismatch_score".to_string());
    header.push("mismatch_tier".to_string());
    writer.write_record(&header).map_err(csv_err(&path))?;

    for row in &summary.rows {
        let mut record: Vec<String> = vec![row.team_name.clone()];
        record.extend(row.values.iter().map(|v| cell(*v)));
        record.extend(row.scores.iter().map(|s| cell(*s)));
        record.push(format!("{}", row.mismatch_score));
        record.push(row.tier.label().to_string());
        writer.write_record(&record).map_err(csv_err(&path))?;
    }

    writer.flush().map_err(io_err(&path))?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Console ranking
// ---------------------------------------------------------------------------

/// Render the top teams by composite score for the console.
pub fn render_top(summary: &SummaryTable, n: usize) -> String {
    if summary.is_empty() {
        return "No teams to rank.\n".to_string();
    }

    let shown = summary.top(n);
    let mut out = format!("Top {} teams by mismatch score:\n", shown.len());
    for (i, row) in shown.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<24} {:>8.3}  {}\n",
            i + 1,
            row.team_name,
            row.mismatch_score,
            row.tier.label()
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate::TeamAggregate;
    use crate::pipeline::merge::SummaryColumn;
    use crate::pipeline::score::{MismatchTier, TeamSummaryRow};
    use crate::schema::{Direction, MetricSpec, RECEIVING_SCHEME};

    fn sample_summary() -> SummaryTable {
        let spec = MetricSpec {
            column: "man_yprr",
            summary: "man_yprr",
            group: "man_receiving_efficiency",
            direction: Direction::HigherBetter,
        };
        SummaryTable {
            columns: vec![SummaryColumn {
                name: "man_yprr".to_string(),
                spec,
            }],
            rows: vec![
                TeamSummaryRow {
                    team_name: "Alpha State".to_string(),
                    team_key: "ALPHA STATE".to_string(),
                    values: vec![Some(2.5)],
                    scores: vec![Some(1.0)],
                    mismatch_score: 1.0,
                    tier: MismatchTier::Elite,
                },
                TeamSummaryRow {
                    team_name: "Bravo Tech".to_string(),
                    team_key: "BRAVO TECH".to_string(),
                    values: vec![None],
                    scores: vec![None],
                    mismatch_score: 0.0,
                    tier: MismatchTier::Weak,
                },
            ],
        }
    }

    #[test]
    fn summary_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_summary(dir.path(), &sample_summary()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("team_name,man_yprr,man_yprr_score,mismatch_score,mismatch_tier")
        );
        assert_eq!(lines.next(), Some("Alpha State,2.5,1,1,Elite"));
        // Missing values stay empty rather than becoming zeros.
        assert_eq!(lines.next(), Some("Bravo Tech,,,0,Weak"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn team_table_csv_includes_counts_for_player_sources() {
        let dir = tempfile::tempdir().unwrap();
        let table = AggregateTable {
            schema: &RECEIVING_SCHEME,
            teams: vec![TeamAggregate {
                team_name: "Alpha State".to_string(),
                player_count: 2,
                weight_total: 15.0,
                values: vec![Some(2.0), None],
            }],
        };

        let written = write_team_tables(dir.path(), &[table]).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("team_receiving_scheme.csv"));

        let text = std::fs::read_to_string(&written[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("team_name,man_yprr,zone_yprr,player_count,player_game_count_total")
        );
        assert_eq!(lines.next(), Some("Alpha State,2,,2,15"));
    }

    #[test]
    fn game_outcome_table_omits_count_columns() {
        use crate::schema::GAME_OUTCOMES;

        let dir = tempfile::tempdir().unwrap();
        let table = AggregateTable {
            schema: &GAME_OUTCOMES,
            teams: vec![TeamAggregate {
                team_name: "Alpha State".to_string(),
                player_count: 1,
                weight_total: 1.0,
                values: vec![
                    Some(1.0),
                    Some(1.0),
                    Some(1.0),
                    Some(31.0),
                    Some(17.0),
                    Some(14.0),
                ],
            }],
        };

        let written = write_team_tables(dir.path(), &[table]).unwrap();
        let text = std::fs::read_to_string(&written[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("team,games_played,wins,win_pct,avg_points_scored,avg_points_allowed,point_differential")
        );
        assert_eq!(lines.next(), Some("Alpha State,1,1,1,31,17,14"));
    }

    #[test]
    fn render_top_limits_and_formats() {
        let summary = sample_summary();
        let text = render_top(&summary, 1);

        assert!(text.starts_with("Top 1 teams by mismatch score:\n"));
        assert!(text.contains("  1. Alpha State"));
        assert!(text.contains("1.000  Elite"));
        assert!(!text.contains("Bravo Tech"));
    }

    #[test]
    fn render_top_empty_summary() {
        let summary = SummaryTable {
            columns: vec![],
            rows: vec![],
        };
        assert_eq!(render_top(&summary, 5), "No teams to rank.\n");
    }
}
