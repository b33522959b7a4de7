// Team mismatch pipeline: aggregate, merge, normalize, score.

pub mod aggregate;
pub mod merge;
pub mod normalize;
pub mod score;

use tracing::{info, warn};

use crate::config::WeightConfig;
use crate::schema::SourceSchema;
use crate::sources::games::{aggregate_outcomes, GameRecord};
use crate::sources::{SourceError, SourceTable};

use aggregate::{aggregate_by_team, AggregateTable, TeamAggregate};
use merge::merge_sources;
use score::{score_teams, SummaryTable};

// ---------------------------------------------------------------------------
// Extension seam
// ---------------------------------------------------------------------------

/// Extra team-metric provider plugged in alongside the file-backed sources.
///
/// Implementations hand back aggregates already at team level, in their
/// schema's metric order. A failing extension is logged and skipped, the
/// same way a stat file that fails to load is.
pub trait ExtensionSource {
    fn schema(&self) -> &'static SourceSchema;
    fn team_metrics(&self) -> Result<Vec<TeamAggregate>, SourceError>;
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything one run produces: each source's team table plus the scored
/// summary.
#[derive(Debug, Clone)]
pub struct AnalysisArtifacts {
    pub tables: Vec<AggregateTable>,
    pub summary: SummaryTable,
}

/// Run the pipeline over already-loaded inputs.
///
/// Every source becomes a team table artifact even when empty; empty tables
/// are excluded from the merge, so their metrics never reach the summary.
pub fn run(
    sources: &[SourceTable],
    games: Option<&[GameRecord]>,
    weights: &WeightConfig,
    extensions: &[&dyn ExtensionSource],
) -> AnalysisArtifacts {
    let mut tables: Vec<AggregateTable> = Vec::new();

    for source in sources {
        let table = aggregate_by_team(source);
        info!(
            "aggregated {} into {} team rows",
            table.schema.label,
            table.teams.len()
        );
        tables.push(table);
    }

    if let Some(games) = games {
        let outcomes = aggregate_outcomes(games);
        info!(
            "rolled {} scheduled games into {} team outcome rows",
            games.len(),
            outcomes.teams.len()
        );
        tables.push(outcomes);
    }

    for ext in extensions {
        let label = ext.schema().label;
        match ext.team_metrics() {
            Ok(teams) => {
                info!("extension {} supplied {} team rows", label, teams.len());
                tables.push(AggregateTable {
                    schema: ext.schema(),
                    teams,
                });
            }
            Err(e) => {
                warn!("skipping extension {}: {e}", label);
            }
        }
    }

    for table in &tables {
        if table.teams.is_empty() {
            warn!("source {} produced no team rows", table.schema.label);
        }
    }
    if !tables.is_empty() && tables.iter().all(|t| t.teams.is_empty()) {
        warn!("no source produced any team rows; the summary will be empty");
    }

    let summary = score_teams(merge_sources(&tables), weights);

    AnalysisArtifacts { tables, summary }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierRule;
    use crate::schema::{Direction, MetricSpec};

    fn weights_of(pairs: &[(&str, f64)]) -> WeightConfig {
        WeightConfig {
            stats_weights: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            tiers: TierRule::default(),
        }
    }

    static EXT_SCHEMA: SourceSchema = SourceSchema {
        label: "pressure_rate",
        team_column: "team_name",
        identity_columns: &[],
        weight_column: None,
        metrics: &[MetricSpec {
            column: "pressure_rate",
            summary: "pressure_rate",
            group: "pressure_rate",
            direction: Direction::HigherBetter,
        }],
    };

    struct StubExtension {
        fail: bool,
    }

    impl ExtensionSource for StubExtension {
        fn schema(&self) -> &'static SourceSchema {
            &EXT_SCHEMA
        }

        fn team_metrics(&self) -> Result<Vec<TeamAggregate>, SourceError> {
            if self.fail {
                return Err(SourceError::MissingColumns {
                    label: EXT_SCHEMA.label,
                    columns: vec!["pressure_rate".to_string()],
                });
            }
            Ok(vec![
                TeamAggregate {
                    team_name: "Alpha State".to_string(),
                    player_count: 1,
                    weight_total: 1.0,
                    values: vec![Some(0.38)],
                },
                TeamAggregate {
                    team_name: "Bravo Tech".to_string(),
                    player_count: 1,
                    weight_total: 1.0,
                    values: vec![Some(0.22)],
                },
            ])
        }
    }

    #[test]
    fn run_with_no_inputs_yields_empty_artifacts() {
        let artifacts = run(&[], None, &weights_of(&[]), &[]);
        assert!(artifacts.tables.is_empty());
        assert!(artifacts.summary.is_empty());
    }

    #[test]
    fn run_includes_extension_metrics_in_summary() {
        let ext = StubExtension { fail: false };
        let artifacts = run(
            &[],
            None,
            &weights_of(&[("pressure_rate", 1.0)]),
            &[&ext],
        );

        assert_eq!(artifacts.tables.len(), 1);
        assert_eq!(artifacts.summary.column_index("pressure_rate"), Some(0));
        assert_eq!(artifacts.summary.rows.len(), 2);
        assert_eq!(artifacts.summary.rows[0].team_name, "Alpha State");
        assert!((artifacts.summary.rows[0].mismatch_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn run_skips_failing_extension() {
        let ext = StubExtension { fail: true };
        let artifacts = run(&[], None, &weights_of(&[]), &[&ext]);

        assert!(artifacts.tables.is_empty());
        assert!(artifacts.summary.is_empty());
    }

    #[test]
    fn run_keeps_empty_source_as_artifact_but_out_of_summary() {
        let empty = SourceTable {
            schema: crate::schema::SourceKind::ReceivingScheme.schema(),
            rows: vec![],
        };
        let ext = StubExtension { fail: false };
        let artifacts = run(&[empty], None, &weights_of(&[("pressure_rate", 1.0)]), &[&ext]);

        // Both artifacts exist, the empty one wrote no summary columns.
        assert_eq!(artifacts.tables.len(), 2);
        assert!(artifacts.tables[0].teams.is_empty());
        assert_eq!(artifacts.summary.columns.len(), 1);
        assert_eq!(artifacts.summary.column_index("man_yprr"), None);
    }

    #[test]
    fn run_rolls_games_into_outcome_table() {
        use crate::sources::games::GameRecord;

        let games = vec![GameRecord {
            game_id: "1".to_string(),
            season: Some(2025),
            week: Some(1),
            home_team: "Alpha State".to_string(),
            away_team: "Bravo Tech".to_string(),
            home_points: Some(31.0),
            away_points: Some(17.0),
        }];
        let artifacts = run(&[], Some(&games), &weights_of(&[("win_pct", 1.0)]), &[]);

        assert_eq!(artifacts.tables.len(), 1);
        assert_eq!(artifacts.tables[0].schema.label, "game_outcomes");
        assert_eq!(artifacts.summary.rows.len(), 2);
        assert_eq!(artifacts.summary.rows[0].team_name, "Alpha State");
    }
}
