// Team-level aggregation of player rows.
//
// Each metric is averaged independently over the players that actually have
// a value for it, weighted by games played. When the contributing rows hold
// zero total weight the metric falls back to an unweighted mean, so a team
// of zero-weight players still aggregates instead of dividing by zero.

use std::collections::BTreeMap;

use crate::schema::SourceSchema;
use crate::sources::{PlayerRow, SourceTable};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Per-team rollup of one source.
#[derive(Debug, Clone)]
pub struct TeamAggregate {
    pub team_name: String,
    /// Rows that contributed: players for stat sources, games for outcome
    /// rollups.
    pub player_count: usize,
    /// Sum of row weights across the team.
    pub weight_total: f64,
    /// Parallel to the schema's metric list.
    pub values: Vec<Option<f64>>,
}

/// All team rollups from one source, sorted by team name.
#[derive(Debug, Clone)]
pub struct AggregateTable {
    pub schema: &'static SourceSchema,
    pub teams: Vec<TeamAggregate>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate player rows to team level, one output row per distinct team
/// name in the source.
pub fn aggregate_by_team(table: &SourceTable) -> AggregateTable {
    let mut grouped: BTreeMap<&str, Vec<&PlayerRow>> = BTreeMap::new();
    for row in &table.rows {
        grouped.entry(row.team_name.as_str()).or_default().push(row);
    }

    let teams = grouped
        .into_iter()
        .map(|(team_name, rows)| {
            let weight_total: f64 = rows.iter().map(|r| r.weight.unwrap_or(0.0)).sum();
            let values = (0..table.schema.metrics.len())
                .map(|idx| weighted_metric(&rows, idx))
                .collect();
            TeamAggregate {
                team_name: team_name.to_string(),
                player_count: rows.len(),
                weight_total,
                values,
            }
        })
        .collect();

    AggregateTable {
        schema: table.schema,
        teams,
    }
}

/// Weighted mean of one metric over the rows that carry it. Falls back to
/// the unweighted mean when those rows hold zero total weight; `None` when
/// no row has the metric at all.
fn weighted_metric(rows: &[&PlayerRow], idx: usize) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut plain_sum = 0.0;
    let mut count = 0usize;

    for row in rows {
        let Some(value) = row.values[idx] else {
            continue;
        };
        let w = row.weight.unwrap_or(0.0);
        weighted_sum += value * w;
        weight_sum += w;
        plain_sum += value;
        count += 1;
    }

    if count == 0 {
        None
    } else if weight_sum > 0.0 {
        Some(weighted_sum / weight_sum)
    } else {
        Some(plain_sum / count as f64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
