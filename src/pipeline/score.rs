// Composite mismatch scoring.
//
// Every summary column is min-max normalized over the teams that carry it,
// direction-adjusted so a favorable reading is always positive, then folded
// into one weighted score per team. A missing metric contributes nothing;
// the composite is the plain weighted sum, never re-normalized.

use std::cmp::Ordering;

use tracing::info;

use crate::config::{TierRule, WeightConfig};
use crate::pipeline::merge::{MergedTable, SummaryColumn};
use crate::pipeline::normalize::{column_bounds, normalize};

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Tier bucket for a team's composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchTier {
    Elite,
    Strong,
    Average,
    Weak,
}

impl MismatchTier {
    /// Tier from a 0-based rank within `total` ranked teams, splitting the
    /// ranking into four even buckets.
    pub fn from_rank(rank: usize, total: usize) -> Self {
        match rank * 4 / total.max(1) {
            0 => MismatchTier::Elite,
            1 => MismatchTier::Strong,
            2 => MismatchTier::Average,
            _ => MismatchTier::Weak,
        }
    }

    /// Tier from fixed score cutoffs.
    pub fn from_thresholds(score: f64, elite: f64, strong: f64, average: f64) -> Self {
        if score >= elite {
            MismatchTier::Elite
        } else if score >= strong {
            MismatchTier::Strong
        } else if score >= average {
            MismatchTier::Average
        } else {
            MismatchTier::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MismatchTier::Elite => "Elite",
            MismatchTier::Strong => "Strong",
            MismatchTier::Average => "Average",
            MismatchTier::Weak => "Weak",
        }
    }
}

// ---------------------------------------------------------------------------
// Summary table
// ---------------------------------------------------------------------------

/// One team's line in the unified summary.
#[derive(Debug, Clone)]
pub struct TeamSummaryRow {
    pub team_name: String,
    pub team_key: String,
    /// Raw merged metric values, parallel to the summary columns.
    pub values: Vec<Option<f64>>,
    /// Direction-adjusted normalized scores, parallel to the summary
    /// columns. Higher-is-better metrics land in [0, 1], lower-is-better in
    /// [-1, 0], so the best reading of any metric never scores negative.
    pub scores: Vec<Option<f64>>,
    pub mismatch_score: f64,
    pub tier: MismatchTier,
}

/// The scored summary, rows ordered best-first (score descending, team name
/// ascending on ties).
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub columns: Vec<SummaryColumn>,
    pub rows: Vec<TeamSummaryRow>,
}

impl SummaryTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn top(&self, n: usize) -> &[TeamSummaryRow] {
        &self.rows[..self.rows.len().min(n)]
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score the merged table: normalize each column, apply direction and
/// weights, assign tiers, and order the rows best-first.
pub fn score_teams(merged: MergedTable, weights: &WeightConfig) -> SummaryTable {
    let MergedTable { columns, rows } = merged;

    // Normalize column by column over the values that are present.
    let mut scores: Vec<Vec<Option<f64>>> = vec![vec![None; columns.len()]; rows.len()];
    for (c, column) in columns.iter().enumerate() {
        let Some(bounds) = column_bounds(rows.iter().map(|r| &r.values[c])) else {
            continue;
        };
        if bounds.is_degenerate() {
            info!(
                "metric '{}' is constant across teams; it carries no signal this run",
                column.name
            );
        }
        let sign = column.spec.direction.sign();
        for (r, row) in rows.iter().enumerate() {
            scores[r][c] = row.values[c].map(|v| sign * normalize(v, bounds));
        }
    }

    let weight_for = |column: &SummaryColumn| -> f64 {
        weights
            .stats_weights
            .get(column.spec.group)
            .copied()
            .unwrap_or(0.0)
    };

    let mut out: Vec<TeamSummaryRow> = rows
        .into_iter()
        .zip(scores)
        .map(|(row, row_scores)| {
            let mismatch_score = columns
                .iter()
                .zip(&row_scores)
                .filter_map(|(col, s)| s.map(|s| weight_for(col) * s))
                .sum();
            TeamSummaryRow {
                team_name: row.team_name,
                team_key: row.team_key,
                values: row.values,
                scores: row_scores,
                mismatch_score,
                // Placeholder until every composite is known.
                tier: MismatchTier::Average,
            }
        })
        .collect();

    assign_tiers(&mut out, &weights.tiers);

    out.sort_by(|a, b| {
        b.mismatch_score
            .partial_cmp(&a.mismatch_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.team_name.cmp(&b.team_name))
    });

    SummaryTable { columns, rows: out }
}

fn assign_tiers(rows: &mut [TeamSummaryRow], rule: &TierRule) {
    match rule {
        TierRule::Thresholds {
            elite,
            strong,
            average,
        } => {
            for row in rows.iter_mut() {
                row.tier =
                    MismatchTier::from_thresholds(row.mismatch_score, *elite, *strong, *average);
            }
        }
        TierRule::RankQuartile => {
            let total = rows.len();
            if total == 0 {
                return;
            }
            // Rank on score descending. Equal scores rank by reversed team
            // name so the ranking stays total and reproducible.
            let mut order: Vec<usize> = (0..total).collect();
            order.sort_by(|&a, &b| {
                rows[b]
                    .mismatch_score
                    .partial_cmp(&rows[a].mismatch_score)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| rows[b].team_name.cmp(&rows[a].team_name))
            });
            for (rank, &idx) in order.iter().enumerate() {
                rows[idx].tier = MismatchTier::from_rank(rank, total);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
