// Cross-source merge into one table of team metric columns.
//
// Sources disagree on capitalization and whitespace, so rows join on a
// normalized key (trimmed, uppercased). Display names keep the spelling of
// the first source that mentioned the team. Column names are planned up
// front from the schemas alone: the first source to publish a summary name
// owns it, later sources get a label suffix. The plan depends only on which
// sources carry data and their order, never on team overlap, so nothing is
// silently overwritten and a given run always yields the same columns.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::pipeline::aggregate::AggregateTable;
use crate::schema::MetricSpec;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Normalized join key for a team name.
pub fn team_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// One column of the merged table: its resolved name plus the metric spec
/// that declared it.
#[derive(Debug, Clone)]
pub struct SummaryColumn {
    pub name: String,
    pub spec: MetricSpec,
}

#[derive(Debug, Clone)]
pub struct MergedRow {
    /// Display spelling from the first source that mentioned the team.
    pub team_name: String,
    pub team_key: String,
    /// Parallel to the merged column plan.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct MergedTable {
    pub columns: Vec<SummaryColumn>,
    pub rows: Vec<MergedRow>,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merge per-source team aggregates into one row per team, keyed on the
/// normalized team name. Teams absent from a source keep missing values in
/// that source's columns. A source with no team rows contributes neither
/// columns nor rows, so its metrics are absent from the result entirely.
pub fn merge_sources(tables: &[AggregateTable]) -> MergedTable {
    let tables: Vec<&AggregateTable> = tables.iter().filter(|t| !t.teams.is_empty()).collect();

    // Column plan first.
    let mut columns: Vec<SummaryColumn> = Vec::new();
    let mut offsets: Vec<usize> = Vec::with_capacity(tables.len());
    let mut used: HashSet<String> = HashSet::new();
    for table in &tables {
        offsets.push(columns.len());
        for spec in table.schema.metrics {
            let mut name = spec.summary.to_string();
            if used.contains(&name) {
                name = format!("{}_{}", spec.summary, table.schema.label);
            }
            while !used.insert(name.clone()) {
                name.push('_');
            }
            columns.push(SummaryColumn { name, spec: *spec });
        }
    }

    // Row union, display name from first appearance.
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<MergedRow> = Vec::new();
    for (t, table) in tables.iter().enumerate() {
        let offset = offsets[t];
        let mut seen: HashSet<String> = HashSet::new();
        for team in &table.teams {
            let key = team_key(&team.team_name);
            if !seen.insert(key.clone()) {
                warn!(
                    "{}: duplicate team key '{}' within one source, keeping the last row",
                    table.schema.label, key
                );
            }
            let row_idx = match index.get(&key) {
                Some(&i) => i,
                None => {
                    index.insert(key.clone(), rows.len());
                    rows.push(MergedRow {
                        team_name: team.team_name.clone(),
                        team_key: key,
                        values: vec![None; columns.len()],
                    });
                    rows.len() - 1
                }
            };
            for (i, v) in team.values.iter().enumerate() {
                rows[row_idx].values[offset + i] = *v;
            }
        }
    }

    rows.sort_by(|a, b| a.team_key.cmp(&b.team_key));

    MergedTable { columns, rows }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
