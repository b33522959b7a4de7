// Declared source schemas.
//
// Every stat source the pipeline can ingest is described here ahead of time:
// which identity columns its file must carry, which column weights the
// per-team aggregation, and which metric columns flow into the unified team
// summary under which name, weight group, and direction. Loaders validate a
// file's header against its declaration, so a renamed or missing column fails
// at load time instead of silently changing what gets aggregated.

// ---------------------------------------------------------------------------
// Metric metadata
// ---------------------------------------------------------------------------

/// Whether a larger value of a metric favors the team that owns it.
///
/// Normalization is direction-blind; the scorer applies `sign` so that a
/// favorable reading always pushes the composite score up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

impl Direction {
    /// Sign the scorer multiplies into a normalized value.
    pub fn sign(self) -> f64 {
        match self {
            Direction::HigherBetter => 1.0,
            Direction::LowerBetter => -1.0,
        }
    }
}

/// One declared metric column of a source.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    /// Column name in the source file and in that source's per-team output.
    pub column: &'static str,
    /// Column name in the unified team summary.
    pub summary: &'static str,
    /// Weight-group key looked up in `weights.toml` under `[stats_weights]`.
    pub group: &'static str,
    pub direction: Direction,
}

/// Declared shape of one source.
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    /// Short label used for config keys, output file names, and column
    /// suffixes when two sources publish the same summary name.
    pub label: &'static str,
    /// Column that rows group under when aggregating to team level.
    pub team_column: &'static str,
    /// Remaining identity columns the file must carry.
    pub identity_columns: &'static [&'static str],
    /// Per-row weight for the weighted mean. `None` means every row counts
    /// equally.
    pub weight_column: Option<&'static str>,
    /// Metric columns in declaration order. Aggregates and summaries keep
    /// this order.
    pub metrics: &'static [MetricSpec],
}

impl SourceSchema {
    /// Position of a metric by its summary name, if this source declares it.
    pub fn metric_index(&self, summary: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.summary == summary)
    }
}

// ---------------------------------------------------------------------------
// Player-level sources
// ---------------------------------------------------------------------------

const PLAYER_IDENTITY: &[&str] = &["player", "player_id", "position"];
const PLAYER_WEIGHT: &str = "player_game_count";

/// Defensive coverage grades and QB ratings allowed, split man/zone.
pub static DEFENSE_COVERAGE: SourceSchema = SourceSchema {
    label: "defense_coverage",
    team_column: "team_name",
    identity_columns: PLAYER_IDENTITY,
    weight_column: Some(PLAYER_WEIGHT),
    metrics: &[
        MetricSpec {
            column: "man_grades_coverage_defense",
            summary: "man_coverage_grade",
            group: "man_coverage_defense",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "zone_grades_coverage_defense",
            summary: "zone_coverage_grade",
            group: "zone_coverage_defense",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "man_qb_rating_against",
            summary: "man_qb_rating_against",
            group: "man_qb_rating_against",
            direction: Direction::LowerBetter,
        },
        MetricSpec {
            column: "zone_qb_rating_against",
            summary: "zone_qb_rating_against",
            group: "zone_qb_rating_against",
            direction: Direction::LowerBetter,
        },
    ],
};

/// Receiving efficiency by route concept.
pub static RECEIVING_CONCEPT: SourceSchema = SourceSchema {
    label: "receiving_concept",
    team_column: "team_name",
    identity_columns: PLAYER_IDENTITY,
    weight_column: Some(PLAYER_WEIGHT),
    metrics: &[
        MetricSpec {
            column: "screen_yprr",
            summary: "screen_yprr",
            group: "screen_efficiency",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "slot_yprr",
            summary: "slot_yprr",
            group: "slot_efficiency",
            direction: Direction::HigherBetter,
        },
    ],
};

/// Receiving efficiency against man and zone coverage.
pub static RECEIVING_SCHEME: SourceSchema = SourceSchema {
    label: "receiving_scheme",
    team_column: "team_name",
    identity_columns: PLAYER_IDENTITY,
    weight_column: Some(PLAYER_WEIGHT),
    metrics: &[
        MetricSpec {
            column: "man_yprr",
            summary: "man_yprr",
            group: "man_receiving_efficiency",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "zone_yprr",
            summary: "zone_yprr",
            group: "zone_receiving_efficiency",
            direction: Direction::HigherBetter,
        },
    ],
};

/// Season results rolled up from the game schedule. Derived per game rather
/// than read from player rows, so it has no identity or weight columns.
pub static GAME_OUTCOMES: SourceSchema = SourceSchema {
    label: "game_outcomes",
    team_column: "team",
    identity_columns: &[],
    weight_column: None,
    metrics: &[
        MetricSpec {
            column: "games_played",
            summary: "games_played",
            group: "games_played",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "wins",
            summary: "wins",
            group: "wins",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "win_pct",
            summary: "win_pct",
            group: "win_pct",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "avg_points_scored",
            summary: "avg_points_scored",
            group: "avg_points_scored",
            direction: Direction::HigherBetter,
        },
        MetricSpec {
            column: "avg_points_allowed",
            summary: "avg_points_allowed",
            group: "avg_points_allowed",
            direction: Direction::LowerBetter,
        },
        MetricSpec {
            column: "point_differential",
            summary: "point_differential",
            group: "point_differential",
            direction: Direction::HigherBetter,
        },
    ],
};

// ---------------------------------------------------------------------------
// Source registry
// ---------------------------------------------------------------------------

/// The player-level stat files the pipeline knows how to ingest. Adding a
/// source means adding a variant here plus its schema above; the config,
/// loader, and merge layers pick it up from this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    DefenseCoverage,
    ReceivingConcept,
    ReceivingScheme,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::DefenseCoverage,
        SourceKind::ReceivingConcept,
        SourceKind::ReceivingScheme,
    ];

    pub fn schema(self) -> &'static SourceSchema {
        match self {
            SourceKind::DefenseCoverage => &DEFENSE_COVERAGE,
            SourceKind::ReceivingConcept => &RECEIVING_CONCEPT,
            SourceKind::ReceivingScheme => &RECEIVING_SCHEME,
        }
    }
}
