// Weekly passing-tilt report.
//
// Joins the season schedule against the scored summary and estimates, per
// game, how far each passing offense outclasses the coverage it will face.
// Both sides are summed into one overall tilt so lopsided matchups surface
// regardless of which sideline holds the edge. Unplayed games are included;
// upcoming matchups are the ones worth previewing.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::pipeline::merge::team_key;
use crate::pipeline::score::{SummaryTable, TeamSummaryRow};
use crate::report::ReportError;
use crate::sources::games::GameRecord;

/// Summary columns averaged into a team's passing-offense reading.
pub const OFFENSE_TILT_COLUMNS: [&str; 4] = ["screen_yprr", "slot_yprr", "man_yprr", "zone_yprr"];

/// Summary columns averaged into a team's coverage reading.
pub const COVERAGE_TILT_COLUMNS: [&str; 2] = ["man_coverage_grade", "zone_coverage_grade"];

// ---------------------------------------------------------------------------
// Tilt computation
// ---------------------------------------------------------------------------

/// One scored matchup.
#[derive(Debug, Clone)]
pub struct MatchupTilt {
    pub week: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    pub home_pass_tilt: f64,
    pub away_pass_tilt: f64,
    pub tilt: f64,
}

impl MatchupTilt {
    pub fn matchup(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

fn mean_of(row: &TeamSummaryRow, indices: &[usize]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &i in indices {
        if let Some(v) = row.values[i] {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Score every game on the schedule against the summary, best tilt first.
///
/// A game is skipped when either side lacks the readings the tilt needs,
/// which covers teams absent from the summary entirely. Ties order by
/// matchup name so reruns agree.
pub fn compute_pass_tilts(summary: &SummaryTable, games: &[GameRecord]) -> Vec<MatchupTilt> {
    let offense_cols: Vec<usize> = OFFENSE_TILT_COLUMNS
        .iter()
        .filter_map(|name| summary.column_index(name))
        .collect();
    let coverage_cols: Vec<usize> = COVERAGE_TILT_COLUMNS
        .iter()
        .filter_map(|name| summary.column_index(name))
        .collect();

    let readings: HashMap<&str, (Option<f64>, Option<f64>)> = summary
        .rows
        .iter()
        .map(|row| {
            (
                row.team_key.as_str(),
                (mean_of(row, &offense_cols), mean_of(row, &coverage_cols)),
            )
        })
        .collect();
    let lookup = |name: &str| {
        readings
            .get(team_key(name).as_str())
            .copied()
            .unwrap_or((None, None))
    };

    let mut tilts: Vec<MatchupTilt> = Vec::new();
    for game in games {
        let (home_offense, home_coverage) = lookup(&game.home_team);
        let (away_offense, away_coverage) = lookup(&game.away_team);

        let (Some(ho), Some(hc), Some(ao), Some(ac)) =
            (home_offense, home_coverage, away_offense, away_coverage)
        else {
            debug!(
                "no tilt for {} vs {}: missing summary readings",
                game.home_team, game.away_team
            );
            continue;
        };

        let home_pass_tilt = ho - ac;
        let away_pass_tilt = ao - hc;
        tilts.push(MatchupTilt {
            week: game.week,
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            home_pass_tilt,
            away_pass_tilt,
            tilt: home_pass_tilt + away_pass_tilt,
        });
    }

    tilts.sort_by(|a, b| {
        b.tilt
            .partial_cmp(&a.tilt)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.home_team.cmp(&b.home_team))
            .then_with(|| a.away_team.cmp(&b.away_team))
    });
    tilts
}

// ---------------------------------------------------------------------------
// Report files
// ---------------------------------------------------------------------------

fn week_token(top: &[MatchupTilt]) -> String {
    match top.iter().find_map(|t| t.week) {
        Some(week) => week.to_string(),
        None => "unknown".to_string(),
    }
}

/// Write the ranked matchups as `top_mismatches_week_<week>.csv` and `.md`.
/// The week in the file names comes from the first ranked game that knows
/// its week.
pub fn write_reports(dir: &Path, top: &[MatchupTilt]) -> Result<(PathBuf, PathBuf), ReportError> {
    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |e: std::io::Error| ReportError::Io { path, source: e }
    };
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let week = week_token(top);
    let csv_path = dir.join(format!("top_mismatches_week_{week}.csv"));
    let md_path = dir.join(format!("top_mismatches_week_{week}.md"));

    let file = std::fs::File::create(&csv_path).map_err(io_err(&csv_path))?;
    let mut writer = csv::Writer::from_writer(file);
    let csv_err = |e: csv::Error| ReportError::Csv {
        path: csv_path.display().to_string(),
        source: e,
    };
    writer
        .write_record(["matchup", "week", "home_pass_tilt", "away_pass_tilt", "tilt"])
        .map_err(csv_err)?;
    for t in top {
        writer
            .write_record(&[
                t.matchup(),
                t.week.map(|w| w.to_string()).unwrap_or_default(),
                format!("{}", t.home_pass_tilt),
                format!("{}", t.away_pass_tilt),
                format!("{}", t.tilt),
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(io_err(&csv_path))?;

    let mut md = format!("# Top {} Passing Mismatches\n\n", top.len());
    for t in top {
        let wk = match t.week {
            Some(w) => w.to_string(),
            None => week.clone(),
        };
        md.push_str(&format!("## {} (Week {})\n", t.matchup(), wk));
        md.push_str(&format!("- Home pass tilt: {:.2}\n", t.home_pass_tilt));
        md.push_str(&format!("- Away pass tilt: {:.2}\n", t.away_pass_tilt));
        md.push_str(&format!("- Overall tilt: **{:.2}**\n\n", t.tilt));
    }
    std::fs::write(&md_path, md).map_err(io_err(&md_path))?;

    Ok((csv_path, md_path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::merge::SummaryColumn;
    use crate::pipeline::score::MismatchTier;
    use crate::schema::{Direction, MetricSpec};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn column(name: &'static str) -> SummaryColumn {
        SummaryColumn {
            name: name.to_string(),
            spec: MetricSpec {
                column: name,
                summary: name,
                group: name,
                direction: Direction::HigherBetter,
            },
        }
    }

    fn summary_row(name: &str, values: Vec<Option<f64>>) -> TeamSummaryRow {
        let scores = vec![None; values.len()];
        TeamSummaryRow {
            team_name: name.to_string(),
            team_key: team_key(name),
            values,
            scores,
            mismatch_score: 0.0,
            tier: MismatchTier::Average,
        }
    }

    // Columns: man_coverage_grade, zone_coverage_grade, screen_yprr,
    // slot_yprr, man_yprr, zone_yprr.
    fn sample_summary() -> SummaryTable {
        SummaryTable {
            columns: vec![
                column("man_coverage_grade"),
                column("zone_coverage_grade"),
                column("screen_yprr"),
                column("slot_yprr"),
                column("man_yprr"),
                column("zone_yprr"),
            ],
            rows: vec![
                // Offense mean 2.0, coverage mean 75.
                summary_row(
                    "Alpha State",
                    vec![
                        Some(80.0),
                        Some(70.0),
                        Some(2.0),
                        Some(2.0),
                        Some(2.0),
                        Some(2.0),
                    ],
                ),
                // Offense mean 1.0, coverage mean 55.
                summary_row(
                    "Bravo Tech",
                    vec![
                        Some(60.0),
                        Some(50.0),
                        Some(1.0),
                        Some(1.0),
                        Some(1.0),
                        Some(1.0),
                    ],
                ),
                // Sparse row: offense mean 1.5 from man_yprr alone, coverage
                // mean 40 from the zone grade alone.
                summary_row(
                    "Charlie A&M",
                    vec![None, Some(40.0), None, None, Some(1.5), None],
                ),
            ],
        }
    }

    fn game(
        week: Option<u32>,
        home: &str,
        away: &str,
        points: Option<(f64, f64)>,
    ) -> GameRecord {
        GameRecord {
            game_id: format!("{home}-{away}"),
            season: Some(2024),
            week,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_points: points.map(|p| p.0),
            away_points: points.map(|p| p.1),
        }
    }

    fn sample_games() -> Vec<GameRecord> {
        vec![
            game(Some(1), "Alpha State", "Bravo Tech", Some((31.0, 17.0))),
            game(Some(1), "Charlie A&M", "Alpha State", Some((21.0, 24.0))),
            game(Some(2), "Bravo Tech", "Charlie A&M", None),
            game(Some(2), "Bravo Tech", "Echo Institute", Some((10.0, 7.0))),
        ]
    }

    #[test]
    fn tilts_rank_best_matchup_first() {
        let tilts = compute_pass_tilts(&sample_summary(), &sample_games());

        // Echo Institute has no summary row, so its game is skipped.
        assert_eq!(tilts.len(), 3);

        // Bravo vs Charlie: home 1.0 - 40 = -39, away 1.5 - 55 = -53.5.
        let best = &tilts[0];
        assert_eq!(best.matchup(), "Bravo Tech vs Charlie A&M");
        assert!(approx_eq(best.home_pass_tilt, -39.0));
        assert!(approx_eq(best.away_pass_tilt, -53.5));
        assert!(approx_eq(best.tilt, -92.5));

        // Charlie vs Alpha: home 1.5 - 75 = -73.5, away 2.0 - 40 = -38.
        assert_eq!(tilts[1].matchup(), "Charlie A&M vs Alpha State");
        assert!(approx_eq(tilts[1].tilt, -111.5));

        // Alpha vs Bravo: home 2.0 - 55 = -53, away 1.0 - 75 = -74.
        assert_eq!(tilts[2].matchup(), "Alpha State vs Bravo Tech");
        assert!(approx_eq(tilts[2].tilt, -127.0));
    }

    #[test]
    fn unplayed_games_are_scored() {
        let tilts = compute_pass_tilts(&sample_summary(), &sample_games());
        // The week 2 Bravo/Charlie game has no points yet and still leads.
        assert_eq!(tilts[0].week, Some(2));
    }

    #[test]
    fn schedule_names_match_case_insensitively() {
        let games = vec![game(Some(1), "ALPHA STATE", "bravo tech", None)];
        let tilts = compute_pass_tilts(&sample_summary(), &games);
        assert_eq!(tilts.len(), 1);
        assert!(approx_eq(tilts[0].tilt, -127.0));
    }

    #[test]
    fn summary_without_coverage_columns_yields_no_tilts() {
        let mut summary = sample_summary();
        summary.columns.truncate(2);
        for row in &mut summary.rows {
            row.values.truncate(2);
        }
        // Only coverage grades remain, so no offense reading exists.
        let tilts = compute_pass_tilts(&summary, &sample_games());
        assert!(tilts.is_empty());
    }

    #[test]
    fn reports_take_week_from_first_ranked_game() {
        let dir = tempfile::tempdir().unwrap();
        let tilts = compute_pass_tilts(&sample_summary(), &sample_games());
        let (csv_path, md_path) = write_reports(dir.path(), &tilts[..2]).unwrap();

        assert!(csv_path.ends_with("top_mismatches_week_2.csv"));
        assert!(md_path.ends_with("top_mismatches_week_2.md"));

        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next(),
            Some("matchup,week,home_pass_tilt,away_pass_tilt,tilt")
        );
        assert_eq!(lines.next(), Some("Bravo Tech vs Charlie A&M,2,-39,-53.5,-92.5"));
        assert_eq!(
            lines.next(),
            Some("Charlie A&M vs Alpha State,1,-73.5,-38,-111.5")
        );

        let md_text = std::fs::read_to_string(&md_path).unwrap();
        assert!(md_text.starts_with("# Top 2 Passing Mismatches\n"));
        assert!(md_text.contains("## Bravo Tech vs Charlie A&M (Week 2)\n"));
        assert!(md_text.contains("- Home pass tilt: -39.00\n"));
        assert!(md_text.contains("- Overall tilt: **-92.50**\n"));
    }

    #[test]
    fn reports_without_week_numbers_use_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let games = vec![game(None, "Alpha State", "Bravo Tech", None)];
        let tilts = compute_pass_tilts(&sample_summary(), &games);
        let (csv_path, _) = write_reports(dir.path(), &tilts).unwrap();

        assert!(csv_path.ends_with("top_mismatches_week_unknown.csv"));
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        // The week cell stays empty rather than repeating the token.
        assert!(csv_text.contains("Alpha State vs Bravo Tech,,-53,-74,-127"));
    }
}
