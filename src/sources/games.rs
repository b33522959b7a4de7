// Game schedule loading and season outcome rollups.
//
// Schedule exports carry one row per game with home/away teams and final
// points. Unplayed games have blank point cells; they load fine (upcoming
// matchups need them) but are excluded from outcome aggregation. Extra
// export columns are ignored.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::pipeline::aggregate::{AggregateTable, TeamAggregate};
use crate::schema::GAME_OUTCOMES;

use super::SourceError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One scheduled game. Points stay `None` until the game has been played.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub game_id: String,
    pub season: Option<i32>,
    pub week: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    pub home_points: Option<f64>,
    pub away_points: Option<f64>,
}

impl GameRecord {
    /// True once both final scores are in.
    pub fn is_final(&self) -> bool {
        self.home_points.is_some() && self.away_points.is_some()
    }
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawGameRow {
    #[serde(default, alias = "id")]
    game_id: Option<String>,
    #[serde(default)]
    season: Option<i32>,
    #[serde(default)]
    week: Option<u32>,
    home_team: String,
    away_team: String,
    #[serde(default)]
    home_points: Option<f64>,
    #[serde(default)]
    away_points: Option<f64>,
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

fn load_games_from_reader<R: Read>(rdr: R) -> Result<Vec<GameRecord>, SourceError> {
    let mut reader = csv::Reader::from_reader(rdr);

    let headers = reader
        .headers()
        .map_err(|e| SourceError::Csv {
            label: GAME_OUTCOMES.label,
            source: e,
        })?
        .clone();
    let has = |name: &str| headers.iter().any(|h| h.trim() == name);
    let missing: Vec<String> = ["home_team", "away_team"]
        .iter()
        .filter(|name| !has(name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SourceError::MissingColumns {
            label: GAME_OUTCOMES.label,
            columns: missing,
        });
    }

    let mut games = Vec::new();
    for result in reader.deserialize::<RawGameRow>() {
        match result {
            Ok(raw) => {
                let home_team = raw.home_team.trim().to_string();
                let away_team = raw.away_team.trim().to_string();
                if home_team.is_empty() || away_team.is_empty() {
                    debug!("skipping game row with blank team name");
                    continue;
                }
                games.push(GameRecord {
                    game_id: raw.game_id.unwrap_or_default().trim().to_string(),
                    season: raw.season,
                    week: raw.week,
                    home_team,
                    away_team,
                    home_points: raw.home_points.filter(|p| p.is_finite()),
                    away_points: raw.away_points.filter(|p| p.is_finite()),
                });
            }
            Err(e) => {
                warn!("skipping malformed game row: {}", e);
            }
        }
    }
    Ok(games)
}

/// Load a season schedule file.
pub fn load_games(path: &Path) -> Result<Vec<GameRecord>, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_games_from_reader(file)
}

// ---------------------------------------------------------------------------
// Outcome aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct OutcomeAcc {
    games: usize,
    wins: usize,
    points_for: f64,
    points_against: f64,
}

/// Roll completed games up into per-team season outcomes, one entry per
/// team in the declared `GAME_OUTCOMES` metric order. Each game counts once
/// for the home team and once for the away team; a tie counts as a game
/// played but not a win.
pub fn aggregate_outcomes(games: &[GameRecord]) -> AggregateTable {
    let mut teams: BTreeMap<String, OutcomeAcc> = BTreeMap::new();
    let mut unplayed = 0usize;

    for game in games {
        let (Some(home_pts), Some(away_pts)) = (game.home_points, game.away_points) else {
            unplayed += 1;
            continue;
        };
        let sides = [
            (&game.home_team, home_pts, away_pts),
            (&game.away_team, away_pts, home_pts),
        ];
        for (team, pf, pa) in sides {
            let acc = teams.entry(team.clone()).or_default();
            acc.games += 1;
            if pf > pa {
                acc.wins += 1;
            }
            acc.points_for += pf;
            acc.points_against += pa;
        }
    }

    if unplayed > 0 {
        debug!(
            "{} scheduled games without final scores excluded from outcomes",
            unplayed
        );
    }

    let teams = teams
        .into_iter()
        .map(|(team_name, acc)| {
            let n = acc.games as f64;
            let avg_scored = acc.points_for / n;
            let avg_allowed = acc.points_against / n;
            TeamAggregate {
                team_name,
                player_count: acc.games,
                weight_total: n,
                values: vec![
                    Some(n),
                    Some(acc.wins as f64),
                    Some(acc.wins as f64 / n),
                    Some(avg_scored),
                    Some(avg_allowed),
                    Some(avg_scored - avg_allowed),
                ],
            }
        })
        .collect();

    AggregateTable {
        schema: &GAME_OUTCOMES,
        teams,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
