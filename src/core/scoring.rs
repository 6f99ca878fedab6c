//! Scoreboard aggregation.
//!
//! Everything the scoreboard shows is derived here from the two append-only
//! fact tables: check records (`competition_services`) and score adjustments
//! (`competition_scores`). The aggregation itself is a set of pure functions
//! over a [`ScoringSnapshot`]; [`compute_scoreboard`] loads the snapshot and
//! builds the whole [`ScoreboardView`] in one go, so a failed read never leaves
//! a half-built view behind.

use crate::{
    entities::{
        CompetitionScore, CompetitionService, Service, Team, competition_score,
        competition_service, service, team,
    },
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Line colours handed out to teams in order, wrapping around.
pub const TEAM_PALETTE: [&str; 8] = [
    "#0072B2", "#D55E00", "#009E73", "#CC79A7", "#F0E442", "#56B4E9", "#E69F00", "#000000",
];

/// Highest round number the scoring tables accept. The chart never draws past
/// it, whatever ends up in the database.
pub const MAX_ROUND: i64 = 10_000;

/// team id -> service id -> value
pub type TeamServiceMap<T> = BTreeMap<i64, BTreeMap<i64, T>>;

/// Drawing area of the cumulative score chart, in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartGeometry {
    /// x of round 1
    pub left: f64,
    /// y of a zero score
    pub baseline: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ChartGeometry {
    fn default() -> Self {
        Self {
            left: 40.0,
            baseline: 210.0,
            width: 740.0,
            height: 180.0,
        }
    }
}

/// Raw rows the scoreboard is computed from.
#[derive(Debug, Clone, Default)]
pub struct ScoringSnapshot {
    pub teams: Vec<team::Model>,
    pub services: Vec<service::Model>,
    pub records: Vec<competition_service::Model>,
    pub adjustments: Vec<competition_score::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMeta {
    pub id: i64,
    pub name: String,
    /// Uptime across all teams, in percent
    pub uptime: f64,
}

/// A team as drawn on the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMeta {
    pub id: i64,
    pub name: String,
    pub color: String,
    /// SVG path data for the cumulative score line, empty before round 1
    pub path: String,
    pub points: Vec<PlotPoint>,
}

/// A team's place in the standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamStanding {
    pub team_id: i64,
    pub name: String,
    pub points: i64,
    /// 1-based, never shared between teams
    pub rank: usize,
}

/// Points a team earned in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundScore {
    pub round: i64,
    pub team_id: i64,
    pub points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

/// Running score of one team, one entry per round starting at round 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamLine {
    pub team_id: i64,
    pub cumulative: Vec<i64>,
    pub points: Vec<PlotPoint>,
}

/// One cell of the status grid, flattened for the templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCell {
    pub service_id: i64,
    pub service_name: String,
    pub is_up: bool,
    pub uptime: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub team_id: i64,
    pub team_name: String,
    pub cells: Vec<StatusCell>,
}

/// Everything the scoreboard page and its JSON endpoint render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardView {
    pub services: Vec<ServiceMeta>,
    pub teams: Vec<TeamMeta>,
    pub latest_statuses: TeamServiceMap<bool>,
    pub service_uptime: BTreeMap<i64, f64>,
    pub team_service_uptime: TeamServiceMap<f64>,
    pub standings: Vec<TeamStanding>,
    pub scores_by_round: Vec<RoundScore>,
    pub status_rows: Vec<StatusRow>,
    pub max_round: i64,
    /// False until the first check result or per-round score arrives
    pub has_scoring: bool,
}

/// Loads every row the scoreboard needs.
///
/// Any failed read aborts the load; nothing is substituted.
#[instrument(skip(db))]
pub async fn load_snapshot(db: &DatabaseConnection) -> Result<ScoringSnapshot> {
    let teams = Team::find().order_by_asc(team::Column::Id).all(db).await?;
    let services = Service::find()
        .order_by_asc(service::Column::Id)
        .all(db)
        .await?;
    let records = CompetitionService::find()
        .order_by_asc(competition_service::Column::Id)
        .all(db)
        .await?;
    let adjustments = CompetitionScore::find()
        .order_by_asc(competition_score::Column::Id)
        .all(db)
        .await?;

    debug!(
        teams = teams.len(),
        services = services.len(),
        records = records.len(),
        adjustments = adjustments.len(),
        "Loaded scoring snapshot"
    );

    Ok(ScoringSnapshot {
        teams,
        services,
        records,
        adjustments,
    })
}

/// Loads a fresh snapshot and builds the full scoreboard from it.
pub async fn compute_scoreboard(db: &DatabaseConnection) -> Result<ScoreboardView> {
    let snapshot = load_snapshot(db).await?;
    Ok(ScoreboardView::from_snapshot(
        &snapshot,
        ChartGeometry::default(),
    ))
}

impl ScoreboardView {
    /// Builds the view model from an already-loaded snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ScoringSnapshot, geometry: ChartGeometry) -> Self {
        let latest = latest_statuses(&snapshot.teams, &snapshot.services, &snapshot.records);
        let service_uptime = service_uptime(&snapshot.services, &snapshot.records);
        let team_service_uptime =
            team_service_uptime(&snapshot.teams, &snapshot.services, &snapshot.records);
        let standings = standings(&snapshot.teams, &snapshot.adjustments);
        let scores_by_round = round_series(&snapshot.adjustments);
        let max_round = max_round(&scores_by_round);
        let lines = cumulative_lines(&snapshot.teams, &scores_by_round, geometry);

        let teams = snapshot
            .teams
            .iter()
            .zip(lines)
            .enumerate()
            .map(|(index, (team, line))| TeamMeta {
                id: team.id,
                name: team.name.clone(),
                color: TEAM_PALETTE[index % TEAM_PALETTE.len()].to_string(),
                path: svg_path(&line.points),
                points: line.points,
            })
            .collect();

        let status_rows = snapshot
            .teams
            .iter()
            .map(|team| StatusRow {
                team_id: team.id,
                team_name: team.name.clone(),
                cells: snapshot
                    .services
                    .iter()
                    .map(|service| StatusCell {
                        service_id: service.id,
                        service_name: service.name.clone(),
                        is_up: latest
                            .get(&team.id)
                            .and_then(|row| row.get(&service.id))
                            .copied()
                            .unwrap_or(false),
                        uptime: team_service_uptime
                            .get(&team.id)
                            .and_then(|row| row.get(&service.id))
                            .copied()
                            .unwrap_or(0.0),
                    })
                    .collect(),
            })
            .collect();

        Self {
            services: snapshot
                .services
                .iter()
                .map(|service| ServiceMeta {
                    id: service.id,
                    name: service.name.clone(),
                    uptime: service_uptime.get(&service.id).copied().unwrap_or(0.0),
                })
                .collect(),
            teams,
            latest_statuses: latest,
            service_uptime,
            team_service_uptime,
            standings,
            has_scoring: !snapshot.records.is_empty() || !scores_by_round.is_empty(),
            scores_by_round,
            status_rows,
            max_round,
        }
    }
}

/// Latest up/down state of every configured (team, service) pair.
///
/// The record with the highest round wins; records sharing that round are
/// ordered by timestamp, then by id, newest first. Pairs without any record
/// are present and `false`. Records for teams or services that are no longer
/// configured are ignored.
#[must_use]
pub fn latest_statuses(
    teams: &[team::Model],
    services: &[service::Model],
    records: &[competition_service::Model],
) -> TeamServiceMap<bool> {
    let mut newest: HashMap<(i64, i64), &competition_service::Model> = HashMap::new();
    for record in records {
        newest
            .entry((record.team_id, record.service_id))
            .and_modify(|current| {
                if record_order_key(record) > record_order_key(current) {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    dense_grid(teams, services, |team_id, service_id| {
        newest
            .get(&(team_id, service_id))
            .is_some_and(|record| record.is_up)
    })
}

fn record_order_key(
    record: &competition_service::Model,
) -> (i64, chrono::DateTime<chrono::Utc>, i64) {
    (record.round, record.timestamp, record.id)
}

/// Percentage of `up` out of `total`, `0.0` when there is nothing to count.
#[must_use]
#[allow(clippy::cast_precision_loss)] // check counts stay far below 2^52
pub fn uptime_percent(up: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    up as f64 * 100.0 / total as f64
}

#[derive(Default, Clone, Copy)]
struct Tally {
    up: usize,
    total: usize,
}

impl Tally {
    fn add(&mut self, is_up: bool) {
        self.total += 1;
        if is_up {
            self.up += 1;
        }
    }

    fn percent(self) -> f64 {
        uptime_percent(self.up, self.total)
    }
}

/// Uptime per service across all teams and rounds.
///
/// Every configured service appears; services that only exist in the records
/// are reported too.
#[must_use]
pub fn service_uptime(
    services: &[service::Model],
    records: &[competition_service::Model],
) -> BTreeMap<i64, f64> {
    let mut tallies: BTreeMap<i64, Tally> = services
        .iter()
        .map(|service| (service.id, Tally::default()))
        .collect();
    for record in records {
        tallies
            .entry(record.service_id)
            .or_default()
            .add(record.is_up);
    }

    tallies
        .into_iter()
        .map(|(service_id, tally)| (service_id, tally.percent()))
        .collect()
}

/// Uptime per configured (team, service) pair, `0.0` where nothing was recorded.
#[must_use]
pub fn team_service_uptime(
    teams: &[team::Model],
    services: &[service::Model],
    records: &[competition_service::Model],
) -> TeamServiceMap<f64> {
    let mut tallies: HashMap<(i64, i64), Tally> = HashMap::new();
    for record in records {
        tallies
            .entry((record.team_id, record.service_id))
            .or_default()
            .add(record.is_up);
    }

    dense_grid(teams, services, |team_id, service_id| {
        tallies
            .get(&(team_id, service_id))
            .copied()
            .unwrap_or_default()
            .percent()
    })
}

fn dense_grid<T>(
    teams: &[team::Model],
    services: &[service::Model],
    mut cell: impl FnMut(i64, i64) -> T,
) -> TeamServiceMap<T> {
    teams
        .iter()
        .map(|team| {
            let row = services
                .iter()
                .map(|service| (service.id, cell(team.id, service.id)))
                .collect();
            (team.id, row)
        })
        .collect()
}

/// Total score of every configured team, ranked.
///
/// Highest score first; equal scores are ordered by name (byte order). Ranks
/// follow the sorted position, so tied teams still get distinct ranks.
#[must_use]
pub fn standings(
    teams: &[team::Model],
    adjustments: &[competition_score::Model],
) -> Vec<TeamStanding> {
    let mut totals: HashMap<i64, i64> = HashMap::new();
    for adjustment in adjustments {
        let total = totals.entry(adjustment.team_id).or_default();
        *total = total.saturating_add(adjustment.score);
    }

    let mut rows: Vec<(i64, &str, i64)> = teams
        .iter()
        .map(|team| {
            (
                team.id,
                team.name.as_str(),
                totals.get(&team.id).copied().unwrap_or(0),
            )
        })
        .collect();
    rows.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(b.1)));

    rows.into_iter()
        .enumerate()
        .map(|(index, (team_id, name, points))| TeamStanding {
            team_id,
            name: name.to_string(),
            points,
            rank: index + 1,
        })
        .collect()
}

/// Points per (round, team), ascending by round then team id.
///
/// Adjustments without a round count towards the standings but not here.
#[must_use]
pub fn round_series(adjustments: &[competition_score::Model]) -> Vec<RoundScore> {
    let mut sums: BTreeMap<(i64, i64), i64> = BTreeMap::new();
    for adjustment in adjustments {
        if let Some(round) = adjustment.round {
            let sum = sums.entry((round, adjustment.team_id)).or_default();
            *sum = sum.saturating_add(adjustment.score);
        }
    }

    sums.into_iter()
        .map(|((round, team_id), points)| RoundScore {
            round,
            team_id,
            points,
        })
        .collect()
}

/// Highest round in the series, clamped to `0..=MAX_ROUND`.
#[must_use]
pub fn max_round(series: &[RoundScore]) -> i64 {
    series
        .iter()
        .map(|score| score.round)
        .max()
        .unwrap_or(0)
        .clamp(0, MAX_ROUND)
}

/// Cumulative score lines for every team, in the order of `teams`.
///
/// Each line holds one point per round `1..=max_round`; rounds a team has no
/// entry for add nothing but still get a point. Rounds past [`MAX_ROUND`] are
/// left off the chart. Sums saturate instead of overflowing. The y axis is scaled by the
/// largest cumulative value of any team (1 when that is 0). Negative totals
/// are drawn below the baseline.
#[must_use]
#[allow(clippy::cast_precision_loss)] // only affects where a line is drawn
pub fn cumulative_lines(
    teams: &[team::Model],
    series: &[RoundScore],
    geometry: ChartGeometry,
) -> Vec<TeamLine> {
    let last_round = max_round(series);
    let by_round: HashMap<(i64, i64), i64> = series
        .iter()
        .map(|score| ((score.round, score.team_id), score.points))
        .collect();

    let cumulative: Vec<(i64, Vec<i64>)> = teams
        .iter()
        .map(|team| {
            let mut running: i64 = 0;
            let sums = (1..=last_round)
                .map(|round| {
                    running = running
                        .saturating_add(by_round.get(&(round, team.id)).copied().unwrap_or(0));
                    running
                })
                .collect();
            (team.id, sums)
        })
        .collect();

    let peak = cumulative
        .iter()
        .flat_map(|(_, sums)| sums.iter().copied())
        .max()
        .unwrap_or(0)
        .max(0);
    let scale = if peak == 0 { 1 } else { peak };

    let to_x = |round: i64| {
        if last_round <= 1 {
            geometry.left + geometry.width
        } else {
            geometry.left + ((round - 1) as f64 / (last_round - 1) as f64) * geometry.width
        }
    };
    let to_y = |value: i64| geometry.baseline - (value as f64 / scale as f64) * geometry.height;

    cumulative
        .into_iter()
        .map(|(team_id, sums)| {
            let points = sums
                .iter()
                .zip(1..)
                .map(|(&value, round)| PlotPoint {
                    x: to_x(round),
                    y: to_y(value),
                })
                .collect();
            TeamLine {
                team_id,
                cumulative: sums,
                points,
            }
        })
        .collect()
}

/// SVG path data (`M x y L x y ...`) through `points`, one decimal place.
#[must_use]
pub fn svg_path(points: &[PlotPoint]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let command = if index == 0 { 'M' } else { 'L' };
            format!("{command} {:.1} {:.1}", point.x, point.y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
