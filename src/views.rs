use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{
    ClusterSummary, Direction, Distribution, Metric, derive_rate, group_and_average,
    quantile_summary, rank_top, rate,
};
use crate::display::round_to;
use crate::records::{
    BatsmanRecord, BowlerRecord, CategoryCount, CityMatches, OverRecord, PlayerRecord,
    PlayerScatter, SeasonWins, TeamClusterRecord, TeamRecord, VenueRecord,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatsmanRow {
    pub player: String,
    pub full_name: String,
    pub total_runs: Option<f64>,
    pub fours: Option<f64>,
    pub sixes: Option<f64>,
    /// Approximation from dismissals; the feed carries no balls faced.
    pub strike_rate: f64,
    pub boundaries: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BowlerRow {
    pub player: String,
    pub full_name: String,
    pub wickets: Option<f64>,
    pub runs_conceded: Option<f64>,
    pub balls_bowled: Option<f64>,
    pub economy: f64,
    pub balls_per_wicket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamWinRate {
    pub team: String,
    /// Mean across the team's rows, rounded to two decimals.
    pub win_percentage: Option<f64>,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonPivot {
    pub season: i32,
    pub wins: Vec<(String, Option<f64>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VenueTotals {
    pub cities: usize,
    pub total_matches: f64,
    pub mean_per_city: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPeak {
    pub season: i32,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamTotals {
    pub best_win_percentage: Option<f64>,
    pub mean_matches: f64,
    pub mean_wins: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub label: String,
    pub count: Option<f64>,
    /// Fraction of the total, 0.0..=1.0.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub player: String,
    pub cluster_name: String,
    pub x: f64,
    pub y: f64,
}

fn batsman_metrics() -> [Metric<PlayerRecord>; 4] {
    [
        Metric::new("total_runs", |r: &PlayerRecord| r.total_runs),
        Metric::new("strike_rate", |r: &PlayerRecord| r.strike_rate),
        Metric::new("boundary_rate", |r: &PlayerRecord| r.boundary_rate),
        Metric::new("average", |r: &PlayerRecord| r.average),
    ]
}

fn team_cluster_metrics() -> [Metric<TeamClusterRecord>; 4] {
    [
        Metric::new("win_percentage", |r: &TeamClusterRecord| r.win_percentage),
        Metric::new("avg_runs_per_match", |r: &TeamClusterRecord| r.avg_runs_per_match),
        Metric::new("six_rate", |r: &TeamClusterRecord| r.six_rate),
        Metric::new("wicket_rate", |r: &TeamClusterRecord| r.wicket_rate),
    ]
}

pub fn batsman_cluster_summary(records: &[PlayerRecord]) -> Vec<ClusterSummary<String>> {
    group_and_average(records, |r| r.cluster_name.clone(), &batsman_metrics())
}

pub fn team_cluster_summary(records: &[TeamClusterRecord]) -> Vec<ClusterSummary<String>> {
    group_and_average(records, |r| r.cluster_name.clone(), &team_cluster_metrics())
}

/// 2-D projection of every clustered player that carries coordinates.
pub fn cluster_projection(records: &[PlayerRecord]) -> Vec<ProjectedPoint> {
    records
        .iter()
        .filter_map(|r| {
            let (x, y) = r.projection?;
            Some(ProjectedPoint {
                player: r.player.clone(),
                cluster_name: r.cluster_name.clone(),
                x,
                y,
            })
        })
        .collect()
}

pub fn over_distribution(records: &[OverRecord]) -> Vec<Distribution<u32>> {
    quantile_summary(records, |r| Some(r.over), |r| r.total_runs)
}

/// Same as [`over_distribution`], restricted to one season.
pub fn over_distribution_for_season(records: &[OverRecord], season: i32) -> Vec<Distribution<u32>> {
    quantile_summary(
        records,
        |r| (r.season == Some(season)).then_some(r.over),
        |r| r.total_runs,
    )
}

pub fn batsman_rows(records: &[BatsmanRecord]) -> Vec<BatsmanRow> {
    records
        .iter()
        .map(|r| BatsmanRow {
            player: short_name(&r.player).to_string(),
            full_name: r.player.clone(),
            total_runs: r.total_runs,
            fours: r.fours,
            sixes: r.sixes,
            strike_rate: derive_rate(
                r,
                |r| r.total_runs.map(|runs| runs * 100.0),
                |r| r.dismissals.map(|d| d * 4.0 + 100.0),
            ),
            boundaries: match (r.fours, r.sixes) {
                (None, None) => None,
                (fours, sixes) => Some(fours.unwrap_or(0.0) + sixes.unwrap_or(0.0)),
            },
        })
        .collect()
}

pub fn bowler_rows(records: &[BowlerRecord]) -> Vec<BowlerRow> {
    records
        .iter()
        .map(|r| BowlerRow {
            player: short_name(&r.player).to_string(),
            full_name: r.player.clone(),
            wickets: r.wickets,
            runs_conceded: r.runs_conceded,
            balls_bowled: r.balls_bowled,
            economy: derive_rate(r, |r| r.runs_conceded, |r| r.balls_bowled.map(|b| b / 6.0)),
            balls_per_wicket: derive_rate(r, |r| r.balls_bowled, |r| r.wickets),
        })
        .collect()
}

pub fn top_batsmen(records: &[BatsmanRecord], n: usize) -> Vec<BatsmanRecord> {
    rank_top(records, |r| r.total_runs, n, Direction::Descending)
}

pub fn top_bowlers(records: &[BowlerRecord], n: usize) -> Vec<BowlerRecord> {
    rank_top(records, |r| r.wickets, n, Direction::Descending)
}

/// Most economical bowlers first.
pub fn economy_leaders(rows: &[BowlerRow], n: usize) -> Vec<BowlerRow> {
    rank_top(
        rows,
        |r| (r.balls_bowled.unwrap_or(0.0) > 0.0).then_some(r.economy),
        n,
        Direction::Ascending,
    )
}

pub fn top_clustered_players(records: &[PlayerRecord], n: usize) -> Vec<PlayerRecord> {
    rank_top(records, |r| r.total_runs, n, Direction::Descending)
}

pub fn top_cities(records: &[CityMatches], n: usize) -> Vec<CityMatches> {
    rank_top(records, |r| r.match_count, n, Direction::Descending)
}

pub fn top_venues(records: &[VenueRecord], n: usize) -> Vec<VenueRecord> {
    rank_top(records, |r| r.total_matches, n, Direction::Descending)
}

/// Fastest scorers of the runs-vs-rate scatter.
pub fn top_scatter(records: &[PlayerScatter], n: usize) -> Vec<PlayerScatter> {
    rank_top(records, |r| r.avg_runs_per_ball, n, Direction::Descending)
}

/// Mean win percentage per team, best first.
pub fn team_win_rates(records: &[TeamRecord], n: usize) -> Vec<TeamWinRate> {
    let metrics = [Metric::new("win_percentage", |r: &TeamRecord| r.win_percentage)];
    let rows: Vec<TeamWinRate> = group_and_average(records, |r| normalize_team(&r.team), &metrics)
        .into_iter()
        .map(|g| TeamWinRate {
            win_percentage: g.mean("win_percentage").map(|v| round_to(v, 2)),
            rows: g.count,
            team: g.key,
        })
        .collect();
    rank_top(&rows, |r| r.win_percentage, n, Direction::Descending)
}

/// Wins per team for each season, oldest season first. Teams keep their
/// first-seen order within a season; a repeated `(season, team)` pair keeps
/// the last value.
pub fn wins_by_season(records: &[SeasonWins]) -> Vec<SeasonPivot> {
    let mut seasons: BTreeMap<i32, Vec<(String, Option<f64>)>> = BTreeMap::new();
    for r in records {
        let wins = seasons.entry(r.season).or_default();
        match wins.iter_mut().find(|(team, _)| *team == r.team) {
            Some(slot) => slot.1 = r.wins,
            None => wins.push((r.team.clone(), r.wins)),
        }
    }
    seasons
        .into_iter()
        .map(|(season, wins)| SeasonPivot { season, wins })
        .collect()
}

pub fn venue_totals(records: &[CityMatches]) -> VenueTotals {
    VenueTotals {
        cities: records.len(),
        total_matches: records.iter().filter_map(|r| r.match_count).sum(),
        mean_per_city: mean_over_rows(records.iter().map(|r| r.match_count), records.len()),
    }
}

pub fn team_totals(records: &[TeamRecord]) -> TeamTotals {
    let best_win_percentage = rank_top(records, |r| r.win_percentage, 1, Direction::Descending)
        .first()
        .and_then(|r| r.win_percentage);
    TeamTotals {
        best_win_percentage,
        mean_matches: mean_over_rows(records.iter().map(|r| r.total_matches), records.len()),
        mean_wins: mean_over_rows(records.iter().map(|r| r.wins), records.len()),
    }
}

/// Season holding the highest value; the earliest listed wins ties.
pub fn trend_peak<T, S, V>(rows: &[T], season: S, value: V) -> Option<TrendPeak>
where
    T: Clone,
    S: Fn(&T) -> i32,
    V: Fn(&T) -> Option<f64>,
{
    let top = rank_top(rows, &value, 1, Direction::Descending);
    let row = top.first()?;
    Some(TrendPeak {
        season: season(row),
        value: value(row)?,
    })
}

pub fn category_shares(records: &[CategoryCount]) -> Vec<CategoryShare> {
    let total: f64 = records.iter().filter_map(|r| r.count).sum();
    records
        .iter()
        .map(|r| CategoryShare {
            label: r.label.clone(),
            count: r.count,
            share: r.count.map(|c| rate(c, total)).unwrap_or(0.0),
        })
        .collect()
}

/// Last whitespace-separated token, used as the chart label.
pub fn short_name(full: &str) -> &str {
    full.split_whitespace().last().unwrap_or(full)
}

fn normalize_team(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Headline averages divide by every row; a missing field adds nothing.
fn mean_over_rows(values: impl Iterator<Item = Option<f64>>, rows: usize) -> f64 {
    rate(values.flatten().sum(), rows as f64)
}
