use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::source::Endpoint;

/// A collection item dropped at the boundary before any transform sees it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIssue {
    #[error("{collection}[{index}]: missing field `{field}`")]
    MissingField {
        collection: &'static str,
        index: usize,
        field: &'static str,
    },
    #[error("{collection}[{index}]: expected an object")]
    NotAnObject {
        collection: &'static str,
        index: usize,
    },
}

/// Typed payload of one endpoint.
pub trait Payload: Sized {
    const ENDPOINT: Endpoint;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self;

    fn issues(&self) -> &[RecordIssue];

    fn parse(raw: &str) -> Result<Self>;
}

macro_rules! payload_parse {
    () => {
        fn parse(raw: &str) -> Result<Self> {
            let root = parse_root(raw, Self::ENDPOINT)?;
            let mut issues = Vec::new();
            let mut out = Self::from_value(&root, &mut issues);
            out.issues = issues;
            Ok(out)
        }

        fn issues(&self) -> &[RecordIssue] {
            &self.issues
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub player: String,
    pub cluster: Option<i64>,
    pub cluster_name: String,
    pub total_runs: Option<f64>,
    pub strike_rate: Option<f64>,
    pub boundary_rate: Option<f64>,
    pub average: Option<f64>,
    pub projection: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamClusterRecord {
    pub team: String,
    pub cluster: Option<i64>,
    pub cluster_name: String,
    pub win_percentage: Option<f64>,
    pub avg_runs_per_match: Option<f64>,
    pub six_rate: Option<f64>,
    pub wicket_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatsmanRecord {
    pub player: String,
    pub total_runs: Option<f64>,
    pub fours: Option<f64>,
    pub sixes: Option<f64>,
    pub dismissals: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BowlerRecord {
    pub player: String,
    pub wickets: Option<f64>,
    pub runs_conceded: Option<f64>,
    pub balls_bowled: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRecord {
    pub team: String,
    pub season: Option<i32>,
    pub total_matches: Option<f64>,
    pub wins: Option<f64>,
    pub win_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonWins {
    pub season: i32,
    pub team: String,
    pub wins: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverRecord {
    pub over: u32,
    pub total_runs: Option<f64>,
    pub season: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueRecord {
    pub venue: String,
    pub city: Option<String>,
    pub total_matches: Option<f64>,
    pub avg_runs_per_delivery: Option<f64>,
    pub six_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityMatches {
    pub city: String,
    pub match_count: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerScatter {
    pub player: String,
    pub innings: Option<f64>,
    pub total_runs: Option<f64>,
    pub avg_runs_per_ball: Option<f64>,
    pub sixes: Option<f64>,
    pub fours: Option<f64>,
}

/// One `(season, value)` point of a season trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonValue {
    pub season: i32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryTrend {
    pub season: i32,
    pub sixes: Option<f64>,
    pub fours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overview {
    pub total_matches: Option<f64>,
    pub total_seasons: Option<f64>,
    pub total_teams: Option<f64>,
    pub total_deliveries: Option<f64>,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamPerformance {
    pub team_stats: Vec<TeamRecord>,
    pub wins_by_season: Vec<SeasonWins>,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueAnalysis {
    pub city_matches: Vec<CityMatches>,
    pub toss_decisions: Vec<CategoryCount>,
    pub result_types: Vec<CategoryCount>,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStats {
    pub top_batsmen: Vec<BatsmanRecord>,
    pub top_bowlers: Vec<BowlerRecord>,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonTrends {
    pub runs_trend: Vec<SeasonValue>,
    pub matches_trend: Vec<SeasonValue>,
    pub boundaries_trend: Vec<BoundaryTrend>,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchDetails {
    pub runs_by_over: Vec<OverRecord>,
    pub player_scatter: Vec<PlayerScatter>,
    pub venue_performance: Vec<VenueRecord>,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatsmanClusters {
    pub clusters: Vec<PlayerRecord>,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamClusters {
    pub clusters: Vec<TeamClusterRecord>,
    pub issues: Vec<RecordIssue>,
}

impl Payload for Overview {
    const ENDPOINT: Endpoint = Endpoint::Overview;

    fn from_value(root: &Value, _issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            total_matches: number(root, "total_matches"),
            total_seasons: number(root, "total_seasons"),
            total_teams: number(root, "total_teams"),
            total_deliveries: number(root, "total_deliveries"),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

impl Payload for TeamPerformance {
    const ENDPOINT: Endpoint = Endpoint::TeamPerformance;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            team_stats: collection(root, "team_stats", issues, parse_team_record),
            wins_by_season: collection(root, "wins_by_season", issues, parse_season_wins),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

impl Payload for VenueAnalysis {
    const ENDPOINT: Endpoint = Endpoint::VenueAnalysis;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            city_matches: collection(root, "city_matches", issues, parse_city_matches),
            toss_decisions: collection(root, "toss_decisions", issues, |v| {
                parse_category(v, "toss_decision")
            }),
            result_types: collection(root, "result_types", issues, |v| parse_category(v, "result")),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

impl Payload for PlayerStats {
    const ENDPOINT: Endpoint = Endpoint::PlayerStats;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            top_batsmen: collection(root, "top_batsmen", issues, parse_batsman),
            top_bowlers: collection(root, "top_bowlers", issues, parse_bowler),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

impl Payload for SeasonTrends {
    const ENDPOINT: Endpoint = Endpoint::SeasonTrends;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            runs_trend: collection(root, "runs_trend", issues, |v| {
                parse_season_value(v, "avg_runs_per_delivery")
            }),
            matches_trend: collection(root, "matches_trend", issues, |v| {
                parse_season_value(v, "total_matches")
            }),
            boundaries_trend: collection(root, "boundaries_trend", issues, parse_boundary_trend),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

impl Payload for MatchDetails {
    const ENDPOINT: Endpoint = Endpoint::MatchDetails;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            runs_by_over: collection(root, "runs_by_over", issues, parse_over),
            player_scatter: collection(root, "player_scatter", issues, parse_player_scatter),
            venue_performance: collection(root, "venue_performance", issues, parse_venue),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

impl Payload for BatsmanClusters {
    const ENDPOINT: Endpoint = Endpoint::BatsmanClusters;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            clusters: collection(root, "clusters", issues, parse_player_record),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

impl Payload for TeamClusters {
    const ENDPOINT: Endpoint = Endpoint::TeamClusters;

    fn from_value(root: &Value, issues: &mut Vec<RecordIssue>) -> Self {
        Self {
            clusters: collection(root, "clusters", issues, parse_team_cluster),
            issues: Vec::new(),
        }
    }

    payload_parse!();
}

fn parse_root(raw: &str, endpoint: Endpoint) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty {} response", endpoint.label()));
    }
    let root: Value = serde_json::from_str(trimmed)
        .with_context(|| format!("invalid {} json", endpoint.label()))?;
    if !root.is_object() {
        return Err(anyhow::anyhow!(
            "{} response is not a json object",
            endpoint.label()
        ));
    }
    Ok(root)
}

/// Parse `root[name]` item by item. Items that fail are logged, recorded in
/// `issues` and dropped; an absent or non-array collection is empty.
fn collection<T, F>(
    root: &Value,
    name: &'static str,
    issues: &mut Vec<RecordIssue>,
    parse: F,
) -> Vec<T>
where
    F: Fn(&Value) -> Result<T, &'static str>,
{
    let Some(items) = root.get(name).and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let outcome = if item.is_object() {
            parse(item).map_err(|field| RecordIssue::MissingField {
                collection: name,
                index,
                field,
            })
        } else {
            Err(RecordIssue::NotAnObject {
                collection: name,
                index,
            })
        };
        match outcome {
            Ok(row) => out.push(row),
            Err(issue) => {
                warn!("dropping record: {issue}");
                issues.push(issue);
            }
        }
    }
    out
}

fn parse_player_record(v: &Value) -> Result<PlayerRecord, &'static str> {
    let player = text(v, "player").ok_or("player")?;
    let cluster = integer(v, "cluster");
    let cluster_name = cluster_label(v, cluster)?;
    let projection = match (number(v, "pca_x"), number(v, "pca_y")) {
        (Some(x), Some(y)) => Some((x, y)),
        _ => None,
    };
    Ok(PlayerRecord {
        player,
        cluster,
        cluster_name,
        total_runs: number_any(v, &["total_runs", "runs"]),
        strike_rate: number(v, "strike_rate"),
        boundary_rate: number(v, "boundary_rate"),
        average: number(v, "average"),
        projection,
    })
}

fn parse_team_cluster(v: &Value) -> Result<TeamClusterRecord, &'static str> {
    let team = text(v, "team").ok_or("team")?;
    let cluster = integer(v, "cluster");
    let cluster_name = cluster_label(v, cluster)?;
    Ok(TeamClusterRecord {
        team,
        cluster,
        cluster_name,
        win_percentage: number(v, "win_percentage"),
        avg_runs_per_match: number(v, "avg_runs_per_match"),
        six_rate: number(v, "six_rate"),
        wicket_rate: number(v, "wicket_rate"),
    })
}

// Unlabelled rows fall back to their numeric cluster id.
fn cluster_label(v: &Value, cluster: Option<i64>) -> Result<String, &'static str> {
    text(v, "cluster_name")
        .or_else(|| cluster.map(|id| format!("Cluster {id}")))
        .ok_or("cluster_name")
}

fn parse_batsman(v: &Value) -> Result<BatsmanRecord, &'static str> {
    Ok(BatsmanRecord {
        player: text(v, "player").ok_or("player")?,
        total_runs: number(v, "total_runs"),
        fours: number(v, "fours"),
        sixes: number(v, "sixes"),
        dismissals: number(v, "dismissals"),
    })
}

fn parse_bowler(v: &Value) -> Result<BowlerRecord, &'static str> {
    Ok(BowlerRecord {
        player: text(v, "player").ok_or("player")?,
        wickets: number(v, "wickets"),
        runs_conceded: number(v, "runs_conceded"),
        balls_bowled: number(v, "balls_bowled"),
    })
}

fn parse_team_record(v: &Value) -> Result<TeamRecord, &'static str> {
    Ok(TeamRecord {
        team: text(v, "team").ok_or("team")?,
        season: season(v, "season"),
        total_matches: number_any(v, &["total_matches", "matches"]),
        wins: number(v, "wins"),
        win_percentage: number(v, "win_percentage"),
    })
}

fn parse_season_wins(v: &Value) -> Result<SeasonWins, &'static str> {
    Ok(SeasonWins {
        season: season(v, "season").ok_or("season")?,
        team: text(v, "team").ok_or("team")?,
        wins: number(v, "wins"),
    })
}

fn parse_over(v: &Value) -> Result<OverRecord, &'static str> {
    let over = number(v, "over")
        .filter(|x| *x >= 0.0 && x.fract() == 0.0 && *x <= u32::MAX as f64)
        .ok_or("over")?;
    Ok(OverRecord {
        over: over as u32,
        total_runs: number(v, "total_runs"),
        season: season(v, "season"),
    })
}

fn parse_venue(v: &Value) -> Result<VenueRecord, &'static str> {
    let city = text(v, "city");
    let venue = text(v, "venue").or_else(|| city.clone()).ok_or("venue")?;
    Ok(VenueRecord {
        venue,
        city,
        total_matches: number(v, "total_matches"),
        avg_runs_per_delivery: number(v, "avg_runs_per_delivery"),
        six_rate: number(v, "six_rate"),
    })
}

fn parse_city_matches(v: &Value) -> Result<CityMatches, &'static str> {
    Ok(CityMatches {
        city: text(v, "city").ok_or("city")?,
        match_count: number(v, "match_count"),
    })
}

fn parse_player_scatter(v: &Value) -> Result<PlayerScatter, &'static str> {
    Ok(PlayerScatter {
        player: text(v, "player").ok_or("player")?,
        innings: number(v, "innings"),
        total_runs: number(v, "total_runs"),
        avg_runs_per_ball: number(v, "avg_runs_per_ball"),
        sixes: number(v, "sixes"),
        fours: number(v, "fours"),
    })
}

fn parse_season_value(v: &Value, field: &'static str) -> Result<SeasonValue, &'static str> {
    Ok(SeasonValue {
        season: season(v, "season").ok_or("season")?,
        value: number(v, field),
    })
}

fn parse_boundary_trend(v: &Value) -> Result<BoundaryTrend, &'static str> {
    Ok(BoundaryTrend {
        season: season(v, "season").ok_or("season")?,
        sixes: number(v, "sixes"),
        fours: number(v, "fours"),
    })
}

fn parse_category(v: &Value, field: &'static str) -> Result<CategoryCount, &'static str> {
    Ok(CategoryCount {
        label: text(v, field).ok_or(field)?,
        count: number(v, "count"),
    })
}

/// Season strings such as `"2007/08"` map to their starting year.
pub fn parse_season(raw: &str) -> Option<i32> {
    let head = raw.trim().split('/').next()?.trim();
    if head.is_empty() {
        return None;
    }
    head.parse::<i32>().ok()
}

fn season(v: &Value, key: &str) -> Option<i32> {
    match v.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .and_then(|x| i32::try_from(x).ok())
            .or_else(|| n.as_f64().filter(|x| x.is_finite()).map(|x| x.trunc() as i32)),
        Value::String(s) => parse_season(s),
        _ => None,
    }
}

/// Numbers are accepted as JSON numbers or numeric strings.
fn number(v: &Value, key: &str) -> Option<f64> {
    let raw = match v.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|x| x.is_finite())
}

fn number_any(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| number(v, key))
}

fn integer(v: &Value, key: &str) -> Option<i64> {
    number(v, key)
        .filter(|x| x.fract() == 0.0)
        .map(|x| x as i64)
}

fn text(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
