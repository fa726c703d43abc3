use anyhow::{Context, Result};
use env_logger::Env;
use log::warn;

use cricket_insights::aggregate::ClusterSummary;
use cricket_insights::config::Config;
use cricket_insights::display::{one_decimal, opt_one_decimal, opt_whole, two_decimals, whole};
use cricket_insights::records::{
    BatsmanClusters, MatchDetails, Overview, PlayerStats, SeasonTrends, TeamClusters,
    TeamPerformance, VenueAnalysis,
};
use cricket_insights::source::{
    DataSource, Loaded, Origin, RemoteSource, SourceChain, StaticFallbackSource,
};
use cricket_insights::views;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Overview,
    Teams,
    Venues,
    Players,
    Trends,
    Clusters,
    Overs,
    All,
}

impl View {
    fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overview" => Some(View::Overview),
            "teams" => Some(View::Teams),
            "venues" => Some(View::Venues),
            "players" => Some(View::Players),
            "trends" => Some(View::Trends),
            "clusters" | "clustering" => Some(View::Clusters),
            "overs" | "details" => Some(View::Overs),
            "all" => Some(View::All),
            _ => None,
        }
    }

    fn includes(self, other: View) -> bool {
        self == View::All || self == other
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut cfg = Config::from_env();
    if args.iter().any(|a| a == "--offline") {
        cfg.offline = true;
    }
    if let Some(n) = parse_value_arg(&args, "--top") {
        cfg.top_n = n
            .trim()
            .parse::<usize>()
            .context("--top expects a number")?
            .clamp(1, 50);
    }
    let view = match parse_value_arg(&args, "--view") {
        Some(name) => View::from_name(&name).with_context(|| format!("unknown view `{name}`"))?,
        None => View::All,
    };

    let remote = if cfg.offline {
        None
    } else {
        match RemoteSource::new(&cfg) {
            Ok(remote) => Some(remote),
            Err(err) => {
                warn!("remote source unavailable: {err:#}");
                None
            }
        }
    };
    let fallback = StaticFallbackSource;
    let chain = SourceChain::new(remote.as_ref().map(|r| r as &dyn DataSource), &fallback);

    if view.includes(View::Overview) {
        print_overview(&chain.load::<Overview>()?);
    }
    if view.includes(View::Teams) {
        print_teams(&chain.load::<TeamPerformance>()?, cfg.top_n);
    }
    if view.includes(View::Venues) {
        print_venues(&chain.load::<VenueAnalysis>()?, cfg.top_n);
    }
    if view.includes(View::Players) {
        print_players(&chain.load::<PlayerStats>()?, cfg.top_n);
    }
    if view.includes(View::Trends) {
        print_trends(&chain.load::<SeasonTrends>()?);
    }
    if view.includes(View::Clusters) {
        let (batsmen, teams) = chain.load_pair::<BatsmanClusters, TeamClusters>();
        print_clusters(&batsmen?, &teams?, cfg.top_n);
    }
    if view.includes(View::Overs) {
        print_overs(&chain.load::<MatchDetails>()?, cfg.top_n);
    }

    Ok(())
}

/// Accepts both `--name=value` and `--name value`.
fn parse_value_arg(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    None
}

fn print_header<P>(title: &str, loaded: &Loaded<P>) {
    println!();
    println!("== {title} ==");
    let stamp = loaded.fetched_at.format("%Y-%m-%d %H:%M:%S UTC");
    match (&loaded.origin, &loaded.primary_error) {
        (Origin::Fallback, Some(err)) => {
            println!("source: {} at {stamp} (backend failed: {err})", loaded.source)
        }
        _ => println!("source: {} at {stamp}", loaded.source),
    }
}

fn print_overview(loaded: &Loaded<Overview>) {
    print_header("Overview", loaded);
    let o = &loaded.payload;
    println!("Matches:    {}", opt_whole(o.total_matches));
    println!("Seasons:    {}", opt_whole(o.total_seasons));
    println!("Teams:      {}", opt_whole(o.total_teams));
    println!("Deliveries: {}", opt_whole(o.total_deliveries));
}

fn print_teams(loaded: &Loaded<TeamPerformance>, top_n: usize) {
    print_header("Team performance", loaded);
    let p = &loaded.payload;

    let totals = views::team_totals(&p.team_stats);
    println!(
        "Best win rate: {}%   avg matches: {}   avg wins: {}",
        opt_one_decimal(totals.best_win_percentage),
        whole(totals.mean_matches),
        whole(totals.mean_wins)
    );

    println!();
    println!("{:<32} {:>8} {:>6}", "Team", "Win %", "Rows");
    for row in views::team_win_rates(&p.team_stats, top_n) {
        println!(
            "{:<32} {:>8} {:>6}",
            row.team,
            row.win_percentage.map(two_decimals).unwrap_or_else(|| "-".to_string()),
            row.rows
        );
    }

    let pivot = views::wins_by_season(&p.wins_by_season);
    if !pivot.is_empty() {
        println!();
        println!("Wins by season:");
        for season in pivot.iter().rev().take(5).rev() {
            let teams = season
                .wins
                .iter()
                .map(|(team, wins)| format!("{team} {}", opt_whole(*wins)))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {}: {teams}", season.season);
        }
    }
}

fn print_venues(loaded: &Loaded<VenueAnalysis>, top_n: usize) {
    print_header("Venues", loaded);
    let p = &loaded.payload;
    let totals = views::venue_totals(&p.city_matches);
    println!(
        "Cities: {}   matches: {}   per city: {}",
        totals.cities,
        whole(totals.total_matches),
        whole(totals.mean_per_city)
    );
    println!();
    for city in views::top_cities(&p.city_matches, top_n) {
        println!("{:<24} {:>6}", city.city, opt_whole(city.match_count));
    }
    for (title, counts) in [("Toss decisions", &p.toss_decisions), ("Results", &p.result_types)] {
        if counts.is_empty() {
            continue;
        }
        println!();
        println!("{title}:");
        for share in views::category_shares(counts) {
            println!(
                "  {:<12} {:>6} {:>6}%",
                share.label,
                opt_whole(share.count),
                one_decimal(share.share * 100.0)
            );
        }
    }
}

fn print_players(loaded: &Loaded<PlayerStats>, top_n: usize) {
    print_header("Players", loaded);
    let p = &loaded.payload;

    println!("{:<20} {:>6} {:>5} {:>5} {:>7} {:>6}", "Batsman", "Runs", "4s", "6s", "SR~", "Bdry");
    let batsmen = views::top_batsmen(&p.top_batsmen, top_n);
    for row in views::batsman_rows(&batsmen) {
        println!(
            "{:<20} {:>6} {:>5} {:>5} {:>7} {:>6}",
            row.full_name,
            opt_whole(row.total_runs),
            opt_whole(row.fours),
            opt_whole(row.sixes),
            one_decimal(row.strike_rate),
            opt_whole(row.boundaries)
        );
    }

    println!();
    println!("{:<20} {:>5} {:>6} {:>6} {:>6} {:>7}", "Bowler", "Wkts", "Runs", "Balls", "Econ", "B/W");
    let bowlers = views::top_bowlers(&p.top_bowlers, top_n);
    for row in views::bowler_rows(&bowlers) {
        println!(
            "{:<20} {:>5} {:>6} {:>6} {:>6} {:>7}",
            row.full_name,
            opt_whole(row.wickets),
            opt_whole(row.runs_conceded),
            opt_whole(row.balls_bowled),
            two_decimals(row.economy),
            one_decimal(row.balls_per_wicket)
        );
    }

    let economical = views::economy_leaders(&views::bowler_rows(&p.top_bowlers), 3);
    if !economical.is_empty() {
        let names = economical
            .iter()
            .map(|row| format!("{} {}", row.player, two_decimals(row.economy)))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Most economical: {names}");
    }
}

fn print_trends(loaded: &Loaded<SeasonTrends>) {
    print_header("Season trends", loaded);
    let p = &loaded.payload;
    if let Some(peak) = views::trend_peak(&p.runs_trend, |r| r.season, |r| r.value) {
        println!("Highest scoring season: {} ({} runs per delivery)", peak.season, one_decimal(peak.value));
    }
    if let Some(peak) = views::trend_peak(&p.matches_trend, |r| r.season, |r| r.value) {
        println!("Busiest season: {} ({} matches)", peak.season, whole(peak.value));
    }
    if let Some(peak) = views::trend_peak(&p.boundaries_trend, |r| r.season, |r| r.sixes) {
        println!("Most sixes: {} ({})", peak.season, whole(peak.value));
    }
    println!();
    println!("{:<8} {:>6} {:>6}", "Season", "6s", "4s");
    for row in &p.boundaries_trend {
        println!("{:<8} {:>6} {:>6}", row.season, opt_whole(row.sixes), opt_whole(row.fours));
    }
}

fn print_clusters(batsmen: &Loaded<BatsmanClusters>, teams: &Loaded<TeamClusters>, top_n: usize) {
    print_header("Batsman clusters", batsmen);
    print_summary(
        &views::batsman_cluster_summary(&batsmen.payload.clusters),
        &BATSMAN_CLUSTER_COLUMNS,
    );
    println!();
    println!("Top clustered batsmen:");
    for player in views::top_clustered_players(&batsmen.payload.clusters, top_n) {
        println!(
            "  {:<20} {:<22} {:>6}",
            player.player,
            player.cluster_name,
            opt_whole(player.total_runs)
        );
    }

    let points = views::cluster_projection(&batsmen.payload.clusters);
    if !points.is_empty() {
        println!();
        println!("Projection:");
        for point in points {
            println!(
                "  {:<20} ({:>5}, {:>5}) {}",
                point.player,
                one_decimal(point.x),
                one_decimal(point.y),
                point.cluster_name
            );
        }
    }

    print_header("Team clusters", teams);
    print_summary(
        &views::team_cluster_summary(&teams.payload.clusters),
        &TEAM_CLUSTER_COLUMNS,
    );
}

type MetricFormat = (&'static str, fn(Option<f64>) -> String);

// Runs read as whole numbers, rates and averages to one decimal.
const BATSMAN_CLUSTER_COLUMNS: [MetricFormat; 4] = [
    ("total_runs", opt_whole),
    ("strike_rate", opt_one_decimal),
    ("boundary_rate", opt_one_decimal),
    ("average", opt_one_decimal),
];

const TEAM_CLUSTER_COLUMNS: [MetricFormat; 4] = [
    ("win_percentage", opt_one_decimal),
    ("avg_runs_per_match", opt_one_decimal),
    ("six_rate", opt_one_decimal),
    ("wicket_rate", opt_one_decimal),
];

fn print_summary(groups: &[ClusterSummary<String>], metrics: &[MetricFormat]) {
    let mut header = format!("{:<22} {:>5}", "Cluster", "n");
    for (name, _) in metrics {
        header.push_str(&format!(" {name:>18}"));
    }
    println!("{header}");
    for group in groups {
        println!("{}", summary_row(group, metrics));
    }
}

fn summary_row(group: &ClusterSummary<String>, metrics: &[MetricFormat]) -> String {
    let mut line = format!("{:<22} {:>5}", group.key, group.count);
    for (name, render) in metrics {
        line.push_str(&format!(" {:>18}", render(group.mean(name))));
    }
    line
}

fn print_overs(loaded: &Loaded<MatchDetails>, top_n: usize) {
    print_header("Runs by over", loaded);
    let p = &loaded.payload;
    println!(
        "{:<5} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "Over", "Min", "Q1", "Med", "Q3", "Max", "Avg"
    );
    for d in views::over_distribution(&p.runs_by_over).iter().take(20) {
        println!(
            "{:<5} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
            d.key,
            whole(d.min),
            whole(d.q1),
            whole(d.median),
            whole(d.q3),
            whole(d.max),
            one_decimal(d.mean)
        );
    }

    if !p.player_scatter.is_empty() {
        println!();
        println!("Fastest scorers:");
        for player in views::top_scatter(&p.player_scatter, top_n) {
            println!(
                "  {:<20} {:>6} runs {:>5} per ball {:>4} 6s {:>4} 4s",
                player.player,
                opt_whole(player.total_runs),
                player.avg_runs_per_ball.map(two_decimals).unwrap_or_else(|| "-".to_string()),
                opt_whole(player.sixes),
                opt_whole(player.fours)
            );
        }
    }

    if !p.venue_performance.is_empty() {
        println!();
        println!("Venues:");
        for venue in views::top_venues(&p.venue_performance, top_n) {
            println!(
                "  {:<26} {:>5} {:>6} {:>6}",
                venue.venue,
                opt_whole(venue.total_matches),
                opt_one_decimal(venue.avg_runs_per_delivery),
                opt_one_decimal(venue.six_rate)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cricket_insights::records::{BatsmanClusters, Payload};

    #[test]
    fn batsman_cluster_runs_print_as_whole_numbers() {
        let raw = r#"{"clusters": [
            {"player": "A", "cluster": 1, "cluster_name": "Power Hitters", "total_runs": 5480, "strike_rate": 145.2, "boundary_rate": 18.7, "average": 28.1},
            {"player": "B", "cluster": 1, "cluster_name": "Power Hitters", "total_runs": 5162, "strike_rate": 151.8, "boundary_rate": 20.1, "average": 39.7}
        ]}"#;
        let clusters = BatsmanClusters::parse(raw).unwrap();
        let summary = views::batsman_cluster_summary(&clusters.clusters);
        let cells: Vec<String> = summary_row(&summary[0], &BATSMAN_CLUSTER_COLUMNS)
            .split_whitespace()
            .map(str::to_string)
            .collect();
        // key spans two tokens, then n and the four means
        assert_eq!(cells, vec!["Power", "Hitters", "2", "5321", "148.5", "19.4", "33.9"]);
    }
}
