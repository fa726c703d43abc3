use crate::source::Endpoint;

const OVERVIEW: &str = include_str!("../data/fallback/overview.json");
const TEAM_PERFORMANCE: &str = include_str!("../data/fallback/team_performance.json");
const VENUE_ANALYSIS: &str = include_str!("../data/fallback/venue_analysis.json");
const PLAYER_STATS: &str = include_str!("../data/fallback/player_stats.json");
const SEASON_TRENDS: &str = include_str!("../data/fallback/season_trends.json");
const MATCH_DETAILS: &str = include_str!("../data/fallback/match_details.json");
const BATSMAN_CLUSTERS: &str = include_str!("../data/fallback/batsman_clusters.json");
const TEAM_CLUSTERS: &str = include_str!("../data/fallback/team_clusters.json");

pub fn fallback_json(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Overview => OVERVIEW,
        Endpoint::TeamPerformance => TEAM_PERFORMANCE,
        Endpoint::VenueAnalysis => VENUE_ANALYSIS,
        Endpoint::PlayerStats => PLAYER_STATS,
        Endpoint::SeasonTrends => SEASON_TRENDS,
        Endpoint::MatchDetails => MATCH_DETAILS,
        Endpoint::BatsmanClusters => BATSMAN_CLUSTERS,
        Endpoint::TeamClusters => TEAM_CLUSTERS,
    }
}
