use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use cricket_insights::records::{BatsmanClusters, Payload, RecordIssue, TeamClusters};
use cricket_insights::source::{Endpoint, StaticFallbackSource, DataSource};
use cricket_insights::views::{batsman_cluster_summary, team_cluster_summary, top_clustered_players};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn sparse_batsman_clusters_average_per_metric() {
    let payload = BatsmanClusters::parse(&read_fixture("batsman_clusters_sparse.json"))
        .expect("fixture should parse");
    assert_eq!(
        payload.issues(),
        &[RecordIssue::MissingField {
            collection: "clusters",
            index: 4,
            field: "player"
        }]
    );

    let summary = batsman_cluster_summary(&payload.clusters);
    let keys: Vec<&str> = summary.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["Anchors", "Hitters", "Cluster 2"]);

    let anchors = &summary[0];
    assert_eq!(anchors.count, 2);
    assert_eq!(anchors.mean("total_runs"), Some(3000.0));
    assert_eq!(anchors.mean("strike_rate"), Some(120.0));
    // Only Alpha carries a boundary rate and an average.
    assert_eq!(anchors.mean("boundary_rate"), Some(10.0));
    assert_eq!(anchors.mean("average"), Some(40.0));

    let hitters = &summary[1];
    assert_eq!(hitters.count, 2);
    assert_eq!(hitters.mean("strike_rate"), Some(155.0));
    assert_eq!(hitters.mean("boundary_rate"), Some(21.0));
}

#[test]
fn fallback_cluster_summaries_match_dashboard_figures() {
    let raw = StaticFallbackSource
        .fetch_raw(Endpoint::BatsmanClusters)
        .unwrap();
    let batsmen = BatsmanClusters::parse(&raw).unwrap();
    let summary = batsman_cluster_summary(&batsmen.clusters);
    assert_eq!(summary.len(), 4);
    let power = summary.iter().find(|g| g.key == "Power Hitters").unwrap();
    assert_eq!(power.count, 2);
    assert_eq!(power.mean("total_runs"), Some(5321.0));
    assert!((power.mean("strike_rate").unwrap() - 148.45).abs() < 1e-9);

    let raw = StaticFallbackSource.fetch_raw(Endpoint::TeamClusters).unwrap();
    let teams = TeamClusters::parse(&raw).unwrap();
    let summary = team_cluster_summary(&teams.clusters);
    let keys: Vec<&str> = summary.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["Balanced Teams", "Batting Heavy", "Bowling Heavy"]);
    assert!((summary[0].mean("win_percentage").unwrap() - 58.95).abs() < 1e-9);
    assert_eq!(summary[2].count, 1);
}

#[test]
fn summary_counts_cover_every_accepted_record() {
    let payload = BatsmanClusters::parse(&read_fixture("batsman_clusters_sparse.json")).unwrap();
    let summary = batsman_cluster_summary(&payload.clusters);
    let total: usize = summary.iter().map(|g| g.count).sum();
    assert_eq!(total, payload.clusters.len());
}

#[test]
fn top_clustered_players_rank_by_runs() {
    let payload = BatsmanClusters::parse(&read_fixture("batsman_clusters_sparse.json")).unwrap();
    let top = top_clustered_players(&payload.clusters, 3);
    let names: Vec<&str> = top.iter().map(|p| p.player.as_str()).collect();
    assert_eq!(names, vec!["A Alpha", "B Beta", "E Eps"]);
}
