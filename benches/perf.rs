use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cricket_insights::aggregate::{Direction, rank_top};
use cricket_insights::records::{BatsmanClusters, OverRecord, Payload, PlayerRecord};
use cricket_insights::views::{batsman_cluster_summary, over_distribution};

const CLUSTER_LABELS: [&str; 4] = [
    "Consistent Players",
    "Power Hitters",
    "Anchor Players",
    "Aggressive Batsmen",
];

fn sample_players(n: usize) -> Vec<PlayerRecord> {
    (0..n)
        .map(|idx| PlayerRecord {
            player: format!("Player {}", idx + 1),
            cluster: Some((idx % 4) as i64),
            cluster_name: CLUSTER_LABELS[idx % 4].to_string(),
            total_runs: Some((idx * 97 % 6000) as f64),
            strike_rate: Some(110.0 + (idx * 13 % 50) as f64),
            boundary_rate: if idx % 9 == 0 {
                None
            } else {
                Some(8.0 + (idx % 14) as f64)
            },
            average: Some(20.0 + (idx % 25) as f64),
            projection: None,
        })
        .collect()
}

fn sample_overs(seasons: usize) -> Vec<OverRecord> {
    (0..seasons * 20)
        .map(|idx| OverRecord {
            over: (idx % 20 + 1) as u32,
            total_runs: Some((idx * 31 % 40) as f64),
            season: Some(2008 + (idx / 20) as i32),
        })
        .collect()
}

fn bench_cluster_summary(c: &mut Criterion) {
    let players = sample_players(5_000);
    c.bench_function("cluster_summary_5k", |b| {
        b.iter(|| {
            let summary = batsman_cluster_summary(black_box(&players));
            black_box(summary.len());
        })
    });
}

fn bench_over_distribution(c: &mut Criterion) {
    let overs = sample_overs(500);
    c.bench_function("over_distribution_10k", |b| {
        b.iter(|| {
            let dist = over_distribution(black_box(&overs));
            black_box(dist.len());
        })
    });
}

fn bench_rank_top(c: &mut Criterion) {
    let players = sample_players(5_000);
    c.bench_function("rank_top_15_of_5k", |b| {
        b.iter(|| {
            let top = rank_top(
                black_box(&players),
                |p| p.total_runs,
                15,
                Direction::Descending,
            );
            black_box(top.len());
        })
    });
}

fn bench_payload_parse(c: &mut Criterion) {
    c.bench_function("batsman_clusters_parse", |b| {
        b.iter(|| {
            let payload = BatsmanClusters::parse(black_box(CLUSTERS_JSON)).unwrap();
            black_box(payload.clusters.len());
        })
    });
}

criterion_group!(
    benches,
    bench_cluster_summary,
    bench_over_distribution,
    bench_rank_top,
    bench_payload_parse
);
criterion_main!(benches);

const CLUSTERS_JSON: &str = include_str!("../data/fallback/batsman_clusters.json");
