use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use log::debug;

/// Value returned by rate calculations whose denominator is zero or missing.
pub const RATE_SENTINEL: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Descending,
    Ascending,
}

/// Named metric extractor. `None` means the record does not carry the metric.
pub struct Metric<T> {
    pub name: &'static str,
    pub extract: fn(&T) -> Option<f64>,
}

impl<T> Metric<T> {
    pub const fn new(name: &'static str, extract: fn(&T) -> Option<f64>) -> Self {
        Self { name, extract }
    }
}

impl<T> Clone for Metric<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Metric<T> {}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricMean {
    pub name: &'static str,
    /// `None` when no member of the group carries the metric.
    pub mean: Option<f64>,
    /// Members that contributed a finite value.
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary<K> {
    pub key: K,
    pub count: usize,
    pub metrics: Vec<MetricMean>,
}

impl<K> ClusterSummary<K> {
    pub fn mean(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.name == name)
            .and_then(|m| m.mean)
    }
}

/// Five-number summary plus mean for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution<K> {
    pub key: K,
    pub samples: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Partition `records` by `group_key` and average every metric per group.
///
/// Groups come back in first-seen order. A metric value that is missing or
/// non-finite is left out of that metric's sum and sample count, but the
/// record still counts as a member of its group.
pub fn group_and_average<T, K, F>(
    records: &[T],
    group_key: F,
    metrics: &[Metric<T>],
) -> Vec<ClusterSummary<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    struct Acc {
        count: usize,
        sums: Vec<f64>,
        samples: Vec<usize>,
    }

    let mut order: Vec<K> = Vec::new();
    let mut groups: HashMap<K, Acc> = HashMap::new();

    for record in records {
        let key = group_key(record);
        let acc = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Acc {
                count: 0,
                sums: vec![0.0; metrics.len()],
                samples: vec![0; metrics.len()],
            }
        });
        acc.count += 1;
        for (idx, metric) in metrics.iter().enumerate() {
            let Some(v) = (metric.extract)(record).filter(|v| v.is_finite()) else {
                continue;
            };
            acc.sums[idx] += v;
            acc.samples[idx] += 1;
        }
    }

    debug!(
        "grouped {} records into {} groups over {} metrics",
        records.len(),
        order.len(),
        metrics.len()
    );

    order
        .into_iter()
        .filter_map(|key| {
            let acc = groups.remove(&key)?;
            let metrics = metrics
                .iter()
                .enumerate()
                .map(|(idx, metric)| {
                    let samples = acc.samples[idx];
                    MetricMean {
                        name: metric.name,
                        mean: (samples > 0).then(|| acc.sums[idx] / samples as f64),
                        samples,
                    }
                })
                .collect();
            Some(ClusterSummary {
                key,
                count: acc.count,
                metrics,
            })
        })
        .collect()
}

/// Per-group min/quartiles/max/mean, sorted ascending by key.
///
/// Quartiles index the ascending sample at `floor(n * p)` with no
/// interpolation, so figures line up with what the dashboard has always shown.
pub fn quantile_summary<T, K, FK, FV>(
    records: &[T],
    group_key: FK,
    value: FV,
) -> Vec<Distribution<K>>
where
    K: Ord,
    FK: Fn(&T) -> Option<K>,
    FV: Fn(&T) -> Option<f64>,
{
    let mut buckets: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for record in records {
        let (Some(key), Some(v)) = (group_key(record), value(record)) else {
            continue;
        };
        if !v.is_finite() {
            continue;
        }
        buckets.entry(key).or_default().push(v);
    }

    debug!(
        "quantile summary over {} records, {} groups",
        records.len(),
        buckets.len()
    );

    buckets
        .into_iter()
        .filter_map(|(key, mut values)| {
            values.sort_by(f64::total_cmp);
            let (&min, &max) = (values.first()?, values.last()?);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some(Distribution {
                samples: values.len(),
                min,
                q1: pick_quantile(&values, 0.25),
                median: pick_quantile(&values, 0.5),
                q3: pick_quantile(&values, 0.75),
                max,
                mean,
                key,
            })
        })
        .collect()
}

fn pick_quantile(sorted: &[f64], p: f64) -> f64 {
    let idx = (sorted.len() as f64 * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Stable sort of a copy of `records` by `metric`, truncated to `n`.
///
/// Records without the metric trail the ranked ones in either direction.
pub fn rank_top<T, F>(records: &[T], metric: F, n: usize, direction: Direction) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<f64>,
{
    let mut keyed: Vec<(Option<f64>, &T)> = records
        .iter()
        .map(|r| (metric(r).filter(|v| v.is_finite()), r))
        .collect();
    keyed.sort_by(|a, b| compare_metric(a.0, b.0, direction));
    keyed.into_iter().take(n).map(|(_, r)| r.clone()).collect()
}

fn compare_metric(a: Option<f64>, b: Option<f64>, direction: Direction) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            Direction::Descending => b.total_cmp(&a),
            Direction::Ascending => a.total_cmp(&b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator == 0.0 {
        return RATE_SENTINEL;
    }
    let r = numerator / denominator;
    if r.is_finite() { r } else { RATE_SENTINEL }
}

/// Ratio of two fields of `record`, or [`RATE_SENTINEL`] when either side is
/// missing or the denominator is zero.
pub fn derive_rate<T, N, D>(record: &T, numerator: N, denominator: D) -> f64
where
    N: Fn(&T) -> Option<f64>,
    D: Fn(&T) -> Option<f64>,
{
    match (numerator(record), denominator(record)) {
        (Some(n), Some(d)) => rate(n, d),
        _ => RATE_SENTINEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        cluster: &'static str,
        runs: Option<f64>,
        balls: Option<f64>,
    }

    fn row(cluster: &'static str, runs: f64) -> Row {
        Row {
            cluster,
            runs: Some(runs),
            balls: None,
        }
    }

    const RUNS: Metric<Row> = Metric::new("runs", |r: &Row| r.runs);
    const BALLS: Metric<Row> = Metric::new("balls", |r: &Row| r.balls);

    #[test]
    fn groups_in_first_seen_order() {
        let rows = vec![row("A", 10.0), row("A", 20.0), row("B", 30.0)];
        let out = group_and_average(&rows, |r| r.cluster, &[RUNS]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].key, "A");
        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].mean("runs"), Some(15.0));
        assert_eq!(out[1].key, "B");
        assert_eq!(out[1].count, 1);
        assert_eq!(out[1].mean("runs"), Some(30.0));
    }

    #[test]
    fn first_seen_order_is_not_sorted_order() {
        let rows = vec![row("Z", 1.0), row("A", 2.0), row("Z", 3.0)];
        let keys: Vec<_> = group_and_average(&rows, |r| r.cluster, &[RUNS])
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["Z", "A"]);
    }

    #[test]
    fn missing_metric_is_excluded_from_its_mean_only() {
        let mut sparse = row("A", 0.0);
        sparse.runs = None;
        sparse.balls = Some(12.0);
        let rows = vec![row("A", 10.0), sparse, row("A", f64::NAN)];
        let out = group_and_average(&rows, |r| r.cluster, &[RUNS, BALLS]);
        assert_eq!(out[0].count, 3);
        assert_eq!(out[0].metrics[0].samples, 1);
        assert_eq!(out[0].mean("runs"), Some(10.0));
        assert_eq!(out[0].mean("balls"), Some(12.0));
    }

    #[test]
    fn metric_absent_from_whole_group_has_no_mean() {
        let rows = vec![row("A", 10.0)];
        let out = group_and_average(&rows, |r| r.cluster, &[RUNS, BALLS]);
        assert_eq!(out[0].mean("balls"), None);
        assert_eq!(out[0].metrics[1].samples, 0);
    }

    #[test]
    fn count_and_mean_match_member_sums() {
        let rows: Vec<Row> = (0..40)
            .map(|i| row(["A", "B", "C"][i % 3], (i * 7 % 11) as f64))
            .collect();
        let out = group_and_average(&rows, |r| r.cluster, &[RUNS]);
        for group in &out {
            let members: Vec<&Row> = rows.iter().filter(|r| r.cluster == group.key).collect();
            assert_eq!(group.count, members.len());
            let sum: f64 = members.iter().filter_map(|r| r.runs).sum();
            let mean = group.mean("runs").unwrap();
            assert!((sum / group.count as f64 - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn transforms_are_deterministic() {
        let rows: Vec<Row> = (0..25)
            .map(|i| row(["A", "B"][i % 2], (i * 13 % 17) as f64))
            .collect();
        let a = group_and_average(&rows, |r| r.cluster, &[RUNS]);
        let b = group_and_average(&rows, |r| r.cluster, &[RUNS]);
        assert_eq!(a, b);
        let qa = quantile_summary(&rows, |r| Some(r.cluster), |r| r.runs);
        let qb = quantile_summary(&rows, |r| Some(r.cluster), |r| r.runs);
        assert_eq!(qa, qb);
    }

    #[test]
    fn empty_inputs_yield_empty_outputs() {
        let rows: Vec<Row> = Vec::new();
        assert!(group_and_average(&rows, |r| r.cluster, &[RUNS]).is_empty());
        assert!(quantile_summary(&rows, |r| Some(r.cluster), |r| r.runs).is_empty());
        assert!(rank_top(&rows, |r| r.runs, 5, Direction::Descending).is_empty());
    }

    #[test]
    fn quartiles_use_floor_index() {
        let rows = vec![(1, 5.0), (1, 15.0), (1, 10.0)];
        let out = quantile_summary(&rows, |r| Some(r.0), |r| Some(r.1));
        assert_eq!(out.len(), 1);
        let d = &out[0];
        assert_eq!(d.key, 1);
        assert_eq!(d.samples, 3);
        assert_eq!((d.min, d.q1, d.median, d.q3, d.max), (5.0, 5.0, 10.0, 15.0, 15.0));
        assert_eq!(d.mean, 10.0);
    }

    #[test]
    fn quartiles_of_even_sample() {
        // n = 4: indices 1, 2, 3.
        let rows = vec![(7, 4.0), (7, 1.0), (7, 3.0), (7, 2.0)];
        let d = &quantile_summary(&rows, |r| Some(r.0), |r| Some(r.1))[0];
        assert_eq!((d.q1, d.median, d.q3), (2.0, 3.0, 4.0));
        assert_eq!(d.mean, 2.5);
    }

    #[test]
    fn quantile_groups_sorted_by_key_and_ordered() {
        let rows: Vec<(u32, f64)> = (0..60)
            .map(|i| ((20 - i % 20) as u32, (i * 37 % 29) as f64))
            .collect();
        let out = quantile_summary(&rows, |r| Some(r.0), |r| Some(r.1));
        assert_eq!(out.len(), 20);
        assert!(out.windows(2).all(|w| w[0].key < w[1].key));
        for d in &out {
            assert!(d.min <= d.q1 && d.q1 <= d.median && d.median <= d.q3 && d.q3 <= d.max);
        }
    }

    #[test]
    fn quantile_skips_missing_values() {
        let rows = vec![(1, Some(4.0)), (1, None), (2, None)];
        let out = quantile_summary(&rows, |r| Some(r.0), |r| r.1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].samples, 1);
        assert_eq!(out[0].median, 4.0);
    }

    #[test]
    fn rank_top_is_bounded_and_sorted() {
        let rows: Vec<Row> = (0..12).map(|i| row("A", (i * 5 % 7) as f64)).collect();
        for n in [0, 3, 12, 40] {
            let top = rank_top(&rows, |r| r.runs, n, Direction::Descending);
            assert_eq!(top.len(), n.min(rows.len()));
            assert!(top.windows(2).all(|w| w[0].runs >= w[1].runs));
            let bottom = rank_top(&rows, |r| r.runs, n, Direction::Ascending);
            assert!(bottom.windows(2).all(|w| w[0].runs <= w[1].runs));
        }
    }

    #[test]
    fn rank_top_ties_keep_input_order() {
        let rows = vec![row("first", 5.0), row("high", 9.0), row("second", 5.0)];
        let top = rank_top(&rows, |r| r.runs, 3, Direction::Descending);
        let order: Vec<_> = top.iter().map(|r| r.cluster).collect();
        assert_eq!(order, vec!["high", "first", "second"]);
    }

    #[test]
    fn rank_top_puts_missing_last_and_leaves_input_alone() {
        let mut missing = row("missing", 0.0);
        missing.runs = None;
        let rows = vec![missing, row("low", 1.0), row("high", 2.0)];
        let snapshot = rows.clone();
        let asc = rank_top(&rows, |r| r.runs, 3, Direction::Ascending);
        assert_eq!(asc.last().unwrap().cluster, "missing");
        let desc = rank_top(&rows, |r| r.runs, 3, Direction::Descending);
        assert_eq!(desc.last().unwrap().cluster, "missing");
        assert_eq!(rows, snapshot);
    }

    #[test]
    fn rates_guard_zero_and_missing_denominators() {
        assert_eq!(rate(36.0, 6.0), 6.0);
        assert_eq!(rate(36.0, 0.0), RATE_SENTINEL);
        assert_eq!(rate(f64::NAN, 4.0), RATE_SENTINEL);
        let r = Row {
            cluster: "A",
            runs: Some(30.0),
            balls: Some(0.0),
        };
        assert_eq!(derive_rate(&r, |r| r.runs, |r| r.balls), RATE_SENTINEL);
        assert_eq!(derive_rate(&r, |r| r.balls, |r| r.runs), 0.0);
        let r = Row { balls: None, ..r };
        assert_eq!(derive_rate(&r, |r| r.runs, |r| r.balls), RATE_SENTINEL);
    }
}
