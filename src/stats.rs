//! Small statistics helpers shared by the recommender and the charts scorer

/// Quantile of `values` with linear interpolation between closest ranks
///
/// Non-finite values are ignored. Returns `None` for an empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

/// Same as [`quantile`] for already sorted, finite values
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Score thresholds at the given percentiles
pub fn percentile_buckets(values: &[f64], percentiles: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);
    percentiles
        .iter()
        .map(|&p| quantile_sorted(&sorted, p))
        .collect()
}

/// Map a score onto `[low, high]` by the share of buckets it reaches
pub fn star_rating(score: f64, buckets: &[f64], low: f64, high: f64) -> Option<f64> {
    if buckets.is_empty() || !score.is_finite() {
        return None;
    }
    let reached = buckets.iter().filter(|&&bucket| bucket <= score).count();
    Some(low + (high - low) * reached as f64 / buckets.len() as f64)
}

/// Descending percentile rank of each value, ties share their average rank
///
/// The largest value gets `1/n`, the smallest `1.0`.
pub fn descending_percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // 1-based positions start+1 ..= end
        let average = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = average / n as f64;
        }
        start = end;
    }
    ranks
}
