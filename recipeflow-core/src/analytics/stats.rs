use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Count occurrences of each non-empty key.
pub fn frequency<'a, I>(keys: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = BTreeMap::new();
    for key in keys {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Pearson correlation of paired samples. None with fewer than two pairs or
/// when either side has no variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x == 0.0 || variance_y == 0.0 {
        return None;
    }
    Some(covariance / (variance_x.sqrt() * variance_y.sqrt()))
}

/// Values a ranking can order. Floats use `total_cmp`, so a stray NaN sorts
/// consistently instead of breaking the sort.
pub trait RankValue {
    fn rank_cmp(&self, other: &Self) -> Ordering;
}

impl RankValue for usize {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl RankValue for f64 {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

/// Sort by value descending, ties by key ascending, and keep the first `limit`.
pub fn ranked<V>(entries: impl IntoIterator<Item = (String, V)>, limit: usize) -> Vec<(String, V)>
where
    V: RankValue,
{
    let mut entries: Vec<(String, V)> = entries.into_iter().collect();
    entries.sort_by(|a, b| b.1.rank_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}
