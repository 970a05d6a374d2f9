//! Order statistics over repeated trials.

use crate::record::NormalizedRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Latency,
    Cycles,
}

impl Metric {
    pub fn value(self, record: &NormalizedRecord) -> Option<f64> {
        match self {
            Self::Latency => Some(record.latency()),
            Self::Cycles => record.cycles(),
        }
    }
}

/// Median of `values`; sorts in place. Even-length input averages the two middle values.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Percentile `q` in `[0, 100]` of already sorted values, linearly interpolated.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (q.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let t = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * t)
}

/// Central percentile interval of the given width; width 100 spans min..max.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileInterval {
    pub width: f64,
}

impl PercentileInterval {
    pub const FULL: PercentileInterval = PercentileInterval { width: 100.0 };

    pub fn bounds(self, sorted: &[f64]) -> Option<(f64, f64)> {
        let half = self.width.clamp(0.0, 100.0) / 2.0;
        Some((
            percentile(sorted, 50.0 - half)?,
            percentile(sorted, 50.0 + half)?,
        ))
    }
}

impl Default for PercentileInterval {
    fn default() -> Self {
        Self::FULL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeStats {
    pub size: u64,
    pub median: f64,
    pub lo: f64,
    pub hi: f64,
    pub trials: usize,
}

/// Groups records by size (ascending) and reduces each group to median and interval bounds.
/// Records without a value for `metric` are skipped.
pub fn aggregate_by_size<'a>(
    records: impl IntoIterator<Item = &'a NormalizedRecord>,
    metric: Metric,
    interval: PercentileInterval,
) -> Vec<SizeStats> {
    let mut by_size: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
    for r in records {
        if let Some(v) = metric.value(r) {
            by_size.entry(r.size()).or_default().push(v);
        }
    }

    let mut out = Vec::with_capacity(by_size.len());
    for (size, mut values) in by_size {
        let Some(median) = median(&mut values) else {
            continue;
        };
        let Some((lo, hi)) = interval.bounds(&values) else {
            continue;
        };
        out.push(SizeStats {
            size,
            median,
            lo,
            hi,
            trials: values.len(),
        });
    }
    out
}
