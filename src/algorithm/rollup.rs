//! Grouping and rollup of repaired records into layer rows

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::models::{AggregatedOutputRow, Layer};

/// Widen a `YYYY-YY` school year to the published `YYYY-20YY` period
///
/// Values without a hyphen are returned unchanged.
#[must_use]
pub fn transform_period(school_year: &str) -> String {
    match school_year.split_once('-') {
        Some((start, end)) => format!("{start}-20{end}"),
        None => school_year.to_string(),
    }
}

/// Identity of one output row within a layer
///
/// Field order gives the published row order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub period: String,
    pub geoid: String,
    pub stratification: String,
}

/// Sums student counts per [`GroupKey`] for one layer
#[derive(Debug)]
pub struct Rollup {
    layer: Layer,
    topic: String,
    /// `None` once a group's sum no longer fits in a `u64`
    groups: FxHashMap<GroupKey, Option<u64>>,
    contributions: usize,
}

/// Rows produced by a rollup
#[derive(Debug, Clone)]
pub struct RollupOutput {
    pub rows: Vec<AggregatedOutputRow>,
    /// Groups whose counts summed to zero and were not emitted
    pub zero_groups_dropped: usize,
    /// Groups whose sum overflowed and were not emitted
    pub overflowed_groups: usize,
    /// Records that fed the rollup
    pub contributions: usize,
}

impl Rollup {
    #[must_use]
    pub fn new(layer: Layer, topic: impl Into<String>) -> Self {
        Self {
            layer,
            topic: topic.into(),
            groups: FxHashMap::default(),
            contributions: 0,
        }
    }

    /// Add one record's count to its group
    pub fn add(&mut self, key: GroupKey, value: u64) {
        let sum = self.groups.entry(key).or_insert(Some(0));
        *sum = sum.and_then(|s| s.checked_add(value));
        self.contributions += 1;
    }

    /// Emit one row per group with a non-zero total, ordered by period, GEOID
    /// and stratification
    #[must_use]
    pub fn finish(self) -> RollupOutput {
        let mut groups: Vec<_> = self.groups.into_iter().collect();
        groups.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        let mut zero_groups_dropped = 0;
        let mut overflowed_groups = 0;
        let mut rows = Vec::with_capacity(groups.len());
        for (key, value) in groups {
            let Some(value) = value else {
                overflowed_groups += 1;
                warn!("Sum for {key:?} overflows, dropping the group");
                continue;
            };
            if value == 0 {
                zero_groups_dropped += 1;
                debug!("Dropping zero-valued group {key:?}");
                continue;
            }
            rows.push(AggregatedOutputRow {
                layer: self.layer.tag().to_string(),
                geoid: key.geoid,
                topic: self.topic.clone(),
                stratification: key.stratification,
                period: key.period,
                value,
            });
        }

        RollupOutput {
            rows,
            zero_groups_dropped,
            overflowed_groups,
            contributions: self.contributions,
        }
    }
}
