//! Redaction repair
//!
//! The census publisher suppresses small counts, so the categories of a
//! dimension usually sum to less than the scope's "All Students" total.
//! Repair attributes each shortfall to an "Unknown" category so every
//! dimension reconciles to the total again.
//!
//! Scopes are keyed by school year plus the layer's geographic scope, so a
//! file holding several years never mixes their totals.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::lookup::{StratificationMap, normalize_code};
use crate::models::{ALL_STUDENTS, EnrollmentRecord};

/// Geographic extent over which "All Students" totals are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// One scope for the whole input
    Global,
    /// One scope per county
    County,
    /// One scope per `(district_code, school_code)` pair
    School,
}

/// Geographic part of a scope key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeKey {
    Global,
    County(String),
    School {
        district_code: String,
        school_code: String,
    },
}

/// Reconciliation unit: a geographic scope within one school year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    pub school_year: String,
    pub key: ScopeKey,
}

impl ScopeKind {
    /// Scope a record belongs to
    #[must_use]
    pub fn scope_of(self, record: &EnrollmentRecord) -> Scope {
        let key = match self {
            Self::Global => ScopeKey::Global,
            Self::County => ScopeKey::County(record.county.clone()),
            Self::School => ScopeKey::School {
                district_code: normalize_code(&record.district_code),
                school_code: normalize_code(&record.school_code),
            },
        };
        Scope {
            school_year: record.school_year.clone(),
            key,
        }
    }
}

/// Options for one repair pass
#[derive(Debug, Clone, Copy)]
pub struct RepairOptions {
    pub scope: ScopeKind,
    /// Synthesize a full "Unknown" record for dimensions a scope lacks entirely
    pub backfill_missing_dimensions: bool,
}

/// Counters describing what a repair pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairStats {
    /// New "Unknown" records carrying a shortfall
    pub synthesized: usize,
    /// Existing "Unknown" records that absorbed a shortfall
    pub merged: usize,
    /// "Unknown" records created for dimensions absent from a scope
    pub backfilled: usize,
    /// Dimensions whose known counts exceed the scope total
    pub over_counted: usize,
    /// Dimensions in scopes without an "All Students" row
    pub missing_totals: usize,
    /// Records whose count was not a number
    pub unparseable: usize,
    /// Scopes and dimensions left unreconciled because their sum overflowed
    pub overflowed: usize,
    /// Repaired records left without a stratification label, not counting
    /// merge targets that arrived unlabeled
    pub label_misses: usize,
}

/// Records after repair, synthetic residuals appended after the inputs
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub records: Vec<EnrollmentRecord>,
    pub stats: RepairStats,
}

#[derive(Debug)]
struct DimensionTally {
    known: u64,
    overflowed: bool,
    representative: usize,
    unknown: Option<usize>,
}

/// Repair redacted counts in `records`
///
/// For every scope and dimension (other than "All Students") whose known
/// categories sum below the scope's "All Students" total, the shortfall is
/// added to the dimension's existing "Unknown" record or, when there is none,
/// carried by a new "Unknown" record copied from the first record of that
/// dimension. Existing "Unknown" counts are part of the known sum, so running
/// repair on its own output changes nothing.
///
/// With `backfill_missing_dimensions`, a scope with a positive total that has
/// no record at all for a dimension seen elsewhere in the same school year
/// gets an "Unknown" record carrying the full total.
///
/// A total or dimension whose sum does not fit in a `u64` is left as it is
/// and counted in [`RepairStats::overflowed`].
///
/// Every record created or changed here has its label re-resolved from
/// `labels`.
#[must_use]
pub fn repair(
    mut records: Vec<EnrollmentRecord>,
    options: RepairOptions,
    labels: &StratificationMap,
) -> RepairOutcome {
    let mut stats = RepairStats::default();
    let mut totals: FxHashMap<Scope, u64> = FxHashMap::default();
    let mut total_rows: FxHashMap<Scope, usize> = FxHashMap::default();
    let mut overflowed_totals: FxHashSet<Scope> = FxHashSet::default();
    let mut dimensions: FxHashMap<(Scope, String), DimensionTally> = FxHashMap::default();
    let mut year_dimensions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let count = match record.parsed_count() {
            Some(count) => count,
            None => {
                stats.unparseable += 1;
                debug!(
                    "Unparseable student count {:?} for {} {}, counting as 0",
                    record.student_count, record.school_name, record.group_by
                );
                0
            }
        };
        let scope = options.scope.scope_of(record);

        if record.is_all_students() {
            let total = totals.entry(scope.clone()).or_insert(0);
            match total.checked_add(count) {
                Some(sum) => *total = sum,
                None => {
                    warn!("{ALL_STUDENTS} total for {scope:?} overflows, leaving it unreconciled");
                    overflowed_totals.insert(scope.clone());
                }
            }
            total_rows.entry(scope).or_insert(index);
            continue;
        }

        year_dimensions
            .entry(record.school_year.clone())
            .or_default()
            .insert(record.group_by.clone());
        let tally = dimensions
            .entry((scope, record.group_by.clone()))
            .or_insert(DimensionTally {
                known: 0,
                overflowed: false,
                representative: index,
                unknown: None,
            });
        match tally.known.checked_add(count) {
            Some(sum) => tally.known = sum,
            None => tally.overflowed = true,
        }
        if record.is_unknown() {
            if tally.unknown.is_none() {
                tally.unknown = Some(index);
            } else {
                debug!(
                    "Duplicate Unknown record for {} {}, merging into the first",
                    record.school_name, record.group_by
                );
            }
        }
    }

    let mut touched = Vec::new();
    let mut residuals = Vec::new();

    for ((scope, group_by), tally) in dimensions
        .iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
    {
        let Some(&total) = totals.get(scope) else {
            stats.missing_totals += 1;
            debug!("No {ALL_STUDENTS} total for {scope:?}, cannot reconcile {group_by}");
            continue;
        };
        if tally.overflowed || overflowed_totals.contains(scope) {
            stats.overflowed += 1;
            warn!("Counts for {group_by} in {scope:?} overflow, leaving it unreconciled");
            continue;
        }

        if tally.known > total {
            stats.over_counted += 1;
            debug!(
                "{group_by} in {scope:?} sums to {} above the {ALL_STUDENTS} total {total}",
                tally.known
            );
            continue;
        }
        if tally.known == total {
            continue;
        }

        let shortfall = total - tally.known;
        if let Some(index) = tally.unknown {
            // the existing Unknown is part of `known`, so this stays within `total`
            let record = &mut records[index];
            record.student_count = (record.count() + shortfall).to_string();
            touched.push(index);
            stats.merged += 1;
            debug!(
                "Updated existing unknown record for {scope:?} {group_by} \
                 with difference {shortfall}"
            );
        } else {
            residuals.push(records[tally.representative].unknown_residual(group_by, shortfall));
            stats.synthesized += 1;
            debug!("Added unknown record for {scope:?} {group_by} carrying {shortfall}");
        }
    }

    if options.backfill_missing_dimensions {
        for (scope, &total) in totals.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
            if total == 0 || overflowed_totals.contains(scope) {
                continue;
            }
            let Some(year_groups) = year_dimensions.get(&scope.school_year) else {
                continue;
            };
            let representative = &records[total_rows[scope]];
            for group_by in year_groups {
                if dimensions.contains_key(&(scope.clone(), group_by.clone())) {
                    continue;
                }
                residuals.push(representative.unknown_residual(group_by, total));
                stats.backfilled += 1;
                debug!("Backfilled missing {group_by} for {scope:?} with {total}");
            }
        }
    }

    for index in touched {
        // misses on records that arrived unlabeled are counted by the caller
        let was_labeled = records[index].stratification.is_some();
        if !labels.assign(&mut records[index]) && was_labeled {
            stats.label_misses += 1;
        }
    }
    for mut residual in residuals {
        if !labels.assign(&mut residual) {
            stats.label_misses += 1;
        }
        records.push(residual);
    }

    if stats.over_counted > 0 {
        warn!(
            "{} dimensions sum above their {ALL_STUDENTS} total and were left unchanged",
            stats.over_counted
        );
    }
    info!(
        "Repair added {} unknown records, merged {} and backfilled {}",
        stats.synthesized, stats.merged, stats.backfilled
    );

    RepairOutcome { records, stats }
}
