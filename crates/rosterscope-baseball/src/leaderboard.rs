// Ranked subsets and grouped counts over a filtered view.

use std::collections::{BTreeMap, HashMap};

use crate::record::PlayerSeason;
use crate::stats::StatId;

// ---------------------------------------------------------------------------
// Top-N
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Largest values first.
    #[default]
    Descending,
    /// Smallest values first (ERA, WHIP).
    Ascending,
}

/// Minimum volume a row needs to appear on a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Qualifier {
    pub stat: StatId,
    pub min: f64,
}

/// The `n` best rows by `stat`. Rows without a value for `stat`, or failing
/// the qualifier, are left out. Ties keep view order.
pub fn top_n<'a>(
    rows: &[&'a PlayerSeason],
    stat: StatId,
    n: usize,
    order: SortOrder,
    qualifier: Option<Qualifier>,
) -> Vec<&'a PlayerSeason> {
    let mut ranked: Vec<(f64, &'a PlayerSeason)> = rows
        .iter()
        .copied()
        .filter(|r| {
            qualifier.map_or(true, |q| q.stat.value(r).is_some_and(|v| v >= q.min))
        })
        .filter_map(|r| stat.value(r).map(|v| (v, r)))
        .collect();

    // sort_by is stable, so equal values keep their view order.
    match order {
        SortOrder::Descending => ranked.sort_by(|a, b| b.0.total_cmp(&a.0)),
        SortOrder::Ascending => ranked.sort_by(|a, b| a.0.total_cmp(&b.0)),
    }
    ranked.truncate(n);
    ranked.into_iter().map(|(_, r)| r).collect()
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Categorical columns rows can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Role,
    League,
    Team,
    Year,
    State,
    Region,
    Conference,
    Position,
}

impl GroupKey {
    pub fn value(&self, row: &PlayerSeason) -> String {
        match self {
            GroupKey::Role => row.role.to_string(),
            GroupKey::League => row.league.clone(),
            GroupKey::Team => row.team.clone(),
            GroupKey::Year => row.year.to_string(),
            GroupKey::State => row.state.clone(),
            GroupKey::Region => row.region.to_string(),
            GroupKey::Conference => row.conference.to_string(),
            GroupKey::Position => row.position.clone().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

impl std::str::FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role" => Ok(GroupKey::Role),
            "league" => Ok(GroupKey::League),
            "team" => Ok(GroupKey::Team),
            "year" => Ok(GroupKey::Year),
            "state" => Ok(GroupKey::State),
            "region" => Ok(GroupKey::Region),
            "conference" => Ok(GroupKey::Conference),
            "position" => Ok(GroupKey::Position),
            other => Err(format!("unknown grouping column '{other}'")),
        }
    }
}

/// Count rows per value of `key`, largest first; ties by value.
pub fn value_counts(rows: &[&PlayerSeason], key: GroupKey) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows {
        *counts.entry(key.value(row)).or_default() += 1;
    }
    let mut out: Vec<_> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Distinct values of `key` in the view, sorted.
pub fn distinct_values(rows: &[&PlayerSeason], key: GroupKey) -> Vec<String> {
    let mut values: Vec<String> = rows.iter().map(|r| key.value(r)).collect();
    values.sort();
    values.dedup();
    values
}

/// Label of the synthetic bucket that absorbs small inner groups.
pub const OTHER_LABEL: &str = "Other";

/// One legend entry: an inner group within an outer group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub outer: String,
    pub inner: String,
    pub count: usize,
}

/// Count rows by `(outer, inner)`. Within an outer group holding more than
/// `keep_top_k + 1` inner groups, keep the `keep_top_k` largest and fold the
/// rest into one "Other" entry carrying their summed count.
///
/// Outer groups come out sorted; inner groups largest first, ties by name,
/// with "Other" last. An inner value that is itself "Other" never takes a
/// top-k slot and always lands in that single trailing entry.
pub fn top_categories_plus_other(
    rows: &[&PlayerSeason],
    outer: GroupKey,
    inner: GroupKey,
    keep_top_k: usize,
) -> Vec<LegendEntry> {
    let mut groups: BTreeMap<String, HashMap<String, usize>> = BTreeMap::new();
    for row in rows {
        *groups
            .entry(outer.value(row))
            .or_default()
            .entry(inner.value(row))
            .or_default() += 1;
    }

    let mut out = Vec::new();
    for (outer_value, mut inner_counts) in groups {
        let total_groups = inner_counts.len();
        let mut other = inner_counts.remove(OTHER_LABEL).unwrap_or(0);

        let mut sorted: Vec<(String, usize)> = inner_counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if total_groups.saturating_sub(1) > keep_top_k {
            other += sorted
                .drain(keep_top_k.min(sorted.len())..)
                .map(|(_, c)| c)
                .sum::<usize>();
        }

        out.extend(sorted.into_iter().map(|(inner_value, count)| LegendEntry {
            outer: outer_value.clone(),
            inner: inner_value,
            count,
        }));
        if other > 0 {
            out.push(LegendEntry {
                outer: outer_value,
                inner: OTHER_LABEL.to_string(),
                count: other,
            });
        }
    }
    out
}
