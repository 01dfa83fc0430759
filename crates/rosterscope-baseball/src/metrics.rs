// Derived hitting metrics: singles, total bases, T90s and T90s per plate
// appearance.

use crate::record::{HittingMetrics, PlayerSeason, RawStats, Role};

fn or_zero(v: Option<f64>) -> f64 {
    v.unwrap_or(0.0)
}

/// Compute derived hitting metrics from raw stats. Missing components count
/// as zero. Singles are not clamped, so inconsistent input can produce a
/// negative value; see [`negative_singles`].
pub fn compute_hitting_metrics(stats: &RawStats) -> HittingMetrics {
    let hits = or_zero(stats.hits);
    let doubles = or_zero(stats.doubles);
    let triples = or_zero(stats.triples);
    let home_runs = or_zero(stats.home_runs);
    let walks = or_zero(stats.walks);
    let hbp = or_zero(stats.hit_by_pitch);

    let singles = hits - doubles - triples - home_runs;
    let total_bases = singles + 2.0 * doubles + 3.0 * triples + 4.0 * home_runs;
    let t90s = total_bases + or_zero(stats.stolen_bases) + walks + hbp;
    let plate_appearances = or_zero(stats.at_bats)
        + walks
        + hbp
        + or_zero(stats.sac_flies)
        + or_zero(stats.sac_hits);
    let t90_per_pa = if plate_appearances > 0.0 {
        t90s / plate_appearances
    } else {
        0.0
    };

    HittingMetrics {
        singles,
        total_bases,
        t90s,
        plate_appearances,
        t90_per_pa,
    }
}

/// Metrics for a record of the given role; pitchers get none.
pub fn metrics_for_role(role: Role, stats: &RawStats) -> Option<HittingMetrics> {
    match role {
        Role::Hitter => Some(compute_hitting_metrics(stats)),
        Role::Pitcher => None,
    }
}

/// Hitter rows whose computed singles are negative (hits fewer than extra
/// base hits). Reported for data-quality review, never corrected.
pub fn negative_singles<'a>(rows: &[&'a PlayerSeason]) -> Vec<&'a PlayerSeason> {
    rows.iter()
        .copied()
        .filter(|r| r.metrics.is_some_and(|m| m.singles < 0.0))
        .collect()
}
