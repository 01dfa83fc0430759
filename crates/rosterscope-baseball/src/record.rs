// Enriched player-season records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classify::ConferenceTier;
use crate::geography::Region;

/// Which side of the ball a record describes. A two-way player appears as
/// two independent records, one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Pitcher,
    Hitter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pitcher => "Pitcher",
            Role::Hitter => "Hitter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pitcher" => Ok(Role::Pitcher),
            "hitter" => Ok(Role::Hitter),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Raw counting and rate statistics as read from the source files.
///
/// `walks`, `hits` and `strikeouts` share a column across roles: drawn by a
/// hitter, allowed by a pitcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStats {
    pub games: Option<f64>,
    // pitching
    pub innings: Option<f64>,
    pub era: Option<f64>,
    pub wins: Option<f64>,
    pub losses: Option<f64>,
    pub whip: Option<f64>,
    // shared
    pub strikeouts: Option<f64>,
    pub walks: Option<f64>,
    pub hits: Option<f64>,
    // hitting
    pub at_bats: Option<f64>,
    pub doubles: Option<f64>,
    pub triples: Option<f64>,
    pub home_runs: Option<f64>,
    pub hit_by_pitch: Option<f64>,
    pub sac_flies: Option<f64>,
    pub sac_hits: Option<f64>,
    pub stolen_bases: Option<f64>,
    pub caught_stealing: Option<f64>,
    pub obp: Option<f64>,
    pub slg: Option<f64>,
    pub ops: Option<f64>,
}

/// Statistics derived for hitter rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HittingMetrics {
    pub singles: f64,
    pub total_bases: f64,
    pub t90s: f64,
    pub plate_appearances: f64,
    /// `t90s / plate_appearances`, or 0.0 when there were no plate appearances.
    pub t90_per_pa: f64,
}

/// One player, one season, one role, after normalization and enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeason {
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// League abbreviation.
    pub league: String,
    pub league_name: String,
    pub team: String,
    pub year: i32,
    pub hsplace: String,
    pub city: String,
    /// Two-letter USPS code, always one of the 50 states.
    pub state: String,
    pub region: Region,
    pub conference: ConferenceTier,
    pub is_academic: bool,
    pub position: Option<String>,
    pub bats: Option<String>,
    pub throws: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub stats: RawStats,
    /// Present if and only if `role == Role::Hitter`.
    pub metrics: Option<HittingMetrics>,
    pub draft_year: Option<i32>,
    /// 0 means not drafted.
    pub draft_round: u32,
}

impl PlayerSeason {
    pub fn is_drafted(&self) -> bool {
        self.draft_year.is_some()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
