// Known statistic identifiers. Custom stat filters and leaderboards name a
// column through this enumeration instead of free-form strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::record::PlayerSeason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatId {
    Games,
    InningsPitched,
    Era,
    Wins,
    Losses,
    Whip,
    Strikeouts,
    Walks,
    Hits,
    AtBats,
    Doubles,
    Triples,
    HomeRuns,
    HitByPitch,
    SacFlies,
    SacHits,
    StolenBases,
    CaughtStealing,
    Obp,
    Slg,
    Ops,
    Singles,
    TotalBases,
    T90s,
    PlateAppearances,
    T90PerPa,
    Height,
    Weight,
    DraftRound,
}

impl StatId {
    pub const ALL: [StatId; 29] = [
        StatId::Games,
        StatId::InningsPitched,
        StatId::Era,
        StatId::Wins,
        StatId::Losses,
        StatId::Whip,
        StatId::Strikeouts,
        StatId::Walks,
        StatId::Hits,
        StatId::AtBats,
        StatId::Doubles,
        StatId::Triples,
        StatId::HomeRuns,
        StatId::HitByPitch,
        StatId::SacFlies,
        StatId::SacHits,
        StatId::StolenBases,
        StatId::CaughtStealing,
        StatId::Obp,
        StatId::Slg,
        StatId::Ops,
        StatId::Singles,
        StatId::TotalBases,
        StatId::T90s,
        StatId::PlateAppearances,
        StatId::T90PerPa,
        StatId::Height,
        StatId::Weight,
        StatId::DraftRound,
    ];

    /// Column name as it appears in the source files and the export.
    pub fn column(&self) -> &'static str {
        match self {
            StatId::Games => "G",
            StatId::InningsPitched => "IP",
            StatId::Era => "ERA",
            StatId::Wins => "W",
            StatId::Losses => "L",
            StatId::Whip => "WHIP",
            StatId::Strikeouts => "SO",
            StatId::Walks => "BB",
            StatId::Hits => "H",
            StatId::AtBats => "AB",
            StatId::Doubles => "2B",
            StatId::Triples => "3B",
            StatId::HomeRuns => "HR",
            StatId::HitByPitch => "HBP",
            StatId::SacFlies => "SF",
            StatId::SacHits => "SH",
            StatId::StolenBases => "SB",
            StatId::CaughtStealing => "CS",
            StatId::Obp => "OBP",
            StatId::Slg => "SLG",
            StatId::Ops => "OPS",
            StatId::Singles => "Singles",
            StatId::TotalBases => "TotalBases",
            StatId::T90s => "T90s",
            StatId::PlateAppearances => "PA",
            StatId::T90PerPa => "T90_per_PA",
            StatId::Height => "height",
            StatId::Weight => "weight",
            StatId::DraftRound => "draft_Round",
        }
    }

    /// Read this statistic from a record. `None` when the record has no
    /// value for it, including every derived hitting metric on pitcher rows.
    pub fn value(&self, row: &PlayerSeason) -> Option<f64> {
        let s = &row.stats;
        let m = row.metrics.as_ref();
        match self {
            StatId::Games => s.games,
            StatId::InningsPitched => s.innings,
            StatId::Era => s.era,
            StatId::Wins => s.wins,
            StatId::Losses => s.losses,
            StatId::Whip => s.whip,
            StatId::Strikeouts => s.strikeouts,
            StatId::Walks => s.walks,
            StatId::Hits => s.hits,
            StatId::AtBats => s.at_bats,
            StatId::Doubles => s.doubles,
            StatId::Triples => s.triples,
            StatId::HomeRuns => s.home_runs,
            StatId::HitByPitch => s.hit_by_pitch,
            StatId::SacFlies => s.sac_flies,
            StatId::SacHits => s.sac_hits,
            StatId::StolenBases => s.stolen_bases,
            StatId::CaughtStealing => s.caught_stealing,
            StatId::Obp => s.obp,
            StatId::Slg => s.slg,
            StatId::Ops => s.ops,
            StatId::Singles => m.map(|m| m.singles),
            StatId::TotalBases => m.map(|m| m.total_bases),
            StatId::T90s => m.map(|m| m.t90s),
            StatId::PlateAppearances => m.map(|m| m.plate_appearances),
            StatId::T90PerPa => m.map(|m| m.t90_per_pa),
            StatId::Height => row.height,
            StatId::Weight => row.weight,
            StatId::DraftRound => Some(f64::from(row.draft_round)),
        }
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Unrecognized statistic identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown statistic '{0}'")]
pub struct UnknownStat(pub String);

impl FromStr for StatId {
    type Err = UnknownStat;

    /// Matches column names case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        StatId::ALL
            .into_iter()
            .find(|id| id.column().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStat(wanted.to_string()))
    }
}

impl TryFrom<String> for StatId {
    type Error = UnknownStat;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatId> for String {
    fn from(id: StatId) -> Self {
        id.column().to_string()
    }
}
