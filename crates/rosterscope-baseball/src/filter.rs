// Conjunctive filter chain over the enriched table.
//
// A `FilterRequest` is an immutable value object. Every field defaults to
// inactive, and an inactive criterion places no restriction on its
// dimension: an empty selection means "everything", never "nothing".

use serde::Deserialize;
use std::fmt;

use crate::classify::ConferenceTier;
use crate::geography::Region;
use crate::record::{PlayerSeason, Role};
use crate::stats::{StatId, UnknownStat};
use crate::table::{PlayerTable, TableBounds};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    UnknownStat(#[from] UnknownStat),

    #[error("both custom stat filters reference {0}")]
    DuplicateCustomStat(StatId),

    #[error("at most {MAX_CUSTOM_FILTERS} custom stat filters are allowed, got {0}")]
    TooManyCustomStats(usize),

    #[error("draft round {hi} is beyond the last round ({max})")]
    DraftRoundBeyondLimit { hi: u32, max: u32 },

    #[error("invalid {field} range: {lo} > {hi}")]
    InvalidRange { field: &'static str, lo: f64, hi: f64 },

    #[error("failed to parse filter request: {0}")]
    Parse(String),
}

/// Custom stat filters a request may carry.
pub const MAX_CUSTOM_FILTERS: usize = 2;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Inclusive `[lo, hi]` bounds, written as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(T, T)")]
pub struct Span<T> {
    pub lo: T,
    pub hi: T,
}

impl<T> From<(T, T)> for Span<T> {
    fn from((lo, hi): (T, T)) -> Self {
        Span { lo, hi }
    }
}

impl<T: PartialOrd + Copy> Span<T> {
    pub fn new(lo: T, hi: T) -> Self {
        Span { lo, hi }
    }

    pub fn contains(&self, v: T) -> bool {
        self.lo <= v && v <= self.hi
    }

    fn covers(&self, lo: T, hi: T) -> bool {
        self.lo <= lo && self.hi >= hi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum DraftStatus {
    #[default]
    All,
    Drafted,
    Undrafted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">=", alias = "AtLeast")]
    AtLeast,
    #[serde(rename = "<=", alias = "AtMost")]
    AtMost,
}

/// Threshold filter on a single statistic.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StatFilter {
    pub stat: StatId,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl StatFilter {
    fn passes(&self, row: &PlayerSeason) -> bool {
        match self.stat.value(row) {
            Some(v) => match self.comparison {
                Comparison::AtLeast => v >= self.threshold,
                Comparison::AtMost => v <= self.threshold,
            },
            None => false,
        }
    }
}

/// The full set of caller-selected criteria.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterRequest {
    pub roles: Vec<Role>,
    pub leagues: Vec<String>,
    pub teams: Vec<String>,
    pub years: Option<Span<i32>>,
    pub states: Vec<String>,
    pub regions: Vec<Region>,
    pub min_games: f64,
    pub draft_status: DraftStatus,
    pub draft_rounds: Option<Span<u32>>,
    pub positions: Vec<String>,
    pub bats: Vec<String>,
    pub throws: Vec<String>,
    pub height: Option<Span<f64>>,
    pub weight: Option<Span<f64>>,
    pub name: String,
    pub conferences: Vec<ConferenceTier>,
    pub academic_only: bool,
    pub custom: Vec<StatFilter>,
    pub good_players: bool,
}

/// One dimension of the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Role,
    League,
    Team,
    Year,
    State,
    Region,
    MinGames,
    DraftStatus,
    DraftRound,
    Position,
    Bats,
    Throws,
    Height,
    Weight,
    Name,
    Conference,
    AcademicOnly,
    CustomStat(usize),
    GoodPlayers,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::CustomStat(i) => write!(f, "custom stat #{}", i + 1),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Hitters with more than 30 games and T90/PA above .550, or pitchers with
/// more than 30 innings and WHIP under 1.35.
pub fn is_good_player(row: &PlayerSeason) -> bool {
    match row.role {
        Role::Hitter => {
            row.stats.games.is_some_and(|g| g > 30.0)
                && row.metrics.is_some_and(|m| m.t90_per_pa > 0.550)
        }
        Role::Pitcher => {
            row.stats.innings.is_some_and(|ip| ip > 30.0)
                && row.stats.whip.is_some_and(|w| w < 1.35)
        }
    }
}

fn in_selection(selection: &[String], value: &str) -> bool {
    selection.is_empty() || selection.iter().any(|s| s == value)
}

fn in_optional_selection(selection: &[String], value: Option<&str>) -> bool {
    selection.is_empty() || value.is_some_and(|v| selection.iter().any(|s| s == v))
}

/// Range test for nullable columns: a missing value passes only when the
/// range spans everything observed.
fn in_nullable_span(span: &Span<f64>, value: Option<f64>, observed: Option<(f64, f64)>) -> bool {
    match value {
        Some(v) => span.contains(v),
        None => observed.map_or(true, |(lo, hi)| span.covers(lo, hi)),
    }
}

impl FilterRequest {
    /// Parse a request from TOML and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, FilterError> {
        let request: FilterRequest =
            toml::from_str(text).map_err(|e| FilterError::Parse(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Reject contradictory requests: inverted ranges, more than
    /// `MAX_CUSTOM_FILTERS` custom filters, and custom filters naming the
    /// same statistic.
    pub fn validate(&self) -> Result<(), FilterError> {
        if let Some(s) = self.years {
            check_span("year", f64::from(s.lo), f64::from(s.hi))?;
        }
        if let Some(s) = self.draft_rounds {
            check_span("draft round", f64::from(s.lo), f64::from(s.hi))?;
        }
        if let Some(s) = self.height {
            check_span("height", s.lo, s.hi)?;
        }
        if let Some(s) = self.weight {
            check_span("weight", s.lo, s.hi)?;
        }
        if self.custom.len() > MAX_CUSTOM_FILTERS {
            return Err(FilterError::TooManyCustomStats(self.custom.len()));
        }
        for (i, a) in self.custom.iter().enumerate() {
            if self.custom[i + 1..].iter().any(|b| b.stat == a.stat) {
                return Err(FilterError::DuplicateCustomStat(a.stat));
            }
        }
        Ok(())
    }

    /// Reject a draft-round range reaching past the last round of the draft.
    pub fn check_draft_round_limit(&self, max: u32) -> Result<(), FilterError> {
        match self.draft_rounds {
            Some(s) if s.hi > max => Err(FilterError::DraftRoundBeyondLimit { hi: s.hi, max }),
            _ => Ok(()),
        }
    }

    /// Criteria that will restrict rows, in chain order.
    pub fn active_criteria(&self) -> Vec<Criterion> {
        let mut active = Vec::new();
        let mut push = |on: bool, c: Criterion| {
            if on {
                active.push(c);
            }
        };
        push(!self.roles.is_empty(), Criterion::Role);
        push(!self.leagues.is_empty(), Criterion::League);
        push(!self.teams.is_empty(), Criterion::Team);
        push(self.years.is_some(), Criterion::Year);
        push(!self.states.is_empty(), Criterion::State);
        push(!self.regions.is_empty(), Criterion::Region);
        push(self.min_games > 0.0, Criterion::MinGames);
        push(self.draft_status != DraftStatus::All, Criterion::DraftStatus);
        push(self.draft_rounds.is_some(), Criterion::DraftRound);
        push(!self.positions.is_empty(), Criterion::Position);
        push(!self.bats.is_empty(), Criterion::Bats);
        push(!self.throws.is_empty(), Criterion::Throws);
        push(self.height.is_some(), Criterion::Height);
        push(self.weight.is_some(), Criterion::Weight);
        push(!self.name.trim().is_empty(), Criterion::Name);
        push(!self.conferences.is_empty(), Criterion::Conference);
        push(self.academic_only, Criterion::AcademicOnly);
        for i in 0..self.custom.len() {
            push(true, Criterion::CustomStat(i));
        }
        push(self.good_players, Criterion::GoodPlayers);
        active
    }

    /// Whether `row` satisfies a single criterion. Inactive criteria pass.
    pub fn passes(&self, criterion: Criterion, row: &PlayerSeason, bounds: &TableBounds) -> bool {
        match criterion {
            Criterion::Role => self.roles.is_empty() || self.roles.contains(&row.role),
            Criterion::League => in_selection(&self.leagues, &row.league),
            Criterion::Team => in_selection(&self.teams, &row.team),
            Criterion::Year => self.years.map_or(true, |s| s.contains(row.year)),
            Criterion::State => in_selection(&self.states, &row.state),
            Criterion::Region => self.regions.is_empty() || self.regions.contains(&row.region),
            Criterion::MinGames => {
                self.min_games <= 0.0 || row.stats.games.is_some_and(|g| g >= self.min_games)
            }
            Criterion::DraftStatus => match self.draft_status {
                DraftStatus::All => true,
                DraftStatus::Drafted => row.is_drafted(),
                DraftStatus::Undrafted => !row.is_drafted(),
            },
            Criterion::DraftRound => self.draft_rounds.map_or(true, |s| s.contains(row.draft_round)),
            Criterion::Position => in_optional_selection(&self.positions, row.position.as_deref()),
            Criterion::Bats => in_optional_selection(&self.bats, row.bats.as_deref()),
            Criterion::Throws => in_optional_selection(&self.throws, row.throws.as_deref()),
            Criterion::Height => self
                .height
                .map_or(true, |s| in_nullable_span(&s, row.height, bounds.height)),
            Criterion::Weight => self
                .weight
                .map_or(true, |s| in_nullable_span(&s, row.weight, bounds.weight)),
            Criterion::Name => {
                let needle = self.name.trim().to_lowercase();
                needle.is_empty()
                    || row.first_name.to_lowercase().contains(&needle)
                    || row.last_name.to_lowercase().contains(&needle)
            }
            Criterion::Conference => {
                self.conferences.is_empty() || self.conferences.contains(&row.conference)
            }
            Criterion::AcademicOnly => !self.academic_only || row.is_academic,
            Criterion::CustomStat(i) => self.custom.get(i).map_or(true, |f| f.passes(row)),
            Criterion::GoodPlayers => !self.good_players || is_good_player(row),
        }
    }

    /// The first active criterion that excludes `row`, or `None` if it passes
    /// the whole chain.
    pub fn first_failing(&self, row: &PlayerSeason, bounds: &TableBounds) -> Option<Criterion> {
        self.active_criteria()
            .into_iter()
            .find(|c| !self.passes(*c, row, bounds))
    }

    pub fn matches(&self, row: &PlayerSeason, bounds: &TableBounds) -> bool {
        self.first_failing(row, bounds).is_none()
    }

    /// Apply the chain to `table`, preserving table order.
    pub fn apply<'a>(&self, table: &'a PlayerTable) -> Vec<&'a PlayerSeason> {
        let active = self.active_criteria();
        let bounds = table.bounds();
        table
            .rows()
            .iter()
            .filter(|row| active.iter().all(|c| self.passes(*c, row, bounds)))
            .collect()
    }
}

fn check_span(field: &'static str, lo: f64, hi: f64) -> Result<(), FilterError> {
    if lo > hi {
        return Err(FilterError::InvalidRange { field, lo, hi });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
