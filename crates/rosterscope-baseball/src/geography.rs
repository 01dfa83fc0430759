// High-school provenance parsing: "<City>, <State>" into a USPS code and a
// recruiting region.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// State tables
// ---------------------------------------------------------------------------

/// The 50 USPS state codes. No DC, no territories.
pub const STATE_CODES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

/// Full state name (uppercased) to USPS code.
const STATE_NAMES: [(&str, &str); 50] = [
    ("ALABAMA", "AL"),
    ("ALASKA", "AK"),
    ("ARIZONA", "AZ"),
    ("ARKANSAS", "AR"),
    ("CALIFORNIA", "CA"),
    ("COLORADO", "CO"),
    ("CONNECTICUT", "CT"),
    ("DELAWARE", "DE"),
    ("FLORIDA", "FL"),
    ("GEORGIA", "GA"),
    ("HAWAII", "HI"),
    ("IDAHO", "ID"),
    ("ILLINOIS", "IL"),
    ("INDIANA", "IN"),
    ("IOWA", "IA"),
    ("KANSAS", "KS"),
    ("KENTUCKY", "KY"),
    ("LOUISIANA", "LA"),
    ("MAINE", "ME"),
    ("MARYLAND", "MD"),
    ("MASSACHUSETTS", "MA"),
    ("MICHIGAN", "MI"),
    ("MINNESOTA", "MN"),
    ("MISSISSIPPI", "MS"),
    ("MISSOURI", "MO"),
    ("MONTANA", "MT"),
    ("NEBRASKA", "NE"),
    ("NEVADA", "NV"),
    ("NEW HAMPSHIRE", "NH"),
    ("NEW JERSEY", "NJ"),
    ("NEW MEXICO", "NM"),
    ("NEW YORK", "NY"),
    ("NORTH CAROLINA", "NC"),
    ("NORTH DAKOTA", "ND"),
    ("OHIO", "OH"),
    ("OKLAHOMA", "OK"),
    ("OREGON", "OR"),
    ("PENNSYLVANIA", "PA"),
    ("RHODE ISLAND", "RI"),
    ("SOUTH CAROLINA", "SC"),
    ("SOUTH DAKOTA", "SD"),
    ("TENNESSEE", "TN"),
    ("TEXAS", "TX"),
    ("UTAH", "UT"),
    ("VERMONT", "VT"),
    ("VIRGINIA", "VA"),
    ("WASHINGTON", "WA"),
    ("WEST VIRGINIA", "WV"),
    ("WISCONSIN", "WI"),
    ("WYOMING", "WY"),
];

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Multi-state recruiting buckets used for aggregate reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "New England")]
    NewEngland,
    #[serde(rename = "Mid Atlantic")]
    MidAtlantic,
    South,
    #[serde(rename = "Midwest I")]
    MidwestI,
    #[serde(rename = "Midwest II")]
    MidwestII,
    Southwest,
    West,
    Other,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Region::NewEngland,
        Region::MidAtlantic,
        Region::South,
        Region::MidwestI,
        Region::MidwestII,
        Region::Southwest,
        Region::West,
        Region::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Region::NewEngland => "New England",
            Region::MidAtlantic => "Mid Atlantic",
            Region::South => "South",
            Region::MidwestI => "Midwest I",
            Region::MidwestII => "Midwest II",
            Region::Southwest => "Southwest",
            Region::West => "West",
            Region::Other => "Other",
        }
    }

    fn states(&self) -> &'static [&'static str] {
        match self {
            Region::NewEngland => &["CT", "ME", "MA", "NH", "RI", "VT"],
            Region::MidAtlantic => &["NY", "NJ", "PA", "DE", "MD"],
            Region::South => &["VA", "WV", "NC", "SC", "GA", "FL", "AL", "MS", "TN", "KY"],
            Region::MidwestI => &["OH", "MI", "IN", "IL", "WI", "MN", "IA", "MO"],
            Region::MidwestII => &["TX", "OK", "KS", "NE", "SD", "ND", "AR", "LA"],
            Region::Southwest => &["AZ", "NM", "NV", "UT", "CO"],
            Region::West => &["CA", "OR", "WA", "ID", "MT", "WY", "AK", "HI"],
            Region::Other => &[],
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Region for a state code. Total: anything unmapped is `Region::Other`.
pub fn region_for_state(state: &str) -> Region {
    Region::ALL
        .into_iter()
        .find(|r| r.states().contains(&state))
        .unwrap_or(Region::Other)
}

// ---------------------------------------------------------------------------
// Provenance parsing
// ---------------------------------------------------------------------------

/// Split a provenance string on its last comma into `(city, state_token)`.
///
/// The state token is trimmed and uppercased. Without a comma the whole
/// trimmed string becomes the state token and the city is empty.
pub fn split_hsplace(hsplace: &str) -> (String, String) {
    match hsplace.rsplit_once(',') {
        Some((city, state)) => (city.trim().to_string(), state.trim().to_uppercase()),
        None => (String::new(), hsplace.trim().to_uppercase()),
    }
}

/// Map a full state name to its code; other tokens pass through unchanged.
pub fn normalize_state_token(token: &str) -> String {
    STATE_NAMES
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| token.to_string())
}

pub fn is_valid_state(code: &str) -> bool {
    STATE_CODES.contains(&code)
}

/// Parse a provenance string into `(city, state)`, or `None` when it does
/// not name one of the 50 states.
pub fn parse_hsplace(hsplace: &str) -> Option<(String, String)> {
    let (city, token) = split_hsplace(hsplace);
    let state = normalize_state_token(&token);
    is_valid_state(&state).then_some((city, state))
}
