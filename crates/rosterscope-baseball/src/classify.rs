// League tier and school classification tables, plus team-name
// disambiguation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conference strength tier derived from the league's full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConferenceTier {
    #[serde(rename = "Power Conference")]
    Power,
    #[serde(rename = "Mid Major")]
    MidMajor,
    #[serde(rename = "Low Major")]
    LowMajor,
}

impl ConferenceTier {
    pub fn label(&self) -> &'static str {
        match self {
            ConferenceTier::Power => "Power Conference",
            ConferenceTier::MidMajor => "Mid Major",
            ConferenceTier::LowMajor => "Low Major",
        }
    }
}

impl fmt::Display for ConferenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const POWER_CONFERENCES: &[&str] = &[
    "Atlantic Coast Conference",
    "Southeastern Conference",
    "Big 12 Conference",
    "Big Ten Conference",
    "Pac-12 Conference",
];

const LOW_MAJOR_CONFERENCES: &[&str] = &[
    "Southwestern Athletic Conference",
    "Mid-Eastern Athletic Conference",
    "Northeast Conference",
    "Metro Atlantic Athletic Conference",
    "Patriot League",
    "America East Conference",
    "Horizon League",
    "Summit League",
    "Ohio Valley Conference",
    "Big South Conference",
    "Atlantic Sun Conference",
    "Southland Conference",
];

const ACADEMIC_SCHOOLS: &[&str] = &[
    "Air Force",
    "Army",
    "Boston College",
    "Brown",
    "Bucknell",
    "California",
    "Columbia",
    "Cornell",
    "Creighton",
    "Dartmouth",
    "Davidson",
    "Duke",
    "Elon",
    "Fordham",
    "Furman",
    "Georgetown",
    "Georgia Tech",
    "Gonzaga",
    "Harvard",
    "Holy Cross",
    "Lafayette",
    "Lehigh",
    "Loyola Marymount",
    "Michigan",
    "Navy",
    "North Carolina",
    "Northeastern",
    "Northwestern",
    "Notre Dame",
    "Penn",
    "Pepperdine",
    "Princeton",
    "Rice",
    "Richmond",
    "Saint Louis",
    "San Diego",
    "Santa Clara",
    "Stanford",
    "Tulane",
    "UC Davis",
    "UC Irvine",
    "UC San Diego",
    "UC Santa Barbara",
    "UCLA",
    "Vanderbilt",
    "Villanova",
    "Virginia",
    "Wake Forest",
    "William & Mary",
    "Yale",
];

/// Tier for a league full name. Total: anything unlisted is Mid Major.
pub fn classify_conference(league_name: &str) -> ConferenceTier {
    if POWER_CONFERENCES.contains(&league_name) {
        ConferenceTier::Power
    } else if LOW_MAJOR_CONFERENCES.contains(&league_name) {
        ConferenceTier::LowMajor
    } else {
        ConferenceTier::MidMajor
    }
}

/// Exact-match membership in the academic school roster.
pub fn classify_academic(team: &str) -> bool {
    ACADEMIC_SCHOOLS.contains(&team)
}

/// Disambiguate team names shared across leagues. Applied at ingestion,
/// before any grouping or display.
pub fn normalize_team_name(team: &str, league: &str) -> String {
    if team == "Miami" && league == "MAC" {
        "Miami-Ohio".to_string()
    } else {
        team.to_string()
    }
}
