// Ingestion and normalization: two role-specific CSV inputs into one
// enriched table.
//
// Pitcher rows come first, then hitter rows, each in file order. Rows whose
// high-school place does not resolve to one of the 50 states are dropped.

use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::classify::{classify_academic, classify_conference, normalize_team_name};
use crate::geography::{parse_hsplace, region_for_state};
use crate::metrics::metrics_for_role;
use crate::record::{PlayerSeason, RawStats, Role};
use crate::table::PlayerTable;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {input}: {source}")]
    Csv { input: String, source: csv::Error },

    #[error("{input} input is missing required column `{column}`")]
    MalformedInput { input: String, column: String },
}

// ---------------------------------------------------------------------------
// Required columns
// ---------------------------------------------------------------------------

/// Required columns with the header spellings accepted for each.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("teamname", &["teamname", "team", "team_name"]),
    ("year", &["year", "season"]),
];

fn check_required_columns(headers: &csv::StringRecord, input: &str) -> Result<(), IngestError> {
    for (canonical, spellings) in REQUIRED_COLUMNS {
        let present = headers
            .iter()
            .any(|h| spellings.iter().any(|s| h.trim() == *s));
        if !present {
            return Err(IngestError::MalformedInput {
                input: input.to_string(),
                column: canonical.to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

/// One source row. Both inputs share this shape; columns absent from a file
/// deserialize to `None`/empty, and numeric cells that fail to parse become
/// `None` rather than rejecting the row.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, alias = "first_name")]
    firstname: String,
    #[serde(default, alias = "last_name")]
    lastname: String,
    #[serde(default, alias = "league_abbr", alias = "lg")]
    league: String,
    #[serde(default, alias = "leaguename", alias = "league_full_name")]
    league_name: String,
    #[serde(alias = "team", alias = "team_name")]
    teamname: String,
    #[serde(alias = "season", deserialize_with = "lenient_f64")]
    year: Option<f64>,
    #[serde(default)]
    hsplace: String,
    #[serde(default, alias = "pos", deserialize_with = "lenient_string")]
    position: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    bats: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    throws: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    weight: Option<f64>,

    #[serde(default, rename = "G", deserialize_with = "lenient_f64")]
    games: Option<f64>,
    #[serde(default, rename = "IP", deserialize_with = "lenient_f64")]
    innings: Option<f64>,
    #[serde(default, rename = "ERA", deserialize_with = "lenient_f64")]
    era: Option<f64>,
    #[serde(default, rename = "W", deserialize_with = "lenient_f64")]
    wins: Option<f64>,
    #[serde(default, rename = "L", deserialize_with = "lenient_f64")]
    losses: Option<f64>,
    #[serde(default, rename = "WHIP", deserialize_with = "lenient_f64")]
    whip: Option<f64>,
    #[serde(default, rename = "SO", alias = "K", deserialize_with = "lenient_f64")]
    strikeouts: Option<f64>,
    #[serde(default, rename = "BB", deserialize_with = "lenient_f64")]
    walks: Option<f64>,
    #[serde(default, rename = "H", deserialize_with = "lenient_f64")]
    hits: Option<f64>,
    #[serde(default, rename = "AB", deserialize_with = "lenient_f64")]
    at_bats: Option<f64>,
    #[serde(default, rename = "2B", alias = "Dbl", deserialize_with = "lenient_f64")]
    doubles: Option<f64>,
    #[serde(default, rename = "3B", alias = "Tpl", deserialize_with = "lenient_f64")]
    triples: Option<f64>,
    #[serde(default, rename = "HR", deserialize_with = "lenient_f64")]
    home_runs: Option<f64>,
    #[serde(default, rename = "HBP", deserialize_with = "lenient_f64")]
    hit_by_pitch: Option<f64>,
    #[serde(default, rename = "SF", deserialize_with = "lenient_f64")]
    sac_flies: Option<f64>,
    #[serde(default, rename = "SH", deserialize_with = "lenient_f64")]
    sac_hits: Option<f64>,
    #[serde(default, rename = "SB", deserialize_with = "lenient_f64")]
    stolen_bases: Option<f64>,
    #[serde(default, rename = "CS", deserialize_with = "lenient_f64")]
    caught_stealing: Option<f64>,
    #[serde(default, rename = "OBP", deserialize_with = "lenient_f64")]
    obp: Option<f64>,
    #[serde(default, rename = "SLG", deserialize_with = "lenient_f64")]
    slg: Option<f64>,
    #[serde(default, rename = "OPS", deserialize_with = "lenient_f64")]
    ops: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    draft_year: Option<f64>,
    #[serde(default, rename = "draft_Round", alias = "draft_round", deserialize_with = "lenient_f64")]
    draft_round: Option<f64>,
}

/// Parse a numeric cell; empty, unparsable and non-finite cells are `None`.
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn lenient_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_number))
}

fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Row counts from one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounts {
    pub read: usize,
    pub kept: usize,
    pub malformed: usize,
    pub invalid_state: usize,
}

fn draft_round(raw: Option<f64>) -> u32 {
    match raw {
        Some(v) if v >= 0.0 && v <= f64::from(u32::MAX) => v.round() as u32,
        _ => 0,
    }
}

fn whip_for(role: Role, raw: &RawRow) -> Option<f64> {
    if raw.whip.is_some() || role != Role::Pitcher {
        return raw.whip;
    }
    match (raw.innings, raw.walks, raw.hits) {
        (Some(ip), Some(bb), Some(h)) if ip > 0.0 => Some((bb + h) / ip),
        _ => None,
    }
}

/// Normalize and enrich one raw row. `None` when the row is dropped.
fn enrich(raw: RawRow, role: Role, counts: &mut IngestCounts) -> Option<PlayerSeason> {
    let Some(year) = raw.year else {
        warn!(
            "skipping {} row '{} {}': unparsable year",
            role,
            raw.firstname.trim(),
            raw.lastname.trim()
        );
        counts.malformed += 1;
        return None;
    };

    let Some((city, state)) = parse_hsplace(&raw.hsplace) else {
        debug!(
            "dropping {} row '{} {}': hsplace '{}' has no valid state",
            role,
            raw.firstname.trim(),
            raw.lastname.trim(),
            raw.hsplace
        );
        counts.invalid_state += 1;
        return None;
    };

    let league = raw.league.trim().to_string();
    let league_name = raw.league_name.trim().to_string();
    let team = normalize_team_name(raw.teamname.trim(), &league);

    let stats = RawStats {
        games: raw.games,
        innings: raw.innings,
        era: raw.era,
        wins: raw.wins,
        losses: raw.losses,
        whip: whip_for(role, &raw),
        strikeouts: raw.strikeouts,
        walks: raw.walks,
        hits: raw.hits,
        at_bats: raw.at_bats,
        doubles: raw.doubles,
        triples: raw.triples,
        home_runs: raw.home_runs,
        hit_by_pitch: raw.hit_by_pitch,
        sac_flies: raw.sac_flies,
        sac_hits: raw.sac_hits,
        stolen_bases: raw.stolen_bases,
        caught_stealing: raw.caught_stealing,
        obp: raw.obp,
        slg: raw.slg,
        ops: raw.ops,
    };
    let metrics = metrics_for_role(role, &stats);

    Some(PlayerSeason {
        first_name: raw.firstname.trim().to_string(),
        last_name: raw.lastname.trim().to_string(),
        role,
        conference: classify_conference(&league_name),
        is_academic: classify_academic(&team),
        league,
        league_name,
        team,
        year: year.round() as i32,
        region: region_for_state(&state),
        hsplace: raw.hsplace,
        city,
        state,
        position: raw.position,
        bats: raw.bats,
        throws: raw.throws,
        height: raw.height,
        weight: raw.weight,
        stats,
        metrics,
        draft_year: raw.draft_year.map(|y| y.round() as i32),
        draft_round: draft_round(raw.draft_round),
    })
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn read_role<R: Read>(
    rdr: R,
    role: Role,
    input: &str,
    rows: &mut Vec<PlayerSeason>,
    counts: &mut IngestCounts,
) -> Result<(), IngestError> {
    let csv_err = |e| IngestError::Csv {
        input: input.to_string(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    check_required_columns(&headers, input)?;

    for result in reader.deserialize::<RawRow>() {
        counts.read += 1;
        match result {
            Ok(raw) => {
                if let Some(row) = enrich(raw, role, counts) {
                    rows.push(row);
                }
            }
            Err(e) => {
                warn!("skipping malformed {} row: {}", role, e);
                counts.malformed += 1;
            }
        }
    }
    Ok(())
}

/// Build the enriched table from a pitcher and a hitter CSV source, returning
/// the row counts alongside it.
pub fn load_from_readers_with_counts<P: Read, H: Read>(
    pitchers: P,
    hitters: H,
) -> Result<(PlayerTable, IngestCounts), IngestError> {
    let mut rows = Vec::new();
    let mut counts = IngestCounts::default();

    read_role(pitchers, Role::Pitcher, "pitchers", &mut rows, &mut counts)?;
    read_role(hitters, Role::Hitter, "hitters", &mut rows, &mut counts)?;

    counts.kept = rows.len();
    info!(
        read = counts.read,
        kept = counts.kept,
        malformed = counts.malformed,
        invalid_state = counts.invalid_state,
        "ingestion complete"
    );
    Ok((PlayerTable::new(rows), counts))
}

/// Build the enriched table from a pitcher and a hitter CSV source.
pub fn load_from_readers<P: Read, H: Read>(
    pitchers: P,
    hitters: H,
) -> Result<PlayerTable, IngestError> {
    load_from_readers_with_counts(pitchers, hitters).map(|(table, _)| table)
}

fn open(path: &Path) -> Result<std::fs::File, IngestError> {
    std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Build the enriched table from two CSV files.
pub fn load_from_paths(pitchers: &Path, hitters: &Path) -> Result<PlayerTable, IngestError> {
    load_from_readers(open(pitchers)?, open(hitters)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ConferenceTier;
    use crate::geography::{Region, STATE_CODES};

    const PITCHER_HEADER: &str =
        "firstname,lastname,league,league_name,teamname,year,hsplace,G,IP,ERA,W,L,SO,BB,H,WHIP";
    const HITTER_HEADER: &str =
        "firstname,lastname,league,league_name,teamname,year,hsplace,G,AB,H,2B,3B,HR,BB,HBP,SF,SH,SB,draft_year,draft_Round";

    fn load(pitchers: &str, hitters: &str) -> (PlayerTable, IngestCounts) {
        load_from_readers_with_counts(pitchers.as_bytes(), hitters.as_bytes()).unwrap()
    }

    #[test]
    fn concatenates_pitchers_then_hitters_with_roles() {
        let pitchers = format!(
            "{PITCHER_HEADER}\n\
             Ace,Lefty,SEC,Southeastern Conference,LSU,2023,\"Baton Rouge, LA\",15,90,2.5,8,2,100,20,70,1.0"
        );
        let hitters = format!(
            "{HITTER_HEADER}\n\
             Big,Stick,SEC,Southeastern Conference,LSU,2023,\"Austin, TX\",55,200,70,15,2,12,30,5,2,1,8,,"
        );
        let (table, counts) = load(&pitchers, &hitters);

        assert_eq!(table.len(), 2);
        assert_eq!(counts.read, 2);
        assert_eq!(counts.kept, 2);
        assert_eq!(table.rows()[0].role, Role::Pitcher);
        assert_eq!(table.rows()[1].role, Role::Hitter);

        let hitter = &table.rows()[1];
        assert_eq!(hitter.state, "TX");
        assert_eq!(hitter.city, "Austin");
        assert_eq!(hitter.region, Region::MidwestII);
        assert_eq!(hitter.conference, ConferenceTier::Power);
        // Hitter-only columns are absent on the pitcher and vice versa.
        assert_eq!(table.rows()[0].stats.at_bats, None);
        assert_eq!(hitter.stats.innings, None);
    }

    #[test]
    fn full_state_names_map_to_codes() {
        let hitters = format!(
            "{HITTER_HEADER}\n\
             Cal,Kid,P12,Pac-12 Conference,UCLA,2022,\"Los Angeles, California\",40,120,30,5,0,3,10,1,0,0,2,,"
        );
        let (table, _) = load(PITCHER_HEADER, &hitters);
        assert_eq!(table.rows()[0].state, "CA");
        assert_eq!(table.rows()[0].region, Region::West);
    }

    #[test]
    fn rows_without_valid_state_are_dropped() {
        let hitters = format!(
            "{HITTER_HEADER}\n\
             A,One,X,X League,Team,2023,\"Toronto, ON\",1,1,1,0,0,0,0,0,0,0,0,,\n\
             B,Two,X,X League,Team,2023,Nowhere,1,1,1,0,0,0,0,0,0,0,0,,\n\
             C,Three,X,X League,Team,2023,\"Washington, DC\",1,1,1,0,0,0,0,0,0,0,0,,\n\
             D,Four,X,X League,Team,2023,\"Boise, ID\",1,1,1,0,0,0,0,0,0,0,0,,"
        );
        let (table, counts) = load(PITCHER_HEADER, &hitters);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].last_name, "Four");
        assert_eq!(counts.invalid_state, 3);
        assert!(table
            .rows()
            .iter()
            .all(|r| STATE_CODES.contains(&r.state.as_str())));
    }

    #[test]
    fn hitter_metrics_present_and_pitcher_metrics_absent() {
        let pitchers = format!(
            "{PITCHER_HEADER}\n\
             P,One,X,X League,Team,2023,\"Reno, NV\",10,40,4.0,3,3,30,12,40,"
        );
        let hitters = format!(
            "{HITTER_HEADER}\n\
             H,One,X,X League,Team,2023,\"Reno, NV\",30,20,10,2,1,1,5,0,0,0,2,,"
        );
        let (table, _) = load(&pitchers, &hitters);
        let pitcher = &table.rows()[0];
        let hitter = &table.rows()[1];

        assert!(pitcher.metrics.is_none());
        let m = hitter.metrics.expect("hitter metrics");
        assert_eq!(m.singles, 6.0);
        assert_eq!(m.total_bases, 17.0);
        assert_eq!(m.t90s, 24.0);
        assert_eq!(m.plate_appearances, 25.0);
        assert!((m.t90_per_pa - 0.96).abs() < 1e-12);
    }

    #[test]
    fn whip_is_derived_when_column_is_empty() {
        let pitchers = format!(
            "{PITCHER_HEADER}\n\
             P,One,X,X League,Team,2023,\"Reno, NV\",10,40,4.0,3,3,30,12,40,"
        );
        let (table, _) = load(&pitchers, HITTER_HEADER);
        let whip = table.rows()[0].stats.whip.expect("derived whip");
        assert!((whip - 52.0 / 40.0).abs() < 1e-12);
    }

    #[test]
    fn whip_column_wins_over_derivation() {
        let pitchers = format!(
            "{PITCHER_HEADER}\n\
             P,One,X,X League,Team,2023,\"Reno, NV\",10,40,4.0,3,3,30,12,40,1.11"
        );
        let (table, _) = load(&pitchers, HITTER_HEADER);
        assert_eq!(table.rows()[0].stats.whip, Some(1.11));
    }

    #[test]
    fn draft_fields_degrade_gracefully() {
        let hitters = format!(
            "{HITTER_HEADER}\n\
             A,Drafted,X,X League,Team,2021,\"Reno, NV\",1,1,1,0,0,0,0,0,0,0,0,2022,5\n\
             B,Garbled,X,X League,Team,2021,\"Reno, NV\",1,1,1,0,0,0,0,0,0,0,0,n/a,abc\n\
             C,Blank,X,X League,Team,2021,\"Reno, NV\",1,1,1,0,0,0,0,0,0,0,0,,\n\
             D,Float,X,X League,Team,2021,\"Reno, NV\",1,1,1,0,0,0,0,0,0,0,0,2023.0,12.0\n\
             E,Negative,X,X League,Team,2021,\"Reno, NV\",1,1,1,0,0,0,0,0,0,0,0,2023,-3"
        );
        let (table, _) = load(PITCHER_HEADER, &hitters);
        let rows = table.rows();

        assert_eq!(rows[0].draft_year, Some(2022));
        assert_eq!(rows[0].draft_round, 5);
        assert!(rows[0].is_drafted());

        assert_eq!(rows[1].draft_year, None);
        assert_eq!(rows[1].draft_round, 0);
        assert!(!rows[1].is_drafted());

        assert_eq!(rows[2].draft_year, None);
        assert_eq!(rows[2].draft_round, 0);

        assert_eq!(rows[3].draft_year, Some(2023));
        assert_eq!(rows[3].draft_round, 12);

        assert_eq!(rows[4].draft_round, 0);
    }

    #[test]
    fn miami_of_the_mac_is_renamed() {
        let hitters = format!(
            "{HITTER_HEADER}\n\
             A,Redhawk,MAC,Mid-American Conference,Miami,2023,\"Oxford, OH\",1,1,1,0,0,0,0,0,0,0,0,,\n\
             B,Hurricane,ACC,Atlantic Coast Conference,Miami,2023,\"Miami, FL\",1,1,1,0,0,0,0,0,0,0,0,,"
        );
        let (table, _) = load(PITCHER_HEADER, &hitters);
        assert_eq!(table.rows()[0].team, "Miami-Ohio");
        assert_eq!(table.rows()[1].team, "Miami");
    }

    #[test]
    fn missing_required_column_is_malformed_input() {
        let no_team = "firstname,lastname,year,hsplace\nA,B,2023,\"Reno, NV\"";
        let err = load_from_readers(no_team.as_bytes(), HITTER_HEADER.as_bytes()).unwrap_err();
        match err {
            IngestError::MalformedInput { input, column } => {
                assert_eq!(input, "pitchers");
                assert_eq!(column, "teamname");
            }
            other => panic!("expected MalformedInput, got: {other:?}"),
        }

        let no_year = "firstname,lastname,teamname,hsplace\nA,B,T,\"Reno, NV\"";
        let err = load_from_readers(PITCHER_HEADER.as_bytes(), no_year.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedInput { ref column, .. } if column == "year"
        ));
    }

    #[test]
    fn alternate_header_spellings_are_accepted() {
        let hitters = "first_name,last_name,lg,leaguename,team,season,hsplace,Dbl,Tpl,H\n\
                       A,B,WCC,West Coast Conference,Gonzaga,2024,\"Spokane, WA\",1,0,3";
        let (table, _) = load(PITCHER_HEADER, hitters);
        let row = &table.rows()[0];
        assert_eq!(row.first_name, "A");
        assert_eq!(row.team, "Gonzaga");
        assert_eq!(row.year, 2024);
        assert_eq!(row.stats.doubles, Some(1.0));
        assert!(row.is_academic);
    }

    #[test]
    fn unparsable_stats_become_missing_not_errors() {
        let hitters = format!(
            "{HITTER_HEADER}\n\
             A,B,X,X League,Team,2023,\"Reno, NV\",ten,--,5,,,,,,,,,,"
        );
        let (table, counts) = load(PITCHER_HEADER, &hitters);
        assert_eq!(counts.malformed, 0);
        let row = &table.rows()[0];
        assert_eq!(row.stats.games, None);
        assert_eq!(row.stats.at_bats, None);
        assert_eq!(row.stats.hits, Some(5.0));
        let m = row.metrics.unwrap();
        assert_eq!(m.plate_appearances, 0.0);
        assert_eq!(m.t90_per_pa, 0.0);
    }

    #[test]
    fn unparsable_year_drops_the_row() {
        let hitters = format!(
            "{HITTER_HEADER}\n\
             A,B,X,X League,Team,soon,\"Reno, NV\",1,1,1,0,0,0,0,0,0,0,0,,"
        );
        let (table, counts) = load(PITCHER_HEADER, &hitters);
        assert!(table.is_empty());
        assert_eq!(counts.malformed, 1);
    }

    #[test]
    fn ingestion_is_idempotent() {
        let pitchers = format!(
            "{PITCHER_HEADER}\n\
             Ace,Lefty,SEC,Southeastern Conference,LSU,2023,\"Baton Rouge, LA\",15,90,2.5,8,2,100,20,70,1.0"
        );
        let hitters = format!(
            "{HITTER_HEADER}\n\
             Big,Stick,SEC,Southeastern Conference,LSU,2023,\"Austin, TX\",55,200,70,15,2,12,30,5,2,1,8,,"
        );
        let (first, _) = load(&pitchers, &hitters);
        let (second, _) = load(&pitchers, &hitters);
        assert_eq!(first, second);
    }

    #[test]
    fn names_and_teams_are_trimmed() {
        let hitters = format!(
            "{HITTER_HEADER}\n  Big  , Stick ,SEC,Southeastern Conference, LSU ,2023,\"Austin, TX\",1,1,1,0,0,0,0,0,0,0,0,,"
        );
        let (table, _) = load(PITCHER_HEADER, &hitters);
        assert_eq!(table.rows()[0].first_name, "Big");
        assert_eq!(table.rows()[0].last_name, "Stick");
        assert_eq!(table.rows()[0].team, "LSU");
    }
}
