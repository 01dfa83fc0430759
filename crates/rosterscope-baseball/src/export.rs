// Flat-file CSV export of a filtered view with every enriched column.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::record::PlayerSeason;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

/// Column names of the export, in order.
pub const EXPORT_COLUMNS: &[&str] = &[
    "firstname",
    "lastname",
    "role",
    "league",
    "league_name",
    "teamname",
    "year",
    "hsplace",
    "city",
    "state",
    "region",
    "conference_type",
    "is_academic_school",
    "position",
    "bats",
    "throws",
    "height",
    "weight",
    "G",
    "IP",
    "ERA",
    "W",
    "L",
    "WHIP",
    "SO",
    "BB",
    "H",
    "AB",
    "2B",
    "3B",
    "HR",
    "HBP",
    "SF",
    "SH",
    "SB",
    "CS",
    "OBP",
    "SLG",
    "OPS",
    "Singles",
    "TotalBases",
    "T90s",
    "PA",
    "T90_per_PA",
    "draft_year",
    "draft_Round",
    "is_drafted",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    firstname: &'a str,
    lastname: &'a str,
    role: &'static str,
    league: &'a str,
    league_name: &'a str,
    teamname: &'a str,
    year: i32,
    hsplace: &'a str,
    city: &'a str,
    state: &'a str,
    region: &'static str,
    conference_type: &'static str,
    is_academic_school: bool,
    position: Option<&'a str>,
    bats: Option<&'a str>,
    throws: Option<&'a str>,
    height: Option<f64>,
    weight: Option<f64>,
    #[serde(rename = "G")]
    games: Option<f64>,
    #[serde(rename = "IP")]
    innings: Option<f64>,
    #[serde(rename = "ERA")]
    era: Option<f64>,
    #[serde(rename = "W")]
    wins: Option<f64>,
    #[serde(rename = "L")]
    losses: Option<f64>,
    #[serde(rename = "WHIP")]
    whip: Option<f64>,
    #[serde(rename = "SO")]
    strikeouts: Option<f64>,
    #[serde(rename = "BB")]
    walks: Option<f64>,
    #[serde(rename = "H")]
    hits: Option<f64>,
    #[serde(rename = "AB")]
    at_bats: Option<f64>,
    #[serde(rename = "2B")]
    doubles: Option<f64>,
    #[serde(rename = "3B")]
    triples: Option<f64>,
    #[serde(rename = "HR")]
    home_runs: Option<f64>,
    #[serde(rename = "HBP")]
    hit_by_pitch: Option<f64>,
    #[serde(rename = "SF")]
    sac_flies: Option<f64>,
    #[serde(rename = "SH")]
    sac_hits: Option<f64>,
    #[serde(rename = "SB")]
    stolen_bases: Option<f64>,
    #[serde(rename = "CS")]
    caught_stealing: Option<f64>,
    #[serde(rename = "OBP")]
    obp: Option<f64>,
    #[serde(rename = "SLG")]
    slg: Option<f64>,
    #[serde(rename = "OPS")]
    ops: Option<f64>,
    #[serde(rename = "Singles")]
    singles: Option<f64>,
    #[serde(rename = "TotalBases")]
    total_bases: Option<f64>,
    #[serde(rename = "T90s")]
    t90s: Option<f64>,
    #[serde(rename = "PA")]
    plate_appearances: Option<f64>,
    #[serde(rename = "T90_per_PA")]
    t90_per_pa: Option<f64>,
    draft_year: Option<i32>,
    #[serde(rename = "draft_Round")]
    draft_round: u32,
    is_drafted: bool,
}

impl<'a> From<&'a PlayerSeason> for ExportRow<'a> {
    fn from(r: &'a PlayerSeason) -> Self {
        let s = &r.stats;
        let m = r.metrics.as_ref();
        ExportRow {
            firstname: &r.first_name,
            lastname: &r.last_name,
            role: r.role.as_str(),
            league: &r.league,
            league_name: &r.league_name,
            teamname: &r.team,
            year: r.year,
            hsplace: &r.hsplace,
            city: &r.city,
            state: &r.state,
            region: r.region.label(),
            conference_type: r.conference.label(),
            is_academic_school: r.is_academic,
            position: r.position.as_deref(),
            bats: r.bats.as_deref(),
            throws: r.throws.as_deref(),
            height: r.height,
            weight: r.weight,
            games: s.games,
            innings: s.innings,
            era: s.era,
            wins: s.wins,
            losses: s.losses,
            whip: s.whip,
            strikeouts: s.strikeouts,
            walks: s.walks,
            hits: s.hits,
            at_bats: s.at_bats,
            doubles: s.doubles,
            triples: s.triples,
            home_runs: s.home_runs,
            hit_by_pitch: s.hit_by_pitch,
            sac_flies: s.sac_flies,
            sac_hits: s.sac_hits,
            stolen_bases: s.stolen_bases,
            caught_stealing: s.caught_stealing,
            obp: s.obp,
            slg: s.slg,
            ops: s.ops,
            singles: m.map(|m| m.singles),
            total_bases: m.map(|m| m.total_bases),
            t90s: m.map(|m| m.t90s),
            plate_appearances: m.map(|m| m.plate_appearances),
            t90_per_pa: m.map(|m| m.t90_per_pa),
            draft_year: r.draft_year,
            draft_round: r.draft_round,
            is_drafted: r.is_drafted(),
        }
    }
}

/// Write `rows` as CSV with a header line. Returns the number of data rows.
pub fn write_csv<W: Write>(rows: &[&PlayerSeason], out: W) -> Result<usize, ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(EXPORT_COLUMNS)?;
    for row in rows {
        writer.serialize(ExportRow::from(*row))?;
    }
    writer.flush().map_err(|e| ExportError::Io {
        path: "<writer>".to_string(),
        source: e,
    })?;
    Ok(rows.len())
}

/// Write `rows` to a CSV file at `path`.
pub fn export_to_path(rows: &[&PlayerSeason], path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    write_csv(rows, file)
}
