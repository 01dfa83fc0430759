// Immutable enriched table handle and an explicit, fingerprint-keyed cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::ingest::{self, IngestError};
use crate::record::PlayerSeason;

/// Observed extremes of the range-filterable columns.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TableBounds {
    pub year: Option<(i32, i32)>,
    pub height: Option<(f64, f64)>,
    pub weight: Option<(f64, f64)>,
}

impl TableBounds {
    fn observe(rows: &[PlayerSeason]) -> Self {
        let mut bounds = TableBounds::default();
        for row in rows {
            bounds.year = Some(match bounds.year {
                Some((lo, hi)) => (lo.min(row.year), hi.max(row.year)),
                None => (row.year, row.year),
            });
            widen(&mut bounds.height, row.height);
            widen(&mut bounds.weight, row.weight);
        }
        bounds
    }
}

fn widen(slot: &mut Option<(f64, f64)>, value: Option<f64>) {
    if let Some(v) = value {
        *slot = Some(match *slot {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        });
    }
}

/// The enriched table. Built once from the two inputs and never mutated;
/// filtering produces borrowed views.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTable {
    rows: Vec<PlayerSeason>,
    bounds: TableBounds,
}

impl PlayerTable {
    pub fn new(rows: Vec<PlayerSeason>) -> Self {
        let bounds = TableBounds::observe(&rows);
        Self { rows, bounds }
    }

    pub fn rows(&self) -> &[PlayerSeason] {
        &self.rows
    }

    /// A view over every row, in table order.
    pub fn view(&self) -> Vec<&PlayerSeason> {
        self.rows.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn bounds(&self) -> &TableBounds {
        &self.bounds
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Identity of an input file: path, size and modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceFingerprint {
    pub fn of(path: &Path) -> Result<Self, IngestError> {
        let meta = std::fs::metadata(path).map_err(|e| IngestError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Holds the most recently built table, rebuilt only when either input's
/// fingerprint changes.
#[derive(Debug, Default)]
pub struct TableCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    pitchers: SourceFingerprint,
    hitters: SourceFingerprint,
    table: Arc<PlayerTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        pitchers: &Path,
        hitters: &Path,
    ) -> Result<Arc<PlayerTable>, IngestError> {
        let pitcher_fp = SourceFingerprint::of(pitchers)?;
        let hitter_fp = SourceFingerprint::of(hitters)?;

        if let Some(entry) = &self.entry {
            if entry.pitchers == pitcher_fp && entry.hitters == hitter_fp {
                debug!("table cache hit");
                return Ok(Arc::clone(&entry.table));
            }
        }

        info!(
            "building table from {} and {}",
            pitchers.display(),
            hitters.display()
        );
        let table = Arc::new(ingest::load_from_paths(pitchers, hitters)?);
        self.entry = Some(CacheEntry {
            pitchers: pitcher_fp,
            hitters: hitter_fp,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
