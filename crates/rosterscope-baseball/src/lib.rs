// College baseball roster pipeline: ingestion, enrichment, filtering and
// leaderboard helpers over an immutable in-memory table.

pub mod classify;
pub mod export;
pub mod filter;
pub mod geography;
pub mod ingest;
pub mod leaderboard;
pub mod metrics;
pub mod record;
pub mod stats;
pub mod summary;
pub mod table;
