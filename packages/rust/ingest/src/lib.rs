//! CSV ingestion for recruiting-pipeline exports.
//!
//! Loading does four things in one pass: it checks the required columns,
//! resolves optional columns through their alias lists, normalizes every
//! cell (dates, interview rounds, flags), and tallies data-quality problems.
//! Only a missing column or an empty file is fatal; everything else ends up
//! in the [`DataQualityReport`].

pub mod dates;
pub mod resolver;
mod table;
mod validate;

use std::path::Path;

use tracing::{info, instrument};

use pipelens_shared::{PipelensError, Result};

pub use resolver::{OptionalColumn, ResolvedColumns, resolve};
pub use table::{EventTable, IngestOptions, TableView, fingerprint};
pub use validate::{Completeness, DataQualityReport, DataWarning, DatasetStatistics};

// ---------------------------------------------------------------------------
// Ingested
// ---------------------------------------------------------------------------

/// A loaded table together with its advisory quality report.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub table: EventTable,
    pub report: DataQualityReport,
}

/// Load a CSV export from disk.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_path(path: &Path, options: &IngestOptions) -> Result<Ingested> {
    let bytes = std::fs::read(path).map_err(|e| PipelensError::io(path, e))?;
    load_bytes(&bytes, options)
}

/// Load a CSV export already held in memory.
#[instrument(skip_all, fields(bytes = bytes.len()))]
pub fn load_bytes(bytes: &[u8], options: &IngestOptions) -> Result<Ingested> {
    let (table, report) = table::read_csv(bytes, options)?;

    info!(
        rows = table.len(),
        companies = report.statistics.unique_companies,
        warnings = report.warnings.len(),
        quality_score = report.quality_score,
        "table loaded"
    );
    let unresolved = table.resolved().unresolved();
    if !unresolved.is_empty() {
        let labels: Vec<&str> = unresolved.iter().map(|c| c.label()).collect();
        info!(missing = ?labels, "optional columns not found; dependent aggregations will be empty");
    }

    Ok(Ingested { table, report })
}
