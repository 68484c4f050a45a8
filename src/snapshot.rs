//! Flat CSV mirrors of the ledgers and the catalog.
//!
//! A snapshot is rewritten in full after every ingestion so the data can be
//! opened without SQLite. It is never read back.

use serde::Serialize;
use tracing::{debug, warn};

use std::{fs::File, io::Write, path::Path};

use crate::error::{Error, Result};

const BOM: &[u8] = "\u{feff}".as_bytes();

/// Writes `rows` to `path` as UTF-8 CSV with a byte-order mark, one header
/// row taken from the field names.
///
/// # Errors
///
/// Returns any errors from creating or writing the file.
pub fn write_snapshot<T: Serialize>(rows: &[T], path: impl AsRef<Path>) -> Result<()> {
    let source = path.as_ref().display().to_string();
    let mut file = File::create(&path)?;
    file.write_all(BOM)?;
    let mut wtr = csv::Writer::from_writer(file);
    for row in rows {
        wtr.serialize(row).map_err(|e| Error::csv(&source, e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Mirrors `rows` to `path`, logging rather than returning any failure,
/// including a failure to read the rows in the first place.
pub fn mirror<T: Serialize>(rows: Result<Vec<T>>, path: &Path) {
    match rows.and_then(|rows| write_snapshot(&rows, path).map(|()| rows.len())) {
        Ok(count) => debug!(path = %path.display(), rows = count, "wrote snapshot"),
        Err(e) => warn!(path = %path.display(), "snapshot not written: {e}"),
    }
}
