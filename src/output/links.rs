//! The discovered-links file
//!
//! The file accumulates across runs: rows are appended and the header is
//! only written when the file is new or empty. The detail stage reads the
//! same file as its input.

use crate::output::{OutputError, OutputResult};
use crate::work::{LinkRecord, ProductLink};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;

/// Column names of the links file
pub const LINK_HEADERS: [&str; 3] = ["page_number", "link", "data_category"];

/// Appends link records, writing the header first if the file is new
///
/// # Returns
///
/// The number of rows written
pub fn append_links(path: &Path, records: &[LinkRecord]) -> OutputResult<usize> {
    let needs_header = std::fs::metadata(path)
        .map(|meta| meta.len() == 0)
        .unwrap_or(true);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        writer.write_record(LINK_HEADERS)?;
    }

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(records.len())
}

/// Links already present in the links file
///
/// A missing file yields an empty set. Malformed rows are ignored, but a
/// file that cannot be read is an error.
pub fn existing_links(path: &Path) -> OutputResult<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    reader.headers()?;

    let mut links = HashSet::new();
    for row in reader.deserialize::<LinkRecord>() {
        match row {
            Ok(record) => {
                links.insert(record.link);
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(_) => {}
        }
    }

    Ok(links)
}

/// Reads the links file as detail-stage work units
///
/// The file must exist and carry `link` and `data_category` columns;
/// anything else is an `OutputError::Input`. Individual malformed rows are
/// skipped with a warning.
pub fn read_links(path: &Path) -> OutputResult<Vec<ProductLink>> {
    let input_error = |message: String| OutputError::Input {
        path: path.display().to_string(),
        message,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| input_error(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| input_error(e.to_string()))?
        .clone();
    for required in ["link", "data_category"] {
        if !headers.iter().any(|header| header == required) {
            return Err(input_error(format!("missing '{}' column", required)));
        }
    }

    let mut links = Vec::new();
    for (index, row) in reader.deserialize::<LinkRecord>().enumerate() {
        match row {
            Ok(record) => links.push(ProductLink::new(record.link, record.category)),
            Err(e) => {
                // Row 1 is the header
                tracing::warn!("Skipping malformed row {} of {}: {}", index + 2, path.display(), e);
            }
        }
    }

    Ok(links)
}
