use crate::harvest::FailedUnit;
use crate::output::OutputResult;
use crate::work::{ProductLink, ProductRecord};
use std::path::Path;

/// Column names of the product details file
pub const PRODUCT_HEADERS: [&str; 7] = [
    "Product Name",
    "Description",
    "Product URL",
    "Sleeve Length",
    "Neckline",
    "Color",
    "Category",
];

/// Column names of the failed links file
pub const FAILED_HEADERS: [&str; 3] = ["link", "data_category", "reason"];

/// Writes product records, replacing any previous file
///
/// Missing fields are written as empty cells. The header is written even
/// when there are no records.
pub fn write_products(path: &Path, records: &[ProductRecord]) -> OutputResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(PRODUCT_HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(records.len())
}

/// Writes the links that could not be harvested, with the reason
pub fn write_failed(path: &Path, failures: &[FailedUnit<ProductLink>]) -> OutputResult<usize> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(FAILED_HEADERS)?;
    for failure in failures {
        writer.write_record([
            failure.unit.url.as_str(),
            failure.unit.category.as_str(),
            &failure.reason.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(failures.len())
}
