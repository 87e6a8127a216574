//! This module provides utilities for loading point sets from files.
//!
//! Point sets are stored as headerless CSV: one point per record, one feature
//! per field, every record with the same number of fields. Leading and
//! trailing whitespace around fields is ignored, and lines starting with `#`
//! are comments.

use crate::{distance::PointSet, error::DistMatError};
use std::{io, path::Path};
use thiserror::Error;

/// Represents all possible errors that can occur during loading and writing.
#[derive(Error, Debug)]
pub enum DataLoaderError {
    /// Wraps a standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Wraps an error from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Occurs when a field cannot be parsed into a float.
    #[error("Parse error: Failed to parse float from '{field}' on line {line}")]
    ParseFloat { field: String, line: u64 },
    /// Occurs when the parsed values do not form a valid point set.
    #[error("Invalid point set: {0}")]
    InvalidPoints(#[from] DistMatError),
}

/// Loads a point set from a CSV file.
///
/// # Arguments
/// * `path`: path to a headerless CSV file with one point per line.
///
/// # Returns
/// The parsed [`PointSet`], or a [`DataLoaderError`] if the file cannot be
/// read, a field is not a number, or the rows are empty or ragged.
pub fn load_points(path: impl AsRef<Path>) -> Result<PointSet, DataLoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        // Ragged rows are reported by `PointSet` with the offending index.
        .flexible(true)
        .from_path(path)?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let row = record
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|_| DataLoaderError::ParseFloat {
                    field: field.to_string(),
                    line,
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    Ok(PointSet::from_rows(&rows)?)
}

/// Writes a point set as headerless CSV, one point per line.
pub fn write_points(path: impl AsRef<Path>, points: &PointSet) -> Result<(), DataLoaderError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    for k in 0..points.nrows() {
        writer.write_record((0..points.ncols()).map(|i| points.value(k, i).to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
