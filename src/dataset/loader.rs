use super::types::{Orientation, RatingMatrix, RatingRecord};
use crate::error::DatasetError;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Result of a dataset load: the matrix plus how many rows were accepted or dropped.
#[derive(Debug)]
pub struct LoadReport {
    pub matrix: RatingMatrix,
    pub rows: usize,
    pub skipped: usize,
}

/// Reads a ratings CSV from disk.
///
/// Failing to open or read the file is an error; individual bad rows are not.
pub fn load_ratings(path: &Path, orientation: Orientation) -> Result<LoadReport, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let report = parse_ratings(BufReader::new(file), orientation)?;

    tracing::info!(
        "Loaded {} ratings for {} entities from {} ({} rows skipped)",
        report.rows,
        report.matrix.len(),
        path.display(),
        report.skipped
    );

    Ok(report)
}

/// Parses `item_id,subject_id,rating[,...]` rows after a header line.
pub fn parse_ratings<R: BufRead>(
    reader: R,
    orientation: Orientation,
) -> Result<LoadReport, DatasetError> {
    let mut lines = reader.split(b'\n');

    match lines.next() {
        Some(header) => {
            header?;
        }
        None => return Err(DatasetError::MissingHeader),
    }

    let mut matrix = RatingMatrix::new(orientation);
    let mut rows = 0usize;
    let mut skipped = 0usize;

    for raw in lines {
        let raw = raw?;
        let Ok(line) = std::str::from_utf8(&raw) else {
            tracing::trace!("Skipping row that is not valid UTF-8");
            skipped += 1;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_row(line) {
            Some(record) => {
                matrix.insert_record(record);
                rows += 1;
            }
            None => {
                tracing::trace!("Skipping malformed row: {:?}", line);
                skipped += 1;
            }
        }
    }

    Ok(LoadReport {
        matrix,
        rows,
        skipped,
    })
}

fn parse_row(line: &str) -> Option<RatingRecord> {
    let mut fields = line.split(',').map(str::trim);

    let item_id = fields.next()?.parse().ok()?;
    let subject_id = fields.next()?.parse().ok()?;
    let rating: f64 = fields.next()?.parse().ok()?;

    if !rating.is_finite() {
        return None;
    }

    Some(RatingRecord {
        item_id,
        subject_id,
        rating,
    })
}
