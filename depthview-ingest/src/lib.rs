//! CSV → frame table loader.
//!
//! Each CSV row is one scanline: a `depth` column plus `original_width` raw
//! samples. Rows are subsampled to `target_width` evenly spaced samples and
//! written as one record each.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use depthview_store::{FrameStore, InsertOutcome, StoreError};
use depthview_types::FrameRecord;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_ORIGINAL_WIDTH: usize = 200;
pub const DEFAULT_TARGET_WIDTH: usize = 150;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv has no `depth` column")]
    MissingDepthColumn,
    #[error("row {row}: expected at least {expected} samples, found {found}")]
    RowTooShort {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("scanline has {found} samples, expected at least {expected}")]
    ScanlineTooShort { expected: usize, found: usize },
    #[error("invalid widths: original {original}, target {target}")]
    InvalidWidth { original: usize, target: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestOptions {
    pub original_width: usize,
    pub target_width: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            original_width: DEFAULT_ORIGINAL_WIDTH,
            target_width: DEFAULT_TARGET_WIDTH,
        }
    }
}

impl IngestOptions {
    fn validate(&self) -> Result<(), IngestError> {
        if self.original_width == 0 || self.target_width == 0 || self.target_width > self.original_width {
            return Err(IngestError::InvalidWidth {
                original: self.original_width,
                target: self.target_width,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    /// Rows whose id was already present (re-ingesting the same file).
    pub skipped: usize,
}

/// Evenly spaced sample indices over `[0, original_width - 1]`, endpoints included.
fn subsample_indices(original_width: usize, target_width: usize) -> Vec<usize> {
    match target_width {
        0 => Vec::new(),
        1 => vec![0],
        n => (0..n)
            .map(|i| i * original_width.saturating_sub(1) / (n - 1))
            .collect(),
    }
}

/// Pick `target_width` samples out of the first `original_width` of `row`.
pub fn resize_scanline(
    row: &[f64],
    original_width: usize,
    target_width: usize,
) -> Result<Vec<f64>, IngestError> {
    IngestOptions {
        original_width,
        target_width,
    }
    .validate()?;
    if row.len() < original_width {
        return Err(IngestError::ScanlineTooShort {
            expected: original_width,
            found: row.len(),
        });
    }
    Ok(subsample_indices(original_width, target_width)
        .into_iter()
        .map(|i| row[i])
        .collect())
}

/// Raw samples are 8-bit: drop the fraction and saturate, NaN becomes 0.
fn to_sample(cell: &str) -> f64 {
    let v = cell.trim().parse::<f64>().unwrap_or(0.0);
    f64::from(v as u8)
}

fn to_depth(cell: &str) -> f64 {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .unwrap_or(0.0)
}

/// Parse and resize every row. Missing or unparsable cells read as 0.
pub fn read_frames<R: Read>(reader: R, opts: IngestOptions) -> Result<Vec<FrameRecord>, IngestError> {
    opts.validate()?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let depth_col = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == "depth")
        .ok_or(IngestError::MissingDepthColumn)?;

    let mut records = Vec::new();
    for (row_idx, row) in rdr.records().enumerate() {
        let row = row?;
        let depth = to_depth(row.get(depth_col).unwrap_or(""));
        let samples: Vec<f64> = row
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != depth_col)
            .map(|(_, cell)| to_sample(cell))
            .collect();
        if samples.len() < opts.original_width {
            return Err(IngestError::RowTooShort {
                row: row_idx + 1,
                expected: opts.original_width,
                found: samples.len(),
            });
        }
        let frame = resize_scanline(&samples, opts.original_width, opts.target_width)?;
        records.push(FrameRecord::new(depth, frame));
    }
    debug!(rows = records.len(), "csv parsed");
    Ok(records)
}

/// Insert records one by one; rows that already exist are skipped.
pub async fn store_frames(
    store: &dyn FrameStore,
    records: Vec<FrameRecord>,
) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    for record in records {
        let depth = record.depth;
        match store.insert(record).await? {
            InsertOutcome::Inserted => report.inserted += 1,
            InsertOutcome::Duplicate => {
                debug!(depth, "skipping frame already in store");
                report.skipped += 1;
            }
        }
    }
    info!(inserted = report.inserted, skipped = report.skipped, "frames ingested");
    Ok(report)
}

/// Read a CSV file and load it into `store`.
pub async fn ingest_path(
    store: &dyn FrameStore,
    path: impl AsRef<Path>,
    opts: IngestOptions,
) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), "ingesting frames");
    let records = read_frames(file, opts)?;
    store_frames(store, records).await
}
