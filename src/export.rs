//! Fileproof - Cleaned-file exporter
//!
//! Writes a subset of a delimited file using the row masks of a finished
//! validation. Lines are copied verbatim, so quoting and the delimiter are
//! preserved.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::data::Dataset;
use crate::result::{ValidateError, ValidationResult};

/// Which rows to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSelection {
    /// Header plus rows without structural errors
    Cleaned { keep_duplicates: bool },
    /// Header plus every flagged row
    ErrorsOnly,
}

impl ExportSelection {
    fn includes(&self, result: &ValidationResult, row: usize) -> bool {
        match self {
            ExportSelection::Cleaned { keep_duplicates } => {
                !result.invalid_row_mask.get(row)
                    && (*keep_duplicates || !result.duplicate_row_mask.get(row))
            }
            ExportSelection::ErrorsOnly => result.is_flagged(row),
        }
    }
}

/// Rows written and omitted by an export
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Data rows written, header excluded
    pub rows_written: usize,
    pub rows_omitted: usize,
}

/// Write the selected rows of `dataset` to `writer`.
pub fn write_subset<W: Write>(
    dataset: &Dataset,
    result: &ValidationResult,
    selection: ExportSelection,
    mut writer: W,
) -> Result<ExportSummary> {
    if result.delimiter_used.is_none() {
        return Err(ValidateError::Export("only delimited files can be exported".to_string()).into());
    }
    let Some(header_row) = result.header_row else {
        return Err(ValidateError::Export("the file has no header row".to_string()).into());
    };

    let mut summary = ExportSummary::default();
    for (index, line) in dataset.lines().enumerate() {
        let row = index + 1;
        if row < header_row {
            continue;
        }
        let line = line.with_context(|| format!("Failed to read line {} of {}", row, dataset.path))?;

        if row == header_row {
            writeln!(writer, "{}", line)?;
        } else if selection.includes(result, row) {
            writeln!(writer, "{}", line)?;
            summary.rows_written += 1;
        } else {
            summary.rows_omitted += 1;
        }
    }
    writer.flush()?;

    Ok(summary)
}

/// Export the selected rows to `path`, replacing it only once fully written.
pub fn export_subset<P: AsRef<Path>>(
    dataset: &Dataset,
    result: &ValidationResult,
    selection: ExportSelection,
    path: P,
) -> Result<ExportSummary> {
    let path = path.as_ref();
    let temp_path = path.with_file_name(format!(
        "{}.tmp",
        path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    ));

    let file = File::create(&temp_path)
        .with_context(|| format!("Failed to create output file: {}", temp_path.display()))?;

    let summary = match write_subset(dataset, result, selection, BufWriter::new(file)) {
        Ok(summary) => summary,
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to {}", path.display()))?;

    info!(
        path = %path.display(),
        written = summary.rows_written,
        omitted = summary.rows_omitted,
        "export written"
    );
    Ok(summary)
}
