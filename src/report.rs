//! Fileproof - Report builder
//!
//! Renders a finished inspection as a plain-text report, and exports the
//! stored error records as CSV.

use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::detector::display_delimiter;
use crate::format::InputFormat;
use crate::inspect::Inspection;
use crate::result::{ErrorKind, ValidationResult};

/// Records shown per error kind in the text report
pub const RECORDS_PER_KIND: usize = 10;

/// Characters of row content kept in the CSV export
pub const CSV_PREVIEW_CHARS: usize = 200;

const HEAVY_RULE: &str =
    "================================================================================";
const LIGHT_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Render the full text report.
pub fn render_text(inspection: &Inspection) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, inspection);
    out
}

/// Write the full text report into any `fmt::Write` sink.
pub fn write_report<W: fmt::Write>(out: &mut W, inspection: &Inspection) -> fmt::Result {
    let result = &inspection.result;
    let source = &inspection.source;

    writeln!(out, "{}", HEAVY_RULE)?;
    writeln!(out, "DATA FILE VALIDATION REPORT")?;
    writeln!(out, "{}", HEAVY_RULE)?;
    writeln!(out)?;
    writeln!(out, "File: {}", source.file_name)?;
    writeln!(out, "File Size: {}", source.size_human)?;
    writeln!(out, "File Type: {}", file_type(inspection))?;
    writeln!(out, "Validation Time: {:.2} seconds", inspection.elapsed.as_secs_f64())?;
    writeln!(out, "Timestamp: {}", inspection.finished_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out)?;

    writeln!(out, "{}", LIGHT_RULE)?;
    let verdict = if result.passed() { "✓ PASSED" } else { "✗ FAILED" };
    writeln!(out, "VALIDATION RESULT: {}", verdict)?;
    writeln!(out, "{}", LIGHT_RULE)?;
    writeln!(out)?;

    if let Some(kind) = result.file_error() {
        writeln!(out, "File Error: {} - {}", kind, file_error_message(kind))?;
    }
    writeln!(out, "Total Rows Processed: {}", group_thousands(result.total_rows))?;
    writeln!(out, "Valid Rows: {}", group_thousands(result.valid_rows))?;
    writeln!(out, "Invalid Rows: {}", group_thousands(result.invalid_rows))?;
    if let Some(delimiter) = result.delimiter_used {
        match &inspection.detection {
            Some(detection) => writeln!(
                out,
                "Delimiter: '{}' (detected from {} lines)",
                display_delimiter(delimiter),
                detection.lines_scored
            )?,
            None => writeln!(out, "Delimiter: '{}' (specified)", display_delimiter(delimiter))?,
        }
    }
    if let Some(columns) = result.expected_column_count {
        let label = match source.format {
            InputFormat::Delimited => "Expected Columns",
            InputFormat::Json => "Expected Keys",
        };
        writeln!(out, "{}: {}", label, columns)?;
    }
    if let Some(seen) = &result.duplicate_row_signatures {
        writeln!(out, "Distinct Rows: {}", group_thousands(seen.distinct_rows()))?;
    }
    if result.header_unclosed {
        writeln!(
            out,
            "Note: the header row ends inside a quoted field; the column count may be wrong"
        )?;
    }

    if !result.kind_counts.is_empty() {
        write_errors(out, result)?;
    } else if result.passed() {
        writeln!(out)?;
        writeln!(out, "✓ No errors found. File is valid!")?;
    }

    writeln!(out)?;
    writeln!(out, "{}", HEAVY_RULE)?;
    writeln!(out, "END OF REPORT")?;
    writeln!(out, "{}", HEAVY_RULE)
}

fn write_errors<W: fmt::Write>(out: &mut W, result: &ValidationResult) -> fmt::Result {
    let occurrences: usize = result.kind_counts.values().sum();
    writeln!(out)?;
    writeln!(out, "{}", HEAVY_RULE)?;
    writeln!(out, "ERRORS ({} found)", group_thousands(occurrences))?;
    writeln!(out, "{}", HEAVY_RULE)?;

    let groups = result.errors_by_kind();
    for (kind, errors) in &groups {
        let total = result.count_of(*kind);
        writeln!(out)?;
        writeln!(out, "{} ({} occurrences):", kind, group_thousands(total))?;
        writeln!(out, "{}", LIGHT_RULE)?;
        for error in errors.iter().take(RECORDS_PER_KIND) {
            writeln!(out, "  Row {}: {}", error.row_number, error.description)?;
        }
        let shown = errors.len().min(RECORDS_PER_KIND);
        if total > shown {
            writeln!(out, "  ... and {} more similar errors", group_thousands(total - shown))?;
        }
    }

    // Kinds that only appeared after the error list filled up
    for (kind, count) in &result.kind_counts {
        if groups.iter().any(|(k, _)| k == kind) {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{} ({} occurrences):", kind, group_thousands(*count))?;
        writeln!(out, "{}", LIGHT_RULE)?;
        writeln!(out, "  (not recorded: error limit reached)")?;
    }

    if result.suppressed_errors > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "Note: {} further errors were counted but not recorded",
            group_thousands(result.suppressed_errors)
        )?;
    }
    Ok(())
}

fn file_type(inspection: &Inspection) -> String {
    match (inspection.source.format, inspection.result.delimiter_used) {
        (InputFormat::Delimited, Some(d)) => format!("Delimited (delimiter: {})", display_delimiter(d)),
        (format, _) => format.label().to_string(),
    }
}

fn file_error_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::EmptyFile => "File is empty",
        ErrorKind::JsonParseError => "Document could not be parsed",
        _ => "File could not be validated",
    }
}

/// Format an integer with `,` thousands separators.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Write the stored error records as CSV.
pub fn write_errors_csv<W: io::Write>(result: &ValidationResult, writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["row_number", "error_kind", "description", "preview"])?;
    for error in &result.errors {
        csv_writer.write_record([
            error.row_number.to_string().as_str(),
            error.kind.as_str(),
            error.description.as_str(),
            crate::result::preview(&error.raw_preview, CSV_PREVIEW_CHARS).as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export the stored error records to a CSV file.
pub fn export_errors_csv<P: AsRef<Path>>(result: &ValidationResult, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create error export: {}", path.display()))?;
    write_errors_csv(result, BufWriter::new(file))
        .with_context(|| format!("Failed to write error export: {}", path.display()))
}

/// Save the text report to a file.
pub fn save_report<P: AsRef<Path>>(inspection: &Inspection, path: P) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_text(inspection))
        .with_context(|| format!("Failed to save report: {}", path.display()))
}
