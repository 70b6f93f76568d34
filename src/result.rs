//! Fileproof - Validation results
//!
//! The error taxonomy, per-row error records and the accumulated result of
//! one validation pass. Both the delimited and the JSON validator build a
//! [`ValidationResult`]; renderers and exporters only read it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::dedup::{DuplicateIndex, RowMask};

/// Default cap on stored error records.
pub const DEFAULT_MAX_ERRORS: usize = 1000;

/// Default number of characters kept from a row for previews.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Closed set of problems the validators report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ColumnCountMismatch,
    UnclosedQuotes,
    EmptyRow,
    DelimiterInUnquotedField,
    DuplicateRow,
    JsonParseError,
    TypeMismatch,
    KeyMismatch,
    EmptyFile,
    FileReadError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ColumnCountMismatch => "COLUMN_COUNT_MISMATCH",
            ErrorKind::UnclosedQuotes => "UNCLOSED_QUOTES",
            ErrorKind::EmptyRow => "EMPTY_ROW",
            ErrorKind::DelimiterInUnquotedField => "DELIMITER_IN_UNQUOTED_FIELD",
            ErrorKind::DuplicateRow => "DUPLICATE_ROW",
            ErrorKind::JsonParseError => "JSON_PARSE_ERROR",
            ErrorKind::TypeMismatch => "TYPE_MISMATCH",
            ErrorKind::KeyMismatch => "KEY_MISMATCH",
            ErrorKind::EmptyFile => "EMPTY_FILE",
            ErrorKind::FileReadError => "FILE_READ_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// 1-based line number (delimited) or element position (JSON)
    pub row_number: usize,
    #[serde(rename = "error_kind")]
    pub kind: ErrorKind,
    pub description: String,
    /// Row content, truncated for display
    pub raw_preview: String,
}

/// How the pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Every row was examined
    Checked,
    /// No content at all
    EmptyFile,
    /// The JSON document could not be parsed
    JsonParseError,
}

/// Outcome of one validation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub file_status: FileStatus,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    /// None in JSON mode
    pub delimiter_used: Option<char>,
    pub expected_column_count: Option<usize>,
    /// Line number of the header row (delimited mode)
    pub header_row: Option<usize>,
    /// The header ended inside a quoted span
    pub header_unclosed: bool,
    /// Stored records, oldest first, at most `max_errors`
    pub errors: Vec<ValidationError>,
    /// Occurrences per kind, including records that were not stored
    pub kind_counts: BTreeMap<ErrorKind, usize>,
    /// Records dropped because the list was full
    pub suppressed_errors: usize,
    /// Present only when duplicate checking is enabled
    #[serde(skip)]
    pub duplicate_row_signatures: Option<DuplicateIndex>,
    /// Rows with a structural (non-duplicate) error
    #[serde(skip)]
    pub invalid_row_mask: RowMask,
    /// Rows flagged as duplicates of an earlier row
    #[serde(skip)]
    pub duplicate_row_mask: RowMask,
    #[serde(skip)]
    max_errors: usize,
    #[serde(skip)]
    preview_chars: usize,
}

impl ValidationResult {
    pub(crate) fn new(
        delimiter_used: Option<char>,
        check_duplicates: bool,
        max_errors: usize,
        preview_chars: usize,
    ) -> Self {
        Self {
            file_status: FileStatus::Checked,
            total_rows: 0,
            valid_rows: 0,
            invalid_rows: 0,
            delimiter_used,
            expected_column_count: None,
            header_row: None,
            header_unclosed: false,
            errors: Vec::new(),
            kind_counts: BTreeMap::new(),
            suppressed_errors: 0,
            duplicate_row_signatures: check_duplicates.then(DuplicateIndex::new),
            invalid_row_mask: RowMask::new(),
            duplicate_row_mask: RowMask::new(),
            max_errors,
            preview_chars,
        }
    }

    /// Record one processed row and the problems found on it.
    pub(crate) fn record_row(&mut self, row: usize, issues: Vec<(ErrorKind, String)>, raw: &str) {
        self.total_rows += 1;
        if issues.is_empty() {
            self.valid_rows += 1;
            return;
        }
        self.invalid_rows += 1;

        for (kind, description) in issues {
            *self.kind_counts.entry(kind).or_insert(0) += 1;
            if kind == ErrorKind::DuplicateRow {
                self.duplicate_row_mask.set(row);
            } else {
                self.invalid_row_mask.set(row);
            }

            if self.errors.len() < self.max_errors {
                self.errors.push(ValidationError {
                    row_number: row,
                    kind,
                    description,
                    raw_preview: preview(raw, self.preview_chars),
                });
                if self.errors.len() == self.max_errors {
                    warn!(
                        max_errors = self.max_errors,
                        row, "error list is full, further records will only be counted"
                    );
                }
            } else {
                self.suppressed_errors += 1;
            }
        }
    }

    /// Short-circuit to a terminal file-level condition.
    pub(crate) fn terminate(&mut self, status: FileStatus) {
        self.file_status = status;
    }

    /// True when the file was fully checked and no row had a problem.
    pub fn passed(&self) -> bool {
        self.file_status == FileStatus::Checked && self.invalid_rows == 0
    }

    /// The terminal file-level kind, if the pass short-circuited.
    pub fn file_error(&self) -> Option<ErrorKind> {
        match self.file_status {
            FileStatus::Checked => None,
            FileStatus::EmptyFile => Some(ErrorKind::EmptyFile),
            FileStatus::JsonParseError => Some(ErrorKind::JsonParseError),
        }
    }

    /// Number of occurrences of `kind`, stored or not.
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.kind_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Stored records grouped by kind, in order of first appearance.
    pub fn errors_by_kind(&self) -> Vec<(ErrorKind, Vec<&ValidationError>)> {
        let mut groups: Vec<(ErrorKind, Vec<&ValidationError>)> = Vec::new();
        for error in &self.errors {
            match groups.iter_mut().find(|(k, _)| *k == error.kind) {
                Some((_, list)) => list.push(error),
                None => groups.push((error.kind, vec![error])),
            }
        }
        groups
    }

    /// Whether `row` carries any error (structural or duplicate).
    pub fn is_flagged(&self, row: usize) -> bool {
        self.invalid_row_mask.get(row) || self.duplicate_row_mask.get(row)
    }
}

/// Truncate row content to at most `max_chars` characters.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Failures that abort a run without a result
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The input could not be read or decoded
    #[error("FILE_READ_ERROR: {context}: {source}")]
    Read {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The caller asked the pass to stop
    #[error("validation cancelled after {rows} rows")]
    Cancelled { rows: usize },
    /// An export could not be produced from this result
    #[error("export failed: {0}")]
    Export(String),
}

impl ValidateError {
    pub fn read(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ValidateError::Read {
            context: context.into(),
            source: source.into(),
        }
    }

    /// The taxonomy kind matching this failure, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ValidateError::Read { .. } => Some(ErrorKind::FileReadError),
            _ => None,
        }
    }
}
