//! Fileproof - Delimited row validator
//!
//! Streams lines once, takes the first non-blank line as the header and
//! classifies every following row. Structural checks run in a fixed order
//! and the first match wins; the duplicate check runs independently.

use std::io;
use std::ops::ControlFlow;
use tracing::{info, warn};

use crate::config::ValidatorConfig;
use crate::result::{
    ErrorKind, FileStatus, ValidateError, ValidationResult, DEFAULT_MAX_ERRORS,
    DEFAULT_PREVIEW_CHARS,
};
use crate::splitter::{split_row, DEFAULT_QUOTES};

/// Validator for delimited text
#[derive(Debug, Clone)]
pub struct RowValidator {
    delimiter: char,
    quotes: Vec<char>,
    check_duplicates: bool,
    max_errors: usize,
    preview_chars: usize,
}

impl RowValidator {
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            quotes: DEFAULT_QUOTES.to_vec(),
            check_duplicates: false,
            max_errors: DEFAULT_MAX_ERRORS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Build from shared settings; `delimiter` is the detected or forced one.
    pub fn from_config(config: &ValidatorConfig, delimiter: char) -> Self {
        Self {
            delimiter,
            quotes: config.quote_chars.clone(),
            check_duplicates: config.check_duplicates,
            max_errors: config.max_errors,
            preview_chars: config.preview_chars,
        }
    }

    pub fn with_duplicate_check(mut self, enabled: bool) -> Self {
        self.check_duplicates = enabled;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_quotes(mut self, quotes: &[char]) -> Self {
        self.quotes = quotes.to_vec();
        self
    }

    /// Structural classification of a single data row.
    ///
    /// Returns the first matching problem, or None for a valid row.
    pub fn classify(&self, line: &str, expected_columns: usize) -> Option<(ErrorKind, String)> {
        if line.trim().is_empty() {
            return Some((ErrorKind::EmptyRow, "Row is empty".to_string()));
        }

        let row = split_row(line, self.delimiter, &self.quotes);
        if row.unclosed {
            return Some((
                ErrorKind::UnclosedQuotes,
                "Unclosed quotes: row ends inside a quoted field".to_string(),
            ));
        }

        if row.field_count() != expected_columns {
            return Some((
                ErrorKind::ColumnCountMismatch,
                format!("Expected {} columns, found {}", expected_columns, row.field_count()),
            ));
        }

        if let Some(pos) = row
            .fields
            .iter()
            .position(|f| f.hidden_delimiter)
        {
            return Some((
                ErrorKind::DelimiterInUnquotedField,
                format!(
                    "Field {} hides the delimiter '{}' in a quote opened mid-field",
                    pos + 1,
                    self.delimiter.escape_default()
                ),
            ));
        }

        None
    }

    /// Validate a full sequence of lines.
    pub fn validate<I, L>(&self, lines: I) -> Result<ValidationResult, ValidateError>
    where
        I: IntoIterator<Item = io::Result<L>>,
        L: AsRef<str>,
    {
        self.validate_with(lines, |_| ControlFlow::Continue(()))
    }

    /// Validate with a checkpoint called before each line.
    ///
    /// The checkpoint receives the number of lines consumed so far; returning
    /// `Break` aborts the pass with [`ValidateError::Cancelled`].
    pub fn validate_with<I, L, F>(
        &self,
        lines: I,
        mut checkpoint: F,
    ) -> Result<ValidationResult, ValidateError>
    where
        I: IntoIterator<Item = io::Result<L>>,
        L: AsRef<str>,
        F: FnMut(usize) -> ControlFlow<()>,
    {
        let mut result = ValidationResult::new(
            Some(self.delimiter),
            self.check_duplicates,
            self.max_errors,
            self.preview_chars,
        );
        let mut expected: Option<usize> = None;

        info!(
            delimiter = ?self.delimiter,
            check_duplicates = self.check_duplicates,
            "starting delimited validation"
        );

        for (index, line) in lines.into_iter().enumerate() {
            if checkpoint(index).is_break() {
                return Err(ValidateError::Cancelled { rows: index });
            }

            let row = index + 1;
            let line = line.map_err(|e| ValidateError::read(format!("line {}", row), e))?;
            let line: &str = line.as_ref();

            let Some(expected_columns) = expected else {
                // Blank lines before the header are not rows
                if line.trim().is_empty() {
                    continue;
                }
                let header = split_row(line, self.delimiter, &self.quotes);
                if header.unclosed {
                    warn!(row, "header row ends inside a quoted field, column count may be wrong");
                }
                expected = Some(header.field_count());
                result.expected_column_count = Some(header.field_count());
                result.header_row = Some(row);
                result.header_unclosed = header.unclosed;
                continue;
            };

            let mut issues = Vec::with_capacity(1);
            if let Some(issue) = self.classify(line, expected_columns) {
                issues.push(issue);
            }

            if let Some(seen) = result.duplicate_row_signatures.as_mut() {
                if !line.trim().is_empty() {
                    if let Some(first) = seen.observe(line, row) {
                        issues.push((ErrorKind::DuplicateRow, format!("Duplicate of row {}", first)));
                    }
                }
            }

            result.record_row(row, issues, line);
        }

        if expected.is_none() {
            result.terminate(FileStatus::EmptyFile);
        }

        info!(
            total = result.total_rows,
            valid = result.valid_rows,
            invalid = result.invalid_rows,
            "delimited validation finished"
        );

        Ok(result)
    }
}

/// Validate `lines` with default quoting and preview settings.
pub fn validate<I, L>(
    lines: I,
    delimiter: char,
    check_duplicates: bool,
    max_errors: usize,
) -> Result<ValidationResult, ValidateError>
where
    I: IntoIterator<Item = io::Result<L>>,
    L: AsRef<str>,
{
    RowValidator::new(delimiter)
        .with_duplicate_check(check_duplicates)
        .with_max_errors(max_errors)
        .validate(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_lines<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = io::Result<&'a str>> + 'a {
        lines.iter().map(|l| Ok(*l))
    }

    fn run(lines: &[&str], check_duplicates: bool) -> ValidationResult {
        validate(ok_lines(lines), ',', check_duplicates, 1000).unwrap()
    }

    #[test]
    fn test_well_formed_file_has_no_errors() {
        let result = run(&["a,b,c", "1,2,3", r#""x,y",2,3"#, "4,,6"], false);
        assert_eq!(result.total_rows, 3);
        assert_eq!(result.valid_rows, 3);
        assert_eq!(result.invalid_rows, 0);
        assert!(result.errors.is_empty());
        assert_eq!(result.expected_column_count, Some(3));
        assert_eq!(result.header_row, Some(1));
        assert!(result.passed());
    }

    #[test]
    fn test_column_count_mismatch() {
        let result = run(&["a,b,c", "1,2,3", "1,2"], false);
        assert_eq!(result.invalid_rows, 1);
        let error = &result.errors[0];
        assert_eq!(error.row_number, 3);
        assert_eq!(error.kind, ErrorKind::ColumnCountMismatch);
        assert_eq!(error.description, "Expected 3 columns, found 2");
        assert_eq!(error.raw_preview, "1,2");
    }

    #[test]
    fn test_unclosed_quotes_win_over_count() {
        let result = run(&["a,b", r#""unterminated,field"#], false);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::UnclosedQuotes);
        assert_eq!(result.errors[0].row_number, 2);
    }

    #[test]
    fn test_empty_row_is_reported_and_counted() {
        let result = run(&["a,b", "1,2", "   ", "3,4"], false);
        assert_eq!(result.total_rows, 3);
        assert_eq!(result.invalid_rows, 1);
        assert_eq!(result.errors[0].kind, ErrorKind::EmptyRow);
        assert_eq!(result.errors[0].row_number, 3);
    }

    #[test]
    fn test_delimiter_hidden_in_unquoted_field() {
        let result = run(&["a,b,c", r#"1,ab"c,d"e,3"#], false);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::DelimiterInUnquotedField);
        assert!(result.errors[0].description.starts_with("Field 2"));
    }

    #[test]
    fn test_space_before_quoted_field_is_valid() {
        let result = run(&["a,b,c", r#"1, "Smith, John", 3"#], false);
        assert!(result.errors.is_empty());
        assert_eq!(result.valid_rows, 1);
    }

    #[test]
    fn test_reopened_quote_hides_delimiter() {
        let result = run(&["a,b,c", r#"1,"x"y"p,q",3"#, r#"1,y"p,q",3"#], false);
        let flagged: Vec<(usize, ErrorKind)> =
            result.errors.iter().map(|e| (e.row_number, e.kind)).collect();
        assert_eq!(
            flagged,
            vec![
                (2, ErrorKind::DelimiterInUnquotedField),
                (3, ErrorKind::DelimiterInUnquotedField),
            ]
        );
    }

    #[test]
    fn test_unclosed_header_is_marked() {
        let result = run(&[r#"a,"b,c"#, "1,2"], false);
        assert!(result.header_unclosed);
        assert_eq!(result.expected_column_count, Some(2));
        assert!(!run(&["a,b", "1,2"], false).header_unclosed);
    }

    #[test]
    fn test_duplicates_flag_only_the_repeat() {
        let result = run(&["a,b", "x,y", "p,q", "x,y"], true);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::DuplicateRow);
        assert_eq!(error.row_number, 4);
        assert_eq!(error.description, "Duplicate of row 2");
        assert!(result.duplicate_row_mask.get(4));
        assert!(!result.duplicate_row_mask.get(2));
        assert_eq!(result.duplicate_row_signatures.as_ref().map(|d| d.distinct_rows()), Some(2));
    }

    #[test]
    fn test_duplicate_and_structural_error_on_same_row() {
        let result = run(&["a,b,c", "1,2", "1,2"], true);
        // Row 2: mismatch. Row 3: mismatch + duplicate, counted once.
        assert_eq!(result.invalid_rows, 2);
        assert_eq!(result.errors.len(), 3);
        assert_eq!(result.errors[1].kind, ErrorKind::ColumnCountMismatch);
        assert_eq!(result.errors[2].kind, ErrorKind::DuplicateRow);
        assert_eq!(result.errors[2].row_number, 3);
    }

    #[test]
    fn test_duplicates_ignored_when_disabled() {
        let result = run(&["a,b", "x,y", "x,y"], false);
        assert!(result.passed());
        assert!(result.duplicate_row_signatures.is_none());
    }

    #[test]
    fn test_error_list_is_bounded_but_counts_are_exact() {
        let mut lines = vec!["a,b,c"];
        lines.extend(std::iter::repeat("1,2").take(10));
        let result = validate(ok_lines(&lines), ',', false, 5).unwrap();
        assert_eq!(result.errors.len(), 5);
        assert_eq!(result.invalid_rows, 10);
        assert_eq!(result.total_rows, 10);
        assert_eq!(result.suppressed_errors, 5);
        assert_eq!(result.count_of(ErrorKind::ColumnCountMismatch), 10);
    }

    #[test]
    fn test_counters_always_add_up() {
        let result = run(
            &["a,b", "1,2", "", "x", r#""q,2"#, "1,2", "3,4,5", "7,8"],
            true,
        );
        assert_eq!(result.valid_rows + result.invalid_rows, result.total_rows);
        assert_eq!(result.total_rows, 7);
    }

    #[test]
    fn test_empty_input_is_empty_file() {
        let result = run(&[], false);
        assert_eq!(result.file_status, FileStatus::EmptyFile);
        assert_eq!(result.file_error(), Some(ErrorKind::EmptyFile));
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.valid_rows, 0);
        assert_eq!(result.invalid_rows, 0);
        assert!(!result.passed());

        let blank = run(&["", "  "], false);
        assert_eq!(blank.file_status, FileStatus::EmptyFile);
    }

    #[test]
    fn test_leading_blank_lines_are_skipped() {
        let result = run(&["", "a,b", "1,2"], false);
        assert_eq!(result.header_row, Some(2));
        assert_eq!(result.total_rows, 1);
        assert!(result.passed());
    }

    #[test]
    fn test_header_only_file_passes() {
        let result = run(&["a,b,c"], false);
        assert_eq!(result.total_rows, 0);
        assert!(result.passed());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let lines = ["a,b", "1,2", "1", "1,2", r#""x"#];
        assert_eq!(run(&lines, true), run(&lines, true));
    }

    #[test]
    fn test_read_error_aborts_pass() {
        let lines: Vec<io::Result<&str>> = vec![
            Ok("a,b"),
            Ok("1,2"),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad bytes")),
            Ok("3,4"),
        ];
        let err = validate(lines, ',', false, 10).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::FileReadError));
    }

    #[test]
    fn test_checkpoint_can_cancel() {
        let lines = ["a,b", "1,2", "3,4", "5,6"];
        let err = RowValidator::new(',')
            .validate_with(ok_lines(&lines), |consumed| {
                if consumed == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, ValidateError::Cancelled { rows: 2 }));
    }

    #[test]
    fn test_double_quotes_only_accepts_apostrophes() {
        let lines = ["name,n", "O'Brien,5"];
        let strict = run(&lines, false);
        assert_eq!(strict.errors[0].kind, ErrorKind::UnclosedQuotes);

        let relaxed = RowValidator::new(',')
            .with_quotes(&['"'])
            .validate(ok_lines(&lines))
            .unwrap();
        assert!(relaxed.passed());
    }

    #[test]
    fn test_classify_order() {
        let validator = RowValidator::new('|');
        assert_eq!(validator.classify("", 2).unwrap().0, ErrorKind::EmptyRow);
        assert_eq!(validator.classify("'a|b", 2).unwrap().0, ErrorKind::UnclosedQuotes);
        assert_eq!(validator.classify("a|b|c", 2).unwrap().0, ErrorKind::ColumnCountMismatch);
        assert!(validator.classify("'a|b'|c", 2).is_none());
    }
}
