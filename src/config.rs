//! Fileproof - Validation settings

use crate::detector::{DEFAULT_CANDIDATES, DEFAULT_SAMPLE_LINES};
use crate::format::InputFormat;
use crate::result::{DEFAULT_MAX_ERRORS, DEFAULT_PREVIEW_CHARS};
use crate::splitter::DEFAULT_QUOTES;

/// Settings shared by the detector and both validators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Forced format; detected from the extension when None
    pub format: Option<InputFormat>,
    /// Forced delimiter; detected from a sample when None
    pub delimiter: Option<char>,
    /// Candidate delimiters in tie-break priority order
    pub candidates: Vec<char>,
    /// Leading lines sampled for delimiter detection
    pub sample_lines: usize,
    /// Characters that open and close quoted spans
    pub quote_chars: Vec<char>,
    pub check_duplicates: bool,
    /// Cap on stored error records
    pub max_errors: usize,
    /// Characters of row content kept per error record
    pub preview_chars: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: None,
            candidates: DEFAULT_CANDIDATES.to_vec(),
            sample_lines: DEFAULT_SAMPLE_LINES,
            quote_chars: DEFAULT_QUOTES.to_vec(),
            check_duplicates: false,
            max_errors: DEFAULT_MAX_ERRORS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_duplicate_check(mut self, enabled: bool) -> Self {
        self.check_duplicates = enabled;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_sample_lines(mut self, lines: usize) -> Self {
        self.sample_lines = lines.max(1);
        self
    }

    /// Only `"` opens a quoted span; apostrophes are plain text.
    pub fn double_quotes_only(mut self) -> Self {
        self.quote_chars = vec!['"'];
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::default();
        assert_eq!(config.candidates, vec![',', '\t', '|', ';', ':', '*']);
        assert_eq!(config.sample_lines, 20);
        assert_eq!(config.max_errors, 1000);
        assert_eq!(config.quote_chars, vec!['"', '\'']);
        assert!(!config.check_duplicates);
    }

    #[test]
    fn test_builder() {
        let config = ValidatorConfig::new()
            .with_delimiter('|')
            .with_duplicate_check(true)
            .with_max_errors(5)
            .with_sample_lines(0)
            .double_quotes_only();
        assert_eq!(config.delimiter, Some('|'));
        assert!(config.check_duplicates);
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.sample_lines, 1);
        assert_eq!(config.quote_chars, vec!['"']);
    }
}
