//! Fileproof - JSON structure validator
//!
//! Parses a whole JSON document. For a top-level array of objects, the first
//! object's keys become the expected schema and every later element is
//! checked for missing/extra keys and for values whose type drifts from the
//! first type seen for that key.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use std::ops::ControlFlow;
use tracing::info;

use crate::config::ValidatorConfig;
use crate::result::{
    ErrorKind, FileStatus, ValidateError, ValidationResult, DEFAULT_MAX_ERRORS,
    DEFAULT_PREVIEW_CHARS,
};

/// Validator for JSON documents
#[derive(Debug, Clone)]
pub struct JsonValidator {
    check_duplicates: bool,
    max_errors: usize,
    preview_chars: usize,
}

impl Default for JsonValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonValidator {
    pub fn new() -> Self {
        Self {
            check_duplicates: false,
            max_errors: DEFAULT_MAX_ERRORS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
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

    /// Validate a document. Malformed content never fails the call.
    pub fn validate(&self, content: &str) -> ValidationResult {
        match self.scan(content, |_| ControlFlow::<Infallible>::Continue(())) {
            Ok(result) => result,
            Err((never, _)) => match never {},
        }
    }

    /// Validate with a checkpoint called before each array element.
    pub fn validate_with<F>(
        &self,
        content: &str,
        checkpoint: F,
    ) -> Result<ValidationResult, ValidateError>
    where
        F: FnMut(usize) -> ControlFlow<()>,
    {
        self.scan(content, checkpoint)
            .map_err(|((), rows)| ValidateError::Cancelled { rows })
    }

    fn scan<B, F>(&self, content: &str, mut checkpoint: F) -> Result<ValidationResult, (B, usize)>
    where
        F: FnMut(usize) -> ControlFlow<B>,
    {
        let mut result = ValidationResult::new(
            None,
            self.check_duplicates,
            self.max_errors,
            self.preview_chars,
        );

        if content.trim().is_empty() {
            result.terminate(FileStatus::EmptyFile);
            return Ok(result);
        }

        let document: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                let line = e.line().max(1);
                let raw = content.lines().nth(line - 1).unwrap_or_default();
                result.record_row(
                    line,
                    vec![(ErrorKind::JsonParseError, format!("Invalid JSON: {}", e))],
                    raw,
                );
                result.terminate(FileStatus::JsonParseError);
                return Ok(result);
            }
        };

        info!(top_level = json_type(&document), "starting JSON validation");

        match &document {
            Value::Array(items) => {
                let mut schema = SchemaTracker::from_first(items.first());
                result.expected_column_count = schema.as_ref().map(|s| s.keys.len());

                for (index, item) in items.iter().enumerate() {
                    if let ControlFlow::Break(b) = checkpoint(index) {
                        return Err((b, index));
                    }

                    let mut issues = match schema.as_mut() {
                        Some(schema) => schema.check(item, index == 0),
                        None => Vec::new(),
                    };
                    self.record_element(&mut result, index + 1, item, &mut issues);
                }
            }
            Value::Object(map) => {
                result.expected_column_count = Some(map.len());
                self.record_element(&mut result, 1, &document, &mut Vec::new());
            }
            scalar => {
                self.record_element(&mut result, 1, scalar, &mut Vec::new());
            }
        }

        info!(
            total = result.total_rows,
            valid = result.valid_rows,
            invalid = result.invalid_rows,
            "JSON validation finished"
        );

        Ok(result)
    }

    fn record_element(
        &self,
        result: &mut ValidationResult,
        row: usize,
        item: &Value,
        issues: &mut Vec<(ErrorKind, String)>,
    ) {
        let needs_text = !issues.is_empty() || result.duplicate_row_signatures.is_some();
        let text = if needs_text {
            serde_json::to_string(item).unwrap_or_default()
        } else {
            String::new()
        };

        if let Some(seen) = result.duplicate_row_signatures.as_mut() {
            if let Some(first) = seen.observe(&text, row) {
                issues.push((
                    ErrorKind::DuplicateRow,
                    format!("Duplicate of element {}", first),
                ));
            }
        }

        result.record_row(row, std::mem::take(issues), &text);
    }
}

/// Expected key set plus the first type seen for every key
struct SchemaTracker {
    keys: BTreeSet<String>,
    key_types: HashMap<String, &'static str>,
}

impl SchemaTracker {
    fn from_first(first: Option<&Value>) -> Option<Self> {
        match first {
            Some(Value::Object(obj)) => Some(Self {
                keys: obj.keys().cloned().collect(),
                key_types: HashMap::new(),
            }),
            _ => None,
        }
    }

    fn check(&mut self, item: &Value, is_first: bool) -> Vec<(ErrorKind, String)> {
        let Value::Object(obj) = item else {
            return vec![(
                ErrorKind::TypeMismatch,
                format!("Expected object, found {}", json_type(item)),
            )];
        };

        let mut issues = Vec::new();

        if !is_first {
            let missing: Vec<&str> = self
                .keys
                .iter()
                .filter(|k| !obj.contains_key(k.as_str()))
                .map(|k| k.as_str())
                .collect();
            let extra: Vec<&str> = obj
                .keys()
                .filter(|k| !self.keys.contains(k.as_str()))
                .map(|k| k.as_str())
                .collect();

            let mut parts = Vec::new();
            if !missing.is_empty() {
                parts.push(format!("Missing keys: {}", missing.join(", ")));
            }
            if !extra.is_empty() {
                parts.push(format!("Extra keys: {}", extra.join(", ")));
            }
            if !parts.is_empty() {
                issues.push((ErrorKind::KeyMismatch, parts.join("; ")));
            }
        }

        let mut drifted = Vec::new();
        for (key, value) in obj {
            let found = json_type(value);
            match self.key_types.get(key) {
                Some(&expected) if expected != found => {
                    drifted.push(format!("Key '{}': expected {}, found {}", key, expected, found));
                }
                Some(_) => {}
                None => {
                    self.key_types.insert(key.clone(), found);
                }
            }
        }
        if !drifted.is_empty() {
            issues.push((ErrorKind::TypeMismatch, drifted.join("; ")));
        }

        issues
    }
}

/// JSON type name used in messages
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a JSON document with default settings.
pub fn validate_json(content: &str) -> ValidationResult {
    JsonValidator::new().validate(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_array_passes() {
        let result = validate_json(r#"[{"id": 1, "name": "a"}, {"name": "b", "id": 2}]"#);
        assert!(result.passed());
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.valid_rows, 2);
        assert_eq!(result.expected_column_count, Some(2));
        assert_eq!(result.delimiter_used, None);
    }

    #[test]
    fn test_parse_error_covers_whole_file() {
        let result = validate_json("[\n  {\"id\": 1},\n  {\"id\": }\n]");
        assert_eq!(result.file_status, FileStatus::JsonParseError);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::JsonParseError);
        assert_eq!(error.row_number, 3);
        assert!(error.description.starts_with("Invalid JSON"));
        assert_eq!(result.total_rows, 1);
        assert_eq!(result.invalid_rows, 1);
        assert!(!result.passed());
    }

    #[test]
    fn test_empty_content_is_empty_file() {
        let result = validate_json("  \n ");
        assert_eq!(result.file_error(), Some(ErrorKind::EmptyFile));
        assert_eq!(result.total_rows, 0);
    }

    #[test]
    fn test_key_mismatch_reports_missing_and_extra() {
        let result = validate_json(r#"[{"a": 1, "b": 2}, {"a": 3, "c": 4}]"#);
        assert_eq!(result.invalid_rows, 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::KeyMismatch);
        assert_eq!(error.row_number, 2);
        assert_eq!(error.description, "Missing keys: b; Extra keys: c");
    }

    #[test]
    fn test_type_drift_against_first_seen_type() {
        let result = validate_json(r#"[{"a": 1}, {"a": "one"}, {"a": 2}]"#);
        assert_eq!(result.invalid_rows, 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::TypeMismatch);
        assert_eq!(error.row_number, 2);
        assert_eq!(error.description, "Key 'a': expected number, found string");
        assert_eq!(error.raw_preview, r#"{"a":"one"}"#);
    }

    #[test]
    fn test_null_is_its_own_type() {
        let result = validate_json(r#"[{"a": null}, {"a": 1}, {"a": null}]"#);
        assert_eq!(result.invalid_rows, 1);
        let error = &result.errors[0];
        assert_eq!(error.row_number, 2);
        assert_eq!(error.kind, ErrorKind::TypeMismatch);
        assert_eq!(error.description, "Key 'a': expected null, found number");
    }

    #[test]
    fn test_extra_key_type_is_tracked_from_first_sighting() {
        let result = validate_json(r#"[{"a": 1}, {"a": 1, "b": true}, {"a": 1, "b": "x"}]"#);
        let kinds: Vec<_> = result.errors.iter().map(|e| (e.row_number, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (2, ErrorKind::KeyMismatch),
                (3, ErrorKind::KeyMismatch),
                (3, ErrorKind::TypeMismatch),
            ]
        );
        assert_eq!(result.invalid_rows, 2);
    }

    #[test]
    fn test_non_object_element() {
        let result = validate_json(r#"[{"a": 1}, 42]"#);
        assert_eq!(result.errors[0].kind, ErrorKind::TypeMismatch);
        assert_eq!(result.errors[0].description, "Expected object, found number");
    }

    #[test]
    fn test_top_level_object_and_scalar() {
        let object = validate_json(r#"{"x": 1, "y": [1, 2]}"#);
        assert!(object.passed());
        assert_eq!(object.total_rows, 1);
        assert_eq!(object.expected_column_count, Some(2));

        let scalar = validate_json("42");
        assert!(scalar.passed());
        assert_eq!(scalar.expected_column_count, None);
    }

    #[test]
    fn test_array_of_scalars_has_no_schema() {
        let result = validate_json("[1, \"two\", null]");
        assert!(result.passed());
        assert_eq!(result.total_rows, 3);
    }

    #[test]
    fn test_duplicate_elements() {
        let result = JsonValidator::new()
            .with_duplicate_check(true)
            .validate(r#"[{"a": 1, "b": 2}, {"b": 2, "a": 1}, {"a": 3, "b": 4}]"#);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::DuplicateRow);
        assert_eq!(result.errors[0].row_number, 2);
        assert_eq!(result.errors[0].description, "Duplicate of element 1");
    }

    #[test]
    fn test_bounding_applies_to_json() {
        let doc = format!("[{{\"a\": 1}}{}]", ", {\"b\": 1}".repeat(10));
        let result = JsonValidator::new().with_max_errors(5).validate(&doc);
        assert_eq!(result.errors.len(), 5);
        assert_eq!(result.invalid_rows, 10);
        assert_eq!(result.valid_rows + result.invalid_rows, result.total_rows);
    }

    #[test]
    fn test_checkpoint_can_cancel() {
        let err = JsonValidator::new()
            .validate_with("[1, 2, 3]", |i| {
                if i == 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, ValidateError::Cancelled { rows: 1 }));
    }
}
