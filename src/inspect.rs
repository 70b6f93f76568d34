//! Fileproof - Inspection pipeline
//!
//! Open → choose format → detect delimiter → validate. The resulting
//! [`Inspection`] owns the dataset and the finalized result, and is handed
//! as a whole to the report builder and the exporter.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::ValidatorConfig;
use crate::data::Dataset;
use crate::detector::{detect_with_scores, Detection};
use crate::format::InputFormat;
use crate::json::JsonValidator;
use crate::result::{ValidateError, ValidationResult};
use crate::validator::RowValidator;

/// Path that selects stdin
pub const STDIN_PATH: &str = "-";

/// Metadata about the inspected input
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub path: String,
    pub file_name: String,
    pub size: u64,
    pub size_human: String,
    pub format: InputFormat,
}

/// A finished validation run
#[derive(Serialize)]
pub struct Inspection {
    pub source: SourceInfo,
    pub result: ValidationResult,
    /// False when the delimiter was forced by the caller
    pub delimiter_detected: bool,
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
    pub finished_at: DateTime<Local>,
    /// Candidate scores, absent when the delimiter was forced or in JSON mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<Detection>,
    #[serde(skip)]
    pub dataset: Dataset,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Inspection {
    pub fn passed(&self) -> bool {
        self.result.passed()
    }
}

/// Open `path` (or stdin for `-`) and validate it.
pub fn inspect_path<F>(
    path: &str,
    config: &ValidatorConfig,
    checkpoint: F,
) -> Result<Inspection, ValidateError>
where
    F: FnMut(usize) -> ControlFlow<()>,
{
    let opened = if path == STDIN_PATH {
        Dataset::from_stdin()
    } else {
        Dataset::open(path)
    };
    let dataset =
        opened.map_err(|e| ValidateError::read(format!("could not read {}", path), e))?;

    let format = config.format.unwrap_or_else(|| {
        if path == STDIN_PATH {
            InputFormat::Delimited
        } else {
            InputFormat::detect(Path::new(path))
        }
    });

    inspect_dataset(dataset, format, config, checkpoint)
}

/// Validate an already opened dataset.
pub fn inspect_dataset<F>(
    dataset: Dataset,
    format: InputFormat,
    config: &ValidatorConfig,
    checkpoint: F,
) -> Result<Inspection, ValidateError>
where
    F: FnMut(usize) -> ControlFlow<()>,
{
    let start = Instant::now();
    info!(path = %dataset.path, format = format.label(), size = dataset.size, "inspecting");

    let (result, detection) = match format {
        InputFormat::Delimited => {
            let detection = match config.delimiter {
                Some(_) => None,
                None => Some(detect_with_scores(
                    &dataset.sample_lines(config.sample_lines),
                    &config.candidates,
                    &config.quote_chars,
                )),
            };
            let delimiter = config
                .delimiter
                .or(detection.as_ref().map(|d| d.delimiter))
                .unwrap_or(crate::detector::FALLBACK_DELIMITER);

            let result = RowValidator::from_config(config, delimiter)
                .validate_with(dataset.lines(), checkpoint)
                .map_err(|e| with_path(e, &dataset.path))?;
            (result, detection)
        }
        InputFormat::Json => {
            let text = dataset
                .text()
                .map_err(|e| ValidateError::read(format!("could not decode {}", dataset.path), e))?;
            let result = JsonValidator::from_config(config).validate_with(text, checkpoint)?;
            (result, None)
        }
    };

    let source = SourceInfo {
        path: dataset.path.clone(),
        file_name: dataset.file_name(),
        size: dataset.size,
        size_human: dataset.size_human(),
        format,
    };

    Ok(Inspection {
        source,
        result,
        delimiter_detected: detection.is_some(),
        elapsed: start.elapsed(),
        finished_at: Local::now(),
        detection,
        dataset,
    })
}

/// Prefix read failures with the file they came from.
fn with_path(err: ValidateError, path: &str) -> ValidateError {
    match err {
        ValidateError::Read { context, source } => ValidateError::Read {
            context: format!("{} ({})", path, context),
            source,
        },
        other => other,
    }
}
