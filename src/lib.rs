//! Fileproof - Structural validation for delimited and JSON data files.
//!
//! Detects the field delimiter of a delimited file, checks every row for
//! column-count, quoting, emptiness and duplicate problems, and validates
//! JSON documents for schema drift across array elements.
//!
//! ## Layout
//!
//! - **Core** (`detector`, `splitter`, `validator`, `json`, `dedup`, `result`):
//!   single-pass checks over borrowed lines.
//! - **Pipeline** (`data`, `format`, `config`, `inspect`) - memory-mapped
//!   input and the open → detect → validate flow.
//! - **Running** (`worker`) - cancellable jobs on a background pool.
//! - **Output** (`report`, `export`) - text report, error CSV and row subsets.

pub mod config;
pub mod data;
pub mod dedup;
pub mod detector;
pub mod export;
pub mod format;
pub mod inspect;
pub mod json;
pub mod report;
pub mod result;
pub mod splitter;
pub mod validator;
pub mod worker;

pub use detector::detect;
pub use json::validate_json;
pub use result::{ErrorKind, ValidateError, ValidationError, ValidationResult};
pub use validator::validate;
