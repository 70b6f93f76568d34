//! Fileproof - Structural validator for delimited and JSON data files
//!
//! Detects the delimiter, checks every row once and prints a report.
//! Exit code 0 means the file passed, 1 that it failed and 2 that it could
//! not be validated at all.

use anyhow::{anyhow, Context, Result};
use argh::FromArgs;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use fileproof::config::ValidatorConfig;
use fileproof::detector::parse_delimiter;
use fileproof::export::{export_subset, ExportSelection};
use fileproof::format::InputFormat;
use fileproof::inspect::Inspection;
use fileproof::report::{export_errors_csv, group_thousands, render_text, save_report};
use fileproof::result::ValidateError;
use fileproof::worker::{JobEvent, ValidationJob, ValidationPool};

/// Fileproof - validate delimited and JSON data files
#[derive(FromArgs)]
struct Args {
    /// path to the file to validate (`-` reads stdin)
    #[argh(positional)]
    file: String,

    /// delimiter to use instead of detecting one (e.g. `,`, `tab`, `pipe`)
    #[argh(option, short = 'd')]
    delimiter: Option<String>,

    /// input format: auto, delimited or json (default: auto)
    #[argh(option, default = "String::from(\"auto\")")]
    format: String,

    /// flag rows that repeat an earlier row
    #[argh(switch, short = 'D')]
    check_duplicates: bool,

    /// maximum number of error records to keep (default: 1000)
    #[argh(option, short = 'm')]
    max_errors: Option<usize>,

    /// number of lines sampled for delimiter detection (default: 20)
    #[argh(option)]
    sample_lines: Option<usize>,

    /// treat only `"` as a quote character
    #[argh(switch)]
    double_quotes_only: bool,

    /// save the text report to this path
    #[argh(option, short = 'r')]
    report: Option<String>,

    /// write the error records as CSV to this path
    #[argh(option)]
    errors_csv: Option<String>,

    /// write the header and all valid rows to this path
    #[argh(option)]
    clean: Option<String>,

    /// keep duplicate rows in the --clean output
    #[argh(switch)]
    keep_duplicates: bool,

    /// write the header and all flagged rows to this path
    #[argh(option)]
    errors_only: Option<String>,

    /// print the result as JSON instead of the text report
    #[argh(switch)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args: Args = argh::from_env();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (warnings only by default).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fileproof=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<ValidatorConfig> {
    let mut config = ValidatorConfig::new().with_duplicate_check(args.check_duplicates);

    if args.format != "auto" {
        let format = InputFormat::parse(&args.format)
            .ok_or_else(|| anyhow!("Unknown format '{}' (expected auto, delimited or json)", args.format))?;
        config = config.with_format(format);
    }
    if let Some(ref raw) = args.delimiter {
        let delimiter =
            parse_delimiter(raw).ok_or_else(|| anyhow!("Invalid delimiter '{}'", raw))?;
        config = config.with_delimiter(delimiter);
    }
    if let Some(max_errors) = args.max_errors {
        config = config.with_max_errors(max_errors);
    }
    if let Some(lines) = args.sample_lines {
        config = config.with_sample_lines(lines);
    }
    if args.double_quotes_only {
        config = config.double_quotes_only();
    }

    Ok(config)
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = build_config(&args)?;

    if args.file == "-" {
        eprintln!("📂 Reading from stdin...");
    } else {
        eprintln!("📂 Validating {}...", args.file);
    }

    let pool = ValidationPool::new(1)?;
    let mut handle = pool.submit(ValidationJob::new(args.file.clone(), config));
    let cancel = handle.cancel_token();
    let show_progress = std::io::stderr().is_terminal();
    let mut progress_shown = false;

    let outcome = loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(JobEvent::Progress { rows }) => {
                    if show_progress {
                        eprint!("\r⏳ Processing... {} rows", group_thousands(rows));
                        progress_shown = true;
                    }
                }
                Some(JobEvent::Finished(outcome)) => break outcome,
                None => return Err(anyhow!("Validation worker stopped unexpectedly")),
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n⚠ Interrupt received, stopping...");
                cancel.cancel();
            }
        }
    };
    if progress_shown {
        eprintln!();
    }

    let inspection = match outcome {
        Ok(inspection) => inspection,
        Err(ValidateError::Cancelled { rows }) => {
            return Err(anyhow!("Validation cancelled after {} rows", group_thousands(rows)));
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&inspection)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print!("{}", render_text(&inspection));
    }

    write_outputs(&args, &inspection)?;

    Ok(if inspection.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Write the optional report, error list and row subsets.
fn write_outputs(args: &Args, inspection: &Inspection) -> Result<()> {
    if let Some(ref path) = args.report {
        save_report(inspection, path)?;
        eprintln!("✅ Report saved to: {}", path);
    }

    if let Some(ref path) = args.errors_csv {
        export_errors_csv(&inspection.result, path)?;
        eprintln!(
            "✅ {} error records written to: {}",
            inspection.result.errors.len(),
            path
        );
    }

    let subsets = [
        (
            args.clean.as_ref(),
            ExportSelection::Cleaned {
                keep_duplicates: args.keep_duplicates,
            },
        ),
        (args.errors_only.as_ref(), ExportSelection::ErrorsOnly),
    ];
    for (path, selection) in subsets {
        let Some(path) = path else { continue };
        let summary = export_subset(&inspection.dataset, &inspection.result, selection, path)
            .with_context(|| format!("Failed to export {}", path))?;
        eprintln!(
            "✅ {} rows written, {} omitted: {}",
            group_thousands(summary.rows_written),
            group_thousands(summary.rows_omitted),
            path
        );
    }

    Ok(())
}
