//! Fileproof - Delimiter detection
//!
//! Picks the candidate whose per-line count (outside quotes) is the most
//! consistent across a sample of lines.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::splitter::count_outside_quotes;

/// Candidate delimiters in tie-break priority order.
pub const DEFAULT_CANDIDATES: &[char] = &[',', '\t', '|', ';', ':', '*'];

/// Delimiter used when nothing else qualifies.
pub const FALLBACK_DELIMITER: char = ',';

/// Number of leading lines sampled for detection.
pub const DEFAULT_SAMPLE_LINES: usize = 20;

/// Per-candidate detection statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CandidateScore {
    pub delimiter: char,
    /// Most common per-line occurrence count
    pub mode: usize,
    /// Number of lines whose count equals `mode`
    pub consistency: usize,
}

/// Outcome of a detection run
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub delimiter: char,
    pub scores: Vec<CandidateScore>,
    /// Number of non-blank lines that were scored
    pub lines_scored: usize,
}

/// Detect the delimiter from sampled lines.
///
/// Never fails: an empty sample, or one where no candidate appears, yields a comma.
pub fn detect<S: AsRef<str>>(sample_lines: &[S], candidates: &[char], quotes: &[char]) -> char {
    detect_with_scores(sample_lines, candidates, quotes).delimiter
}

/// Like [`detect`], but also returns the score of every candidate.
pub fn detect_with_scores<S: AsRef<str>>(
    sample_lines: &[S],
    candidates: &[char],
    quotes: &[char],
) -> Detection {
    let lines: Vec<&str> = sample_lines
        .iter()
        .map(|l| l.as_ref())
        .filter(|l| !l.trim().is_empty())
        .collect();

    let scores: Vec<CandidateScore> = candidates
        .iter()
        .map(|&delimiter| score_candidate(&lines, delimiter, quotes))
        .collect();

    // Strictly greater wins, so earlier candidates keep ties.
    let mut best: Option<CandidateScore> = None;
    for score in scores.iter().filter(|s| s.mode > 0) {
        if best.map_or(true, |b| score.consistency > b.consistency) {
            best = Some(*score);
        }
    }

    let delimiter = best.map_or(FALLBACK_DELIMITER, |b| b.delimiter);
    for score in &scores {
        debug!(
            delimiter = ?score.delimiter,
            mode = score.mode,
            consistency = score.consistency,
            "delimiter candidate scored"
        );
    }
    debug!(delimiter = ?delimiter, lines = lines.len(), "delimiter detected");

    Detection {
        delimiter,
        scores,
        lines_scored: lines.len(),
    }
}

fn score_candidate(lines: &[&str], delimiter: char, quotes: &[char]) -> CandidateScore {
    let mut frequency: HashMap<usize, usize> = HashMap::new();
    for line in lines {
        *frequency
            .entry(count_outside_quotes(line, delimiter, quotes))
            .or_insert(0) += 1;
    }

    // Equally frequent counts resolve to the larger count.
    let (mode, consistency) = frequency
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .unwrap_or((0, 0));

    CandidateScore {
        delimiter,
        mode,
        consistency,
    }
}

/// Parse a user-supplied delimiter: a single character or a name like `tab`.
pub fn parse_delimiter(s: &str) -> Option<char> {
    match s.to_lowercase().as_str() {
        "\\t" | "tab" | "tsv" => Some('\t'),
        "comma" | "csv" => Some(','),
        "pipe" => Some('|'),
        "semicolon" => Some(';'),
        "colon" => Some(':'),
        "asterisk" | "star" => Some('*'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
    }
}

/// Printable form of a delimiter (`\t` for tab)
pub fn display_delimiter(delimiter: char) -> String {
    delimiter.escape_default().to_string()
}
