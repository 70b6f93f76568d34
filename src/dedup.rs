//! Fileproof - Duplicate row tracking
//!
//! Exact-match duplicate detection over row signatures, plus a compact
//! growable bitmask used to remember which rows were flagged.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────────┐
//! │  row text   │────▶│  FNV-1a 64   │────▶│ DuplicateIndex │──▶ first-seen row
//! └─────────────┘     └──────────────┘     └────────────────┘
//! ```

use std::collections::HashMap;

// ─── RowMask ────────────────────────────────────────────────────────────────

/// Compact bitmask indexed by row number.
///
/// Packs 64 row states per `u64` word and grows on demand, since the
/// number of rows is unknown until the pass ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowMask {
    words: Vec<u64>,
}

impl RowMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bit at `index` to 1.
    #[inline]
    pub fn set(&mut self, index: usize) {
        let word = index >> 6;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (index & 63);
    }

    /// Test whether bit at `index` is set.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.words
            .get(index >> 6)
            .map_or(false, |w| w & (1u64 << (index & 63)) != 0)
    }
}

// ─── Signature ──────────────────────────────────────────────────────────────

/// 64-bit content signature of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowSignature(pub u64);

impl RowSignature {
    /// FNV-1a over the row bytes.
    pub fn of(text: &str) -> Self {
        let mut h: u64 = 0xcbf29ce484222325;
        for &b in text.as_bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        Self(h)
    }
}

// ─── DuplicateIndex ─────────────────────────────────────────────────────────

/// Signatures seen so far, each mapped to the row where it first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateIndex {
    seen: HashMap<RowSignature, usize>,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `text` at `row`. Returns the first-seen row if this is a repeat.
    pub fn observe(&mut self, text: &str, row: usize) -> Option<usize> {
        match self.seen.entry(RowSignature::of(text)) {
            std::collections::hash_map::Entry::Occupied(e) => Some(*e.get()),
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(row);
                None
            }
        }
    }

    /// Number of distinct rows observed.
    pub fn distinct_rows(&self) -> usize {
        self.seen.len()
    }
}
