//! Fileproof - Memory-mapped input handling
//!
//! Provides zero-copy line access to data files using mmap.
//! Also supports reading from stdin for pipeline workflows.

use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Storage backend for the dataset
enum DataStorage {
    /// Memory-mapped file (zero-copy, for large files)
    Mmap(Mmap),
    /// In-memory buffer (for stdin or empty files)
    InMemory(Vec<u8>),
}

impl DataStorage {
    fn as_bytes(&self) -> &[u8] {
        match self {
            DataStorage::Mmap(m) => m.as_ref(),
            DataStorage::InMemory(v) => v.as_slice(),
        }
    }
}

/// Input file backed by a memory map or an in-memory buffer, with pre-computed line offsets
pub struct Dataset {
    /// Data storage (mmap or in-memory)
    storage: DataStorage,
    /// Byte offsets for the start of each line
    line_offsets: Vec<usize>,
    /// File path for display
    pub path: String,
    /// File size in bytes
    pub size: u64,
}

impl Dataset {
    /// Open a file and build the line index
    ///
    /// This memory-maps the file (instant open) and scans for newlines
    /// to enable O(1) access to any line.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref)
            .with_context(|| format!("Failed to open file: {}", path_ref.display()))?;

        let metadata = file
            .metadata()
            .with_context(|| format!("Failed to stat file: {}", path_ref.display()))?;
        let size = metadata.len();

        // Zero-length maps are rejected by some platforms
        let storage = if size == 0 {
            DataStorage::InMemory(Vec::new())
        } else {
            let mmap = unsafe { Mmap::map(&file) }
                .with_context(|| format!("Failed to map file: {}", path_ref.display()))?;
            DataStorage::Mmap(mmap)
        };

        Ok(Self::from_storage(
            storage,
            path_ref.display().to_string(),
            size,
        ))
    }

    /// Read dataset from stdin
    ///
    /// Supports pipeline workflows: `cat data.csv | fileproof -`
    pub fn from_stdin() -> Result<Self> {
        let mut buffer = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .context("Failed to read from stdin")?;
        let size = buffer.len() as u64;
        Ok(Self::from_storage(
            DataStorage::InMemory(buffer),
            "<stdin>".to_string(),
            size,
        ))
    }

    /// Wrap an in-memory buffer (used by tests and embedders)
    pub fn from_bytes(bytes: Vec<u8>, path: impl Into<String>) -> Self {
        let size = bytes.len() as u64;
        Self::from_storage(DataStorage::InMemory(bytes), path.into(), size)
    }

    fn from_storage(storage: DataStorage, path: String, size: u64) -> Self {
        let bytes = storage.as_bytes();
        let mut line_offsets = Vec::new();
        if !bytes.is_empty() {
            line_offsets.push(0);
            for (i, &byte) in bytes.iter().enumerate() {
                if byte == b'\n' && i + 1 < bytes.len() {
                    line_offsets.push(i + 1);
                }
            }
        }

        Self {
            storage,
            line_offsets,
            path,
            size,
        }
    }

    /// Get the total number of lines in the file
    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// Raw bytes of a line, without its terminator
    fn line_bytes(&self, index: usize) -> Option<&[u8]> {
        let data = self.storage.as_bytes();
        let start = *self.line_offsets.get(index)?;
        let mut end = match self.line_offsets.get(index + 1) {
            Some(next) => next - 1,
            None if data.ends_with(b"\n") => data.len() - 1,
            None => data.len(),
        };
        if end > start && data[end - 1] == b'\r' {
            end -= 1;
        }
        Some(&data[start..end.max(start)])
    }

    /// Iterate over all lines in order.
    ///
    /// A line that is not valid UTF-8 yields an `InvalidData` error.
    pub fn lines(&self) -> impl Iterator<Item = io::Result<&str>> + '_ {
        (0..self.line_count()).map(move |i| {
            let bytes = self.line_bytes(i).unwrap_or_default();
            std::str::from_utf8(bytes).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {} is not valid UTF-8: {}", i + 1, e),
                )
            })
        })
    }

    /// First `count` lines, for delimiter sniffing. Stops at the first undecodable line.
    pub fn sample_lines(&self, count: usize) -> Vec<&str> {
        self.lines()
            .take(count)
            .map_while(|line| line.ok())
            .collect()
    }

    /// Whole content as text (JSON mode)
    pub fn text(&self) -> io::Result<&str> {
        std::str::from_utf8(self.storage.as_bytes()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("content is not valid UTF-8: {}", e),
            )
        })
    }

    /// File name without directories, for report headers
    pub fn file_name(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.clone())
    }

    /// Get formatted file size string
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size >= GB {
            format!("{:.2} GB", self.size as f64 / GB as f64)
        } else if self.size >= MB {
            format!("{:.2} MB", self.size as f64 / MB as f64)
        } else if self.size >= KB {
            format!("{:.2} KB", self.size as f64 / KB as f64)
        } else {
            format!("{} B", self.size)
        }
    }
}
