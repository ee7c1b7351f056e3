//! Cursor-based tailing of the application log.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::models::LogLine;

/// Errors surfaced by a tail read.
#[derive(Debug, Error)]
pub enum TailError {
    /// The log file does not exist. Surfaced as a condition by the
    /// orchestrator; the cursor is not advanced.
    #[error("Log file not found: {0}")]
    Missing(PathBuf),

    /// The file exists but could not be read this cycle.
    #[error("Failed to read log file: {0}")]
    Io(#[from] io::Error),
}

/// Tracks a byte-offset read cursor into the application log and returns only
/// lines appended since monitor start.
///
/// State is in-memory only: a restart of the watchdog begins a fresh
/// ignore-window, which is the intended semantics — everything already in the
/// log at startup is permanently excluded regardless of keyword content.
#[derive(Debug)]
pub struct LogTailTracker {
    path: PathBuf,
    cursor: u64,
}

impl LogTailTracker {
    /// Creates a tracker with its baseline at the file's current end.
    ///
    /// If the file does not exist yet, the baseline is offset zero: any
    /// content that appears later was necessarily written after start.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cursor = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self { path, cursor }
    }

    /// The current read cursor, for logging and tests.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// The log file being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads lines appended since the last call and advances the cursor to
    /// the new end of file.
    ///
    /// A file smaller than the stored cursor is treated as rotation: the
    /// cursor resets to zero and the whole file is read, since the historical
    /// content it pointed into is gone. Pre-rotation content is never
    /// retroactively surfaced.
    pub fn read_new(&mut self) -> Result<Vec<LogLine>, TailError> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TailError::Missing(self.path.clone()));
            }
            Err(e) => return Err(TailError::Io(e)),
        };

        let len = metadata.len();
        if len < self.cursor {
            tracing::warn!(
                path = %self.path.display(),
                cursor = self.cursor,
                len,
                "Log file shrank below cursor, assuming rotation"
            );
            self.cursor = 0;
        }

        if len == self.cursor {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.cursor))?;
        let mut buf = Vec::with_capacity((len - self.cursor) as usize);
        file.take(len - self.cursor).read_to_end(&mut buf)?;

        let start = self.cursor;
        self.cursor = len;

        Ok(split_lines(&buf, start))
    }
}

/// Splits a raw appended region into lines with their originating offsets.
/// Invalid UTF-8 is replaced rather than dropped so keyword matching still
/// sees the rest of the line.
fn split_lines(buf: &[u8], base_offset: u64) -> Vec<LogLine> {
    let mut lines = Vec::new();
    let mut line_start = 0usize;

    for (i, byte) in buf.iter().enumerate() {
        if *byte == b'\n' {
            let raw = &buf[line_start..i];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            lines.push(LogLine {
                offset: base_offset + line_start as u64,
                text: String::from_utf8_lossy(raw).into_owned(),
            });
            line_start = i + 1;
        }
    }

    if line_start < buf.len() {
        lines.push(LogLine {
            offset: base_offset + line_start as u64,
            text: String::from_utf8_lossy(&buf[line_start..]).into_owned(),
        });
    }

    lines
}
