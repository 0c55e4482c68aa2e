//! Batched output writing
//!
//! Candidates are buffered in memory and appended to the destination one
//! batch at a time. The file is opened for each flush and closed right after,
//! so a killed run leaves only complete lines behind.

use crate::error::{PwgenError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default number of candidates per batch
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// What happens to an existing destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Empty the destination once before the first batch
    #[default]
    Truncate,
    /// Keep existing content and append after it
    Append,
}

/// Newline-delimited batch writer
pub struct BatchWriter {
    path: PathBuf,
    batch: Vec<String>,
    batch_size: usize,
    lines_written: u64,
    bytes_written: u64,
    flushes: u64,
}

impl BatchWriter {
    /// Prepare the destination: parent directories are created and, in
    /// [`WriteMode::Truncate`], the file is emptied.
    pub fn new(path: impl Into<PathBuf>, mode: WriteMode, batch_size: usize) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;

        if mode == WriteMode::Truncate {
            File::create(&path).map_err(|e| PwgenError::output(&path, e))?;
        }

        let batch_size = batch_size.max(1);
        Ok(Self {
            path,
            batch: Vec::with_capacity(batch_size.min(DEFAULT_BATCH_SIZE)),
            batch_size,
            lines_written: 0,
            bytes_written: 0,
            flushes: 0,
        })
    }

    /// Queue a line. Returns true if this push filled the batch and flushed it.
    pub fn push(&mut self, line: String) -> Result<bool> {
        self.batch.push(line);
        if self.batch.len() >= self.batch_size {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Append the pending batch to the destination
    pub fn flush(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PwgenError::output(&self.path, e))?;

        let mut writer = BufWriter::new(file);
        let mut bytes = 0u64;
        for line in &self.batch {
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| PwgenError::output(&self.path, e))?;
            bytes += line.len() as u64 + 1;
        }
        writer.flush().map_err(|e| PwgenError::output(&self.path, e))?;

        self.lines_written += self.batch.len() as u64;
        self.bytes_written += bytes;
        self.flushes += 1;
        self.batch.clear();
        Ok(())
    }

    /// Drop the pending batch without writing it. Returns how many lines were lost.
    pub fn discard(&mut self) -> usize {
        let dropped = self.batch.len();
        self.batch.clear();
        dropped
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines that reached the destination
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

/// Create the parent directory of `path` if missing
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| PwgenError::output(parent, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_batches_flush_at_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let mut writer = BatchWriter::new(&path, WriteMode::Truncate, 2).unwrap();

        assert!(!writer.push("a".into()).unwrap());
        assert!(writer.push("b".into()).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");

        writer.push("c".into()).unwrap();
        assert_eq!(writer.pending(), 1);
        writer.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
        assert_eq!(writer.lines_written(), 3);
        assert_eq!(writer.bytes_written(), 6);
        assert_eq!(writer.flushes(), 2);
    }

    #[test]
    fn test_truncate_vs_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old\n").unwrap();

        let mut writer = BatchWriter::new(&path, WriteMode::Append, 10).unwrap();
        writer.push("new".into()).unwrap();
        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");

        let writer = BatchWriter::new(&path, WriteMode::Truncate, 10).unwrap();
        assert_eq!(writer.lines_written(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.txt");
        let mut writer = BatchWriter::new(&path, WriteMode::Truncate, 10).unwrap();
        writer.push("x".into()).unwrap();
        writer.flush().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_discard_drops_pending() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let mut writer = BatchWriter::new(&path, WriteMode::Truncate, 10).unwrap();
        writer.push("lost".into()).unwrap();
        assert_eq!(writer.discard(), 1);
        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let mut writer = BatchWriter::new(&path, WriteMode::Truncate, 10).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.flushes(), 0);
    }
}
