use std::{
  fs::{self, File, OpenOptions},
  io::{BufRead, BufReader, BufWriter, Write},
  path::{Path, PathBuf},
};

use log::error;

use crate::errors::{Errors, Result};

/// Append-only handle on a collection's log file.
///
/// Writes go through a fixed-capacity buffer; callers decide when to flush.
pub struct LogFile {
  path: PathBuf,
  writer: BufWriter<File>,
}

impl LogFile {
  /// Opens the log at `path` for appending, creating it if absent.
  pub fn open<P>(path: P, buffer_capacity: usize) -> Result<Self>
  where
    P: AsRef<Path>,
  {
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .map_err(|e| {
        error!("failed to open log file {}: {}", path.as_ref().display(), e);
        Errors::FailedToOpenLogFile
      })?;

    Ok(Self {
      path: path.as_ref().to_path_buf(),
      writer: BufWriter::with_capacity(buffer_capacity, file),
    })
  }

  /// Creates an empty log at `path`, truncating anything already there.
  /// Used for compaction temp files.
  pub fn create<P>(path: P, buffer_capacity: usize) -> Result<Self>
  where
    P: AsRef<Path>,
  {
    let file = OpenOptions::new()
      .create(true)
      .write(true)
      .truncate(true)
      .open(&path)
      .map_err(|e| {
        error!("failed to create log file {}: {}", path.as_ref().display(), e);
        Errors::FailedToOpenLogFile
      })?;

    Ok(Self {
      path: path.as_ref().to_path_buf(),
      writer: BufWriter::with_capacity(buffer_capacity, file),
    })
  }

  /// Appends one encoded record as a newline-terminated line.
  pub fn append(&mut self, encoded: &[u8]) -> Result<()> {
    self
      .writer
      .write_all(encoded)
      .and_then(|_| self.writer.write_all(b"\n"))
      .map_err(|e| {
        error!("failed to write log file {}: {}", self.path.display(), e);
        Errors::FailedToWriteLogFile
      })
  }

  /// Bytes sitting in the write buffer, not yet handed to the OS.
  pub fn buffered(&self) -> usize {
    self.writer.buffer().len()
  }

  pub fn flush(&mut self) -> Result<()> {
    self.writer.flush().map_err(|e| {
      error!("failed to flush log file {}: {}", self.path.display(), e);
      Errors::FailedToFlushLogFile
    })
  }

  pub fn sync(&mut self) -> Result<()> {
    self.flush()?;
    self.writer.get_ref().sync_all().map_err(|e| {
      error!("failed to sync log file {}: {}", self.path.display(), e);
      Errors::FailedToSyncLogFile
    })
  }

  /// Renames the file to `dest` while keeping the open handle, so the writer
  /// stays positioned at the end of the renamed file.
  pub fn persist(&mut self, dest: &Path) -> Result<()> {
    fs::rename(&self.path, dest).map_err(|e| {
      error!(
        "failed to rename {} over {}: {}",
        self.path.display(),
        dest.display(),
        e
      );
      Errors::FailedToReplaceLogFile
    })?;
    self.path = dest.to_path_buf();
    Ok(())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

/// Reads a log file line by line for replay. Yields raw line bytes with the
/// terminator stripped; a trailing line without a terminator is still yielded
/// so the decoder can judge it.
pub struct LogReader {
  path: PathBuf,
  inner: BufReader<File>,
}

impl LogReader {
  pub fn open<P>(path: P) -> Result<Self>
  where
    P: AsRef<Path>,
  {
    let file = File::open(&path).map_err(|e| {
      error!("failed to open log file {}: {}", path.as_ref().display(), e);
      Errors::FailedToOpenLogFile
    })?;

    Ok(Self {
      path: path.as_ref().to_path_buf(),
      inner: BufReader::new(file),
    })
  }
}

impl Iterator for LogReader {
  type Item = Result<Vec<u8>>;

  fn next(&mut self) -> Option<Self::Item> {
    let mut line = Vec::new();
    match self.inner.read_until(b'\n', &mut line) {
      Ok(0) => None,
      Ok(_) => {
        if line.last() == Some(&b'\n') {
          line.pop();
        }
        Some(Ok(line))
      }
      Err(e) => {
        error!("failed to read log file {}: {}", self.path.display(), e);
        Some(Err(Errors::FailedToReadLogFile))
      }
    }
  }
}
