use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
  sync::{atomic::AtomicBool, Arc},
  time::Instant,
};

use bytes::Bytes;
use log::warn;
use parking_lot::RwLock;
use serde_json::Value;

use crate::{
  data::{
    log_file::{LogFile, LogReader},
    log_record::LogRecord,
  },
  errors::{Errors, Result},
  option::Options,
};

pub const LOG_FILE_SUFFIX: &str = ".jsonl";
pub(crate) const TMP_FILE_SUFFIX: &str = ".tmp";

/// One independent namespace of keys, backed by its own append-only log and
/// in-memory index.
///
/// The index is the authoritative read view; the log is the authoritative
/// recovery source. All of a collection's mutable state sits behind one
/// RwLock: reads share it, writes and compaction take it exclusively.
pub struct Collection {
  pub(crate) name: String,
  pub(crate) opts: Options,
  pub(crate) inner: RwLock<CollectionInner>,
  /// Single-slot compaction guard, at most one compaction in flight.
  pub(crate) compacting: AtomicBool,
}

pub(crate) struct CollectionInner {
  pub(crate) log: LogFile,
  pub(crate) index: BTreeMap<String, Bytes>,
  /// Log lines written since the last compaction, tombstones included.
  pub(crate) lines: usize,
  pub(crate) last_flush: Instant,
}

impl Collection {
  /// Opens or creates the collection's log and rebuilds the index by replay.
  ///
  /// Blank lines are ignored. Corrupt lines are logged and skipped without
  /// aborting recovery, and do not count toward the line counter.
  pub(crate) fn open(name: &str, opts: &Options) -> Result<Self> {
    let path = log_file_path(&opts.dir_path, name);
    let log = LogFile::open(&path, opts.flush_buffer_bytes)?;

    let mut index = BTreeMap::new();
    let mut lines = 0usize;
    for line in LogReader::open(&path)? {
      let line = line?;
      if line.iter().all(|b| b.is_ascii_whitespace()) {
        continue;
      }
      let record = match LogRecord::decode(&line) {
        Ok(record) => record,
        Err(e) => {
          warn!("skip corrupt line in {}: {}", path.display(), e);
          continue;
        }
      };
      if record.tombstone {
        index.remove(&record.key);
      } else {
        let value = record.value_bytes()?;
        index.insert(record.key, value);
      }
      lines += 1;
    }

    Ok(Self {
      name: name.to_string(),
      opts: opts.clone(),
      inner: RwLock::new(CollectionInner {
        log,
        index,
        lines,
        last_flush: Instant::now(),
      }),
      compacting: AtomicBool::new(false),
    })
  }

  /// Appends a record for `key` and updates the index, last write wins.
  ///
  /// The value must be valid JSON; it is normalized to one compact line
  /// before anything is written.
  pub fn put(self: &Arc<Self>, key: &str, value: Bytes) -> Result<()> {
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }
    let parsed: Value = serde_json::from_slice(&value).map_err(|_| Errors::InvalidJsonValue)?;

    let record = LogRecord::normal(self.name.clone(), key.to_string(), parsed);
    let payload = record.value_bytes()?;
    let encoded = record.encode()?;

    let should_compact = {
      let mut inner = self.inner.write();
      inner.log.append(&encoded)?;
      inner.index.insert(key.to_string(), payload);
      inner.lines += 1;
      self.flush_if_due(&mut inner)?;
      self.past_dead_ratio(&inner)
    };

    if should_compact {
      self.trigger_compact();
    }
    Ok(())
  }

  /// Appends a tombstone for `key` and drops it from the index. Deleting an
  /// absent key appends nothing.
  pub fn delete(self: &Arc<Self>, key: &str) -> Result<()> {
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }

    let record = LogRecord::deleted(self.name.clone(), key.to_string());
    let encoded = record.encode()?;

    let should_compact = {
      let mut inner = self.inner.write();
      if !inner.index.contains_key(key) {
        return Ok(());
      }
      inner.log.append(&encoded)?;
      inner.index.remove(key);
      inner.lines += 1;
      self.flush_if_due(&mut inner)?;
      self.past_dead_ratio(&inner)
    };

    if should_compact {
      self.trigger_compact();
    }
    Ok(())
  }

  /// Index lookup; never touches the log file.
  pub fn get(&self, key: &str) -> Option<Bytes> {
    self.inner.read().index.get(key).cloned()
  }

  /// A sorted (key, value) snapshot filtered by `prefix`, then paged by
  /// `offset` and `limit`. Recomputed on every call, not a live cursor.
  pub fn list(&self, prefix: &str, limit: usize, offset: usize) -> Vec<(String, Bytes)> {
    let inner = self.inner.read();
    inner
      .index
      .iter()
      .filter(|(key, _)| prefix.is_empty() || key.starts_with(prefix))
      .skip(offset)
      .take(limit)
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect()
  }

  /// Every (key, value) pair matching `prefix`, in key order.
  pub(crate) fn matching(&self, prefix: &str) -> Vec<(String, Bytes)> {
    self.list(prefix, usize::MAX, 0)
  }

  /// Flushes the write buffer and fsyncs the log.
  pub fn sync(&self) -> Result<()> {
    let mut inner = self.inner.write();
    inner.log.sync()?;
    inner.last_flush = Instant::now();
    Ok(())
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn key_count(&self) -> usize {
    self.inner.read().index.len()
  }

  pub fn line_count(&self) -> usize {
    self.inner.read().lines
  }

  fn flush_if_due(&self, inner: &mut CollectionInner) -> Result<()> {
    if inner.log.buffered() >= self.opts.flush_buffer_bytes
      || inner.last_flush.elapsed() >= self.opts.flush_interval
    {
      inner.log.flush()?;
      inner.last_flush = Instant::now();
    }
    Ok(())
  }

  /// True once more than half the log is dead weight, past the minimum size.
  pub(crate) fn past_dead_ratio(&self, inner: &CollectionInner) -> bool {
    inner.lines > self.opts.compact_min_lines
      && inner.lines > self.opts.compact_dead_factor * inner.index.len()
  }
}

pub(crate) fn log_file_path(dir: &Path, name: &str) -> PathBuf {
  dir.join(format!("{}{}", name, LOG_FILE_SUFFIX))
}

pub(crate) fn tmp_file_path(dir: &Path, name: &str) -> PathBuf {
  dir.join(format!("{}{}", name, TMP_FILE_SUFFIX))
}
