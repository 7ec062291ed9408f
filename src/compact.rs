#![allow(clippy::field_reassign_with_default)]
use std::{
  sync::{atomic::Ordering, Arc},
  thread,
  time::Instant,
};

use log::{debug, error, info};
use time::OffsetDateTime;

use crate::{
  collection::{log_file_path, tmp_file_path, Collection},
  data::{log_file::LogFile, log_record::LogRecord},
  errors::{Errors, Result},
};

impl Collection {
  /// Rewrites the log to exactly one record per live key, discarding
  /// tombstones and superseded versions.
  ///
  /// Holds the collection's exclusive lock for the whole rewrite, so reads
  /// and writes on this collection block until it finishes. The temp file is
  /// the only thing written; the live path changes only through one atomic
  /// rename, and any failure before that leaves log and index untouched.
  pub fn compact(&self) -> Result<()> {
    if self
      .compacting
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return Err(Errors::CompactionInProgress);
    }

    let res = self.rewrite_live();
    self.compacting.store(false, Ordering::SeqCst);
    res
  }

  fn rewrite_live(&self) -> Result<()> {
    let mut inner = self.inner.write();

    inner.log.flush()?;

    let tmp_path = tmp_file_path(&self.opts.dir_path, &self.name);
    let mut tmp = LogFile::create(&tmp_path, self.opts.flush_buffer_bytes)?;

    let ts = OffsetDateTime::now_utc();
    for (key, value) in inner.index.iter() {
      let record = LogRecord {
        collection: self.name.clone(),
        key: key.clone(),
        value: serde_json::from_slice(value)
          .map_err(|e| Errors::CorruptLogRecord(e.to_string()))?,
        ts,
        tombstone: false,
      };
      tmp.append(&record.encode()?)?;
    }
    tmp.flush()?;
    tmp.sync()?;

    // The handle survives the rename, already positioned at end of the
    // renamed file; no fallible step remains after the publish.
    tmp.persist(&log_file_path(&self.opts.dir_path, &self.name))?;

    inner.log = tmp;
    inner.lines = inner.index.len();
    inner.last_flush = Instant::now();

    info!(
      "compacted collection={} to {} lines",
      self.name, inner.lines
    );
    Ok(())
  }

  /// Fire-and-forget background compaction. The single-slot guard keeps at
  /// most one compaction per collection in flight; a trigger while one runs
  /// is dropped. Failures are logged, never surfaced to the writer that
  /// tripped the trigger.
  pub(crate) fn trigger_compact(self: &Arc<Self>) {
    if self.compacting.load(Ordering::SeqCst) {
      return;
    }

    let collection = Arc::clone(self);
    thread::spawn(move || match collection.compact() {
      Ok(()) => {}
      Err(Errors::CompactionInProgress) => {
        debug!("compaction already running for collection={}", collection.name);
      }
      Err(e) => {
        error!("compaction failed for collection={}: {}", collection.name, e);
      }
    });
  }
}
