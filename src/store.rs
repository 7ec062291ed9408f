use std::{
  collections::HashMap,
  fs::{self, File},
  io::Write,
  path::Path,
  sync::Arc,
};

use bytes::Bytes;
use fs2::FileExt;
use log::{error, warn};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::value::RawValue;

use crate::{
  collection::{Collection, LOG_FILE_SUFFIX},
  errors::{Errors, Result},
  option::{ListOptions, Options},
  util,
};

pub(crate) const FILE_LOCK_NAME: &str = "flock";
pub const DEFAULT_COLLECTION: &str = "default";

/// Registry of collections sharing one storage directory.
///
/// Collections are discovered from existing `.jsonl` logs at open time and
/// created lazily on first reference afterwards; none is ever destroyed while
/// the process lives. An exclusive file lock keeps the directory
/// single-process.
pub struct Store {
  opts: Options,
  collections: RwLock<HashMap<String, Arc<Collection>>>,
  _lock_file: File,
}

/// A point-in-time summary of the store.
#[derive(Debug, Serialize)]
pub struct Stat {
  pub collection_num: usize,
  pub key_num: usize,
  pub log_lines: usize,
  pub reclaimable_lines: usize,
  pub disk_size: u64,
}

#[derive(Serialize)]
struct ListItem<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  collection: Option<&'a str>,
  key: &'a str,
  value: &'a RawValue,
}

impl Store {
  /// Opens the store rooted at `opts.dir_path`, creating the directory if
  /// absent and replaying every collection log found inside it. A collection
  /// that fails to open is skipped; a missing `default` collection is
  /// created and must succeed.
  pub fn open(opts: Options) -> Result<Store> {
    fs::create_dir_all(&opts.dir_path).map_err(|e| {
      error!(
        "failed to create store directory {}: {}",
        opts.dir_path.display(),
        e
      );
      Errors::FailedToCreateStoreDir
    })?;

    let lock_file = fs::OpenOptions::new()
      .create(true)
      .read(true)
      .write(true)
      .open(opts.dir_path.join(FILE_LOCK_NAME))
      .map_err(|e| {
        error!("failed to open store lock file: {}", e);
        Errors::FailedToLockStoreDir
      })?;
    lock_file
      .try_lock_exclusive()
      .map_err(|_| Errors::StoreDirInUse)?;

    let store = Store {
      opts,
      collections: RwLock::new(HashMap::new()),
      _lock_file: lock_file,
    };

    store.discover_collections()?;
    store.open_collection(DEFAULT_COLLECTION)?;
    Ok(store)
  }

  fn discover_collections(&self) -> Result<()> {
    let entries = fs::read_dir(&self.opts.dir_path).map_err(|e| {
      error!(
        "failed to read store directory {}: {}",
        self.opts.dir_path.display(),
        e
      );
      Errors::FailedToReadStoreDir
    })?;

    for entry in entries.flatten() {
      if !entry.path().is_file() {
        continue;
      }
      let file_name = entry.file_name();
      let name = match file_name
        .to_str()
        .and_then(|file_name| file_name.strip_suffix(LOG_FILE_SUFFIX))
      {
        Some(name) if !name.is_empty() => name,
        _ => continue,
      };
      if let Err(e) = self.open_collection(name) {
        warn!("skip collection {}: {}", name, e);
      }
    }
    Ok(())
  }

  /// Returns the collection named `name`, creating it on first reference.
  pub fn open_collection(&self, name: &str) -> Result<Arc<Collection>> {
    if let Some(collection) = self.collections.read().get(name) {
      return Ok(Arc::clone(collection));
    }

    let mut collections = self.collections.write();
    if let Some(collection) = collections.get(name) {
      return Ok(Arc::clone(collection));
    }
    let collection = Arc::new(Collection::open(name, &self.opts)?);
    collections.insert(name.to_string(), Arc::clone(&collection));
    Ok(collection)
  }

  pub fn put(&self, collection: &str, key: &str, value: Bytes) -> Result<()> {
    let collection = self.open_collection(resolve_collection(collection))?;
    collection.put(key, value)
  }

  pub fn get(&self, collection: &str, key: &str) -> Option<Bytes> {
    let collection = self.open_collection(resolve_collection(collection)).ok()?;
    collection.get(key)
  }

  pub fn delete(&self, collection: &str, key: &str) -> Result<()> {
    let collection = self.open_collection(resolve_collection(collection))?;
    collection.delete(key)
  }

  /// Streams a JSON array of `{collection?, key, value}` objects to `sink`.
  ///
  /// With no collection set, all collections are visited in name order and
  /// the offset and limit are consumed across the whole concatenation. The
  /// limit is capped; `0` means the store's default page size. Each
  /// collection's snapshot is taken under its shared lock and serialized
  /// after the lock is released.
  pub fn list_to(&self, opts: &ListOptions, sink: &mut dyn Write) -> Result<()> {
    let limit = if opts.limit == 0 {
      self.opts.default_list_limit
    } else {
      opts.limit.min(self.opts.max_list_limit)
    };

    let names = match &opts.collection {
      Some(name) => vec![resolve_collection(name).to_string()],
      None => {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
      }
    };

    write_sink(sink, b"[")?;
    let mut wrote = 0usize;
    let mut skipped = 0usize;
    let mut first = true;

    for name in &names {
      let collection = match self.open_collection(name) {
        Ok(collection) => collection,
        Err(e) => {
          warn!("skip collection {} while listing: {}", name, e);
          continue;
        }
      };

      for (key, value) in collection.matching(&opts.prefix) {
        if skipped < opts.offset {
          skipped += 1;
          continue;
        }
        if wrote >= limit {
          break;
        }
        if !first {
          write_sink(sink, b",")?;
        }
        first = false;

        let item = ListItem {
          collection: opts.include_collection.then_some(name.as_str()),
          key: &key,
          value: raw_payload(&value)?,
        };
        serde_json::to_writer(&mut *sink, &item).map_err(|e| {
          error!("failed to write list output: {}", e);
          Errors::FailedToWriteListOutput
        })?;
        wrote += 1;
      }
      if wrote >= limit {
        break;
      }
    }
    write_sink(sink, b"]")
  }

  pub fn stat(&self) -> Result<Stat> {
    let collections: Vec<Arc<Collection>> =
      self.collections.read().values().cloned().collect();

    let mut key_num = 0;
    let mut log_lines = 0;
    for collection in &collections {
      key_num += collection.key_count();
      log_lines += collection.line_count();
    }

    Ok(Stat {
      collection_num: collections.len(),
      key_num,
      log_lines,
      reclaimable_lines: log_lines.saturating_sub(key_num),
      disk_size: util::file::dir_disk_size(&self.opts.dir_path),
    })
  }

  /// Flushes and fsyncs every collection's log.
  pub fn sync(&self) -> Result<()> {
    let collections: Vec<Arc<Collection>> =
      self.collections.read().values().cloned().collect();
    for collection in collections {
      collection.sync()?;
    }
    Ok(())
  }

  pub fn dir_path(&self) -> &Path {
    &self.opts.dir_path
  }
}

/// Empty or whitespace collection names fall back to the default collection.
pub(crate) fn resolve_collection(name: &str) -> &str {
  let name = name.trim();
  if name.is_empty() {
    DEFAULT_COLLECTION
  } else {
    name
  }
}

fn raw_payload(value: &[u8]) -> Result<&RawValue> {
  serde_json::from_slice(value).map_err(|e| Errors::CorruptLogRecord(e.to_string()))
}

fn write_sink(sink: &mut dyn Write, bytes: &[u8]) -> Result<()> {
  sink.write_all(bytes).map_err(|e| {
    error!("failed to write list output: {}", e);
    Errors::FailedToWriteListOutput
  })
}
