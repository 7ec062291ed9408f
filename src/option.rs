use lazy_static::lazy_static;
use std::{path::PathBuf, time::Duration};

lazy_static! {
  pub static ref DEFAULT_DIR_PATH: PathBuf = std::env::temp_dir().join("jotdb");
}

#[derive(Debug, Clone)]
pub struct Options {
  pub dir_path: PathBuf,

  /// Buffered bytes that force a flush of a collection's write buffer.
  pub flush_buffer_bytes: usize,

  /// Elapsed time since the last flush that forces one on the next write.
  pub flush_interval: Duration,

  /// Minimum log lines before compaction is considered at all.
  pub compact_min_lines: usize,

  /// Compaction runs once lines exceed `compact_dead_factor * live_keys`.
  pub compact_dead_factor: usize,

  pub default_list_limit: usize,

  pub max_list_limit: usize,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      dir_path: DEFAULT_DIR_PATH.clone(),
      flush_buffer_bytes: 256 * 1024, // 256KB
      flush_interval: Duration::from_secs(2),
      compact_min_lines: 1000,
      compact_dead_factor: 2,
      default_list_limit: 100,
      max_list_limit: 10000,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
  /// Collection to list, or `None` for all collections in name order.
  pub collection: Option<String>,

  pub prefix: String,

  /// Requested page size; `0` falls back to the store's default limit.
  pub limit: usize,

  pub offset: usize,

  pub include_collection: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for ListOptions {
  fn default() -> Self {
    Self {
      collection: None,
      prefix: String::new(),
      limit: 0,
      offset: 0,
      include_collection: false,
    }
  }
}
