use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, Errors>;

#[derive(Error, Debug, PartialEq)]
pub enum Errors {
  #[error("the key is empty")]
  KeyIsEmpty,

  #[error("the value is not valid JSON")]
  InvalidJsonValue,

  #[error("corrupt log record: {0}")]
  CorruptLogRecord(String),

  #[error("failed to create the store directory")]
  FailedToCreateStoreDir,

  #[error("failed to read the store directory")]
  FailedToReadStoreDir,

  #[error("failed to lock the store directory")]
  FailedToLockStoreDir,

  #[error("the store directory is used by another process")]
  StoreDirInUse,

  #[error("failed to open collection log file")]
  FailedToOpenLogFile,

  #[error("failed to read collection log file")]
  FailedToReadLogFile,

  #[error("failed to write collection log file")]
  FailedToWriteLogFile,

  #[error("failed to flush collection log file")]
  FailedToFlushLogFile,

  #[error("failed to sync collection log file")]
  FailedToSyncLogFile,

  #[error("failed to encode log record")]
  FailedToEncodeRecord,

  #[error("failed to replace collection log file")]
  FailedToReplaceLogFile,

  #[error("compaction already in progress")]
  CompactionInProgress,

  #[error("failed to write list output")]
  FailedToWriteListOutput,
}
