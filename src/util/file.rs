use std::path::Path;

/// Total on-disk size of a directory in bytes, zero if it cannot be read.
pub fn dir_disk_size<P>(dir_path: P) -> u64
where
  P: AsRef<Path>,
{
  if let Ok(size) = fs_extra::dir::get_size(dir_path) {
    return size;
  }
  0
}
