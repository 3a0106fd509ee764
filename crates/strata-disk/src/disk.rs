//! The disk interface.

use std::time::SystemTime;

use strata_core::DiskError;

use crate::stream::{ReadStream, WriteStream};
use crate::DEFAULT_BUF_SIZE;

/// Write mode for [`Disk::write_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace any existing content
    Rewrite,
    /// Extend existing content, creating the file when missing
    Append,
}

/// Settings applied when opening a read stream.
#[derive(Debug, Clone)]
pub struct ReadSettings {
    /// Stream buffer size in bytes
    pub buffer_size: usize,
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUF_SIZE,
        }
    }
}

/// Settings applied when opening a write stream.
#[derive(Debug, Clone, Default)]
pub struct WriteSettings {
    /// Sync file contents to storage when the stream is finalized
    pub sync_on_finalize: bool,
}

/// A lazy sequence of directory entries.
///
/// Items are full logical paths; directory entries carry a trailing `/`.
/// The iterator is a snapshot; re-listing requires re-construction.
pub type DirectoryIterator = Box<dyn Iterator<Item = Result<String, DiskError>> + Send>;

/// A blocking store of files and directories addressed by logical paths.
///
/// Paths are relative POSIX paths rooted at the disk; `""` names the root.
/// Implementations guarantee per-path atomicity for their own primitives
/// and nothing across primitives; callers compose them.
pub trait Disk: Send + Sync {
    /// Returns the disk name used in configuration and registries.
    fn name(&self) -> &str;

    /// Returns true if `path` exists.
    fn exists(&self, path: &str) -> Result<bool, DiskError>;

    /// Returns true if `path` exists and is a regular file.
    fn is_file(&self, path: &str) -> Result<bool, DiskError>;

    /// Returns true if `path` exists and is a directory.
    fn is_directory(&self, path: &str) -> Result<bool, DiskError>;

    /// Returns the size of the file at `path` in bytes.
    fn file_size(&self, path: &str) -> Result<u64, DiskError>;

    /// Creates an empty file. Fails with `AlreadyExists` if `path` exists.
    fn create_file(&self, path: &str) -> Result<(), DiskError>;

    /// Creates a single directory. The parent must already exist.
    fn create_directory(&self, path: &str) -> Result<(), DiskError>;

    /// Creates `path` and all missing ancestors, idempotently.
    fn create_directories(&self, path: &str) -> Result<(), DiskError>;

    /// Removes every entry inside the directory, keeping the directory.
    fn clear_directory(&self, path: &str) -> Result<(), DiskError>;

    /// Moves a file. `to` must not exist.
    fn move_file(&self, from: &str, to: &str) -> Result<(), DiskError>;

    /// Moves a directory. `to` must not exist.
    fn move_directory(&self, from: &str, to: &str) -> Result<(), DiskError>;

    /// Moves `from` over `to`, replacing `to` if it exists.
    fn replace_file(&self, from: &str, to: &str) -> Result<(), DiskError>;

    /// Lists the names of the entries in a directory. Order is unspecified.
    fn list_files(&self, path: &str) -> Result<Vec<String>, DiskError>;

    /// Iterates a directory, yielding full paths (directories with `/`).
    fn iterate_directory(&self, path: &str) -> Result<DirectoryIterator, DiskError>;

    /// Opens a read stream over the file at `path`.
    ///
    /// `read_hint` and `file_size` let callers pass along knowledge that
    /// can spare the disk a stat; implementations may ignore them.
    fn read_file(
        &self,
        path: &str,
        settings: ReadSettings,
        read_hint: Option<u64>,
        file_size: Option<u64>,
    ) -> Result<Box<dyn ReadStream>, DiskError>;

    /// Opens a write stream over the file at `path`.
    fn write_file(
        &self,
        path: &str,
        buf_size: usize,
        mode: WriteMode,
        settings: WriteSettings,
    ) -> Result<Box<dyn WriteStream>, DiskError>;

    /// Removes a file. Fails with `NotFound` if it does not exist.
    fn remove_file(&self, path: &str) -> Result<(), DiskError>;

    /// Removes a file, succeeding when it does not exist.
    fn remove_file_if_exists(&self, path: &str) -> Result<(), DiskError>;

    /// Removes an empty directory.
    fn remove_directory(&self, path: &str) -> Result<(), DiskError>;

    /// Removes a file or a directory tree.
    fn remove_recursive(&self, path: &str) -> Result<(), DiskError>;

    /// Sets the modification time of `path`.
    fn set_last_modified(&self, path: &str, time: SystemTime) -> Result<(), DiskError>;

    /// Returns the modification time of `path`.
    fn get_last_modified(&self, path: &str) -> Result<SystemTime, DiskError>;

    /// Creates a hard link `dst` referring to the file at `src`.
    fn create_hard_link(&self, src: &str, dst: &str) -> Result<(), DiskError>;

    /// Returns the backing blob paths for `path`.
    ///
    /// Only object-storage disks can answer this.
    fn blob_path(&self, _path: &str) -> Result<Vec<String>, DiskError> {
        Err(DiskError::Unsupported("blob_path"))
    }

    /// Writes a file by handing blob parts directly to the backing store.
    ///
    /// Only object-storage disks implement this.
    fn write_file_using_blob_function(
        &self,
        _path: &str,
        _mode: WriteMode,
        _write_blob: &mut dyn FnMut(&[u8]) -> Result<(), DiskError>,
    ) -> Result<(), DiskError> {
        Err(DiskError::Unsupported("write_file_using_blob_function"))
    }

    /// Returns true if concurrent writers to distinct paths are safe.
    fn supports_parallel_write(&self) -> bool {
        false
    }

    /// Returns true if operations involve network interaction.
    fn is_remote(&self) -> bool {
        false
    }
}
