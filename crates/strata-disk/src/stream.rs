//! Read and write stream interfaces.

use std::io::{Read, Seek, Write};

use strata_core::DiskError;

/// A blocking, seekable read stream over a single file.
///
/// The total file size is known up front so that wrappers (such as the
/// overlay's concatenating reader) can reason about boundaries without
/// issuing extra stat calls.
pub trait ReadStream: Read + Seek + Send {
    /// Total size of the underlying file in bytes.
    fn len(&self) -> u64;

    /// Returns true if the underlying file is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current byte offset from the start of the file.
    fn position(&mut self) -> Result<u64, DiskError>;
}

/// A blocking write stream over a single file.
pub trait WriteStream: Write + Send {
    /// Flushes buffered data and completes the write.
    ///
    /// Must be called before dropping the stream; a dropped, unfinalized
    /// stream may leave buffered bytes behind.
    fn finalize(&mut self) -> Result<(), DiskError>;
}
