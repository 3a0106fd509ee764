//! Concatenating read stream.
//!
//! Appending to a base-resident file writes a fresh suffix file on the diff
//! instead of copying the base content up. Reads then see one logical file:
//! the base bytes first, the diff bytes after. This wrapper presents the two
//! underlying streams as that single file, including seeks across the
//! boundary.

use std::io::{self, Read, Seek, SeekFrom};

use strata_core::DiskError;
use strata_disk::ReadStream;

/// A read stream delivering base content followed by diff content.
pub struct OverlayReadStream {
    base: Box<dyn ReadStream>,
    diff: Box<dyn ReadStream>,
    base_size: u64,
    diff_size: u64,
    /// False while the base still has bytes to deliver.
    reading_diff: bool,
}

impl OverlayReadStream {
    /// Wraps two freshly opened streams. Both must be positioned at 0.
    pub fn new(base: Box<dyn ReadStream>, diff: Box<dyn ReadStream>) -> Self {
        let base_size = base.len();
        let diff_size = diff.len();
        Self {
            base,
            diff,
            base_size,
            diff_size,
            reading_diff: base_size == 0,
        }
    }

    fn logical_position(&mut self) -> io::Result<u64> {
        let pos = if self.reading_diff {
            self.base_size + self.diff.stream_position()?
        } else {
            self.base.stream_position()?
        };
        Ok(pos)
    }
}

impl Read for OverlayReadStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.reading_diff {
            let n = self.base.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            self.reading_diff = true;
        }
        // A zero-byte pull here is EOF for the logical file.
        self.diff.read(buf)
    }
}

impl Seek for OverlayReadStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let total = self.base_size + self.diff_size;
        let current = self.logical_position()?;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(delta) => current as i64 + delta,
            SeekFrom::End(delta) => total as i64 + delta,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }
        let target = target as u64;

        if target < self.base_size {
            self.base.seek(SeekFrom::Start(target))?;
            self.diff.seek(SeekFrom::Start(0))?;
            self.reading_diff = false;
        } else {
            self.base.seek(SeekFrom::Start(self.base_size))?;
            self.diff.seek(SeekFrom::Start(target - self.base_size))?;
            self.reading_diff = true;
        }
        Ok(target)
    }
}

impl ReadStream for OverlayReadStream {
    fn len(&self) -> u64 {
        self.base_size + self.diff_size
    }

    fn position(&mut self) -> Result<u64, DiskError> {
        Ok(self.logical_position()?)
    }
}
