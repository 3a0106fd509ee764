//! Local filesystem disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use strata_core::{path as lpath, DiskError};
use tracing::debug;

use crate::disk::{DirectoryIterator, Disk, ReadSettings, WriteMode, WriteSettings};
use crate::stream::{ReadStream, WriteStream};

/// A disk rooted at a directory of the local filesystem.
pub struct LocalDisk {
    name: String,
    root: PathBuf,
}

impl LocalDisk {
    /// Creates a disk rooted at `root`, creating the directory when missing.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self, DiskError> {
        let name = name.into();
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(name = %name, root = %root.display(), "Opened local disk");
        Ok(Self { name, root })
    }

    /// Returns the root directory of this disk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, path: &str) -> Result<PathBuf, DiskError> {
        let normalized = lpath::normalize(path)?;
        Ok(if normalized.is_empty() {
            self.root.clone()
        } else {
            self.root.join(normalized)
        })
    }
}

fn map_io(err: io::Error, path: &str) -> DiskError {
    match err.kind() {
        io::ErrorKind::NotFound => DiskError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => DiskError::AlreadyExists(path.to_string()),
        io::ErrorKind::DirectoryNotEmpty => DiskError::DirectoryNotEmpty(path.to_string()),
        io::ErrorKind::NotADirectory => DiskError::NotADirectory(path.to_string()),
        io::ErrorKind::IsADirectory => DiskError::IsADirectory(path.to_string()),
        _ => DiskError::Io(err),
    }
}

impl Disk for LocalDisk {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> Result<bool, DiskError> {
        Ok(self.abs(path)?.try_exists()?)
    }

    fn is_file(&self, path: &str) -> Result<bool, DiskError> {
        Ok(self.abs(path)?.is_file())
    }

    fn is_directory(&self, path: &str) -> Result<bool, DiskError> {
        Ok(self.abs(path)?.is_dir())
    }

    fn file_size(&self, path: &str) -> Result<u64, DiskError> {
        let meta = fs::metadata(self.abs(path)?).map_err(|e| map_io(e, path))?;
        if meta.is_dir() {
            return Err(DiskError::IsADirectory(path.to_string()));
        }
        Ok(meta.len())
    }

    fn create_file(&self, path: &str) -> Result<(), DiskError> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.abs(path)?)
            .map_err(|e| map_io(e, path))?;
        Ok(())
    }

    fn create_directory(&self, path: &str) -> Result<(), DiskError> {
        fs::create_dir(self.abs(path)?).map_err(|e| map_io(e, path))
    }

    fn create_directories(&self, path: &str) -> Result<(), DiskError> {
        fs::create_dir_all(self.abs(path)?).map_err(|e| map_io(e, path))
    }

    fn clear_directory(&self, path: &str) -> Result<(), DiskError> {
        let dir = self.abs(path)?;
        for entry in fs::read_dir(&dir).map_err(|e| map_io(e, path))? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn move_file(&self, from: &str, to: &str) -> Result<(), DiskError> {
        let dst = self.abs(to)?;
        if dst.try_exists()? {
            return Err(DiskError::AlreadyExists(to.to_string()));
        }
        fs::rename(self.abs(from)?, dst).map_err(|e| map_io(e, from))
    }

    fn move_directory(&self, from: &str, to: &str) -> Result<(), DiskError> {
        self.move_file(from, to)
    }

    fn replace_file(&self, from: &str, to: &str) -> Result<(), DiskError> {
        fs::rename(self.abs(from)?, self.abs(to)?).map_err(|e| map_io(e, from))
    }

    fn list_files(&self, path: &str) -> Result<Vec<String>, DiskError> {
        let dir = self.abs(path)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| map_io(e, path))? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn iterate_directory(&self, path: &str) -> Result<DirectoryIterator, DiskError> {
        let normalized = lpath::normalize(path)?;
        let dir = self.abs(&normalized)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| map_io(e, path))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let full = lpath::join(&normalized, &name);
            if entry.file_type()?.is_dir() {
                entries.push(Ok(format!("{full}/")));
            } else {
                entries.push(Ok(full));
            }
        }
        Ok(Box::new(entries.into_iter()))
    }

    fn read_file(
        &self,
        path: &str,
        settings: ReadSettings,
        _read_hint: Option<u64>,
        file_size: Option<u64>,
    ) -> Result<Box<dyn ReadStream>, DiskError> {
        let file = File::open(self.abs(path)?).map_err(|e| map_io(e, path))?;
        let size = match file_size {
            Some(size) => size,
            None => file.metadata()?.len(),
        };
        Ok(Box::new(FileReadStream {
            inner: BufReader::with_capacity(settings.buffer_size, file),
            size,
        }))
    }

    fn write_file(
        &self,
        path: &str,
        buf_size: usize,
        mode: WriteMode,
        settings: WriteSettings,
    ) -> Result<Box<dyn WriteStream>, DiskError> {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        match mode {
            WriteMode::Rewrite => options.truncate(true),
            WriteMode::Append => options.append(true),
        };
        let file = options.open(self.abs(path)?).map_err(|e| map_io(e, path))?;
        Ok(Box::new(FileWriteStream {
            inner: BufWriter::with_capacity(buf_size, file),
            sync_on_finalize: settings.sync_on_finalize,
        }))
    }

    fn remove_file(&self, path: &str) -> Result<(), DiskError> {
        let abs = self.abs(path)?;
        if abs.is_dir() {
            return Err(DiskError::IsADirectory(path.to_string()));
        }
        fs::remove_file(abs).map_err(|e| map_io(e, path))
    }

    fn remove_file_if_exists(&self, path: &str) -> Result<(), DiskError> {
        match self.remove_file(path) {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }

    fn remove_directory(&self, path: &str) -> Result<(), DiskError> {
        fs::remove_dir(self.abs(path)?).map_err(|e| map_io(e, path))
    }

    fn remove_recursive(&self, path: &str) -> Result<(), DiskError> {
        let abs = self.abs(path)?;
        if abs.is_dir() {
            fs::remove_dir_all(abs).map_err(|e| map_io(e, path))
        } else {
            fs::remove_file(abs).map_err(|e| map_io(e, path))
        }
    }

    fn set_last_modified(&self, path: &str, time: SystemTime) -> Result<(), DiskError> {
        let file = File::open(self.abs(path)?).map_err(|e| map_io(e, path))?;
        file.set_modified(time)?;
        Ok(())
    }

    fn get_last_modified(&self, path: &str) -> Result<SystemTime, DiskError> {
        let meta = fs::metadata(self.abs(path)?).map_err(|e| map_io(e, path))?;
        Ok(meta.modified()?)
    }

    fn create_hard_link(&self, src: &str, dst: &str) -> Result<(), DiskError> {
        fs::hard_link(self.abs(src)?, self.abs(dst)?).map_err(|e| map_io(e, src))
    }
}

/// Buffered read stream over a local file.
struct FileReadStream {
    inner: BufReader<File>,
    size: u64,
}

impl Read for FileReadStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for FileReadStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl ReadStream for FileReadStream {
    fn len(&self) -> u64 {
        self.size
    }

    fn position(&mut self) -> Result<u64, DiskError> {
        Ok(self.inner.stream_position()?)
    }
}

/// Buffered write stream over a local file.
struct FileWriteStream {
    inner: BufWriter<File>,
    sync_on_finalize: bool,
}

impl Write for FileWriteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl WriteStream for FileWriteStream {
    fn finalize(&mut self) -> Result<(), DiskError> {
        self.inner.flush()?;
        if self.sync_on_finalize {
            self.inner.get_ref().sync_all()?;
        }
        Ok(())
    }
}
