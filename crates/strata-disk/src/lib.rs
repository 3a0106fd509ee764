//! Strata Disk - the disk abstraction and its local implementations.
//!
//! This crate provides:
//! - The `Disk` trait: a blocking, path-addressed file store
//! - `ReadStream` / `WriteStream`: the buffer interfaces disks hand out
//! - `LocalDisk`: a `std::fs`-backed implementation
//! - `MetadataStore` and `DiskMetadataStore`: marker persistence
//! - `DiskRegistry`: the ambient map configuration resolves disks from

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod disk;
pub mod local;
pub mod metadata;
pub mod registry;
pub mod stream;

pub use disk::{Disk, DirectoryIterator, ReadSettings, WriteMode, WriteSettings};
pub use local::LocalDisk;
pub use metadata::{DiskMetadataStore, MetadataStore};
pub use registry::{DiskRegistry, LocalDiskConfig};
pub use stream::{ReadStream, WriteStream};

/// Default buffer size for file streams, in bytes.
pub const DEFAULT_BUF_SIZE: usize = 64 * 1024;
