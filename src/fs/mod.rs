// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

pub mod mock;

/// Abstract filesystem interface.
///
/// The freshness oracle only ever reads through this trait, so tests can
/// drive staleness decisions with [`mock::MockFileSystem`].
pub trait FileSystem: Send + Sync + Debug {
    /// Modification time of `path`, or `None` if it does not exist.
    ///
    /// Any error other than "not found" is returned as-is; callers must not
    /// treat it as a missing file.
    fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>> {
        match fs::metadata(path) {
            Ok(meta) => meta.modified().map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
