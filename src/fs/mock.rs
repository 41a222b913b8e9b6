// src/fs/mock.rs

use super::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { modified: SystemTime },
    /// Any stat of this path fails with the given error kind.
    Unreadable(io::ErrorKind),
}

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, MockEntry>,
    /// Logical clock in seconds since the epoch; every write advances it.
    clock: u64,
}

/// In-memory filesystem with a logical clock.
///
/// Each `add_file` / `touch` gets a strictly later modification time than
/// the previous one, so tests can express "newer than" by call order.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(state: &mut MockState) -> SystemTime {
        state.clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(state.clock)
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        let modified = Self::tick(&mut state);
        state
            .files
            .insert(path.as_ref().to_path_buf(), MockEntry::File { modified });
    }

    /// Bump the modification time of `path`, creating it empty if absent.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        let now = Self::tick(&mut state);
        match state.files.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified }) => *modified = now,
            _ => {
                state
                    .files
                    .insert(path.as_ref().to_path_buf(), MockEntry::File { modified: now });
            }
        }
    }

    pub fn set_modified(&self, path: impl AsRef<Path>, when: SystemTime) {
        let mut state = self.lock();
        if let Some(MockEntry::File { modified }) = state.files.get_mut(path.as_ref()) {
            *modified = when;
        }
    }

    /// Make every stat of `path` fail with `kind`.
    pub fn add_unreadable(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        let mut state = self.lock();
        state
            .files
            .insert(path.as_ref().to_path_buf(), MockEntry::Unreadable(kind));
    }
}

impl FileSystem for MockFileSystem {
    fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>> {
        match self.lock().files.get(path) {
            Some(MockEntry::File { modified }) => Ok(Some(*modified)),
            Some(MockEntry::Unreadable(kind)) => Err(io::Error::new(
                *kind,
                format!("mock stat failure for {:?}", path),
            )),
            None => Ok(None),
        }
    }
}
