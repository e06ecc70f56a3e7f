// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of cachedoc.
//
// cachedoc is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// cachedoc is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with cachedoc. If not, see <https://www.gnu.org/licenses/>.

//! File-based creation lock manager.
//!
//! ## Purpose
//! Cross-process mutual exclusion using advisory exclusive locks on one lock
//! file per identifier, kept under a lock directory.
//!
//! ## Lock File Naming
//! Identifiers such as `mongodb_container/funclock/sessions` are flattened to
//! a single file name: every character outside `[A-Za-z0-9._-]` becomes `_`,
//! and `.lock` is appended.

use crate::manager::validate_identifier;
use crate::{CreationLock, CreationLockManager, HeldLock, LockError, LockResult};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Lock manager backed by lock files in a directory.
#[derive(Clone, Debug)]
pub struct FileLockManager {
    lock_dir: PathBuf,
}

impl FileLockManager {
    /// Create a manager rooted at `lock_dir`, creating the directory if needed.
    pub fn new(lock_dir: impl Into<PathBuf>) -> LockResult<Self> {
        let lock_dir = lock_dir.into();
        if lock_dir.as_os_str().is_empty() {
            return Err(LockError::ConfigError("lock directory must not be empty".to_string()));
        }
        std::fs::create_dir_all(&lock_dir)?;
        Ok(Self { lock_dir })
    }

    /// Directory holding the lock files.
    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    /// Path of the lock file used for `identifier`.
    pub fn lock_path(&self, identifier: &str) -> PathBuf {
        let file_name: String = identifier
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.lock_dir.join(format!("{}.lock", file_name))
    }

    fn open_lock_file(path: &Path) -> LockResult<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                LockError::BackendError(format!("Failed to open lock file {}: {}", path.display(), e))
            })
    }
}

struct FileHeldLock {
    file: Option<File>,
}

impl HeldLock for FileHeldLock {
    fn release(&mut self) -> LockResult<()> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CreationLockManager for FileLockManager {
    #[instrument(skip(self), fields(lock_dir = %self.lock_dir.display()))]
    async fn acquire(&self, identifier: &str) -> LockResult<CreationLock> {
        validate_identifier(identifier)?;
        let path = self.lock_path(identifier);

        // flock blocks the calling thread
        let file = tokio::task::spawn_blocking(move || -> LockResult<File> {
            let file = Self::open_lock_file(&path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await??;

        debug!(identifier = %identifier, "File creation lock acquired");
        Ok(CreationLock::new(
            identifier,
            Box::new(FileHeldLock { file: Some(file) }),
        ))
    }

    async fn try_acquire(&self, identifier: &str) -> LockResult<Option<CreationLock>> {
        validate_identifier(identifier)?;
        let file = Self::open_lock_file(&self.lock_path(identifier))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(CreationLock::new(
                identifier,
                Box::new(FileHeldLock { file: Some(file) }),
            ))),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(LockError::IOError(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_flattens_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let manager = FileLockManager::new(dir.path()).unwrap();
        let path = manager.lock_path("mongodb_container/funclock/sess:1");
        assert_eq!(path, dir.path().join("mongodb_container_funclock_sess_1.lock"));
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("container_mongodb_lock");
        let manager = FileLockManager::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(manager.lock_dir(), nested.as_path());
    }

    #[test]
    fn test_empty_lock_dir_rejected() {
        assert!(matches!(FileLockManager::new(""), Err(LockError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_acquire_creates_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = FileLockManager::new(dir.path()).unwrap();

        let lock = manager.acquire("funclock/sess").await.unwrap();
        assert!(manager.lock_path("funclock/sess").exists());
        lock.release().unwrap();
    }

    #[tokio::test]
    async fn test_try_acquire_contended() {
        let dir = tempfile::tempdir().unwrap();
        let manager = FileLockManager::new(dir.path()).unwrap();

        let lock = manager.acquire("funclock/sess").await.unwrap();
        assert!(manager.try_acquire("funclock/sess").await.unwrap().is_none());
        assert!(manager.try_acquire("funclock/other").await.unwrap().is_some());

        drop(lock);
        assert!(manager.try_acquire("funclock/sess").await.unwrap().is_some());
    }
}
