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

//! In-memory creation lock manager (for testing and single-process hosts).

use crate::manager::validate_identifier;
use crate::{CreationLock, CreationLockManager, HeldLock, LockResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// In-memory lock manager.
///
/// ## Limitations
/// - Not shared across processes
/// - Entries for released identifiers stay in the map
#[derive(Clone, Default)]
pub struct MemoryLockManager {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl MemoryLockManager {
    /// Create a new in-memory lock manager.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, identifier: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

struct MemoryHeldLock {
    guard: Option<OwnedMutexGuard<()>>,
}

impl HeldLock for MemoryHeldLock {
    fn release(&mut self) -> LockResult<()> {
        self.guard.take();
        Ok(())
    }
}

#[async_trait]
impl CreationLockManager for MemoryLockManager {
    async fn acquire(&self, identifier: &str) -> LockResult<CreationLock> {
        validate_identifier(identifier)?;
        let guard = self.slot(identifier).lock_owned().await;
        Ok(CreationLock::new(
            identifier,
            Box::new(MemoryHeldLock { guard: Some(guard) }),
        ))
    }

    async fn try_acquire(&self, identifier: &str) -> LockResult<Option<CreationLock>> {
        validate_identifier(identifier)?;
        match self.slot(identifier).try_lock_owned() {
            Ok(guard) => Ok(Some(CreationLock::new(
                identifier,
                Box::new(MemoryHeldLock { guard: Some(guard) }),
            ))),
            Err(_) => Ok(None),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LockError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_lock() {
        let manager = MemoryLockManager::new();
        let lock = manager.acquire("container/funclock/sess").await.unwrap();
        assert_eq!(lock.identifier(), "container/funclock/sess");
    }

    #[tokio::test]
    async fn test_try_acquire_while_held() {
        let manager = MemoryLockManager::new();
        let lock = manager.acquire("ns").await.unwrap();

        assert!(manager.try_acquire("ns").await.unwrap().is_none());
        // Other identifiers are independent
        assert!(manager.try_acquire("other").await.unwrap().is_some());

        lock.release().unwrap();
        assert!(manager.try_acquire("ns").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_releases_lock() {
        let manager = MemoryLockManager::new();
        {
            let _lock = manager.acquire("ns").await.unwrap();
            assert!(manager.try_acquire("ns").await.unwrap().is_none());
        }
        assert!(manager.try_acquire("ns").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let manager = MemoryLockManager::new();
        let lock = manager.acquire("ns").await.unwrap();

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.acquire("ns").await.map(|l| l.identifier().to_string()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(lock);
        let identifier = waiter.await.unwrap().unwrap();
        assert_eq!(identifier, "ns");
    }

    #[tokio::test]
    async fn test_empty_identifier_rejected() {
        let manager = MemoryLockManager::new();
        match manager.acquire("  ").await {
            Err(LockError::InvalidKey(_)) => {}
            other => panic!("Expected InvalidKey, got {:?}", other),
        }
    }
}
