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

//! Creation lock manager trait and the scoped lock it hands out.

use crate::{LockError, LockResult};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Backend-specific state held while a lock is owned.
///
/// Dropping the value must also release the lock; `release` exists so the
/// owner can observe failures instead of losing them in `Drop`.
pub trait HeldLock: Send + Sync {
    /// Release the underlying lock. Called at most once.
    fn release(&mut self) -> LockResult<()>;
}

/// Scoped creation lock.
///
/// Released when [`CreationLock::release`] is called or when the value is
/// dropped, whichever comes first.
pub struct CreationLock {
    identifier: String,
    held: Option<Box<dyn HeldLock>>,
}

impl CreationLock {
    /// Wrap backend lock state for `identifier`.
    pub fn new(identifier: impl Into<String>, held: Box<dyn HeldLock>) -> Self {
        Self {
            identifier: identifier.into(),
            held: Some(held),
        }
    }

    /// Identifier this lock was acquired for.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Release the lock, reporting backend failures.
    pub fn release(mut self) -> LockResult<()> {
        match self.held.take() {
            Some(mut held) => {
                held.release()?;
                debug!(identifier = %self.identifier, "Creation lock released");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for CreationLock {
    fn drop(&mut self) {
        if let Some(mut held) = self.held.take() {
            if let Err(e) = held.release() {
                warn!(identifier = %self.identifier, error = %e, "Failed to release creation lock on drop");
            }
        }
    }
}

impl std::fmt::Debug for CreationLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreationLock")
            .field("identifier", &self.identifier)
            .field("held", &self.held.is_some())
            .finish()
    }
}

/// Trait for mutual exclusion keyed by an identifier.
///
/// ## Purpose
/// Guards first-time initialization of a namespace's storage. The store
/// never implements locking itself; a manager is injected.
///
/// ## Behavior
/// - `acquire` waits until the lock for `identifier` is free
/// - `try_acquire` returns `Ok(None)` instead of waiting
/// - Identifiers are opaque strings; backends map them to their own keys
#[async_trait]
pub trait CreationLockManager: Send + Sync {
    /// Acquire the lock for `identifier`, waiting while another holder has it.
    async fn acquire(&self, identifier: &str) -> LockResult<CreationLock>;

    /// Acquire the lock for `identifier` only if it is free right now.
    async fn try_acquire(&self, identifier: &str) -> LockResult<Option<CreationLock>>;

    /// Short backend name for logs (e.g. "file", "memory").
    fn backend_name(&self) -> &'static str;
}

/// Reject empty identifiers before touching any backend.
pub(crate) fn validate_identifier(identifier: &str) -> LockResult<()> {
    if identifier.trim().is_empty() {
        return Err(LockError::InvalidKey("identifier must not be empty".to_string()));
    }
    Ok(())
}
