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

//! # cachedoc Creation Locks
//!
//! ## Purpose
//! Provides the creation lock capability injected into namespaced stores:
//! mutual exclusion keyed by an identifier, acquired and released as a scoped
//! guard. Hosts use it to keep two callers from initializing the same
//! namespace's backing storage at once.
//!
//! ## Architecture Context
//! The key-value store never locks on its own. It asks a
//! [`CreationLockManager`] for a [`CreationLock`] named after its namespace
//! (`mongodb_container/funclock/{namespace}`) and hands the guard back to the
//! host.
//!
//! ## Backend Support
//!
//! - **File**: one advisory-locked file per identifier under a lock directory
//!   (cross-process, default for stores configured with `lock_dir`/`data_dir`)
//! - **InMemory**: tokio mutex per identifier (single process, for testing)
//!
//! ## Examples
//!
//! ```rust,no_run
//! use cachedoc_locks::{CreationLockManager, FileLockManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = FileLockManager::new("/var/lib/app/container_mongodb_lock")?;
//!
//! let lock = manager.acquire("mongodb_container/funclock/sessions").await?;
//! // ... initialize namespace storage ...
//! lock.release()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod file;
pub mod manager;
pub mod memory;

pub use error::{LockError, LockResult};
pub use file::FileLockManager;
pub use manager::{CreationLock, CreationLockManager, HeldLock};
pub use memory::MemoryLockManager;
