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

//! cachedoc: namespaced key-value storage on a MongoDB collection
//!
//! A caching or session framework with pluggable backends keeps one
//! manager per namespace. cachedoc implements that manager on top of a
//! single MongoDB collection shared by every namespace:
//!
//! - Entries are documents `{ _id: "{namespace}_{key}", data, timestamp }`
//! - Values are encoded by a [`keyvalue::Codec`] (bincode by default)
//! - First-time namespace creation is guarded by a file lock
//!
//! ## Crates
//! - [`keyvalue`]: the namespaced store, connection parsing and backends
//! - [`locks`]: creation lock managers (file and in-memory)
//!
//! ## Example
//! ```rust,no_run
//! use cachedoc::{NamespacedStore, StoreConfig};
//!
//! # async fn example() -> cachedoc::KVResult<()> {
//! let config = StoreConfig::new("mongodb://localhost:27017/app.sessions");
//! let sessions = NamespacedStore::open("sess", &config).await?;
//!
//! sessions.set("user42", "logged-in").await?;
//! let state: String = sessions.get("user42").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use cachedoc_keyvalue as keyvalue; // Namespaced store and backends
pub use cachedoc_locks as locks; // Creation locks

// Re-export core types for convenience
pub use keyvalue::{
    BincodeCodec, Codec, ConnectionTarget, DocumentCollection, InMemoryCollection, JsonCodec,
    KVError, KVResult, MongoContainer, NamespaceManager, NamespacedStore, StoreConfig,
};
#[cfg(feature = "mongodb-backend")]
pub use keyvalue::MongoCollection;
pub use locks::{CreationLock, CreationLockManager, FileLockManager, LockError, MemoryLockManager};

/// Open the store for `namespace` using `CACHEDOC_*` environment variables.
///
/// See [`StoreConfig::from_env`] for the variables read.
#[cfg(feature = "mongodb-backend")]
pub async fn open_from_env(namespace: &str) -> KVResult<NamespacedStore> {
    let config = StoreConfig::from_env();
    tracing::info!(
        namespace = %namespace,
        lock_dir = ?config.resolved_lock_dir(),
        "Opening namespaced store from environment"
    );
    NamespacedStore::open(namespace, &config).await
}
