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

//! # cachedoc KeyValue Store
//!
//! ## Purpose
//! Persists the entries of a caching/session framework into a document
//! database. Each namespace (a session scope, a cache region) is served by a
//! [`NamespacedStore`] that maps dictionary-style operations onto
//! single-document upsert/find/remove calls.
//!
//! ## Architecture Context
//! The host framework owns session lifecycle and dispatch. It constructs one
//! store per namespace (directly or through a [`MongoContainer`]) and calls
//! it through the [`NamespaceManager`] contract:
//!
//! - **get/set/contains/delete**: one round trip per call, keyed by `{namespace}_{key}`
//! - **keys**: lazy stream of this namespace's keys
//! - **drop_all**: remove this namespace's entries
//! - **creation_lock**: scoped lock from an injected [`cachedoc_locks::CreationLockManager`]
//!
//! ## Document Shape
//! ```text
//! { _id: "{namespace}_{key}", data: <binary>, timestamp: <UTC datetime> }
//! ```
//! `data` is produced by the store's [`Codec`] and never inspected by the
//! backend. `timestamp` records the last write and is advisory only.
//!
//! ## Backend Support
//!
//! - **MongoDB**: feature `mongodb-backend` (default)
//! - **InMemory**: always available, for tests and single-process use
//!
//! ## Examples
//!
//! ```rust,no_run
//! use cachedoc_keyvalue::{NamespacedStore, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::new("mongodb://localhost:27017/app.sessions")
//!     .with_data_dir("/var/lib/app");
//! let store = NamespacedStore::open("sessions", &config).await?;
//!
//! store.set("user:42", &vec!["admin".to_string()]).await?;
//! let roles: Vec<String> = store.get("user:42").await?;
//! assert!(store.contains("user:42").await?);
//!
//! store.delete("user:42").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod memory;
pub mod store;
pub mod uri;

#[cfg(feature = "mongodb-backend")]
pub mod mongo;

pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::{StoreConfig, LOCK_DIR_NAME};
pub use container::{MongoContainer, NamespaceManager};
pub use error::{KVError, KVResult};
pub use memory::InMemoryCollection;
pub use store::{NamespacedStore, CREATION_LOCK_PREFIX, KEY_DELIMITER};
pub use uri::ConnectionTarget;

#[cfg(feature = "mongodb-backend")]
pub use mongo::MongoCollection;

/// One stored entry, as the backend sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Namespaced identifier (`_id`)
    pub id: String,
    /// Opaque encoded value
    pub data: Vec<u8>,
    /// Last write time (advisory)
    pub timestamp: DateTime<Utc>,
}

/// Backing collection seam.
///
/// ## Purpose
/// Single-document operations over one collection, addressed by the
/// already-namespaced identifier. Namespace formatting and value encoding
/// belong to [`NamespacedStore`]; backends only move bytes.
///
/// ## Consistency
/// `upsert` must be atomic per document: readers see either the old or the
/// new `{data, timestamp}` pair, never a mix. Nothing is promised across
/// documents.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Fetch only the `data` field of the document with `id`.
    async fn find_data(&self, id: &str) -> KVResult<Option<Vec<u8>>>;

    /// Check existence without fetching `data`.
    async fn exists(&self, id: &str) -> KVResult<bool>;

    /// Insert or overwrite `{data, timestamp}` for `id`.
    async fn upsert(&self, id: &str, data: Vec<u8>, timestamp: DateTime<Utc>) -> KVResult<()>;

    /// Remove the document with `id`. Absent documents are not an error.
    async fn remove(&self, id: &str) -> KVResult<()>;

    /// Stream identifiers starting with `prefix` (all identifiers for `""`).
    ///
    /// Each call starts a new read; there is no snapshot across calls.
    async fn ids_with_prefix(&self, prefix: &str) -> KVResult<BoxStream<'static, KVResult<String>>>;

    /// Remove every document whose identifier starts with `prefix`.
    ///
    /// ## Returns
    /// Number of documents removed
    async fn remove_with_prefix(&self, prefix: &str) -> KVResult<u64>;

    /// Destroy the whole collection, whatever namespaces it holds.
    async fn drop_collection(&self) -> KVResult<()>;

    /// Backend type (e.g., "InMemory", "MongoDB")
    fn backend_name(&self) -> &'static str;
}
