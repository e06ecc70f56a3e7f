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

//! Namespaced key-value store.
//!
//! ## Purpose
//! Binds one namespace to one backing collection and translates
//! dictionary-style calls into single-document operations.
//!
//! ## Key Format
//! Documents are addressed by `{namespace}_{key}`. Namespaces may not contain
//! the delimiter, so the first `_` of an identifier always ends the
//! namespace; keys may contain it freely.
//!
//! ## Namespace Scoping
//! [`NamespacedStore::keys`] and [`NamespacedStore::drop_all`] only see
//! identifiers carrying this namespace's prefix, so namespaces can share a
//! collection (`sess` never matches documents of `sess-admin`, and
//! `sess_admin` is rejected). [`NamespacedStore::drop_collection`] is the one
//! operation that reaches past the namespace: it destroys the whole collection.

use crate::{BincodeCodec, Codec, DocumentCollection, KVError, KVResult, StoreConfig};
use cachedoc_locks::{CreationLock, CreationLockManager, FileLockManager};
use chrono::Utc;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Separator between namespace and key in document identifiers.
pub const KEY_DELIMITER: &str = "_";

/// Creation lock identifiers are this prefix followed by the namespace.
pub const CREATION_LOCK_PREFIX: &str = "mongodb_container/funclock/";

/// Key-value store scoped to one namespace.
///
/// ## Architecture
/// - One shared collection handle, opened at construction
/// - Values encoded by `C` (bincode unless chosen otherwise)
/// - Optional creation lock manager, file-based when the configuration has
///   a lock directory
///
/// Every operation is one backend round trip; the store keeps no state
/// between calls and does not serialize concurrent callers.
pub struct NamespacedStore<C: Codec = BincodeCodec> {
    namespace: String,
    /// `{namespace}{KEY_DELIMITER}`
    prefix: String,
    collection: Arc<dyn DocumentCollection>,
    codec: C,
    lock_manager: Option<Arc<dyn CreationLockManager>>,
}

impl<C: Codec> Clone for NamespacedStore<C> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            prefix: self.prefix.clone(),
            collection: Arc::clone(&self.collection),
            codec: self.codec.clone(),
            lock_manager: self.lock_manager.clone(),
        }
    }
}

impl<C: Codec> std::fmt::Debug for NamespacedStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedStore")
            .field("namespace", &self.namespace)
            .field("backend", &self.collection.backend_name())
            .field("codec", &self.codec.name())
            .field("lock_manager", &self.lock_manager.as_ref().map(|m| m.backend_name()))
            .finish()
    }
}

impl NamespacedStore<BincodeCodec> {
    /// Open a store for `namespace` against the configured MongoDB collection.
    ///
    /// ## Behavior
    /// 1. Validates the namespace and parses the URI (no network yet)
    /// 2. Creates the lock directory, if one is configured
    /// 3. Connects and pings the server
    ///
    /// ## Errors
    /// - [`KVError::ConfigError`]: empty namespace, no URI, URI without
    ///   database or collection
    /// - [`KVError::ConnectionError`]: server unreachable (not retried)
    #[cfg(feature = "mongodb-backend")]
    #[instrument(skip(config))]
    pub async fn open(namespace: &str, config: &StoreConfig) -> KVResult<Self> {
        validate_namespace(namespace)?;
        let target = config.target()?;
        let lock_manager = lock_manager_for(config)?;

        let collection = crate::mongo::MongoCollection::connect(&target).await?;

        debug!(
            namespace = %namespace,
            database = %target.database,
            collection = %target.collection,
            "Namespaced store opened"
        );
        Ok(Self::from_parts(namespace, Arc::new(collection), BincodeCodec, lock_manager))
    }

    /// Bind a store for `namespace` to an already-open collection.
    pub fn with_collection(namespace: &str, collection: Arc<dyn DocumentCollection>) -> KVResult<Self> {
        validate_namespace(namespace)?;
        Ok(Self::from_parts(namespace, collection, BincodeCodec, None))
    }
}

impl<C: Codec> NamespacedStore<C> {
    pub(crate) fn from_parts(
        namespace: &str,
        collection: Arc<dyn DocumentCollection>,
        codec: C,
        lock_manager: Option<Arc<dyn CreationLockManager>>,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            prefix: format!("{}{}", namespace, KEY_DELIMITER),
            collection,
            codec,
            lock_manager,
        }
    }

    /// Same store, values encoded with `codec` instead.
    pub fn with_codec<D: Codec>(self, codec: D) -> NamespacedStore<D> {
        NamespacedStore {
            namespace: self.namespace,
            prefix: self.prefix,
            collection: self.collection,
            codec,
            lock_manager: self.lock_manager,
        }
    }

    /// Use `manager` for creation locks.
    pub fn with_lock_manager(mut self, manager: Arc<dyn CreationLockManager>) -> Self {
        self.lock_manager = Some(manager);
        self
    }

    /// Namespace this store is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Value codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Backing collection handle.
    pub fn collection(&self) -> &Arc<dyn DocumentCollection> {
        &self.collection
    }

    /// Document identifier for `key`.
    pub fn format_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Get the value stored under `key`.
    ///
    /// ## Errors
    /// - [`KVError::KeyNotFound`]: no document for `key`; no default is substituted
    /// - [`KVError::DeserializationError`]: stored bytes do not decode as `T`
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> KVResult<T> {
        debug!(key = %key, "Getting");
        match self.collection.find_data(&self.format_key(key)).await? {
            Some(bytes) => self.codec.decode(&bytes),
            None => Err(KVError::KeyNotFound(key.to_string())),
        }
    }

    /// Check whether `key` is stored (the value is not fetched).
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn contains(&self, key: &str) -> KVResult<bool> {
        debug!(key = %key, "Contains");
        self.collection.exists(&self.format_key(key)).await
    }

    /// Alias for [`NamespacedStore::contains`].
    pub async fn has_key(&self, key: &str) -> KVResult<bool> {
        self.contains(key).await
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// ## Behavior
    /// - Writes `{data, timestamp: now}`; creates the document if absent
    /// - Last write wins between concurrent writers
    #[instrument(skip(self, value), fields(namespace = %self.namespace))]
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> KVResult<()> {
        let data = self.codec.encode(value)?;
        debug!(key = %key, value_len = data.len(), codec = self.codec.name(), "Setting");
        self.collection.upsert(&self.format_key(key), data, Utc::now()).await
    }

    /// Remove `key`. Removing an absent key succeeds.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn delete(&self, key: &str) -> KVResult<()> {
        debug!(key = %key, "Deleting");
        self.collection.remove(&self.format_key(key)).await
    }

    /// Lazily stream this namespace's keys, prefix stripped.
    ///
    /// Every call reads current state again; nothing is cached.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn keys_stream(&self) -> KVResult<BoxStream<'static, KVResult<String>>> {
        debug!(backend = self.collection.backend_name(), "Retrieving keys");
        let prefix = self.prefix.clone();
        let ids = self.collection.ids_with_prefix(&self.prefix).await?;
        Ok(ids
            .map_ok(move |id| match id.strip_prefix(prefix.as_str()) {
                Some(key) => key.to_string(),
                None => id,
            })
            .boxed())
    }

    /// All keys of this namespace, prefix stripped.
    pub async fn keys(&self) -> KVResult<Vec<String>> {
        self.keys_stream().await?.try_collect().await
    }

    /// Remove every entry of this namespace.
    ///
    /// ## Returns
    /// Number of entries removed
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn drop_all(&self) -> KVResult<u64> {
        let removed = self.collection.remove_with_prefix(&self.prefix).await?;
        debug!(removed = removed, "Removed namespace entries");
        Ok(removed)
    }

    /// Destroy the entire backing collection.
    ///
    /// Unlike [`NamespacedStore::drop_all`] this also removes the entries of
    /// every other namespace stored in the same collection. Irreversible.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn drop_collection(&self) -> KVResult<()> {
        debug!(backend = self.collection.backend_name(), "Dropping backing collection");
        self.collection.drop_collection().await
    }

    /// Identifier of this namespace's creation lock.
    pub fn creation_lock_identifier(&self) -> String {
        format!("{}{}", CREATION_LOCK_PREFIX, self.namespace)
    }

    /// Acquire this namespace's creation lock, waiting while it is held.
    ///
    /// ## Errors
    /// [`KVError::ConfigError`] when neither a lock directory was configured
    /// nor a lock manager injected.
    pub async fn creation_lock(&self) -> KVResult<CreationLock> {
        let manager = self.lock_manager.as_ref().ok_or_else(|| {
            KVError::ConfigError(format!(
                "no lock_dir or data_dir configured for creation lock of namespace {}",
                self.namespace
            ))
        })?;
        Ok(manager.acquire(&self.creation_lock_identifier()).await?)
    }
}

pub(crate) fn validate_namespace(namespace: &str) -> KVResult<()> {
    if namespace.is_empty() {
        return Err(KVError::ConfigError("namespace must not be empty".to_string()));
    }
    if namespace.contains(KEY_DELIMITER) {
        return Err(KVError::ConfigError(format!(
            "namespace {} must not contain '{}'",
            namespace, KEY_DELIMITER
        )));
    }
    Ok(())
}

/// File lock manager for the configured lock directory, creating it.
pub(crate) fn lock_manager_for(config: &StoreConfig) -> KVResult<Option<Arc<dyn CreationLockManager>>> {
    match config.resolved_lock_dir() {
        Some(dir) => {
            let manager: Arc<dyn CreationLockManager> = Arc::new(FileLockManager::new(dir)?);
            Ok(Some(manager))
        }
        None => Ok(None),
    }
}
