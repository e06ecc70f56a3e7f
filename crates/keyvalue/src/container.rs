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

//! Host framework contract.
//!
//! ## Purpose
//! A pluggable-backend caching/session framework talks to its storage
//! through a per-namespace manager object. [`NamespaceManager`] is that
//! contract; [`NamespacedStore`] implements it. [`MongoContainer`] is the
//! factory the host keeps per configured backend: it opens the connection
//! once and hands out a store for each namespace the host asks for.

use crate::store::{lock_manager_for, validate_namespace};
use crate::{BincodeCodec, Codec, DocumentCollection, KVResult, NamespacedStore, StoreConfig};
use async_trait::async_trait;
use cachedoc_locks::{CreationLock, CreationLockManager};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Per-namespace storage contract used by the host framework.
///
/// `get` and `set_value` are generic over the value type, so the trait is not
/// object safe: hosts dispatch through it statically (`M: NamespaceManager`
/// or a concrete `NamespacedStore<C>`), not as `dyn NamespaceManager`.
///
/// ## Operations
/// - `get` / `set_value` / `contains` / `remove`: single entries
/// - `keys`: every key of the namespace
/// - `do_remove`: drop the namespace's entries
/// - `creation_lock`: guard first-time initialization of the namespace
#[async_trait]
pub trait NamespaceManager: Send + Sync {
    /// Namespace served by this manager.
    fn namespace(&self) -> &str;

    /// Value stored under `key`; `KeyNotFound` when absent.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> KVResult<T>;

    /// Store `value` under `key`.
    async fn set_value<T: Serialize + Sync + ?Sized>(&self, key: &str, value: &T) -> KVResult<()>;

    /// Whether `key` is stored.
    async fn contains(&self, key: &str) -> KVResult<bool>;

    /// Alias for `contains`.
    async fn has_key(&self, key: &str) -> KVResult<bool> {
        self.contains(key).await
    }

    /// Remove `key` (idempotent).
    async fn remove(&self, key: &str) -> KVResult<()>;

    /// Keys of the namespace.
    async fn keys(&self) -> KVResult<Vec<String>>;

    /// Remove every entry of the namespace.
    async fn do_remove(&self) -> KVResult<()>;

    /// Acquire the namespace's creation lock.
    async fn creation_lock(&self) -> KVResult<CreationLock>;
}

#[async_trait]
impl<C: Codec> NamespaceManager for NamespacedStore<C> {
    fn namespace(&self) -> &str {
        NamespacedStore::namespace(self)
    }

    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> KVResult<T> {
        NamespacedStore::get(self, key).await
    }

    async fn set_value<T: Serialize + Sync + ?Sized>(&self, key: &str, value: &T) -> KVResult<()> {
        NamespacedStore::set(self, key, value).await
    }

    async fn contains(&self, key: &str) -> KVResult<bool> {
        NamespacedStore::contains(self, key).await
    }

    async fn remove(&self, key: &str) -> KVResult<()> {
        NamespacedStore::delete(self, key).await
    }

    async fn keys(&self) -> KVResult<Vec<String>> {
        NamespacedStore::keys(self).await
    }

    async fn do_remove(&self) -> KVResult<()> {
        NamespacedStore::drop_all(self).await.map(|_| ())
    }

    async fn creation_lock(&self) -> KVResult<CreationLock> {
        NamespacedStore::creation_lock(self).await
    }
}

/// Factory of namespaced stores sharing one backing collection.
///
/// ## Design
/// The connection is opened once, in [`MongoContainer::open`], and owned by
/// the container; every store it creates holds a clone of the same handle.
/// Dropping the container and all its stores closes the connection.
pub struct MongoContainer<C: Codec = BincodeCodec> {
    collection: Arc<dyn DocumentCollection>,
    lock_manager: Option<Arc<dyn CreationLockManager>>,
    codec: C,
}

impl MongoContainer<BincodeCodec> {
    /// Open the configured MongoDB collection.
    ///
    /// Same validation and errors as [`NamespacedStore::open`], minus the
    /// namespace check, which happens per [`MongoContainer::namespace`] call.
    #[cfg(feature = "mongodb-backend")]
    pub async fn open(config: &StoreConfig) -> KVResult<Self> {
        let target = config.target()?;
        let lock_manager = lock_manager_for(config)?;
        let collection = crate::mongo::MongoCollection::connect(&target).await?;
        Ok(Self {
            collection: Arc::new(collection),
            lock_manager,
            codec: BincodeCodec,
        })
    }

    /// Container over an already-open collection, with lock files per `config`.
    pub fn with_collection(collection: Arc<dyn DocumentCollection>, config: &StoreConfig) -> KVResult<Self> {
        Ok(Self {
            collection,
            lock_manager: lock_manager_for(config)?,
            codec: BincodeCodec,
        })
    }
}

impl<C: Codec> MongoContainer<C> {
    /// Stores created from now on encode values with `codec`.
    pub fn with_codec<D: Codec>(self, codec: D) -> MongoContainer<D> {
        MongoContainer {
            collection: self.collection,
            lock_manager: self.lock_manager,
            codec,
        }
    }

    /// Use `manager` for creation locks of every store created from now on.
    pub fn with_lock_manager(mut self, manager: Arc<dyn CreationLockManager>) -> Self {
        self.lock_manager = Some(manager);
        self
    }

    /// Store for `namespace`, sharing this container's collection handle.
    pub fn namespace(&self, namespace: &str) -> KVResult<NamespacedStore<C>> {
        validate_namespace(namespace)?;
        Ok(NamespacedStore::from_parts(
            namespace,
            Arc::clone(&self.collection),
            self.codec.clone(),
            self.lock_manager.clone(),
        ))
    }

    /// Backend type of the shared collection.
    pub fn backend_name(&self) -> &'static str {
        self.collection.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryCollection, JsonCodec, KVError};

    async fn roundtrip<M: NamespaceManager>(manager: &M) {
        manager.set_value("k", "v").await.unwrap();
        assert!(manager.has_key("k").await.unwrap());
        let value: String = manager.get("k").await.unwrap();
        assert_eq!(value, "v");
        assert_eq!(manager.keys().await.unwrap(), vec!["k".to_string()]);

        manager.remove("k").await.unwrap();
        assert!(!manager.contains("k").await.unwrap());

        manager.set_value("k2", &1u8).await.unwrap();
        manager.do_remove().await.unwrap();
        assert!(manager.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_implements_namespace_manager() {
        let store = NamespacedStore::with_collection("ns", Arc::new(InMemoryCollection::new())).unwrap();
        assert_eq!(NamespaceManager::namespace(&store), "ns");
        roundtrip(&store).await;
    }

    #[tokio::test]
    async fn test_container_shares_collection() {
        let collection = InMemoryCollection::new();
        let container = MongoContainer::with_collection(Arc::new(collection.clone()), &StoreConfig::default())
            .unwrap()
            .with_codec(JsonCodec);
        assert_eq!(container.backend_name(), "InMemory");

        let a = container.namespace("a").unwrap();
        let b = container.namespace("b").unwrap();
        a.set("x", &1).await.unwrap();
        b.set("x", &2).await.unwrap();

        assert_eq!(collection.len().await, 2);
        assert_eq!(a.get::<i32>("x").await.unwrap(), 1);
        assert_eq!(b.get::<i32>("x").await.unwrap(), 2);
        assert_eq!(collection.document("a_x").await.unwrap().data, b"1".to_vec());
    }

    #[tokio::test]
    async fn test_container_file_locks_per_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default().with_lock_dir(dir.path());
        let container = MongoContainer::with_collection(Arc::new(InMemoryCollection::new()), &config).unwrap();

        let a = container.namespace("a").unwrap();
        let b = container.namespace("b").unwrap();

        let lock_a = a.creation_lock().await.unwrap();
        // A different namespace is not blocked
        let lock_b = b.creation_lock().await.unwrap();
        assert!(dir.path().join("mongodb_container_funclock_a.lock").exists());

        lock_a.release().unwrap();
        lock_b.release().unwrap();
    }

    #[test]
    fn test_container_rejects_invalid_namespace() {
        let container =
            MongoContainer::with_collection(Arc::new(InMemoryCollection::new()), &StoreConfig::default()).unwrap();
        assert!(matches!(container.namespace(""), Err(KVError::ConfigError(_))));
        assert!(matches!(container.namespace("sess_admin"), Err(KVError::ConfigError(_))));
    }
}
