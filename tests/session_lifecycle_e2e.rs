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

//! End-to-end session lifecycle through the host-facing API.
//!
//! Drives a container the way a session framework does: one container per
//! configured backend, one manager per namespace, a creation lock around
//! first-time setup, then dictionary-style access and teardown.

use cachedoc::{
    InMemoryCollection, KVError, MongoContainer, NamespaceManager, NamespacedStore, StoreConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Session {
    user: String,
    visits: u32,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn create_namespace<M: NamespaceManager>(manager: &M) {
    let lock = manager.creation_lock().await.unwrap();
    if !manager.contains("__created").await.unwrap() {
        manager.set_value("__created", &true).await.unwrap();
    }
    lock.release().unwrap();
}

#[tokio::test]
async fn test_session_lifecycle() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::default().with_data_dir(dir.path());
    let collection = InMemoryCollection::new();
    let container = MongoContainer::with_collection(Arc::new(collection.clone()), &config).unwrap();

    let sessions = container.namespace("sess").unwrap();
    create_namespace(&sessions).await;
    assert!(dir.path().join("container_mongodb_lock").is_dir());

    let alice = Session {
        user: "alice".to_string(),
        visits: 1,
    };
    sessions.set_value("A", &alice).await.unwrap();
    sessions.set_value("B", "world").await.unwrap();

    let keys: BTreeSet<String> = NamespaceManager::keys(&sessions).await.unwrap().into_iter().collect();
    let expected: BTreeSet<String> = ["A", "B", "__created"].iter().map(|s| s.to_string()).collect();
    assert_eq!(keys, expected);

    let loaded: Session = NamespaceManager::get(&sessions, "A").await.unwrap();
    assert_eq!(loaded, alice);

    sessions.do_remove().await.unwrap();

    assert!(NamespaceManager::keys(&sessions).await.unwrap().is_empty());
    assert!(!NamespaceManager::contains(&sessions, "A").await.unwrap());
    assert!(collection.is_empty().await);
}

#[tokio::test]
async fn test_namespaces_do_not_leak_through_container() {
    init_tracing();
    let container =
        MongoContainer::with_collection(Arc::new(InMemoryCollection::new()), &StoreConfig::default()).unwrap();

    let sessions = container.namespace("sess").unwrap();
    let cache = container.namespace("cache").unwrap();

    sessions.set("A", "session").await.unwrap();
    cache.set("A", "cached").await.unwrap();
    cache.drop_all().await.unwrap();

    assert_eq!(sessions.get::<String>("A").await.unwrap(), "session");
    assert!(cache.get::<String>("A").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_creation_lock_requires_lock_dir() {
    let store = NamespacedStore::with_collection("sess", Arc::new(InMemoryCollection::new())).unwrap();
    assert!(matches!(store.creation_lock().await, Err(KVError::ConfigError(_))));
}

#[cfg(feature = "mongodb-backend")]
#[tokio::test]
async fn test_uri_without_collection_is_rejected() {
    let config = StoreConfig::new("mongodb://127.0.0.1:1/dbname");
    match NamespacedStore::open("sess", &config).await {
        Err(KVError::ConfigError(msg)) => assert!(msg.contains("missing collection")),
        other => panic!("Expected ConfigError, got {:?}", other),
    }
}
