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

//! In-memory document collection.
//!
//! ## Purpose
//! `BTreeMap`-backed [`DocumentCollection`] used by tests and by hosts that
//! want the store's semantics without a database.
//!
//! ## Limitations
//! - Not persistent
//! - Not shared across processes
//! - `ids_with_prefix` streams a snapshot taken when the call is made

use crate::{DocumentCollection, KVResult, StoredDocument};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory collection (cheap to clone, clones share the same documents).
#[derive(Clone, Default)]
pub struct InMemoryCollection {
    documents: Arc<RwLock<BTreeMap<String, StoredDocument>>>,
}

impl InMemoryCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// True when no documents are stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Full document for `id`, including its timestamp.
    pub async fn document(&self, id: &str) -> Option<StoredDocument> {
        self.documents.read().await.get(id).cloned()
    }
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    async fn find_data(&self, id: &str) -> KVResult<Option<Vec<u8>>> {
        let documents = self.documents.read().await;
        Ok(documents.get(id).map(|doc| doc.data.clone()))
    }

    async fn exists(&self, id: &str) -> KVResult<bool> {
        let documents = self.documents.read().await;
        Ok(documents.contains_key(id))
    }

    async fn upsert(&self, id: &str, data: Vec<u8>, timestamp: DateTime<Utc>) -> KVResult<()> {
        let mut documents = self.documents.write().await;
        documents.insert(
            id.to_string(),
            StoredDocument {
                id: id.to_string(),
                data,
                timestamp,
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &str) -> KVResult<()> {
        let mut documents = self.documents.write().await;
        documents.remove(id);
        Ok(())
    }

    async fn ids_with_prefix(&self, prefix: &str) -> KVResult<BoxStream<'static, KVResult<String>>> {
        let documents = self.documents.read().await;
        let ids: Vec<KVResult<String>> = documents
            .range(prefix.to_string()..)
            .take_while(|(id, _)| id.starts_with(prefix))
            .map(|(id, _)| Ok(id.clone()))
            .collect();
        Ok(stream::iter(ids).boxed())
    }

    async fn remove_with_prefix(&self, prefix: &str) -> KVResult<u64> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|id, _| !id.starts_with(prefix));
        Ok((before - documents.len()) as u64)
    }

    async fn drop_collection(&self) -> KVResult<()> {
        let mut documents = self.documents.write().await;
        documents.clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let coll = InMemoryCollection::new();
        coll.upsert("ns_a", b"v1".to_vec(), Utc::now()).await.unwrap();
        coll.upsert("ns_a", b"v2".to_vec(), Utc::now()).await.unwrap();

        assert_eq!(coll.len().await, 1);
        assert_eq!(coll.find_data("ns_a").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn test_remove_absent_is_ok() {
        let coll = InMemoryCollection::new();
        coll.remove("missing").await.unwrap();
        assert!(!coll.exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_ids_with_prefix() {
        let coll = InMemoryCollection::new();
        for id in ["a_1", "a_2", "ab_1", "b_1"] {
            coll.upsert(id, Vec::new(), Utc::now()).await.unwrap();
        }

        let ids: Vec<String> = coll.ids_with_prefix("a_").await.unwrap().try_collect().await.unwrap();
        assert_eq!(ids, vec!["a_1".to_string(), "a_2".to_string()]);

        let all: Vec<String> = coll.ids_with_prefix("").await.unwrap().try_collect().await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_remove_with_prefix_and_drop() {
        let coll = InMemoryCollection::new();
        for id in ["a_1", "a_2", "b_1"] {
            coll.upsert(id, Vec::new(), Utc::now()).await.unwrap();
        }

        assert_eq!(coll.remove_with_prefix("a_").await.unwrap(), 2);
        assert_eq!(coll.len().await, 1);

        coll.drop_collection().await.unwrap();
        assert!(coll.is_empty().await);
    }
}
