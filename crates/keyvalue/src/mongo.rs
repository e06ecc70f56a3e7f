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

//! MongoDB-based document collection.
//!
//! ## Purpose
//! [`DocumentCollection`] over one MongoDB collection, one driver call per
//! operation.
//!
//! ## Design
//! - **Eager connect**: `connect` pings the server so an unreachable database
//!   fails at construction, not on first use
//! - **Projection**: lookups fetch only `data`; existence checks use
//!   `count_documents` with `limit(1)` and fetch nothing
//! - **Upsert**: `update_one` with `$set` and `upsert: true`, atomic per document
//! - **Prefix scans**: anchored `$regex` on `_id`, which MongoDB serves from
//!   the `_id` index
//! - **No retries**: driver errors go straight to the caller
//!
//! ## Observability
//! - Tracing: one span per operation with the document id
//! - Metrics: `cachedoc_keyvalue_mongo_duration_seconds` histogram and
//!   `cachedoc_keyvalue_mongo_ops_total` counter, labelled by `op`/`result`

use crate::{ConnectionTarget, DocumentCollection, KVError, KVResult};
use async_trait::async_trait;
use bson::{doc, spec::BinarySubtype, Binary, Bson, Document};
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use mongodb::options::{ClientOptions, CountOptions, FindOneOptions, FindOptions, UpdateOptions};
use mongodb::{Client, Collection};
use std::time::Instant;
use tracing::{debug, error, instrument};

/// MongoDB collection handle.
///
/// Clones share the driver's connection pool.
#[derive(Clone)]
pub struct MongoCollection {
    /// Driver client (owns the connection pool)
    client: Client,
    /// Backing collection
    collection: Collection<Document>,
    /// Where this handle points
    target: ConnectionTarget,
}

impl MongoCollection {
    /// Open a connection to `target` and verify the server answers.
    ///
    /// ## Errors
    /// - [`KVError::ConfigError`]: the driver rejects the URI options
    /// - [`KVError::ConnectionError`]: the server cannot be reached
    #[instrument(skip(target), fields(database = %target.database, collection = %target.collection))]
    pub async fn connect(target: &ConnectionTarget) -> KVResult<Self> {
        let start = Instant::now();

        let mut options = ClientOptions::parse(&target.driver_uri).await?;
        if options.app_name.is_none() {
            options.app_name = Some("cachedoc".to_string());
        }
        let client = Client::with_options(options)?;
        let database = client.database(&target.database);

        if let Err(e) = database.run_command(doc! { "ping": 1 }, None).await {
            error!(error = %e, hosts = ?target.hosts, "MongoDB ping failed");
            record("connect", start, "error");
            return Err(e.into());
        }

        record("connect", start, "success");
        debug!(
            hosts = ?target.hosts,
            duration_ms = start.elapsed().as_millis(),
            "MongoDB collection opened"
        );

        Ok(Self {
            collection: database.collection::<Document>(&target.collection),
            client,
            target: target.clone(),
        })
    }

    /// Connection target this handle was opened with.
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn prefix_filter(prefix: &str) -> Document {
        if prefix.is_empty() {
            doc! {}
        } else {
            doc! { "_id": { "$regex": format!("^{}", regex::escape(prefix)) } }
        }
    }
}

fn record(op: &'static str, start: Instant, result: &'static str) {
    metrics::histogram!("cachedoc_keyvalue_mongo_duration_seconds", "op" => op)
        .record(start.elapsed().as_secs_f64());
    metrics::counter!("cachedoc_keyvalue_mongo_ops_total", "op" => op, "result" => result)
        .increment(1);
}

/// Log, count and convert a driver error.
fn fail(op: &'static str, start: Instant, id: &str, e: mongodb::error::Error) -> KVError {
    error!(error = %e, id = %id, op = op, "MongoDB operation failed");
    record(op, start, "error");
    e.into()
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    #[instrument(skip(self), fields(collection = %self.target.collection))]
    async fn find_data(&self, id: &str) -> KVResult<Option<Vec<u8>>> {
        let start = Instant::now();
        let options = FindOneOptions::builder()
            .projection(doc! { "_id": 0, "data": 1 })
            .build();

        let found = self
            .collection
            .find_one(doc! { "_id": id }, options)
            .await
            .map_err(|e| fail("find", start, id, e))?;

        match found {
            None => {
                record("find", start, "not_found");
                Ok(None)
            }
            Some(document) => match document.get("data") {
                Some(Bson::Binary(binary)) => {
                    record("find", start, "found");
                    Ok(Some(binary.bytes.clone()))
                }
                other => {
                    record("find", start, "error");
                    Err(KVError::BackendError(format!(
                        "document {} has no binary data field (found {:?})",
                        id,
                        other.map(Bson::element_type)
                    )))
                }
            },
        }
    }

    #[instrument(skip(self), fields(collection = %self.target.collection))]
    async fn exists(&self, id: &str) -> KVResult<bool> {
        let start = Instant::now();
        let options = CountOptions::builder().limit(1).build();

        let count = self
            .collection
            .count_documents(doc! { "_id": id }, options)
            .await
            .map_err(|e| fail("count", start, id, e))?;

        record("count", start, "success");
        Ok(count > 0)
    }

    #[instrument(skip(self, data, timestamp), fields(collection = %self.target.collection, value_len = data.len()))]
    async fn upsert(&self, id: &str, data: Vec<u8>, timestamp: DateTime<Utc>) -> KVResult<()> {
        let start = Instant::now();
        let update = doc! {
            "$set": {
                "data": Binary { subtype: BinarySubtype::Generic, bytes: data },
                "timestamp": bson::DateTime::from_millis(timestamp.timestamp_millis()),
            }
        };
        let options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .collection
            .update_one(doc! { "_id": id }, update, options)
            .await
            .map_err(|e| fail("upsert", start, id, e))?;

        record("upsert", start, "success");
        debug!(
            id = %id,
            inserted = result.upserted_id.is_some(),
            duration_ms = start.elapsed().as_millis(),
            "Document upserted"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.target.collection))]
    async fn remove(&self, id: &str) -> KVResult<()> {
        let start = Instant::now();

        let result = self
            .collection
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| fail("delete", start, id, e))?;

        record("delete", start, "success");
        debug!(id = %id, deleted = result.deleted_count, "Document removed");
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.target.collection))]
    async fn ids_with_prefix(&self, prefix: &str) -> KVResult<BoxStream<'static, KVResult<String>>> {
        let start = Instant::now();
        let options = FindOptions::builder().projection(doc! { "_id": 1 }).build();

        let cursor = self
            .collection
            .find(Self::prefix_filter(prefix), options)
            .await
            .map_err(|e| fail("scan", start, prefix, e))?;

        record("scan", start, "success");
        let ids = cursor.map(|item| {
            let document = item.map_err(KVError::from)?;
            document
                .get_str("_id")
                .map(str::to_string)
                .map_err(|e| KVError::BackendError(format!("document _id is not a string: {}", e)))
        });
        Ok(ids.boxed())
    }

    #[instrument(skip(self), fields(collection = %self.target.collection))]
    async fn remove_with_prefix(&self, prefix: &str) -> KVResult<u64> {
        let start = Instant::now();

        let result = self
            .collection
            .delete_many(Self::prefix_filter(prefix), None)
            .await
            .map_err(|e| fail("delete_many", start, prefix, e))?;

        record("delete_many", start, "success");
        debug!(prefix = %prefix, deleted = result.deleted_count, "Documents removed by prefix");
        Ok(result.deleted_count)
    }

    #[instrument(skip(self), fields(collection = %self.target.collection))]
    async fn drop_collection(&self) -> KVResult<()> {
        let start = Instant::now();

        self.collection
            .drop(None)
            .await
            .map_err(|e| fail("drop", start, &self.target.collection, e))?;

        record("drop", start, "success");
        debug!(collection = %self.target.collection, "Collection dropped");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "MongoDB"
    }
}
