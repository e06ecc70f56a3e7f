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

//! Configuration for namespaced stores.
//!
//! ## Purpose
//! Carries the three parameters a host framework passes when it creates a
//! store: the connection URI and where creation lock files live.
//!
//! ## Parameters
//! - `uri`: connection target, required to open a store
//!   (`mongodb://host:27017/database.collection`)
//! - `data_dir`: base directory; lock files go to `{data_dir}/container_mongodb_lock`
//! - `lock_dir`: explicit lock directory, overrides the `data_dir`-derived path
//!
//! ## Environment Variables
//! - `CACHEDOC_URI`
//! - `CACHEDOC_DATA_DIR`
//! - `CACHEDOC_LOCK_DIR`
//!
//! ## Examples
//!
//! ```bash
//! export CACHEDOC_URI=mongodb://localhost:27017/app.sessions
//! export CACHEDOC_DATA_DIR=/var/lib/app
//! cargo run
//! ```

use crate::{ConnectionTarget, KVError, KVResult};
use std::collections::HashMap;
use std::path::PathBuf;

/// Directory created under `data_dir` when no explicit `lock_dir` is given.
pub const LOCK_DIR_NAME: &str = "container_mongodb_lock";

/// Store configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Connection URI
    pub uri: Option<String>,
    /// Base data directory
    pub data_dir: Option<PathBuf>,
    /// Explicit lock directory
    pub lock_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Configuration with only a connection URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    /// Set the base data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Set the explicit lock directory.
    pub fn with_lock_dir(mut self, lock_dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(lock_dir.into());
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Unset or empty variables leave the field unset; a missing URI is only
    /// reported when a store is opened.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            uri: var("CACHEDOC_URI"),
            data_dir: var("CACHEDOC_DATA_DIR").map(PathBuf::from),
            lock_dir: var("CACHEDOC_LOCK_DIR").map(PathBuf::from),
        }
    }

    /// Create configuration from a host parameter map.
    ///
    /// Recognizes `uri`, `data_dir` and `lock_dir`. Hosts pass their whole
    /// backend parameter set, so other keys are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let param = |name: &str| params.get(name).filter(|v| !v.trim().is_empty()).cloned();
        Self {
            uri: param("uri"),
            data_dir: param("data_dir").map(PathBuf::from),
            lock_dir: param("lock_dir").map(PathBuf::from),
        }
    }

    /// Parse the connection URI.
    ///
    /// ## Errors
    /// [`KVError::ConfigError`] when no URI is configured or it lacks a
    /// database or collection.
    pub fn target(&self) -> KVResult<ConnectionTarget> {
        match self.uri.as_deref() {
            Some(uri) => ConnectionTarget::parse(uri),
            None => Err(KVError::ConfigError("URI is required".to_string())),
        }
    }

    /// Lock directory: `lock_dir`, else `data_dir/container_mongodb_lock`.
    pub fn resolved_lock_dir(&self) -> Option<PathBuf> {
        match (&self.lock_dir, &self.data_dir) {
            (Some(lock_dir), _) => Some(lock_dir.clone()),
            (None, Some(data_dir)) => Some(data_dir.join(LOCK_DIR_NAME)),
            (None, None) => None,
        }
    }
}
