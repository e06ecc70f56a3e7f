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

//! Error types for namespaced store operations.

use thiserror::Error;

/// Result type for namespaced store operations.
pub type KVResult<T> = Result<T, KVError>;

/// Errors that can occur during namespaced store operations.
#[derive(Error, Debug)]
pub enum KVError {
    /// Key not found
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Configuration error (missing URI, URI without database/collection, bad namespace, ...)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Backing database unreachable
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Backend error (driver failure, malformed stored document, ...)
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Creation lock error
    #[error("Lock error: {0}")]
    Lock(#[from] cachedoc_locks::LockError),

    /// IO error
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl KVError {
    /// True for `KeyNotFound`, so callers can tell "absent" from other failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KVError::KeyNotFound(_))
    }
}

#[cfg(feature = "mongodb-backend")]
impl From<mongodb::error::Error> for KVError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => {
                KVError::ConnectionError(format!("MongoDB unreachable: {}", err))
            }
            ErrorKind::InvalidArgument { .. } => KVError::ConfigError(format!("MongoDB: {}", err)),
            _ => KVError::BackendError(format!("MongoDB error: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(KVError::KeyNotFound("k".to_string()).is_not_found());
        assert!(!KVError::ConfigError("c".to_string()).is_not_found());
    }

    #[test]
    fn test_lock_error_conversion() {
        let err: KVError = cachedoc_locks::LockError::InvalidKey("".to_string()).into();
        assert!(matches!(err, KVError::Lock(_)));
        assert!(err.to_string().starts_with("Lock error"));
    }
}
