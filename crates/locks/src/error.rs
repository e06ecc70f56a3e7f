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

//! Error types for creation lock operations.

use thiserror::Error;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// Invalid lock identifier
    #[error("Invalid lock identifier: {0}")]
    InvalidKey(String),

    /// Backend error (lock file, task join, etc.)
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl From<tokio::task::JoinError> for LockError {
    fn from(err: tokio::task::JoinError) -> Self {
        LockError::BackendError(format!("Lock task failed: {}", err))
    }
}
