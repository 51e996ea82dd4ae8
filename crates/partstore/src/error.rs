// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures of the local store. None of these are fatal to a load on
/// their own; the fetcher downgrades them to a cache miss.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid entry name {0:?}: names must be flat file names")]
    InvalidName(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The byte stream being written failed before it was exhausted.
    #[error("input stream for {name} failed: {source}")]
    Stream {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn invalid_name<S: AsRef<str>>(name: S) -> Self {
        StoreError::InvalidName(name.as_ref().to_string())
    }

    pub fn stream<S: AsRef<str>>(name: S, source: std::io::Error) -> Self {
        StoreError::Stream {
            name: name.as_ref().to_string(),
            source,
        }
    }
}
