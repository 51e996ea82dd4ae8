// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use engine::QueryError;
use partstore::StoreError;
use std::fmt;
use thiserror::Error;

/// Neither the local store nor the network produced the part.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("part {index} is outside the dataset (0..{total})")]
    OutOfRange { index: usize, total: usize },

    #[error("part {index}: invalid URL: {source}")]
    Url {
        index: usize,
        #[source]
        source: url::ParseError,
    },

    #[error("part {index}: request to {url} failed: {source}")]
    Request {
        index: usize,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("part {index}: {url} returned {status}")]
    Status {
        index: usize,
        url: String,
        status: String,
    },

    #[error("part {index}: {url} returned an empty body")]
    EmptyBody { index: usize, url: String },

    /// The body could not be piped into the local store, either because
    /// the download broke off or because the store write failed.
    #[error("part {index}: failed to cache {name}: {source}")]
    CacheWrite {
        index: usize,
        name: String,
        #[source]
        source: StoreError,
    },

    /// Only used when no local store is available and the body is
    /// buffered in memory instead.
    #[error("part {index}: download of {url} failed: {source}")]
    Download {
        index: usize,
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("part {index}: {name} was written but could not be read back from the local store")]
    NotCached {
        index: usize,
        name: String,
        #[source]
        source: Option<StoreError>,
    },
}

impl FetchError {
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            FetchError::OutOfRange { index, .. }
            | FetchError::Url { index, .. }
            | FetchError::Request { index, .. }
            | FetchError::Status { index, .. }
            | FetchError::EmptyBody { index, .. }
            | FetchError::CacheWrite { index, .. }
            | FetchError::Download { index, .. }
            | FetchError::NotCached { index, .. } => *index,
        }
    }
}

/// The SQL statement a part is applied with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Create,
    Insert,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Create => f.write_str("CREATE TABLE"),
            Statement::Insert => f.write_str("INSERT"),
        }
    }
}

/// A dataset load aborted. No part of a failed load is reported as
/// usable.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to connect to the query engine: {0}")]
    Connect(#[source] QueryError),

    #[error("{source}")]
    Fetch {
        index: usize,
        #[source]
        source: FetchError,
    },

    #[error("failed to register part {index}: {source}")]
    Register {
        index: usize,
        #[source]
        source: QueryError,
    },

    #[error("{statement} for part {index} failed: {source}")]
    Statement {
        index: usize,
        statement: Statement,
        #[source]
        source: QueryError,
    },

    #[error("row count verification failed: {0}")]
    Verify(#[source] QueryError),

    #[error("row count verification returned no count")]
    MissingRowCount,
}

impl LoadError {
    /// The part index the load failed at, if it failed at a part.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            LoadError::Fetch { index, .. }
            | LoadError::Register { index, .. }
            | LoadError::Statement { index, .. } => Some(*index),
            LoadError::Connect(_) | LoadError::Verify(_) | LoadError::MissingRowCount => None,
        }
    }
}
