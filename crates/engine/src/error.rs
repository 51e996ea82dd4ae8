// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Planning or execution failed: malformed SQL, unknown columns,
    /// a duplicate `CREATE TABLE`, and so on.
    #[error("{0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("buffer {name} is not a readable parquet file: {source}")]
    Buffer {
        name: String,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),
}
