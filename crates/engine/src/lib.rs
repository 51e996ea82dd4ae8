// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Query engine seam used by the dataset loader and the shell
//!
//! An engine hands out short-lived [`Connection`]s and accepts named
//! byte buffers ("virtual files") that SQL can read through
//! [`QueryEngine::file_ref`]. [`DataFusionEngine`] is the embedded
//! implementation.

mod error;
mod rows;
mod session;

pub use error::{QueryError, Result};
pub use rows::{Row, RowSet, Value};
pub use session::{DataFusionConnection, DataFusionEngine};

use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    /// Make `bytes` readable from SQL under `virtual_name`, replacing any
    /// earlier buffer of the same name.
    async fn register_buffer(&self, virtual_name: &str, bytes: Bytes) -> Result<()>;

    /// Drop a registered buffer. Unknown names are not an error.
    async fn unregister_buffer(&self, virtual_name: &str) -> Result<()>;

    /// SQL fragment that reads the registered buffer, usable after `FROM`.
    fn file_ref(&self, virtual_name: &str) -> String;
}

#[async_trait]
pub trait Connection: Send {
    async fn query(&mut self, sql: &str) -> Result<RowSet>;

    /// Run `sql` with `$1`, `$2`, ... bound to `params`.
    async fn query_with_params(&mut self, sql: &str, params: &[Value]) -> Result<RowSet>;

    /// Release the connection. Dropping it has the same effect.
    async fn close(self: Box<Self>);
}
