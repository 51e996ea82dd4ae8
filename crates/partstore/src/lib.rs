// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Partstore -- a flat, persistent namespace of binary blobs
//!
//! The loader uses this as the cache layer in front of the network. A
//! store may be *unavailable* (no persistent storage in this
//! environment); in that case every operation is a no-op that reports
//! "not cached" and writes are skipped.
//!
//! Three implementations are provided: [`HostStore`] keeps one file per
//! entry in a host directory, [`MemoryStore`] keeps entries in process
//! memory, and [`NoStore`] is permanently unavailable.

mod error;
mod host;
mod memory;

pub use error::{Result, StoreError};
pub use host::HostStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// A stream of byte chunks piped into [`LocalStore::write_stream`].
pub type ByteStream<'a> = BoxStream<'a, std::io::Result<Bytes>>;

/// Outcome of [`LocalStore::remove`]. Removing a missing entry is not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    NotFound,
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Whether persistent storage exists in this environment.
    fn available(&self) -> bool;

    /// Returns `Ok(None)` when the entry does not exist.
    async fn read(&self, name: &str) -> Result<Option<Bytes>>;

    /// Creates or truncates `name` and pipes `stream` into it. Success is
    /// only reported after the stream is exhausted. After a failure the
    /// entry must be treated as not cached.
    async fn write_stream(&self, name: &str, stream: ByteStream<'_>) -> Result<()>;

    async fn remove(&self, name: &str) -> Result<Removal>;
}

/// The store used when no persistent storage is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStore;

#[async_trait]
impl LocalStore for NoStore {
    fn available(&self) -> bool {
        false
    }

    async fn read(&self, _name: &str) -> Result<Option<Bytes>> {
        Ok(None)
    }

    async fn write_stream(&self, _name: &str, _stream: ByteStream<'_>) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _name: &str) -> Result<Removal> {
        Ok(Removal::NotFound)
    }
}

/// Entry names form one flat namespace: no separators, no `.` or `..`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0')
    {
        return Err(StoreError::invalid_name(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("aozora_combined_part00.parquet").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b.parquet").is_err());
        assert!(validate_name("a\\b.parquet").is_err());
    }

    #[tokio::test]
    async fn test_no_store_is_inert() {
        let store = NoStore;
        assert!(!store.available());

        let chunks = futures::stream::iter(vec![Ok(Bytes::from_static(b"abc"))]).boxed();
        store.write_stream("x.parquet", chunks).await.expect("skipped write");

        assert!(store.read("x.parquet").await.expect("read").is_none());
        assert_eq!(
            store.remove("x.parquet").await.expect("remove"),
            Removal::NotFound
        );
    }
}
