// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Result, StoreError};
use crate::{ByteStream, LocalStore, Removal, validate_name};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-process store. Clones share the same entries.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore(Arc<Mutex<HashMap<String, Bytes>>>);

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the stored entries, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn insert<S: Into<String>>(&self, name: S, bytes: Bytes) {
        _ = self.0.lock().await.insert(name.into(), bytes);
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    fn available(&self) -> bool {
        true
    }

    async fn read(&self, name: &str) -> Result<Option<Bytes>> {
        validate_name(name)?;
        Ok(self.0.lock().await.get(name).cloned())
    }

    async fn write_stream(&self, name: &str, mut stream: ByteStream<'_>) -> Result<()> {
        validate_name(name)?;
        // The entry only changes once the whole stream has arrived
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StoreError::stream(name, e))?;
            buffer.extend_from_slice(&chunk);
        }
        _ = self
            .0
            .lock()
            .await
            .insert(name.to_string(), buffer.freeze());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<Removal> {
        validate_name(name)?;
        Ok(match self.0.lock().await.remove(name) {
            Some(_) => Removal::Removed,
            None => Removal::NotFound,
        })
    }
}
