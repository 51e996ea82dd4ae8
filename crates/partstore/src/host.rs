// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Result, StoreError};
use crate::{ByteStream, LocalStore, Removal, validate_name};
use async_trait::async_trait;
use bytes::Bytes;
use diagnostics::*;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// A store backed by one flat host directory, one file per entry.
///
/// Writes land in a sibling `<name>.partial` file that is renamed over
/// the entry once the stream is exhausted, so an interrupted write never
/// becomes visible as an entry.
#[derive(Debug, Clone)]
pub struct HostStore {
    /// `None` when the directory could not be created
    root: Option<PathBuf>,
}

impl HostStore {
    /// Open (creating if needed) the store directory. When the directory
    /// cannot be created the store opens as unavailable.
    pub async fn open<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        match tokio::fs::create_dir_all(&root).await {
            Ok(()) => {
                let dir = root.display().to_string();
                debug!("Opened local store at {dir}");
                Self { root: Some(root) }
            }
            Err(e) => {
                let dir = root.display().to_string();
                let error = e.to_string();
                warn!("Local store unavailable at {dir}: {error}");
                Self { root: None }
            }
        }
    }

    /// The store directory, if the store is available.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn entry_path(root: &Path, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(root.join(name))
    }

    fn partial_path(root: &Path, name: &str) -> PathBuf {
        root.join(format!("{name}.partial"))
    }

    async fn discard(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                let file = path.display().to_string();
                let error = e.to_string();
                warn!("Failed to discard partial write {file}: {error}");
            }
        }
    }
}

#[async_trait]
impl LocalStore for HostStore {
    fn available(&self) -> bool {
        self.root.is_some()
    }

    async fn read(&self, name: &str) -> Result<Option<Bytes>> {
        let Some(root) = &self.root else {
            return Ok(None);
        };
        let path = Self::entry_path(root, name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    async fn write_stream(&self, name: &str, mut stream: ByteStream<'_>) -> Result<()> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let path = Self::entry_path(root, name)?;
        let partial = Self::partial_path(root, name);

        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|source| StoreError::Write {
                path: partial.clone(),
                source,
            })?;

        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(source) => {
                    drop(file);
                    Self::discard(&partial).await;
                    return Err(StoreError::stream(name, source));
                }
            };
            if let Err(source) = file.write_all(&chunk).await {
                drop(file);
                Self::discard(&partial).await;
                return Err(StoreError::Write { path, source });
            }
            written += chunk.len();
        }

        let finished = async {
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&partial, &path).await
        };
        if let Err(source) = finished.await {
            Self::discard(&partial).await;
            return Err(StoreError::Write { path, source });
        }

        debug!("Stored {name} ({written} bytes)");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<Removal> {
        let Some(root) = &self.root else {
            return Ok(Removal::NotFound);
        };
        let path = Self::entry_path(root, name)?;

        // A write interrupted by a crash leaves its partial file behind
        Self::discard(&Self::partial_path(root, name)).await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::NotFound),
            Err(source) => Err(StoreError::Remove { path, source }),
        }
    }
}
