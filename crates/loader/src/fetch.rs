// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Part fetcher: local store first, then the network with write-through

use crate::error::FetchError;
use crate::layout::PartLayout;
use crate::source::PartSource;
use bytes::{Bytes, BytesMut};
use diagnostics::*;
use futures::StreamExt;
use partstore::{ByteStream, LocalStore};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct FetchedPart {
    pub index: usize,
    pub bytes: Bytes,
    pub origin: Origin,
}

#[derive(Clone)]
pub struct PartFetcher {
    layout: PartLayout,
    store: Arc<dyn LocalStore>,
    source: Arc<dyn PartSource>,
}

impl PartFetcher {
    pub fn new(layout: PartLayout, store: Arc<dyn LocalStore>, source: Arc<dyn PartSource>) -> Self {
        Self {
            layout,
            store,
            source,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &PartLayout {
        &self.layout
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    /// Obtain the bytes of part `index`.
    ///
    /// A cached entry is returned without touching the network. On a miss
    /// the body is streamed straight into the store and the entry is read
    /// back, so the bytes returned are exactly the bytes cached. A store
    /// that is unavailable degrades to buffering the body in memory.
    pub async fn fetch_part(&self, index: usize) -> Result<FetchedPart, FetchError> {
        if !self.layout.contains(index) {
            return Err(FetchError::OutOfRange {
                index,
                total: self.layout.total_parts(),
            });
        }
        let name = self.layout.part_name(index);

        if let Some(bytes) = self.cached(&name).await {
            let size = bytes.len();
            debug!("Part {index}: cache hit for {name} ({size} bytes)");
            return Ok(FetchedPart {
                index,
                bytes,
                origin: Origin::Cache,
            });
        }

        let url = self
            .layout
            .part_url(index)
            .map_err(|source| FetchError::Url { index, source })?;
        let location = url.to_string();
        debug!("Part {index}: fetching {location}");
        let stream = self.source.open(index, &url).await?;

        let bytes = if self.store.available() {
            self.write_through(index, &name, stream).await?
        } else {
            collect(stream)
                .await
                .map_err(|source| FetchError::Download {
                    index,
                    url: location,
                    source,
                })?
        };

        let size = bytes.len();
        debug!("Part {index}: fetched {name} ({size} bytes)");
        Ok(FetchedPart {
            index,
            bytes,
            origin: Origin::Network,
        })
    }

    /// Store read failures other than "absent" are reported and treated
    /// as a miss.
    async fn cached(&self, name: &str) -> Option<Bytes> {
        match self.store.read(name).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = e.to_string();
                warn!("Local store read of {name} failed, fetching from network: {error}");
                None
            }
        }
    }

    async fn write_through(
        &self,
        index: usize,
        name: &str,
        stream: ByteStream<'static>,
    ) -> Result<Bytes, FetchError> {
        self.store
            .write_stream(name, stream)
            .await
            .map_err(|source| FetchError::CacheWrite {
                index,
                name: name.to_string(),
                source,
            })?;

        match self.store.read(name).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(FetchError::NotCached {
                index,
                name: name.to_string(),
                source: None,
            }),
            Err(source) => Err(FetchError::NotCached {
                index,
                name: name.to_string(),
                source: Some(source),
            }),
        }
    }
}

async fn collect(mut stream: ByteStream<'static>) -> std::io::Result<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}
