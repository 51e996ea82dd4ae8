// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::FetchError;
use async_trait::async_trait;
use futures::StreamExt;
use partstore::ByteStream;
use std::time::Duration;
use url::Url;

/// The network half of the part fetcher: opens a part's body as a stream.
#[async_trait]
pub trait PartSource: Send + Sync {
    async fn open(&self, index: usize, url: &Url) -> Result<ByteStream<'static>, FetchError>;
}

/// Fetches parts with HTTP GET.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// `timeout` bounds each request; `None` lets a stalled request wait
    /// forever.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl PartSource for HttpSource {
    async fn open(&self, index: usize, url: &Url) -> Result<ByteStream<'static>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                index,
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                index,
                url: url.to_string(),
                status: status.to_string(),
            });
        }
        if response.content_length() == Some(0) {
            return Err(FetchError::EmptyBody {
                index,
                url: url.to_string(),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed())
    }
}
