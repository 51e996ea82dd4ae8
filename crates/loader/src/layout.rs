// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::ops::Range;
use url::Url;

/// File name of part `index` in a dataset published under `prefix`.
#[must_use]
pub fn part_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:02}.parquet")
}

/// Names and locations of the parts of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartLayout {
    base_url: Url,
    prefix: String,
    total_parts: usize,
}

impl PartLayout {
    /// `base_url` is expected to end in `/`; see [`crate::DatasetConfig::layout`].
    #[must_use]
    pub fn new(base_url: Url, prefix: String, total_parts: usize) -> Self {
        Self {
            base_url,
            prefix,
            total_parts,
        }
    }

    #[must_use]
    pub fn total_parts(&self) -> usize {
        self.total_parts
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Part indices in load order.
    #[must_use]
    pub fn indices(&self) -> Range<usize> {
        0..self.total_parts
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index < self.total_parts
    }

    /// Store and network name: `<prefix><NN>.parquet`.
    #[must_use]
    pub fn part_name(&self, index: usize) -> String {
        part_file_name(&self.prefix, index)
    }

    /// Name the part's buffer is registered under in the query engine.
    #[must_use]
    pub fn virtual_name(&self, index: usize) -> String {
        format!("part{index}")
    }

    pub fn part_url(&self, index: usize) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.part_name(index))
    }
}
