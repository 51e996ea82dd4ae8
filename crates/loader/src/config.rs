// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Deployment configuration for one published dataset

use crate::layout::PartLayout;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173/";
pub const DEFAULT_PREFIX: &str = "aozora_combined_part";
pub const DEFAULT_TOTAL_PARTS: usize = 6;
pub const DEFAULT_TABLE: &str = "aozora_combined";

/// Largest part count the two-digit part names can address.
pub const MAX_PARTS: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL {0:?} must use http or https")]
    Scheme(String),

    #[error("total_parts must be at least 1")]
    NoParts,

    #[error("total_parts {0} exceeds the two-digit part naming scheme")]
    TooManyParts(usize),

    #[error("invalid part prefix {0:?}: must be a non-empty file name prefix")]
    Prefix(String),

    #[error("invalid table name {0:?}: must be a letter or '_' followed by letters, digits or '_'")]
    Table(String),
}

/// Where the parts live and what they assemble into.
///
/// `total_parts` must match the number of parts actually published; the
/// loader does not discover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub base_url: String,
    pub prefix: String,
    pub total_parts: usize,
    pub table: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            total_parts: DEFAULT_TOTAL_PARTS,
            table: DEFAULT_TABLE.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl DatasetConfig {
    /// Validate the configuration and derive the part layout from it.
    pub fn layout(&self) -> Result<PartLayout, ConfigError> {
        if self.total_parts == 0 {
            return Err(ConfigError::NoParts);
        }
        if self.total_parts > MAX_PARTS {
            return Err(ConfigError::TooManyParts(self.total_parts));
        }
        if self.prefix.is_empty() || partstore::validate_name(&self.prefix).is_err() {
            return Err(ConfigError::Prefix(self.prefix.clone()));
        }
        validate_table_name(&self.table)?;

        let mut base = Url::parse(&self.base_url).map_err(|source| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Scheme(self.base_url.clone()));
        }
        // Joining a part name must append to the path, not replace its last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(PartLayout::new(base, self.prefix.clone(), self.total_parts))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// The logical table name is interpolated into SQL, so it is restricted
/// to a plain identifier.
pub fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Table(name.to_string()))
    }
}
