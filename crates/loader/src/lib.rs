// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Loader -- materializes a sharded parquet dataset into one table
//!
//! A dataset is published as `total_parts` parquet files named
//! `<prefix><NN>.parquet` under a base URL. The [`PartFetcher`] serves
//! each part from the local store when it can and otherwise streams it
//! from the network into the store. The [`DatasetLoader`] feeds the parts
//! to a query engine in index order: part 0 creates the logical table
//! and every later part is appended to it.
//!
//! The per-part pipeline is deliberately sequential. Part order is a
//! correctness requirement and two concurrent fetches of one part would
//! race on the same store entry.

pub mod config;
mod error;
mod evict;
mod fetch;
mod layout;
mod load;
mod source;

pub use config::{ConfigError, DatasetConfig};
pub use error::{FetchError, LoadError, Statement};
pub use evict::{EvictionSummary, clear_all};
pub use fetch::{FetchedPart, Origin, PartFetcher};
pub use layout::{PartLayout, part_file_name};
pub use load::{DatasetLoader, LoadSummary};
pub use source::{HttpSource, PartSource};
