// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cache;
pub mod query;
pub mod shell;
pub mod split;

pub use cache::clear_cache_command;
pub use query::{Request, query_command};
pub use shell::shell_command;
pub use split::{SplitSummary, split_command, split_parquet};
