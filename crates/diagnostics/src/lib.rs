// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging setup shared by every shardsql crate
//!
//! Usage:
//! - Set SHARDSQL_LOG=off (default) - no logs
//! - Set SHARDSQL_LOG=warn - cache degradations and failures
//! - Set SHARDSQL_LOG=info - load summaries
//! - Set SHARDSQL_LOG=debug - per-part fetch and SQL statements

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`].
pub const LOG_ENV: &str = "SHARDSQL_LOG";

static INIT: Once = Once::new();

/// The level named by a `SHARDSQL_LOG` value: `Ok(None)` means logging
/// is off, `Err` carries an unrecognised value.
pub fn parse_level(value: &str) -> Result<Option<emit::Level>, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Ok(None),
        "debug" => Ok(Some(emit::Level::Debug)),
        "info" => Ok(Some(emit::Level::Info)),
        "warn" => Ok(Some(emit::Level::Warn)),
        "error" => Ok(Some(emit::Level::Error)),
        other => Err(other.to_string()),
    }
}

/// Initialize diagnostics based on the SHARDSQL_LOG environment variable
///
/// Safe to call multiple times; only the first call has an effect.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());

        let level = match parse_level(&value) {
            Ok(Some(level)) => level,
            Ok(None) => return,
            Err(unknown) => {
                // Bootstrap warning, emitted before any logger exists
                eprintln!("Warning: Unknown {LOG_ENV} value '{unknown}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the rest of the process
        std::mem::forget(rt);
    });
}

// The level macros are emit's own, re-exported rather than wrapped: a
// `macro_rules!` wrapper would give emit's template captures (`{part}`)
// the wrapper's hygiene, hiding the caller's locals.

/// Operations a user wants to see in normal usage.
/// Examples: "Loaded 6 parts", "Cleared 6 cached parts"
pub use emit::info;

/// Detailed progress: per-part fetches, SQL statements, cache hits.
pub use emit::debug;

/// Recoverable conditions such as a local store read failing and the
/// fetch falling back to the network.
pub use emit::warn;

/// Failures that abort an operation.
pub use emit::error;

pub use init_diagnostics as init;
