// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::app::App;
use anyhow::Result;
use std::io::Write;

/// Remove every cached part and report what happened.
///
/// Individual removal failures are reported, not raised.
pub async fn clear_cache_command<W: Write>(app: &App, out: &mut W) -> Result<()> {
    let summary = app.clear_cache().await;
    writeln!(
        out,
        "Removed {} cached parts ({} not cached, {} failed)",
        summary.removed, summary.missing, summary.failed
    )?;
    Ok(())
}
