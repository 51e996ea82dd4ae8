// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::layout::PartLayout;
use diagnostics::*;
use partstore::{LocalStore, Removal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionSummary {
    pub removed: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Remove every cached part of `layout` from `store`.
///
/// Best effort: each failure is logged and the remaining parts are still
/// removed. Tables already loaded into an engine are unaffected; only the
/// next load sees the eviction.
pub async fn clear_all(store: &dyn LocalStore, layout: &PartLayout) -> EvictionSummary {
    let mut summary = EvictionSummary::default();
    for index in layout.indices() {
        let name = layout.part_name(index);
        match store.remove(&name).await {
            Ok(Removal::Removed) => summary.removed += 1,
            Ok(Removal::NotFound) => summary.missing += 1,
            Err(e) => {
                let error = e.to_string();
                warn!("Failed to remove cached part {name}: {error}");
                summary.failed += 1;
            }
        }
    }

    let removed = summary.removed;
    let failed = summary.failed;
    info!("Cleared {removed} cached parts ({failed} failures)");
    summary
}
