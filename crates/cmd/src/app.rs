// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::presets;
use anyhow::{Result, bail};
use diagnostics::*;
use engine::{DataFusionEngine, QueryEngine, RowSet, Value};
use loader::{DatasetConfig, DatasetLoader, EvictionSummary, LoadSummary, PartFetcher, PartSource};
use partstore::LocalStore;
use std::sync::Arc;

/// Application state: one dataset, one engine and the local part store.
///
/// Queries are refused until [`App::start`] has loaded the dataset.
pub struct App {
    config: DatasetConfig,
    engine: DataFusionEngine,
    loader: DatasetLoader,
    ready: bool,
}

impl App {
    pub fn new(
        config: DatasetConfig,
        store: Arc<dyn LocalStore>,
        source: Arc<dyn PartSource>,
    ) -> Result<Self> {
        let layout = config.layout()?;
        let loader = DatasetLoader::new(PartFetcher::new(layout, store, source), config.table.clone());
        Ok(Self {
            config,
            engine: DataFusionEngine::new(),
            loader,
            ready: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Load every part into the logical table.
    ///
    /// Runs the load once; later calls return an error without touching
    /// the dataset.
    pub async fn start(&mut self) -> Result<LoadSummary> {
        if self.ready {
            bail!("dataset is already loaded");
        }
        let summary = self.loader.load_all(&self.engine).await?;
        self.ready = true;
        Ok(summary)
    }

    /// Run user SQL verbatim.
    pub async fn query(&self, sql: &str) -> Result<RowSet> {
        self.run(sql, &[]).await
    }

    /// Search titles and author names. An empty term is no search at all.
    pub async fn search(&self, term: &str) -> Result<Option<RowSet>> {
        let Some(pattern) = presets::like_pattern(term) else {
            return Ok(None);
        };
        let sql = presets::search(self.table());
        Ok(Some(self.run(&sql, &[Value::Text(pattern)]).await?))
    }

    pub async fn default_listing(&self) -> Result<RowSet> {
        self.query(&presets::default_listing(self.table())).await
    }

    pub async fn author_stats(&self) -> Result<RowSet> {
        self.query(&presets::author_stats(self.table())).await
    }

    pub async fn yearly_stats(&self) -> Result<RowSet> {
        self.query(&presets::yearly_stats(self.table())).await
    }

    /// Remove every cached part. Does not require a loaded dataset and
    /// does not change the loaded table.
    pub async fn clear_cache(&self) -> EvictionSummary {
        let fetcher = self.loader.fetcher();
        loader::clear_all(fetcher.store().as_ref(), fetcher.layout()).await
    }

    fn table(&self) -> &str {
        self.loader.table()
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<RowSet> {
        if !self.ready {
            bail!("dataset is not loaded");
        }
        debug!("Executing SQL query: {sql}");

        let mut conn = self.engine.connect().await?;
        let result = if params.is_empty() {
            conn.query(sql).await
        } else {
            conn.query_with_params(sql, params).await
        };
        conn.close().await;
        Ok(result?)
    }
}
