// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Dataset loader: assembles every part into one logical table

use crate::error::{LoadError, Statement};
use crate::fetch::{Origin, PartFetcher};
use diagnostics::*;
use engine::{Connection, QueryEngine, Value};

/// Outcome of a successful [`DatasetLoader::load_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub parts: usize,
    pub cache_hits: usize,
    pub total_rows: u64,
}

pub struct DatasetLoader {
    fetcher: PartFetcher,
    table: String,
}

impl DatasetLoader {
    /// `table` must be a plain identifier; see
    /// [`crate::config::validate_table_name`].
    pub fn new<S: Into<String>>(fetcher: PartFetcher, table: S) -> Self {
        Self {
            fetcher,
            table: table.into(),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn fetcher(&self) -> &PartFetcher {
        &self.fetcher
    }

    /// Fetch every part in index order and assemble the logical table.
    ///
    /// Part 0 creates the table and each later part is appended to it, so
    /// the parts are processed one at a time: each part is registered,
    /// applied and unregistered before the next fetch starts. One connection serves the
    /// whole sequence and is closed on every exit path.
    ///
    /// Not re-entrant: a second call on the same engine fails at part 0
    /// because the table already exists.
    pub async fn load_all(&self, engine: &dyn QueryEngine) -> Result<LoadSummary, LoadError> {
        let mut conn = engine.connect().await.map_err(LoadError::Connect)?;
        let result = self.load_parts(engine, conn.as_mut()).await;
        conn.close().await;

        match &result {
            Ok(summary) => {
                let table = self.table.as_str();
                let parts = summary.parts;
                let cache_hits = summary.cache_hits;
                let total_rows = summary.total_rows;
                info!("Loaded {parts} parts into {table} ({cache_hits} from cache), {total_rows} rows");
            }
            Err(e) => {
                let error = e.to_string();
                error!("Dataset load failed: {error}");
            }
        }
        result
    }

    async fn load_parts(
        &self,
        engine: &dyn QueryEngine,
        conn: &mut dyn Connection,
    ) -> Result<LoadSummary, LoadError> {
        let layout = self.fetcher.layout();
        let table = self.table.as_str();
        let mut cache_hits = 0;

        for index in layout.indices() {
            let part = self
                .fetcher
                .fetch_part(index)
                .await
                .map_err(|source| LoadError::Fetch { index, source })?;
            if part.origin == Origin::Cache {
                cache_hits += 1;
            }

            let virtual_name = layout.virtual_name(index);
            engine
                .register_buffer(&virtual_name, part.bytes)
                .await
                .map_err(|source| LoadError::Register { index, source })?;

            let file = engine.file_ref(&virtual_name);
            let (statement, sql) = if index == 0 {
                (
                    Statement::Create,
                    format!("CREATE TABLE {table} AS SELECT * FROM {file}"),
                )
            } else {
                (
                    Statement::Insert,
                    format!("INSERT INTO {table} SELECT * FROM {file}"),
                )
            };
            let applied = conn.query(&sql).await;

            // The rows now live in the logical table; drop the decoded part
            if let Err(e) = engine.unregister_buffer(&virtual_name).await {
                let error = e.to_string();
                warn!("Part {index}: failed to unregister {virtual_name}: {error}");
            }
            _ = applied.map_err(|source| LoadError::Statement {
                index,
                statement,
                source,
            })?;
            debug!("Part {index}: applied to {table}");
        }

        let count = conn
            .query(&format!("SELECT COUNT(*) AS total_rows FROM {table}"))
            .await
            .map_err(LoadError::Verify)?;
        let total_rows = count
            .first_value("total_rows")
            .and_then(Value::as_u64)
            .ok_or(LoadError::MissingRowCount)?;
        debug!("Total rows loaded: {total_rows}");

        Ok(LoadSummary {
            parts: layout.total_parts(),
            cache_hits,
            total_rows,
        })
    }
}
