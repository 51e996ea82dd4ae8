// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{QueryError, Result};
use crate::rows::{RowSet, Value};
use crate::{Connection, QueryEngine};
use async_trait::async_trait;
use bytes::Bytes;
use datafusion::dataframe::DataFrame;
use datafusion::datasource::MemTable;
use datafusion::execution::context::{SessionConfig, SessionContext};
use datafusion::scalar::ScalarValue;
use datafusion::sql::TableReference;
use diagnostics::*;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Embedded DataFusion engine. All connections share one session, so a
/// table created through one connection is visible to the next.
///
/// Registered buffers are decoded into in-memory tables named after the
/// virtual file; [`QueryEngine::file_ref`] quotes that name for SQL.
#[derive(Clone)]
pub struct DataFusionEngine {
    ctx: SessionContext,
    open: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

impl Default for DataFusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFusionEngine {
    #[must_use]
    pub fn new() -> Self {
        let mut config = SessionConfig::new().with_information_schema(true);
        // Column names such as `作品ID` are matched exactly as the parts define them
        config.options_mut().sql_parser.enable_ident_normalization = false;
        Self {
            ctx: SessionContext::new_with_config(config),
            open: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Number of connections that have been handed out and not yet
    /// closed or dropped.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Open a connection with its concrete type.
    #[must_use]
    pub fn open(&self) -> DataFusionConnection {
        _ = self.open.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        debug!("Opened connection {id}");
        DataFusionConnection {
            ctx: self.ctx.clone(),
            id,
            _lease: Lease(self.open.clone()),
        }
    }
}

#[async_trait]
impl QueryEngine for DataFusionEngine {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(self.open()))
    }

    async fn register_buffer(&self, virtual_name: &str, bytes: Bytes) -> Result<()> {
        let size = bytes.len();
        let buffer_error = |source| QueryError::Buffer {
            name: virtual_name.to_string(),
            source,
        };

        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(buffer_error)?;
        let schema = builder.schema().clone();
        let batches = builder
            .build()
            .map_err(buffer_error)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();

        let table = MemTable::try_new(schema, vec![batches])?;
        let reference = TableReference::bare(virtual_name);
        _ = self.ctx.deregister_table(reference.clone())?;
        _ = self.ctx.register_table(reference, Arc::new(table))?;

        debug!("Registered buffer {virtual_name} ({size} bytes, {rows} rows)");
        Ok(())
    }

    async fn unregister_buffer(&self, virtual_name: &str) -> Result<()> {
        if self.ctx.deregister_table(TableReference::bare(virtual_name))?.is_some() {
            debug!("Unregistered buffer {virtual_name}");
        }
        Ok(())
    }

    fn file_ref(&self, virtual_name: &str) -> String {
        format!("\"{}\"", virtual_name.replace('"', "\"\""))
    }
}

/// Decrements the engine's open-connection count when dropped.
struct Lease(Arc<AtomicUsize>);

impl Drop for Lease {
    fn drop(&mut self) {
        _ = self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct DataFusionConnection {
    ctx: SessionContext,
    id: u64,
    _lease: Lease,
}

impl DataFusionConnection {
    async fn collect(df: DataFrame) -> Result<RowSet> {
        let schema = df.schema().inner().clone();
        let batches = df.collect().await?;
        RowSet::from_batches(schema, batches)
    }
}

#[async_trait]
impl Connection for DataFusionConnection {
    async fn query(&mut self, sql: &str) -> Result<RowSet> {
        let id = self.id;
        debug!("Connection {id} executing: {sql}");
        let df = self.ctx.sql(sql).await?;
        Self::collect(df).await
    }

    async fn query_with_params(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        let id = self.id;
        let count = params.len();
        debug!("Connection {id} executing with {count} parameters: {sql}");
        let values: Vec<ScalarValue> = params.iter().map(scalar).collect();
        let df = self.ctx.sql(sql).await?.with_param_values(values)?;
        Self::collect(df).await
    }

    async fn close(self: Box<Self>) {
        let id = self.id;
        debug!("Closed connection {id}");
    }
}

fn scalar(value: &Value) -> ScalarValue {
    match value {
        Value::Null => ScalarValue::Null,
        Value::Boolean(v) => ScalarValue::Boolean(Some(*v)),
        Value::Int(v) => ScalarValue::Int64(Some(*v)),
        Value::UInt(v) => ScalarValue::UInt64(Some(*v)),
        Value::Float(v) => ScalarValue::Float64(Some(*v)),
        Value::Text(v) => ScalarValue::Utf8(Some(v.clone())),
    }
}
