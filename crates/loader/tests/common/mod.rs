// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Test doubles shared by the loader integration tests

#![allow(dead_code)]

use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow_array::{Int64Array, StringArray};
use async_trait::async_trait;
use bytes::Bytes;
use engine::{Connection, DataFusionEngine, QueryEngine, RowSet, Value};
use futures::StreamExt;
use loader::{DatasetConfig, FetchError, PartLayout, PartSource};
use parquet::arrow::ArrowWriter;
use partstore::{ByteStream, LocalStore, Removal, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// A parquet part with `rows` works, ids starting at `first_id`.
pub fn parquet_part(first_id: i64, rows: usize) -> Bytes {
    let schema = Arc::new(Schema::new(vec![
        Field::new("作品ID", DataType::Int64, false),
        Field::new("作品名", DataType::Utf8, false),
        Field::new("姓", DataType::Utf8, true),
        Field::new("名", DataType::Utf8, true),
        Field::new("公開日", DataType::Utf8, true),
    ]));
    let ids: Vec<i64> = (0..rows as i64).map(|i| first_id + i).collect();
    let titles: Vec<String> = ids.iter().map(|id| format!("作品{id}")).collect();
    let family: Vec<Option<&str>> = ids.iter().map(|_| Some("芥川")).collect();
    let given: Vec<Option<&str>> = ids.iter().map(|_| Some("竜之介")).collect();
    let dates: Vec<Option<&str>> = ids.iter().map(|_| Some("1999-01-01")).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(titles)),
            Arc::new(StringArray::from(family)),
            Arc::new(StringArray::from(given)),
            Arc::new(StringArray::from(dates)),
        ],
    )
    .expect("batch");

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, None).expect("writer");
    writer.write(&batch).expect("write");
    _ = writer.close().expect("close");
    Bytes::from(buffer)
}

/// A layout of `total_parts` parts under a test URL.
pub fn layout(total_parts: usize) -> PartLayout {
    DatasetConfig {
        base_url: "http://parts.test/data/".to_string(),
        total_parts,
        ..DatasetConfig::default()
    }
    .layout()
    .expect("layout")
}

#[derive(Clone)]
pub enum Reply {
    Body(Bytes),
    /// Body delivered in two chunks with a transport error in between
    Broken(Bytes),
    Status(&'static str),
}

/// Serves canned replies by part index and records every request.
#[derive(Clone, Default)]
pub struct RecordingSource {
    replies: Arc<Mutex<HashMap<usize, Reply>>>,
    requests: Arc<Mutex<Vec<usize>>>,
}

impl RecordingSource {
    pub fn with_parts(parts: Vec<Bytes>) -> Self {
        let source = Self::default();
        for (index, bytes) in parts.into_iter().enumerate() {
            source.set(index, Reply::Body(bytes));
        }
        source
    }

    pub fn set(&self, index: usize, reply: Reply) {
        _ = self.replies.lock().expect("lock").insert(index, reply);
    }

    pub fn requests(&self) -> Vec<usize> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PartSource for RecordingSource {
    async fn open(&self, index: usize, url: &Url) -> Result<ByteStream<'static>, FetchError> {
        self.requests.lock().expect("lock").push(index);
        let reply = self.replies.lock().expect("lock").get(&index).cloned();
        match reply {
            Some(Reply::Body(bytes)) => {
                let (head, tail) = bytes.split_at(bytes.len() / 2);
                let chunks: Vec<std::io::Result<Bytes>> = vec![
                    Ok(Bytes::copy_from_slice(head)),
                    Ok(Bytes::copy_from_slice(tail)),
                ];
                Ok(futures::stream::iter(chunks).boxed())
            }
            Some(Reply::Broken(bytes)) => {
                let chunks: Vec<std::io::Result<Bytes>> = vec![
                    Ok(bytes.slice(..bytes.len() / 2)),
                    Err(std::io::Error::other("connection reset")),
                ];
                Ok(futures::stream::iter(chunks).boxed())
            }
            Some(Reply::Status(status)) => Err(FetchError::Status {
                index,
                url: url.to_string(),
                status: status.to_string(),
            }),
            None => Err(FetchError::Status {
                index,
                url: url.to_string(),
                status: "404 Not Found".to_string(),
            }),
        }
    }
}

/// Accepts every write and then forgets it.
#[derive(Default)]
pub struct ForgetfulStore;

#[async_trait]
impl LocalStore for ForgetfulStore {
    fn available(&self) -> bool {
        true
    }

    async fn read(&self, _name: &str) -> partstore::Result<Option<Bytes>> {
        Ok(None)
    }

    async fn write_stream(&self, _name: &str, mut stream: ByteStream<'_>) -> partstore::Result<()> {
        while stream.next().await.is_some() {}
        Ok(())
    }

    async fn remove(&self, _name: &str) -> partstore::Result<Removal> {
        Ok(Removal::NotFound)
    }
}

/// Wraps a store and fails every read and remove.
pub struct FailingStore<S>(pub S);

#[async_trait]
impl<S: LocalStore> LocalStore for FailingStore<S> {
    fn available(&self) -> bool {
        true
    }

    async fn read(&self, name: &str) -> partstore::Result<Option<Bytes>> {
        Err(StoreError::Read {
            path: name.into(),
            source: std::io::Error::other("quota exceeded"),
        })
    }

    async fn write_stream(&self, name: &str, stream: ByteStream<'_>) -> partstore::Result<()> {
        self.0.write_stream(name, stream).await
    }

    async fn remove(&self, name: &str) -> partstore::Result<Removal> {
        Err(StoreError::Remove {
            path: name.into(),
            source: std::io::Error::other("permission denied"),
        })
    }
}

#[derive(Debug, Default)]
pub struct EngineLog {
    pub registered: Vec<String>,
    pub unregistered: Vec<String>,
    pub statements: Vec<String>,
    pub connects: usize,
    pub closes: usize,
}

impl EngineLog {
    pub fn creates(&self) -> Vec<&String> {
        self.statements
            .iter()
            .filter(|s| s.starts_with("CREATE TABLE"))
            .collect()
    }

    pub fn inserts(&self) -> Vec<&String> {
        self.statements
            .iter()
            .filter(|s| s.starts_with("INSERT INTO"))
            .collect()
    }
}

/// A DataFusion engine that records registrations, statements and
/// connection lifecycle.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub inner: DataFusionEngine,
    pub log: Arc<Mutex<EngineLog>>,
}

impl RecordingEngine {
    pub fn snapshot<T>(&self, f: impl FnOnce(&EngineLog) -> T) -> T {
        f(&self.log.lock().expect("lock"))
    }
}

#[async_trait]
impl QueryEngine for RecordingEngine {
    async fn connect(&self) -> engine::Result<Box<dyn Connection>> {
        self.log.lock().expect("lock").connects += 1;
        let inner = self.inner.connect().await?;
        Ok(Box::new(RecordingConnection {
            inner,
            log: self.log.clone(),
        }))
    }

    async fn register_buffer(&self, virtual_name: &str, bytes: Bytes) -> engine::Result<()> {
        self.log
            .lock()
            .expect("lock")
            .registered
            .push(virtual_name.to_string());
        self.inner.register_buffer(virtual_name, bytes).await
    }

    async fn unregister_buffer(&self, virtual_name: &str) -> engine::Result<()> {
        self.log
            .lock()
            .expect("lock")
            .unregistered
            .push(virtual_name.to_string());
        self.inner.unregister_buffer(virtual_name).await
    }

    fn file_ref(&self, virtual_name: &str) -> String {
        self.inner.file_ref(virtual_name)
    }
}

struct RecordingConnection {
    inner: Box<dyn Connection>,
    log: Arc<Mutex<EngineLog>>,
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn query(&mut self, sql: &str) -> engine::Result<RowSet> {
        self.log.lock().expect("lock").statements.push(sql.to_string());
        self.inner.query(sql).await
    }

    async fn query_with_params(&mut self, sql: &str, params: &[Value]) -> engine::Result<RowSet> {
        self.log.lock().expect("lock").statements.push(sql.to_string());
        self.inner.query_with_params(sql, params).await
    }

    async fn close(self: Box<Self>) {
        self.log.lock().expect("lock").closes += 1;
        self.inner.close().await;
    }
}

/// Row count of `table` through a fresh connection.
pub async fn count_rows(engine: &dyn QueryEngine, table: &str) -> u64 {
    let mut conn = engine.connect().await.expect("connect");
    let rows = conn
        .query(&format!("SELECT COUNT(*) AS n FROM {table}"))
        .await
        .expect("count");
    conn.close().await;
    rows.first_value("n").and_then(Value::as_u64).expect("count value")
}
