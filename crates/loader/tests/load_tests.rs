// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::{RecordingEngine, RecordingSource, Reply, count_rows, layout, parquet_part};
use engine::QueryEngine;
use loader::{DatasetLoader, FetchError, LoadError, PartFetcher, Statement};
use partstore::{HostStore, LocalStore, MemoryStore};
use std::sync::Arc;
use tempfile::tempdir;

const TABLE: &str = "aozora_combined";

fn loader(store: Arc<dyn LocalStore>, source: &RecordingSource, parts: usize) -> DatasetLoader {
    let fetcher = PartFetcher::new(layout(parts), store, Arc::new(source.clone()));
    DatasetLoader::new(fetcher, TABLE)
}

#[tokio::test]
async fn test_rows_of_all_parts_are_assembled() {
    let source = RecordingSource::with_parts(vec![
        parquet_part(0, 10),
        parquet_part(10, 5),
        parquet_part(15, 0),
    ]);
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 3);

    let summary = loader.load_all(&engine).await.expect("load");
    assert_eq!(summary.parts, 3);
    assert_eq!(summary.total_rows, 15);
    assert_eq!(summary.cache_hits, 0);
    assert_eq!(count_rows(&engine, TABLE).await, 15);

    engine.snapshot(|log| {
        assert_eq!(log.creates().len(), 1);
        assert_eq!(log.inserts().len(), 2);
        assert_eq!(
            log.statements[..3],
            [
                "CREATE TABLE aozora_combined AS SELECT * FROM \"part0\"",
                "INSERT INTO aozora_combined SELECT * FROM \"part1\"",
                "INSERT INTO aozora_combined SELECT * FROM \"part2\"",
            ]
        );
        assert_eq!(log.connects, 2);
        assert_eq!(log.closes, 2);
    });
}

#[tokio::test]
async fn test_parts_are_processed_in_ascending_order() {
    let parts: Vec<_> = (0..6).map(|i| parquet_part(i * 100, 3)).collect();
    let source = RecordingSource::with_parts(parts);
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 6);

    _ = loader.load_all(&engine).await.expect("load");

    assert_eq!(source.requests(), vec![0, 1, 2, 3, 4, 5]);
    engine.snapshot(|log| {
        assert_eq!(
            log.registered,
            vec!["part0", "part1", "part2", "part3", "part4", "part5"]
        );
        // One connection for the whole sequence
        assert_eq!(log.connects, 1);
        assert_eq!(log.closes, 1);
    });
}

#[tokio::test]
async fn test_missing_part_aborts_load() {
    let source = RecordingSource::with_parts(vec![
        parquet_part(0, 10),
        parquet_part(10, 5),
        parquet_part(15, 1),
    ]);
    source.set(1, Reply::Status("404 Not Found"));
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 3);

    let err = loader.load_all(&engine).await.expect_err("load must fail");
    match &err {
        LoadError::Fetch {
            index,
            source: FetchError::Status { status, .. },
        } => {
            assert_eq!(*index, 1);
            assert_eq!(status, "404 Not Found");
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
    assert_eq!(err.index(), Some(1));

    assert_eq!(source.requests(), vec![0, 1]);
    engine.snapshot(|log| {
        assert_eq!(log.creates().len(), 1);
        assert!(log.inserts().is_empty(), "no INSERT after the failed part");
        assert_eq!(log.connects, 1);
        assert_eq!(log.closes, 1);
    });
    assert_eq!(engine.inner.open_connections(), 0);
}

#[tokio::test]
async fn test_second_load_fails_and_keeps_first_data() {
    let source = RecordingSource::with_parts(vec![parquet_part(0, 4), parquet_part(4, 3)]);
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 2);

    let summary = loader.load_all(&engine).await.expect("first load");
    assert_eq!(summary.total_rows, 7);

    let err = loader.load_all(&engine).await.expect_err("second load");
    assert!(
        matches!(
            err,
            LoadError::Statement {
                index: 0,
                statement: Statement::Create,
                ..
            }
        ),
        "got {err:?}"
    );

    assert_eq!(count_rows(&engine, TABLE).await, 7);
    assert_eq!(engine.inner.open_connections(), 0);
}

#[tokio::test]
async fn test_undecodable_part_is_register_error() {
    let source = RecordingSource::with_parts(vec![
        parquet_part(0, 2),
        bytes::Bytes::from_static(b"<html>not found</html>"),
    ]);
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 2);

    let err = loader.load_all(&engine).await.expect_err("load must fail");
    assert!(matches!(err, LoadError::Register { index: 1, .. }), "got {err:?}");
    engine.snapshot(|log| assert_eq!(log.closes, 1));
}

#[tokio::test]
async fn test_second_session_loads_from_cache() {
    let dir = tempdir().expect("tempdir");
    let source = RecordingSource::with_parts(vec![
        parquet_part(0, 3),
        parquet_part(3, 3),
        parquet_part(6, 3),
    ]);

    let first = {
        let store = HostStore::open(dir.path()).await;
        let engine = RecordingEngine::default();
        loader(Arc::new(store), &source, 3)
            .load_all(&engine)
            .await
            .expect("first session")
    };
    assert_eq!(first.cache_hits, 0);

    let store = HostStore::open(dir.path()).await;
    let engine = RecordingEngine::default();
    let second = loader(Arc::new(store), &source, 3)
        .load_all(&engine)
        .await
        .expect("second session");

    assert_eq!(second.cache_hits, 3);
    assert_eq!(second.total_rows, 9);
    assert_eq!(source.requests(), vec![0, 1, 2], "second session stays offline");
}

#[tokio::test]
async fn test_single_part_dataset() {
    let source = RecordingSource::with_parts(vec![parquet_part(0, 4)]);
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 1);

    let summary = loader.load_all(&engine).await.expect("load");
    assert_eq!(summary.parts, 1);
    assert_eq!(summary.total_rows, 4);
    assert_eq!(source.requests(), vec![0]);

    engine.snapshot(|log| {
        assert_eq!(
            log.creates(),
            ["CREATE TABLE aozora_combined AS SELECT * FROM \"part0\""]
        );
        assert!(log.inserts().is_empty());
        assert_eq!(log.closes, 1);
    });
    assert_eq!(count_rows(&engine, TABLE).await, 4);
}

#[tokio::test]
async fn test_parts_are_unregistered_after_load() {
    let source = RecordingSource::with_parts(vec![parquet_part(0, 2), parquet_part(2, 3)]);
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 2);

    _ = loader.load_all(&engine).await.expect("load");
    engine.snapshot(|log| assert_eq!(log.unregistered, vec!["part0", "part1"]));

    let mut conn = engine.connect().await.expect("connect");
    for virtual_name in ["part0", "part1"] {
        let sql = format!("SELECT * FROM {}", engine.file_ref(virtual_name));
        assert!(conn.query(&sql).await.is_err(), "{virtual_name} still registered");
    }
    conn.close().await;
    assert_eq!(count_rows(&engine, TABLE).await, 5);
}

#[tokio::test]
async fn test_failed_statement_still_unregisters_part() {
    let source = RecordingSource::with_parts(vec![parquet_part(0, 2)]);
    let engine = RecordingEngine::default();
    let loader = loader(Arc::new(MemoryStore::new()), &source, 1);

    _ = loader.load_all(&engine).await.expect("first load");
    _ = loader.load_all(&engine).await.expect_err("second load");
    engine.snapshot(|log| assert_eq!(log.unregistered, vec!["part0", "part0"]));
}
