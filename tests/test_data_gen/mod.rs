//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sortdb::sortdb_io::MemoryStorage;
use sortdb::{DataType, Field, OrderMaker, Record, Scalar, Schema, SortConfig, Storage};

/// Fresh temp directory, removed when dropped.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("sortdb-tests-")
        .tempdir()
        .expect("create temp dir")
}

pub fn memory_storage() -> (MemoryStorage, Arc<dyn Storage>) {
    let mem = MemoryStorage::new();
    (mem.clone(), Arc::new(mem))
}

/// (key Int, name String, score Double)
pub fn test_schema() -> Schema {
    Schema::new(vec![
        Field::new("key", DataType::Int),
        Field::new("name", DataType::String),
        Field::new("score", DataType::Double),
    ])
}

pub fn key_order() -> OrderMaker {
    OrderMaker::from_names(&test_schema(), &["key"]).expect("key order")
}

pub fn record(key: i32) -> Record {
    Record::new(vec![
        Scalar::Int(key),
        Scalar::Str(format!("name-{key}")),
        Scalar::Double(f64::from(key) / 2.0),
    ])
}

/// Seeded random records; keys are drawn from `0..key_range` so duplicates occur.
pub fn generate_random_records(n: usize, key_range: i32, seed: u64) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            Record::new(vec![
                Scalar::Int(rng.gen_range(0..key_range)),
                Scalar::Str(format!("row-{i}")),
                Scalar::Double(rng.gen::<f64>()),
            ])
        })
        .collect()
}

pub fn key_of(r: &Record) -> i32 {
    match r.get(0) {
        Some(Scalar::Int(k)) => *k,
        other => panic!("record has no Int key: {other:?}"),
    }
}

pub fn keys(records: &[Record]) -> Vec<i32> {
    records.iter().map(key_of).collect()
}

pub fn verify_sorted(records: &[Record]) -> bool {
    records.windows(2).all(|w| key_of(&w[0]) <= key_of(&w[1]))
}

/// Small pages so that tests exercise many pages and runs.
pub fn small_page_config(scratch_dir: &str) -> SortConfig {
    SortConfig {
        run_length_pages: 2,
        page_size: 256,
        pipe_capacity: 16,
        scratch_dir: scratch_dir.to_string(),
        storage_uri: None,
    }
}
