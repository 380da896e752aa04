use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sortdb::sortdb_io::MemoryStorage;
use sortdb::{
    DataType, ExternalSort, Field, OrderMaker, Pipe, Record, Scalar, Schema, SortConfig, SortInfo,
    SortedFile, Storage,
};

fn make_records(rows: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..rows)
        .map(|i| {
            Record::new(vec![
                Scalar::Int(rng.gen_range(0..1_000_000)),
                Scalar::Str(format!("customer-{i}")),
                Scalar::Double(rng.gen::<f64>() * 1000.0),
            ])
        })
        .collect()
}

fn order() -> OrderMaker {
    let schema = Schema::new(vec![
        Field::new("key", DataType::Int),
        Field::new("name", DataType::String),
        Field::new("balance", DataType::Double),
    ]);
    OrderMaker::from_names(&schema, &["key"]).unwrap()
}

fn config() -> SortConfig {
    SortConfig {
        run_length_pages: 4,
        page_size: 4096,
        pipe_capacity: 256,
        scratch_dir: "bench-scratch".into(),
        storage_uri: None,
    }
}

fn run_sort(records: &[Record], cfg: &SortConfig) -> usize {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let input = Arc::new(Pipe::with_capacity(cfg.pipe_capacity));
    let output = Arc::new(Pipe::with_capacity(cfg.pipe_capacity));
    let sort = ExternalSort::start(
        Arc::clone(&input),
        Arc::clone(&output),
        order(),
        cfg.run_length_pages,
        storage,
        cfg,
    )
    .unwrap();

    let batch = records.to_vec();
    let producer = thread::spawn(move || {
        for r in batch {
            input.insert(r).unwrap();
        }
        input.shut_down();
    });
    let n = output.drain().count();
    producer.join().unwrap();
    sort.finish().unwrap();
    n
}

fn bench_external_sort(c: &mut Criterion) {
    let cfg = config();
    let mut group = c.benchmark_group("external_sort");
    for rows in [1_000usize, 10_000, 50_000] {
        let records = make_records(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &records, |b, recs| {
            b.iter(|| run_sort(recs, &cfg))
        });
    }
    group.finish();
}

fn bench_sorted_file_merge(c: &mut Criterion) {
    let cfg = config();
    let base = make_records(20_000);
    let delta = make_records(2_000);
    c.bench_function("sorted_file_incremental_merge", |b| {
        b.iter(|| {
            let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
            let info = SortInfo::from_config(order(), &cfg);
            let mut file = SortedFile::create(storage, "bench.bin", info, &cfg).unwrap();
            for r in &base {
                file.add(r.clone()).unwrap();
            }
            file.close().unwrap();
            for r in &delta {
                file.add(r.clone()).unwrap();
            }
            file.close().unwrap();
            file.page_count()
        })
    });
}

criterion_group!(sorting, bench_external_sort, bench_sorted_file_merge);
criterion_main!(sorting);
