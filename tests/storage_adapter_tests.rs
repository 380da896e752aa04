mod test_data_gen;

use sortdb::sortdb_io::build_storage_from_config;
use sortdb::{SortConfig, Storage};
use test_data_gen::create_temp_dir;

#[test]
fn test_file_storage_builder_write_read() {
    let dir = create_temp_dir();
    let cfg = SortConfig {
        scratch_dir: dir.path().to_string_lossy().into_owned(),
        ..SortConfig::default()
    };

    let storage = build_storage_from_config(&cfg.storage_config()).expect("fs storage");

    let path = format!("{}/nested/segment.bin", cfg.scratch_dir);
    storage.write(&path, b"hello ").expect("write");
    assert_eq!(storage.append(&path, b"world").expect("append"), 6);
    let roundtrip = storage.read_range(&path, 0, 64).expect("read");
    assert_eq!(roundtrip, b"hello world");
    assert_eq!(storage.list(&cfg.scratch_dir).unwrap(), vec![path.clone()]);

    let moved = format!("{}/moved.bin", cfg.scratch_dir);
    storage.rename(&path, &moved).expect("rename");
    assert!(!storage.exists(&path));
    assert_eq!(storage.size(&moved).unwrap(), 11);
}

#[test]
fn test_memory_storage_from_uri() {
    let cfg = SortConfig {
        storage_uri: Some("memory://".into()),
        ..SortConfig::default()
    };
    let storage = build_storage_from_config(&cfg.storage_config()).expect("memory storage");
    storage.write("a/b", b"xyz").unwrap();
    assert!(storage.exists("a/b"));
    assert!(!std::path::Path::new("a/b").exists());
}

#[test]
fn test_invalid_scheme_errors() {
    let cfg = SortConfig {
        storage_uri: Some("ftp://example.com/spill".into()),
        ..SortConfig::default()
    };
    let err = build_storage_from_config(&cfg.storage_config())
        .err()
        .expect("should fail");
    assert!(err.to_string().contains("unsupported storage scheme"));
}

#[test]
fn test_configure_from_json_and_serde_round_trip() {
    let (cfg, storage) = sortdb::configure(Some(
        r#"{"run_length_pages": 4, "page_size": 4096, "storage_uri": "memory://"}"#,
    ))
    .expect("configure");
    assert_eq!(cfg.run_length_pages, 4);
    assert_eq!(cfg.pipe_capacity, SortConfig::default().pipe_capacity);
    storage.write("x", b"1").unwrap();

    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(SortConfig::from_json_str(&json).unwrap(), cfg);

    let err = sortdb::configure(Some(r#"{"page_size": 8}"#)).err().unwrap();
    assert!(matches!(err, sortdb::OpError::Config(_)));
}
