//! Paged file layout tests over both storage backends.

mod test_data_gen;

use std::sync::Arc;

use sortdb::sortdb_io::FsStorage;
use sortdb::sortdb_mem::{Error as MemError, Page, PagedFile};
use sortdb::Storage;
use test_data_gen::{create_temp_dir, memory_storage, record};

fn page_of(keys: std::ops::Range<i32>, page_size: usize) -> Page {
    let mut page = Page::new(page_size);
    for k in keys {
        page.try_append(record(k)).expect("fits");
    }
    page
}

fn exercise(storage: Arc<dyn Storage>, path: &str) {
    let mut file = PagedFile::create(Arc::clone(&storage), path, 512).unwrap();
    assert_eq!(file.page_count(), 0);
    // page 0 holds the file header
    assert_eq!(storage.size(path).unwrap(), 512);

    assert_eq!(file.append_page(&page_of(0..3, 512)).unwrap(), 0);
    assert_eq!(file.append_page(&page_of(3..5, 512)).unwrap(), 1);
    assert_eq!(storage.size(path).unwrap(), 3 * 512);

    let reopened = PagedFile::open(Arc::clone(&storage), path).unwrap();
    assert_eq!(reopened.page_size(), 512);
    assert_eq!(reopened.page_count(), 2);
    let second = reopened.get_page(1).unwrap();
    assert_eq!(second.iter().cloned().collect::<Vec<_>>(), vec![record(3), record(4)]);
    assert!(matches!(
        reopened.get_page(2),
        Err(MemError::PageOutOfRange { index: 2, len: 2 })
    ));

    reopened.delete().unwrap();
    assert!(!storage.exists(path));
}

#[test]
fn test_paged_file_in_memory() {
    let (_mem, storage) = memory_storage();
    exercise(storage, "pages.bin");
}

#[test]
fn test_paged_file_on_disk() {
    let dir = create_temp_dir();
    let path = dir.path().join("pages.bin");
    exercise(Arc::new(FsStorage::new()), path.to_str().unwrap());
}

#[test]
fn test_open_rejects_foreign_files() {
    let (mem, storage) = memory_storage();
    mem.write("junk", &[7u8; 512]).unwrap();
    assert!(matches!(
        PagedFile::open(Arc::clone(&storage), "junk"),
        Err(MemError::Codec(_))
    ));
    assert!(matches!(
        PagedFile::open(storage, "absent"),
        Err(MemError::NotFound(_))
    ));
}

#[test]
fn test_corrupt_page_is_detected() {
    let (mem, storage) = memory_storage();
    let mut file = PagedFile::create(Arc::clone(&storage), "c.bin", 256).unwrap();
    file.append_page(&page_of(0..2, 256)).unwrap();

    let mut bytes = mem.read_range("c.bin", 0, 512).unwrap();
    bytes[256 + 60] ^= 0x55;
    mem.write("c.bin", &bytes).unwrap();

    assert!(matches!(file.get_page(0), Err(MemError::ChecksumMismatch(0))));
}
