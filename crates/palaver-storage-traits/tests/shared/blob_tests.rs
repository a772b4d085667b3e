//! Blob store test functions

use palaver_storage_traits::blob::CHAT_FILES_PREFIX;
use palaver_storage_traits::{BlobPath, BlobStore};

/// Uploads return distinct download links per object name
pub fn test_upload_returns_link<S>(store: S)
where
    S: BlobStore,
{
    let a = BlobPath::new(CHAT_FILES_PREFIX, "1_a.txt").unwrap();
    let b = BlobPath::new(CHAT_FILES_PREFIX, "1_b.txt").unwrap();

    let url_a = store.upload(&a, b"a".to_vec(), "text/plain").unwrap();
    let url_b = store.upload(&b, b"b".to_vec(), "text/plain").unwrap();

    assert!(url_a.ends_with("chat_files/1_a.txt"));
    assert_ne!(url_a, url_b);

    // re-uploading under the same name keeps the same link
    let again = store.upload(&a, b"a2".to_vec(), "text/plain").unwrap();
    assert_eq!(again, url_a);
}
