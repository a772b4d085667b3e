//! Store-contract test functions shared by every adapter

pub mod blob_tests;
pub mod document_tests;

use palaver_storage_traits::StorePath;

/// Parses a path, panicking on invalid input
pub fn path(p: &str) -> StorePath {
    StorePath::parse(p).expect("valid test path")
}
