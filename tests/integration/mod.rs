//! Integration tests for athena-query.
//!
//! Remote calls go to `MockQueryService` / `MockObjectStore`; cache records
//! and output files are written to temporary directories.

pub mod batch_test;
pub mod cached_execution_test;
