//! Query execution for athena-query.
//!
//! The executor drives one query through submission, polling, and result
//! retrieval; `types` holds the result shape shared with the formatters.

pub mod executor;
pub mod types;

pub use executor::{QueryExecutor, QueryOutcome, QueryRequest};
pub use types::{Column, QueryResult, Row};
