//! athena-query - Run batches of SQL queries against AWS Athena.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
pub mod remote;
pub mod retry;
pub mod runner;
pub mod web;
