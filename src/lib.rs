//! SKINWATCH: cross-marketplace skin price monitor
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod tasks;
pub mod platforms;
pub mod strategy;
pub mod engine;
pub mod storage;
pub mod report;
pub mod dashboard;
