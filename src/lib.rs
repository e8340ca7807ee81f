//! Fortuva betting engine.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod chain;
pub mod codec;
pub mod config;
pub mod engine;
pub mod strategy;
pub mod types;
