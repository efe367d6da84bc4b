//! Shared utilities for advisor-rs
//!
//! Common functionality used across the advisor-rs workspace, currently the
//! tracing/logging setup shared by the server and CLI entry points.

pub mod logging;

pub use logging::init_tracing;
