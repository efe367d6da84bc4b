//! Tool framework for advisor-rs
//!
//! Defines the capability seam both orchestrators share: a [`Tool`] is a
//! named data-fetch operation over a symbol that renders a textual report
//! (consumed by the reasoning loop and the heuristic parser) alongside the
//! structured fields (consumed by the deterministic pipeline). The
//! [`ToolRegistry`] resolves capabilities by name.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolOutput};
