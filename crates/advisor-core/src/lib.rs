//! Core types for advisor-rs
//!
//! This crate defines the domain model shared across the advisor-rs workspace:
//! the recommendation/result types produced by both analysis strategies, the
//! caller-supplied portfolio model, conversation turns, and the top-level
//! error type.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    AnalysisResult, ChatReply, ConversationTurn, KeyMetrics, Portfolio, Position, Recommendation,
    SentimentLabel, TraceStep, TrendSignal, TurnRole,
};
