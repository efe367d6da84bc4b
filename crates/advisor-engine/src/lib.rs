//! Analysis engine for advisor-rs
//!
//! This crate turns market data into a structured BUY/SELL/HOLD
//! recommendation two ways: a deterministic stage pipeline
//! ([`PipelineAnalyzer`]) that scores fixed formulas, and a reasoning-loop
//! orchestrator ([`AgenticAnalyzer`]) that lets a language model steer the
//! capability tools and parses its free-form answer back into the same
//! result shape. [`Strategy::select`] picks one at startup;
//! [`AdvisorService`] is the facade the outer layers call.

pub mod agentic;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod history;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod service;
pub mod state;
pub mod transcript;

// Re-export key types
pub use agentic::{AgenticAnalyzer, ChatExchange};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use history::HistoryStore;
pub use parser::{ParsedResult, ResultParser};
pub use pipeline::PipelineAnalyzer;
pub use service::{AdvisorService, Strategy};
pub use transcript::{RunRecord, TranscriptLog};
