//! Strategy selection and the analysis service facade
//!
//! The orchestrator is chosen once at construction and fixed for the
//! process lifetime: the agentic strategy when a reasoning provider is
//! available, otherwise the deterministic pipeline, otherwise every
//! request fails fast.

use crate::agentic::{AgenticAnalyzer, ChatExchange};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pipeline::PipelineAnalyzer;
use crate::transcript::TranscriptLog;
use advisor_core::{AnalysisResult, Portfolio};
use advisor_llm::LLMProvider;
use advisor_market::MarketData;
use std::sync::Arc;
use tracing::{info, warn};

const UNAVAILABLE: &str = "no analysis strategy could be initialized";

/// The active orchestrator, selected once and never re-evaluated
pub enum Strategy {
    /// Reasoning-service-driven tool loop
    Agentic(AgenticAnalyzer),
    /// Deterministic stage pipeline
    Pipeline(PipelineAnalyzer),
    /// Neither orchestrator could be constructed
    Unavailable,
}

impl Strategy {
    /// Select the preferred strategy from the available backends
    ///
    /// The agentic orchestrator needs both a reasoning provider and market
    /// data; without a provider the pipeline takes over, and without
    /// market data nothing can run.
    pub fn select(
        provider: Option<Arc<dyn LLMProvider>>,
        market: Option<Arc<dyn MarketData>>,
        config: EngineConfig,
    ) -> Self {
        let Some(market) = market else {
            warn!("market data unavailable, analysis disabled");
            return Self::Unavailable;
        };

        match provider {
            Some(provider) => {
                info!(strategy = "agentic", "analysis strategy selected");
                Self::Agentic(AgenticAnalyzer::with_market(provider, market, config))
            }
            None => {
                warn!(
                    strategy = "pipeline",
                    "reasoning service unavailable, falling back to the pipeline"
                );
                let log = TranscriptLog::new(config.logs_dir);
                Self::Pipeline(PipelineAnalyzer::new(market, log))
            }
        }
    }

    /// Name of the active strategy, for logging and health reporting
    pub fn name(&self) -> &'static str {
        match self {
            Self::Agentic(_) => "agentic",
            Self::Pipeline(_) => "pipeline",
            Self::Unavailable => "none",
        }
    }
}

/// Facade over the selected analysis strategy
pub struct AdvisorService {
    strategy: Strategy,
}

impl AdvisorService {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// Name of the active strategy
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// True when analysis requests can be served
    pub fn is_available(&self) -> bool {
        !matches!(self.strategy, Strategy::Unavailable)
    }

    /// Run one full analysis with the active strategy
    pub async fn analyze(
        &self,
        symbol: &str,
        analysis_type: &str,
        portfolio: Option<Portfolio>,
    ) -> Result<AnalysisResult> {
        match &self.strategy {
            Strategy::Agentic(agent) => agent.analyze(symbol, analysis_type, portfolio).await,
            Strategy::Pipeline(pipeline) => {
                pipeline.analyze(symbol, analysis_type, portfolio).await
            }
            Strategy::Unavailable => {
                Err(EngineError::ServiceUnavailable(UNAVAILABLE.to_string()))
            }
        }
    }

    /// Answer a follow-up question about a symbol
    ///
    /// Chat rides on the agentic loop's conversation history; the
    /// pipeline has no conversational state to answer from.
    pub async fn chat(
        &self,
        symbol: &str,
        question: &str,
        portfolio: Option<Portfolio>,
    ) -> Result<ChatExchange> {
        match &self.strategy {
            Strategy::Agentic(agent) => agent.chat(symbol, question, portfolio).await,
            Strategy::Pipeline(_) => Err(EngineError::ServiceUnavailable(
                "chat requires the agentic strategy".to_string(),
            )),
            Strategy::Unavailable => {
                Err(EngineError::ServiceUnavailable(UNAVAILABLE.to_string()))
            }
        }
    }
}
