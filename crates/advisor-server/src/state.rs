//! Shared application state

use crate::config::ServerConfig;
use advisor_engine::{AdvisorService, EngineConfig, Strategy};
use advisor_llm::LLMProvider;
use advisor_llm::providers::OpenAIProvider;
use advisor_market::{AlphaVantageClient, MarketData};
use std::sync::Arc;
use tracing::warn;

/// State shared by all request handlers
pub struct AppState {
    /// The selected analysis strategy behind its facade
    pub service: AdvisorService,

    /// Direct market data access for the passthrough endpoints; `None`
    /// when the client could not be constructed
    pub market: Option<Arc<dyn MarketData>>,

    /// Whether responses carry the `debug` payload
    pub debug: bool,
}

impl AppState {
    /// Wire the full state from the environment
    ///
    /// A missing market key disables both analysis and the passthrough
    /// endpoints; a missing reasoning key only drops the agentic strategy.
    pub fn from_env(config: &ServerConfig) -> Self {
        let market: Option<Arc<dyn MarketData>> = match AlphaVantageClient::from_env() {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "market data client unavailable");
                None
            }
        };

        let provider: Option<Arc<dyn LLMProvider>> = match OpenAIProvider::from_env() {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                warn!(error = %e, "reasoning provider unavailable");
                None
            }
        };

        let strategy = Strategy::select(provider, market.clone(), EngineConfig::from_env());

        Self {
            service: AdvisorService::new(strategy),
            market,
            debug: config.analysis_debug,
        }
    }
}
