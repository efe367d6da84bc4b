//! Analysis capabilities
//!
//! The four data-fetch operations both orchestrators share. Each renders a
//! Chinese-language report for the reasoning loop and carries the structured
//! payload for programmatic consumers.

pub mod news;
pub mod overview;
pub mod price;
pub mod technical;

pub use news::StockNewsTool;
pub use overview::CompanyInfoTool;
pub use price::StockPriceTool;
pub use technical::TechnicalIndicatorsTool;

use advisor_market::MarketData;
use advisor_tools::ToolRegistry;
use std::sync::Arc;

/// Build a registry holding all four capabilities over one market source
pub fn build_registry(market: Arc<dyn MarketData>) -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(StockPriceTool::new(Arc::clone(&market))));
    registry.register(Arc::new(StockNewsTool::new(Arc::clone(&market))));
    registry.register(Arc::new(TechnicalIndicatorsTool::new(Arc::clone(&market))));
    registry.register(Arc::new(CompanyInfoTool::new(market)));
    registry
}
