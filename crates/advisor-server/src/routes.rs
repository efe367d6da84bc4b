//! HTTP routes and request handlers
//!
//! The analysis and chat endpoints front the engine's strategy facade;
//! the `/api/stocks` endpoints pass market data straight through. Error
//! responses carry a `detail` field: 503 when no strategy is available,
//! 500 with a reason for run-level failures.

use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use advisor_core::{AnalysisResult, Portfolio};
use advisor_engine::{ChatExchange, EngineError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

const API_VERSION: &str = "1.0.0";

/// Body of `POST /api/analysis/{symbol}`
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default = "default_analysis_type")]
    pub analysis_type: String,

    /// Accepted for interface compatibility; the analysis window is
    /// currently fixed by the data source
    #[serde(default = "default_time_period")]
    pub time_period: String,

    #[serde(default)]
    pub portfolio: Option<Portfolio>,
}

/// Body of `POST /api/chat/{symbol}`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,

    #[serde(default)]
    pub portfolio: Option<Portfolio>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_time_period")]
    pub period: String,
}

#[derive(Debug, Deserialize)]
pub struct IndicatorQuery {
    #[serde(default = "default_indicator")]
    pub indicator: String,
}

fn default_analysis_type() -> String {
    "comprehensive".to_string()
}

fn default_time_period() -> String {
    "1m".to_string()
}

fn default_indicator() -> String {
    "SMA".to_string()
}

/// Computation period passed to the indicator endpoint
const INDICATOR_PERIOD: usize = 20;

#[derive(Debug, Serialize)]
struct AnalysisResponse {
    #[serde(flatten)]
    result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<Value>,
}

#[derive(Debug, Serialize)]
struct IndicatorValue {
    indicator_type: String,
    value: f64,
    timestamp: String,
}

/// Register all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/api/stocks/{symbol}/quote").route(web::get().to(quote)))
        .service(web::resource("/api/stocks/{symbol}/history").route(web::get().to(history)))
        .service(web::resource("/api/stocks/{symbol}/indicators").route(web::get().to(indicators)))
        .service(web::resource("/api/analysis/{symbol}").route(web::post().to(analyze)))
        .service(web::resource("/api/chat/{symbol}").route(web::post().to(chat)));
}

async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "股票分析API服务",
        "version": API_VERSION,
        "timestamp": Utc::now(),
    }))
}

async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "strategy": state.service.strategy_name(),
        "timestamp": Utc::now(),
    }))
}

async fn quote(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let symbol = path.into_inner().to_uppercase();
    info!(%symbol, "quote requested");

    let Some(market) = state.market.as_ref() else {
        return market_unavailable();
    };

    match market.quote(&symbol).await {
        Ok(quote) => HttpResponse::Ok().json(quote),
        Err(e) => {
            error!(%symbol, error = %e, "quote fetch failed");
            failure(&format!("获取股票报价失败: {e}"))
        }
    }
}

async fn history(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> HttpResponse {
    let symbol = path.into_inner().to_uppercase();
    info!(%symbol, period = %query.period, "history requested");

    let Some(market) = state.market.as_ref() else {
        return market_unavailable();
    };

    match market.daily_history(&symbol).await {
        Ok(bars) => HttpResponse::Ok().json(bars),
        Err(e) => {
            // degrade to an empty series, charts tolerate missing data
            warn!(%symbol, error = %e, "history fetch failed");
            HttpResponse::Ok().json(Vec::<Value>::new())
        }
    }
}

async fn indicators(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<IndicatorQuery>,
) -> HttpResponse {
    let symbol = path.into_inner().to_uppercase();
    info!(%symbol, indicator = %query.indicator, "indicator series requested");

    let Some(market) = state.market.as_ref() else {
        return market_unavailable();
    };

    match market
        .indicator_series(&symbol, &query.indicator, INDICATOR_PERIOD)
        .await
    {
        Ok(points) => {
            let values: Vec<IndicatorValue> = points
                .into_iter()
                .map(|point| IndicatorValue {
                    indicator_type: query.indicator.clone(),
                    value: point.value,
                    timestamp: point.date,
                })
                .collect();
            HttpResponse::Ok().json(values)
        }
        Err(e) => {
            error!(%symbol, error = %e, "indicator fetch failed");
            failure(&format!("获取技术指标失败: {e}"))
        }
    }
}

async fn analyze(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<AnalysisRequest>,
) -> HttpResponse {
    let symbol = path.into_inner().to_uppercase();
    let request = request.into_inner();
    info!(%symbol, analysis_type = %request.analysis_type, "analysis requested");

    match state
        .service
        .analyze(&symbol, &request.analysis_type, request.portfolio)
        .await
    {
        Ok(result) => {
            let debug = state.debug.then(|| result.detailed_analysis.clone()).flatten();
            HttpResponse::Ok().json(AnalysisResponse { result, debug })
        }
        Err(EngineError::ServiceUnavailable(_)) => service_unavailable(),
        Err(e) => {
            error!(%symbol, error = %e, "analysis failed");
            failure(&format!("分析失败: {e}"))
        }
    }
}

async fn chat(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<ChatRequest>,
) -> HttpResponse {
    let symbol = path.into_inner().to_uppercase();
    let request = request.into_inner();
    info!(%symbol, "chat requested");

    match state
        .service
        .chat(&symbol, &request.question, request.portfolio)
        .await
    {
        Ok(ChatExchange { reply, steps }) => {
            let debug = state.debug.then(|| {
                json!({
                    "content": reply.content,
                    "steps": steps,
                    "timestamp": reply.timestamp,
                })
            });
            HttpResponse::Ok().json(ChatResponse {
                content: reply.content,
                timestamp: reply.timestamp,
                debug,
            })
        }
        Err(EngineError::ServiceUnavailable(_)) => service_unavailable(),
        Err(e) => {
            error!(%symbol, error = %e, "chat failed");
            failure(&format!("对话失败: {e}"))
        }
    }
}

fn service_unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(json!({ "detail": "分析服务不可用" }))
}

fn market_unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(json!({ "detail": "行情服务不可用" }))
}

fn failure(detail: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "detail": detail }))
}
