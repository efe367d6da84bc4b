//! Weighted-sum scoring and recommendation classification
//!
//! Pure functions over the signals the pipeline stages produce. Technical
//! trend contributes ±1, news sentiment its raw mean score, and a held
//! position ±0.5 once unrealized P&L crosses ±10%.

use advisor_core::{Recommendation, TrendSignal};
use serde::{Deserialize, Serialize};

const BUY_THRESHOLD: f64 = 0.5;
const SELL_THRESHOLD: f64 = -0.5;
const MAX_CONFIDENCE: f64 = 0.9;
const HOLD_CONFIDENCE: f64 = 0.6;
const PNL_TRIM_THRESHOLD: f64 = 10.0;
const PNL_ACCUMULATE_THRESHOLD: f64 = -10.0;

/// Per-dimension score breakdown carried into detailed_analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub technical: f64,
    pub sentiment: f64,
    pub portfolio: f64,
    pub total: f64,
}

impl Scores {
    /// Combine the three dimension scores
    pub fn new(technical: f64, sentiment: f64, portfolio: f64) -> Self {
        Self {
            technical,
            sentiment,
            portfolio,
            total: technical + sentiment + portfolio,
        }
    }
}

/// Technical dimension: +1 bullish, -1 bearish, 0 otherwise
pub fn score_technical(trend: TrendSignal) -> f64 {
    match trend {
        TrendSignal::Bullish => 1.0,
        TrendSignal::Bearish => -1.0,
        TrendSignal::Unknown => 0.0,
    }
}

/// Portfolio dimension from unrealized P&L percentage
///
/// Above +10% suggests trimming (-0.5), below -10% suggests accumulating
/// (+0.5). `None` means P&L could not be computed (no position, or the
/// current price was a degraded placeholder) and contributes nothing.
pub fn score_portfolio(pnl_percentage: Option<f64>) -> f64 {
    match pnl_percentage {
        Some(pnl) if pnl > PNL_TRIM_THRESHOLD => -0.5,
        Some(pnl) if pnl < PNL_ACCUMULATE_THRESHOLD => 0.5,
        _ => 0.0,
    }
}

/// Map a total score to a recommendation and its confidence
///
/// Totals of exactly ±0.5 stay HOLD; confidence for BUY/SELL is the total's
/// magnitude capped at 0.9, HOLD is fixed at 0.6.
pub fn classify(total: f64) -> (Recommendation, f64) {
    if total > BUY_THRESHOLD {
        (Recommendation::Buy, total.abs().min(MAX_CONFIDENCE))
    } else if total < SELL_THRESHOLD {
        (Recommendation::Sell, total.abs().min(MAX_CONFIDENCE))
    } else {
        (Recommendation::Hold, HOLD_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_scores() {
        assert!((score_technical(TrendSignal::Bullish) - 1.0).abs() < f64::EPSILON);
        assert!((score_technical(TrendSignal::Bearish) + 1.0).abs() < f64::EPSILON);
        assert!(score_technical(TrendSignal::Unknown).abs() < f64::EPSILON);
    }

    #[test]
    fn test_portfolio_score_bands() {
        assert!((score_portfolio(Some(25.0)) + 0.5).abs() < f64::EPSILON);
        assert!((score_portfolio(Some(-15.0)) - 0.5).abs() < f64::EPSILON);
        assert!(score_portfolio(Some(5.0)).abs() < f64::EPSILON);
        assert!(score_portfolio(Some(10.0)).abs() < f64::EPSILON);
        assert!(score_portfolio(Some(-10.0)).abs() < f64::EPSILON);
        assert!(score_portfolio(None).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify_thresholds_are_exclusive() {
        let (rec, confidence) = classify(0.5);
        assert_eq!(rec, Recommendation::Hold);
        assert!((confidence - 0.6).abs() < f64::EPSILON);

        let (rec, _) = classify(-0.5);
        assert_eq!(rec, Recommendation::Hold);

        let (rec, confidence) = classify(0.51);
        assert_eq!(rec, Recommendation::Buy);
        assert!((confidence - 0.51).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify_caps_confidence() {
        let (rec, confidence) = classify(1.8);
        assert_eq!(rec, Recommendation::Buy);
        assert!((confidence - 0.9).abs() < f64::EPSILON);

        let (rec, confidence) = classify(-1.0);
        assert_eq!(rec, Recommendation::Sell);
        assert!((confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scores_total() {
        let scores = Scores::new(1.0, 0.2, -0.5);
        assert!((scores.total - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_trimming_scenario() {
        // Bullish trend, mildly positive news, profitable position
        let scores = Scores::new(
            score_technical(TrendSignal::Bullish),
            0.2,
            score_portfolio(Some(25.0)),
        );
        let (rec, confidence) = classify(scores.total);
        assert_eq!(rec, Recommendation::Buy);
        assert!((confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_bearish_no_position_scenario() {
        let scores = Scores::new(
            score_technical(TrendSignal::Bearish),
            0.0,
            score_portfolio(None),
        );
        let (rec, confidence) = classify(scores.total);
        assert_eq!(rec, Recommendation::Sell);
        assert!((confidence - 0.9).abs() < f64::EPSILON);
    }
}
