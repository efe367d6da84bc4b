//! Local indicator computation from daily closes
//!
//! Fallback for when the provider's indicator endpoints return nothing
//! (quota exhausted, thin symbols). Computes the same RSI(14),
//! MACD(12,26,9), and SMA(50) the technical capability reports.

use crate::error::{MarketError, Result};
use crate::types::{DailyBar, IndicatorBundle, MacdTriple};
use ta::Next;
use ta::indicators::{
    MovingAverageConvergenceDivergence, RelativeStrengthIndex, SimpleMovingAverage,
};

const RSI_PERIOD: usize = 14;
const SMA_PERIOD: usize = 50;

/// Compute the indicator bundle from daily bars (newest first)
pub fn compute_bundle(bars: &[DailyBar]) -> Result<IndicatorBundle> {
    if bars.is_empty() {
        return Err(MarketError::IndicatorError(
            "no daily history to compute indicators from".to_string(),
        ));
    }

    // Indicators consume the series oldest first
    let closes: Vec<f64> = bars.iter().rev().map(|bar| bar.close).collect();

    let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD)
        .map_err(|e| MarketError::IndicatorError(e.to_string()))?;
    let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9)
        .map_err(|e| MarketError::IndicatorError(e.to_string()))?;
    let mut sma = SimpleMovingAverage::new(SMA_PERIOD)
        .map_err(|e| MarketError::IndicatorError(e.to_string()))?;

    let mut last_rsi = 0.0;
    let mut last_macd = MacdTriple {
        macd: 0.0,
        signal: 0.0,
        histogram: 0.0,
    };
    let mut last_sma = 0.0;

    for &close in &closes {
        last_rsi = rsi.next(close);
        let output = macd.next(close);
        last_macd = MacdTriple {
            macd: output.macd,
            signal: output.signal,
            histogram: output.histogram,
        };
        last_sma = sma.next(close);
    }

    Ok(IndicatorBundle {
        rsi: Some(last_rsi),
        macd: Some(last_macd),
        sma: Some(last_sma),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars_from_closes_ascending(closes: &[f64]) -> Vec<DailyBar> {
        // Build newest-first bars from an oldest-first close series
        closes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &close)| DailyBar {
                date: format!("2024-01-{:02}", i + 1),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn test_empty_history_is_an_error() {
        assert!(compute_bundle(&[]).is_err());
    }

    #[test]
    fn test_rising_series_reads_bullish() {
        let closes: Vec<f64> = (1..=60).map(f64::from).collect();
        let bars = bars_from_closes_ascending(&closes);

        let bundle = compute_bundle(&bars).unwrap();
        let rsi = bundle.rsi.unwrap();
        let macd = bundle.macd.unwrap();
        let sma = bundle.sma.unwrap();

        // Strictly rising closes: overbought RSI, positive MACD histogram,
        // SMA lagging below the last close
        assert!(rsi > 70.0, "rsi was {rsi}");
        assert!(macd.histogram > 0.0, "histogram was {}", macd.histogram);
        assert!(sma < 60.0);
        assert!(sma > 0.0);
    }

    #[test]
    fn test_falling_series_reads_bearish() {
        let closes: Vec<f64> = (1..=60).rev().map(f64::from).collect();
        let bars = bars_from_closes_ascending(&closes);

        let bundle = compute_bundle(&bars).unwrap();
        assert!(bundle.rsi.unwrap() < 30.0);
        assert!(bundle.macd.unwrap().histogram < 0.0);
    }
}
