use chrono::{DateTime, Utc};

use crate::error::AnalysisError;

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Time-ordered window of bars for one instrument and one fetch.
///
/// Each analysis cycle owns a fresh series; everything downstream
/// (indicators, swing points, patterns, risk levels) is derived from it
/// and never mutates it.
#[derive(Debug, Clone)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series from already time-ordered bars. Rejects an unsorted
    /// window or duplicate timestamps rather than silently reordering.
    pub fn new(bars: Vec<Bar>) -> Result<Self, AnalysisError> {
        if bars.is_empty() {
            return Err(AnalysisError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(AnalysisError::DegenerateInput(format!(
                    "bars out of order at {}",
                    pair[1].timestamp
                )));
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> &Bar {
        &self.bars[index]
    }

    pub fn last(&self) -> &Bar {
        self.bars.last().expect("series is never empty")
    }

    pub fn last_close(&self) -> f64 {
        self.last().close
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar_at(minute: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn ordered_bars_accepted() {
        let series = BarSeries::new(vec![bar_at(0, 100.0), bar_at(1, 101.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_close(), 101.0);
    }

    #[test]
    fn duplicate_timestamps_rejected() {
        let result = BarSeries::new(vec![bar_at(0, 100.0), bar_at(0, 101.0)]);
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
    }

    #[test]
    fn out_of_order_rejected() {
        let result = BarSeries::new(vec![bar_at(5, 100.0), bar_at(1, 101.0)]);
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
    }

    #[test]
    fn empty_window_rejected() {
        assert!(matches!(
            BarSeries::new(vec![]),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }
}
