//! Structural pattern detectors
//!
//! Four independent detectors over one bar window: break of structure,
//! market structure shift, fair value gap and order block. Each is a pure
//! function of the window (plus swing points where noted) and returns an
//! ordered list of signals; an empty list is a valid no-pattern outcome.

use serde::Serialize;

pub mod bos;
pub mod fvg;
pub mod mss;
pub mod order_block;

pub use bos::BosDetector;
pub use fvg::FvgDetector;
pub use mss::MssDetector;
pub use order_block::OrderBlockDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Pattern kind with its kind-specific price levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PatternKind {
    /// Continuation: close beyond the latest swing extreme.
    Bos { broken_level: f64 },
    /// Reversal: close beyond the opposite extreme after a directional run.
    Mss { broken_level: f64 },
    /// 3-bar imbalance between the first bar and the third.
    Fvg { top: f64, bottom: f64, size: f64 },
    /// Last opposite-colored candle before a swing point.
    OrderBlock { top: f64, bottom: f64 },
}

impl PatternKind {
    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::Bos { .. } => "BOS",
            PatternKind::Mss { .. } => "MSS",
            PatternKind::Fvg { .. } => "FVG",
            PatternKind::OrderBlock { .. } => "ORDER_BLOCK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSignal {
    pub kind: PatternKind,
    pub direction: Direction,
    /// In [0, 1]; detectors clamp before emitting.
    pub confidence: f64,
    /// Bar index the pattern anchors to: the broken swing for BOS/MSS, the
    /// third bar of a gap, the zone candle of an order block.
    pub source_index: usize,
}

impl PatternSignal {
    pub fn new(
        kind: PatternKind,
        direction: Direction,
        confidence: f64,
        source_index: usize,
    ) -> Self {
        Self {
            kind,
            direction,
            confidence: confidence.clamp(0.0, 1.0),
            source_index,
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::bars::{Bar, BarSeries};
    use chrono::{Duration, TimeZone, Utc};

    /// Bars from (open, high, low, close) tuples, 15 minutes apart.
    pub fn series_from_ohlc(rows: &[(f64, f64, f64, f64)]) -> BarSeries {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, (o, h, l, c))| Bar {
                timestamp: start + Duration::minutes(15 * i as i64),
                open: *o,
                high: *h,
                low: *l,
                close: *c,
                volume: 1.0,
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    /// Flat-bodied bars where high = close + spread and low = close - spread.
    pub fn series_from_closes(closes: &[f64], spread: f64) -> BarSeries {
        let rows: Vec<(f64, f64, f64, f64)> = closes
            .iter()
            .map(|c| (*c, c + spread, c - spread, *c))
            .collect();
        series_from_ohlc(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped_on_construction() {
        let signal = PatternSignal::new(
            PatternKind::Bos { broken_level: 1.0 },
            Direction::Buy,
            1.7,
            0,
        );
        assert_eq!(signal.confidence, 1.0);

        let signal = PatternSignal::new(
            PatternKind::Mss { broken_level: 1.0 },
            Direction::Sell,
            -0.2,
            0,
        );
        assert_eq!(signal.confidence, 0.0);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(PatternKind::Bos { broken_level: 0.0 }.label(), "BOS");
        assert_eq!(
            PatternKind::Fvg {
                top: 0.0,
                bottom: 0.0,
                size: 0.0
            }
            .label(),
            "FVG"
        );
    }
}
