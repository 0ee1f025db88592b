//! Fair value gap: a 3-bar imbalance where the first and third bar do not
//! overlap. Gap size must strictly exceed the asset-class threshold;
//! confidence grows with the gap relative to that threshold, capped at 0.9.

use crate::bars::BarSeries;
use crate::patterns::{Direction, PatternKind, PatternSignal};

const FVG_BASE_CONFIDENCE: f64 = 0.6;
const FVG_CONFIDENCE_SLOPE: f64 = 0.1;
const FVG_MAX_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
pub struct FvgDetector {
    /// Minimum gap size (strict) for the instrument's asset class.
    threshold: f64,
    /// Only this many of the most recent gaps are retained.
    keep_last: usize,
}

impl FvgDetector {
    pub fn new(threshold: f64, keep_last: usize) -> Self {
        Self {
            threshold,
            keep_last,
        }
    }

    fn confidence(&self, gap: f64) -> f64 {
        let scaled = FVG_BASE_CONFIDENCE + FVG_CONFIDENCE_SLOPE * (gap / self.threshold);
        scaled.min(FVG_MAX_CONFIDENCE)
    }

    pub fn detect(&self, series: &BarSeries) -> Vec<PatternSignal> {
        let bars = series.bars();
        let mut signals = Vec::new();

        for i in 2..bars.len() {
            let first = &bars[i - 2];
            let third = &bars[i];

            // Bullish: first bar's high below third bar's low.
            if first.high < third.low {
                let gap = third.low - first.high;
                if gap > self.threshold {
                    signals.push(PatternSignal::new(
                        PatternKind::Fvg {
                            top: third.low,
                            bottom: first.high,
                            size: gap,
                        },
                        Direction::Buy,
                        self.confidence(gap),
                        i,
                    ));
                }
            }

            // Bearish: first bar's low above third bar's high.
            if first.low > third.high {
                let gap = first.low - third.high;
                if gap > self.threshold {
                    signals.push(PatternSignal::new(
                        PatternKind::Fvg {
                            top: first.low,
                            bottom: third.high,
                            size: gap,
                        },
                        Direction::Sell,
                        self.confidence(gap),
                        i,
                    ));
                }
            }
        }

        if signals.len() > self.keep_last {
            signals.drain(..signals.len() - self.keep_last);
        }
        signals
    }
}
