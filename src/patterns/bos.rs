//! Break of structure: the latest close pushing past the most recent
//! swing extreme, read as trend continuation.

use crate::bars::BarSeries;
use crate::patterns::{Direction, PatternKind, PatternSignal};
use crate::structure::SwingPoints;

const BOS_CONFIDENCE: f64 = 0.75;

/// Requires at least two swing extremes on the broken side so a single
/// early spike cannot read as established structure.
const MIN_SWINGS: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct BosDetector;

impl BosDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, series: &BarSeries, swings: &SwingPoints) -> Vec<PatternSignal> {
        let mut signals = Vec::new();
        let close = series.last_close();

        if swings.highs.len() >= MIN_SWINGS {
            let latest_high = &swings.highs[swings.highs.len() - 1];
            if close > latest_high.price {
                signals.push(PatternSignal::new(
                    PatternKind::Bos {
                        broken_level: latest_high.price,
                    },
                    Direction::Buy,
                    BOS_CONFIDENCE,
                    latest_high.index,
                ));
            }
        }

        if swings.lows.len() >= MIN_SWINGS {
            let latest_low = &swings.lows[swings.lows.len() - 1];
            if close < latest_low.price {
                signals.push(PatternSignal::new(
                    PatternKind::Bos {
                        broken_level: latest_low.price,
                    },
                    Direction::Sell,
                    BOS_CONFIDENCE,
                    latest_low.index,
                ));
            }
        }

        signals
    }
}
