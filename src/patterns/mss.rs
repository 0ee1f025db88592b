//! Market structure shift: after a directional run, a close through the
//! *opposite* extreme signals reversal. Carries more weight than a plain
//! break of structure.

use crate::bars::BarSeries;
use crate::patterns::{Direction, PatternKind, PatternSignal};
use crate::structure::SwingPoints;

const MSS_CONFIDENCE: f64 = 0.85;

#[derive(Debug, Clone, Copy, Default)]
pub struct MssDetector;

impl MssDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, series: &BarSeries, swings: &SwingPoints) -> Vec<PatternSignal> {
        let mut signals = Vec::new();
        let close = series.last_close();

        // Bearish shift: uptrend (latest high newer than latest low) and a
        // close below that low.
        if swings.lows.len() >= 2 {
            if let (Some(high), Some(low)) = (swings.latest_high(), swings.latest_low()) {
                if high.timestamp > low.timestamp && close < low.price {
                    signals.push(PatternSignal::new(
                        PatternKind::Mss {
                            broken_level: low.price,
                        },
                        Direction::Sell,
                        MSS_CONFIDENCE,
                        low.index,
                    ));
                }
            }
        }

        // Bullish shift: downtrend (latest low newer than latest high) and
        // a close above that high.
        if swings.highs.len() >= 2 {
            if let (Some(high), Some(low)) = (swings.latest_high(), swings.latest_low()) {
                if low.timestamp > high.timestamp && close > high.price {
                    signals.push(PatternSignal::new(
                        PatternKind::Mss {
                            broken_level: high.price,
                        },
                        Direction::Buy,
                        MSS_CONFIDENCE,
                        high.index,
                    ));
                }
            }
        }

        signals
    }
}
