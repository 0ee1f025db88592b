//! Order block: the last opposite-colored candle before a swing point,
//! marked as an institutional supply or demand zone.

use crate::bars::BarSeries;
use crate::patterns::{Direction, PatternKind, PatternSignal};
use crate::structure::SwingPoints;

const ORDER_BLOCK_CONFIDENCE: f64 = 0.75;
/// How many of the most recent swing points are examined per side.
const SWING_TAKE: usize = 3;
/// How far back from the swing point the candle scan reaches.
const SCAN_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBlockDetector;

impl OrderBlockDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, series: &BarSeries, swings: &SwingPoints) -> Vec<PatternSignal> {
        let bars = series.bars();
        let mut signals = Vec::new();

        // Bullish zones: nearest bearish candle before each recent swing low.
        for swing in recent(&swings.lows) {
            let start = swing.index.saturating_sub(SCAN_DEPTH);
            for j in (start..swing.index).rev() {
                if bars[j].close < bars[j].open {
                    signals.push(PatternSignal::new(
                        PatternKind::OrderBlock {
                            top: bars[j].high,
                            bottom: bars[j].low,
                        },
                        Direction::Buy,
                        ORDER_BLOCK_CONFIDENCE,
                        j,
                    ));
                    break;
                }
            }
        }

        // Bearish zones: nearest bullish candle before each recent swing high.
        for swing in recent(&swings.highs) {
            let start = swing.index.saturating_sub(SCAN_DEPTH);
            for j in (start..swing.index).rev() {
                if bars[j].close > bars[j].open {
                    signals.push(PatternSignal::new(
                        PatternKind::OrderBlock {
                            top: bars[j].high,
                            bottom: bars[j].low,
                        },
                        Direction::Sell,
                        ORDER_BLOCK_CONFIDENCE,
                        j,
                    ));
                    break;
                }
            }
        }

        signals
    }
}

fn recent(points: &[crate::structure::SwingPoint]) -> &[crate::structure::SwingPoint] {
    &points[points.len().saturating_sub(SWING_TAKE)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::testutil::series_from_ohlc;
    use crate::structure::StructureAnalyzer;

    /// V-shape with a single bearish candle right before the trough.
    fn v_shape_rows() -> Vec<(f64, f64, f64, f64)> {
        let mut rows = Vec::new();
        // Decline: bullish-bodied drift bars except one clear bearish
        // candle just before the bottom.
        for i in 0..6 {
            let p = 110.0 - i as f64;
            rows.push((p - 0.3, p + 0.4, p - 0.6, p)); // close > open
        }
        // The bearish candle (index 6): open 104.4, close 103.6.
        rows.push((104.4, 104.6, 103.4, 103.6));
        // The trough bar (index 7).
        rows.push((103.4, 103.5, 102.0, 103.0));
        // Recovery.
        for i in 0..8 {
            let p = 103.5 + i as f64;
            rows.push((p - 0.3, p + 0.4, p - 0.6, p));
        }
        rows
    }

    #[test]
    fn bearish_candle_before_swing_low_marks_bullish_zone() {
        let series = series_from_ohlc(&v_shape_rows());
        let swings = StructureAnalyzer::new(5).find_swing_points(&series);
        assert_eq!(swings.lows.len(), 1);
        assert_eq!(swings.lows[0].index, 7);

        let signals = OrderBlockDetector::new().detect(&series, &swings);
        let block = signals
            .iter()
            .find(|s| s.direction == Direction::Buy)
            .expect("bullish order block");
        assert_eq!(block.source_index, 6);
        assert_eq!(block.confidence, 0.75);
        match block.kind {
            PatternKind::OrderBlock { top, bottom } => {
                assert_eq!(top, 104.6);
                assert_eq!(bottom, 103.4);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn scan_stops_after_ten_bars() {
        // Swing low at index 12 with only bullish candles in the ten bars
        // before it: no block found.
        let mut rows = Vec::new();
        rows.push((100.8, 101.0, 99.9, 100.0)); // bearish, but 12 bars away
        for i in 0..11 {
            let p = 110.0 - i as f64;
            rows.push((p - 0.3, p + 0.4, p - 0.6, p)); // all bullish bodies
        }
        rows.push((98.4, 98.5, 97.0, 98.0)); // trough, index 12
        for i in 0..8 {
            let p = 99.0 + i as f64;
            rows.push((p - 0.3, p + 0.4, p - 0.6, p));
        }
        let series = series_from_ohlc(&rows);
        let swings = StructureAnalyzer::new(5).find_swing_points(&series);
        assert!(swings.lows.iter().any(|s| s.index == 12));

        let signals = OrderBlockDetector::new().detect(&series, &swings);
        assert!(signals.iter().all(|s| s.direction != Direction::Buy));
    }

    #[test]
    fn only_last_three_swings_considered() {
        // Build four V-shapes; only the latest three lows may source blocks.
        let mut rows = Vec::new();
        let mut base = 100.0;
        for _ in 0..4 {
            for i in 0..6 {
                let p = base + 6.0 - i as f64;
                rows.push((p + 0.3, p + 0.5, p - 0.4, p)); // bearish bodies down
            }
            for i in 0..6 {
                let p = base + 1.0 + i as f64;
                rows.push((p - 0.3, p + 0.4, p - 0.6, p)); // bullish recovery
            }
            base += 1.0;
        }
        let series = series_from_ohlc(&rows);
        let swings = StructureAnalyzer::new(5).find_swing_points(&series);
        assert!(swings.lows.len() >= 4);

        let signals = OrderBlockDetector::new().detect(&series, &swings);
        let bullish: Vec<_> = signals
            .iter()
            .filter(|s| s.direction == Direction::Buy)
            .collect();
        assert_eq!(bullish.len(), 3);
        // Blocks come from the three most recent lows, oldest first; the
        // first V's candle is never examined.
        let oldest_kept = swings.lows[swings.lows.len() - 3].index;
        assert!(bullish.iter().all(|s| s.source_index >= oldest_kept - 1));
        assert!(bullish[0].source_index < bullish[1].source_index);
        assert!(bullish[1].source_index < bullish[2].source_index);
    }
}
