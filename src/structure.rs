//! Market structure analyzer
//!
//! Detects swing highs and lows: local extrema confirmed by a full
//! symmetric window of surrounding bars. Only strict extrema qualify, so
//! a tie anywhere in the window disqualifies the candidate, and indices
//! within the half-width of either boundary are never produced.

use chrono::{DateTime, Utc};

use crate::bars::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

/// Swing highs and lows for one window, each time-ordered.
#[derive(Debug, Clone, Default)]
pub struct SwingPoints {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl SwingPoints {
    pub fn latest_high(&self) -> Option<&SwingPoint> {
        self.highs.last()
    }

    pub fn latest_low(&self) -> Option<&SwingPoint> {
        self.lows.last()
    }
}

pub struct StructureAnalyzer {
    half_width: usize,
}

impl StructureAnalyzer {
    pub fn new(half_width: usize) -> Self {
        Self { half_width }
    }

    pub fn find_swing_points(&self, series: &BarSeries) -> SwingPoints {
        let bars = series.bars();
        let w = self.half_width;
        let n = bars.len();
        let mut points = SwingPoints::default();

        if w == 0 || n < 2 * w + 1 {
            return points;
        }

        for i in w..n - w {
            let mut is_high = true;
            let mut is_low = true;
            for j in i - w..=i + w {
                if j == i {
                    continue;
                }
                if bars[j].high >= bars[i].high {
                    is_high = false;
                }
                if bars[j].low <= bars[i].low {
                    is_low = false;
                }
                if !is_high && !is_low {
                    break;
                }
            }

            if is_high {
                points.highs.push(SwingPoint {
                    index: i,
                    timestamp: bars[i].timestamp,
                    price: bars[i].high,
                    kind: SwingKind::High,
                });
            }
            if is_low {
                points.lows.push(SwingPoint {
                    index: i,
                    timestamp: bars[i].timestamp,
                    price: bars[i].low,
                    kind: SwingKind::Low,
                });
            }
        }

        points
    }
}
