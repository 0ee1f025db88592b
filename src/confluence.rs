//! Confluence scorer
//!
//! Fuses the four pattern detectors into one decision. Structure breaks
//! (BOS, MSS) always contribute; imbalance and zone signals (FVG, order
//! block) only confirm: they count when their direction matches the
//! immediately preceding contributing signal, and once counted they join
//! the contributing list themselves.

use serde::Serialize;

use crate::patterns::{Direction, PatternSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskQuality {
    Low,
    Medium,
    High,
}

/// Detector outputs for one analysis window, in detector order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    pub bos: Vec<PatternSignal>,
    pub mss: Vec<PatternSignal>,
    pub fvg: Vec<PatternSignal>,
    pub order_blocks: Vec<PatternSignal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfluenceResult {
    pub action: Action,
    /// Weighted average confidence, clamped to [0, 1].
    pub confidence: f64,
    pub signal_count: usize,
    pub contributing: Vec<PatternSignal>,
    pub risk_quality: RiskQuality,
}

impl ConfluenceResult {
    fn hold() -> Self {
        Self {
            action: Action::Hold,
            confidence: 0.0,
            signal_count: 0,
            contributing: Vec::new(),
            risk_quality: RiskQuality::Low,
        }
    }
}

/// Per-kind weights applied to signal confidence before averaging.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfluenceWeights {
    pub bos: f64,
    pub mss: f64,
    pub fvg: f64,
    pub order_block: f64,
}

impl Default for ConfluenceWeights {
    fn default() -> Self {
        Self {
            bos: 1.0,
            mss: 1.2,
            fvg: 0.8,
            order_block: 0.9,
        }
    }
}

/// Minimum weighted-average confidence for a directional action.
const ACTION_CONFIDENCE_FLOOR: f64 = 0.7;
const HIGH_QUALITY_FLOOR: f64 = 0.8;
const MEDIUM_QUALITY_FLOOR: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfluenceScorer {
    weights: ConfluenceWeights,
}

impl ConfluenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ConfluenceWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, patterns: &PatternSet) -> ConfluenceResult {
        let mut contributing: Vec<PatternSignal> = Vec::new();
        let mut total_confidence = 0.0;

        for signal in &patterns.bos {
            total_confidence += signal.confidence * self.weights.bos;
            contributing.push(signal.clone());
        }
        for signal in &patterns.mss {
            total_confidence += signal.confidence * self.weights.mss;
            contributing.push(signal.clone());
        }
        // Confirmation-only signals: counted when aligned with the signal
        // immediately before them.
        for signal in &patterns.fvg {
            if confirms(&contributing, signal.direction) {
                total_confidence += signal.confidence * self.weights.fvg;
                contributing.push(signal.clone());
            }
        }
        for signal in &patterns.order_blocks {
            if confirms(&contributing, signal.direction) {
                total_confidence += signal.confidence * self.weights.order_block;
                contributing.push(signal.clone());
            }
        }

        let signal_count = contributing.len();
        if signal_count == 0 {
            return ConfluenceResult::hold();
        }

        let avg_confidence = (total_confidence / signal_count as f64).clamp(0.0, 1.0);

        let buy_count = contributing
            .iter()
            .filter(|s| s.direction == Direction::Buy)
            .count();
        let sell_count = signal_count - buy_count;

        let action = if buy_count > sell_count && avg_confidence > ACTION_CONFIDENCE_FLOOR {
            Action::Buy
        } else if sell_count > buy_count && avg_confidence > ACTION_CONFIDENCE_FLOOR {
            Action::Sell
        } else {
            Action::Hold
        };

        let risk_quality = if avg_confidence > HIGH_QUALITY_FLOOR {
            RiskQuality::High
        } else if avg_confidence > MEDIUM_QUALITY_FLOOR {
            RiskQuality::Medium
        } else {
            RiskQuality::Low
        };

        ConfluenceResult {
            action,
            confidence: avg_confidence,
            signal_count,
            contributing,
            risk_quality,
        }
    }
}

fn confirms(contributing: &[PatternSignal], direction: Direction) -> bool {
    contributing
        .last()
        .is_some_and(|last| last.direction == direction)
}
