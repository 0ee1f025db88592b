//! Emitted trade signal
//!
//! Immutable once constructed; only the quality gate decides whether it is
//! forwarded to the notifier. Overall confidence blends the structural
//! confluence with the traditional indicator agreement, weighted toward
//! structure.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::confluence::RiskQuality;
use crate::indicators::IndicatorVotes;
use crate::patterns::{Direction, PatternSignal};

const CONFLUENCE_WEIGHT: f64 = 0.7;
const TRADITIONAL_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub symbol: String,
    pub display_name: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub take_profit_2: f64,
    pub take_profit_3: f64,
    pub position_size: f64,
    pub reward_ratio: f64,
    pub confidence: f64,
    pub risk_quality: RiskQuality,
    pub timestamp: DateTime<Utc>,
    pub contributing: Vec<PatternSignal>,
}

/// Blend of structural confluence confidence and the fraction of
/// traditional checks agreeing, clamped to 1.0.
pub fn overall_confidence(confluence_confidence: f64, votes: IndicatorVotes) -> f64 {
    let blended =
        confluence_confidence * CONFLUENCE_WEIGHT + votes.strength() * TRADITIONAL_WEIGHT;
    blended.min(1.0)
}

/// Prices are quoted to 5 decimals in delivered messages.
pub fn round_price(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_weights_structure_over_indicators() {
        let votes = IndicatorVotes { buy: 3, sell: 0 };
        let confidence = overall_confidence(0.8, votes);
        // 0.8*0.7 + 1.0*0.3
        assert!((confidence - 0.86).abs() < 1e-12);
    }

    #[test]
    fn blend_never_exceeds_one() {
        let votes = IndicatorVotes { buy: 3, sell: 0 };
        assert_eq!(overall_confidence(1.0, votes), 1.0);
    }

    #[test]
    fn partial_votes_reduce_the_blend() {
        let votes = IndicatorVotes { buy: 1, sell: 0 };
        let confidence = overall_confidence(0.9, votes);
        // 0.9*0.7 + (1/3)*0.3
        assert!((confidence - 0.73).abs() < 1e-12);
    }

    #[test]
    fn prices_round_to_five_decimals() {
        assert_eq!(round_price(1.085_549_9), 1.08555);
        assert_eq!(round_price(1.085_544_9), 1.08554);
    }
}
