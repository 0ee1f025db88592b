//! Per-instrument analysis pipeline
//!
//! Pure fan-out from one bar window to a candidate signal: indicators and
//! swing structure feed the four pattern detectors, the confluence scorer
//! fuses them, and the risk engine attaches stop/target levels and a
//! position size. No I/O happens here; the bot owns fetching and delivery,
//! the quality gate owns the final emit decision.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::bars::BarSeries;
use crate::config::{AnalysisConfig, RiskConfig};
use crate::confluence::{Action, ConfluenceResult, ConfluenceScorer, PatternSet};
use crate::error::AnalysisError;
use crate::indicators::{IndicatorEngine, IndicatorVotes};
use crate::instruments::InstrumentSpec;
use crate::patterns::{BosDetector, Direction, FvgDetector, MssDetector, OrderBlockDetector};
use crate::risk::RiskEngine;
use crate::signal::{overall_confidence, round_price, Signal};
use crate::structure::StructureAnalyzer;

/// A signal candidate plus the analysis context the quality gate needs.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub signal: Signal,
    pub confluence: ConfluenceResult,
    pub votes: IndicatorVotes,
}

pub struct SignalEngine {
    analysis: AnalysisConfig,
    indicators: IndicatorEngine,
    structure: StructureAnalyzer,
    scorer: ConfluenceScorer,
    risk: RiskEngine,
}

impl SignalEngine {
    pub fn new(analysis: AnalysisConfig, risk: RiskConfig) -> Self {
        let indicators = IndicatorEngine::new(analysis.min_indicator_bars);
        let structure = StructureAnalyzer::new(analysis.swing_half_width);
        Self {
            analysis,
            indicators,
            structure,
            scorer: ConfluenceScorer::new(),
            risk: RiskEngine::new(risk),
        }
    }

    /// Run the full pipeline for one instrument over one window.
    ///
    /// `Ok(None)` is the ordinary outcome: no confluence, no traditional
    /// agreement, or a risk plan that failed validation. Errors are
    /// reserved for windows the pipeline cannot analyze at all.
    pub fn analyze(
        &self,
        instrument: &InstrumentSpec,
        series: &BarSeries,
        now: DateTime<Utc>,
    ) -> Result<Option<Candidate>, AnalysisError> {
        if series.len() < self.analysis.min_structure_bars {
            return Err(AnalysisError::InsufficientData {
                required: self.analysis.min_structure_bars,
                actual: series.len(),
            });
        }

        let indicators = self.indicators.compute(&series.closes())?;
        let votes = indicators.votes();

        let swings = self.structure.find_swing_points(series);
        let fvg_threshold = self
            .analysis
            .fvg_threshold
            .for_class(instrument.asset_class);
        let patterns = PatternSet {
            bos: BosDetector::new().detect(series, &swings),
            mss: MssDetector::new().detect(series, &swings),
            fvg: FvgDetector::new(fvg_threshold, self.analysis.fvg_keep_last).detect(series),
            order_blocks: OrderBlockDetector::new().detect(series, &swings),
        };

        let confluence = self.scorer.score(&patterns);
        let direction = match confluence.action {
            Action::Buy => Direction::Buy,
            Action::Sell => Direction::Sell,
            Action::Hold => {
                debug!("{}: no confluence, holding", instrument.symbol);
                return Ok(None);
            }
        };

        // Structure proposes, the traditional stack must second it.
        if !votes.confirms(direction) {
            debug!(
                "{}: confluence says {} but no traditional vote agrees",
                instrument.symbol, direction
            );
            return Ok(None);
        }

        let entry = round_price(series.last_close());
        let atr = self.risk.atr(series)?;
        let volatility = atr * instrument.volatility_multiplier;
        let levels = self.risk.structural_levels(series);
        let plan = self
            .risk
            .build_plan(instrument, direction, entry, volatility, &levels)?;

        if let Err(violation) = self.risk.validate(instrument, entry, &plan) {
            info!("{}: plan rejected: {}", instrument.symbol, violation);
            return Ok(None);
        }

        let confidence = overall_confidence(confluence.confidence, votes);
        let signal = Signal {
            symbol: instrument.symbol.clone(),
            display_name: instrument.display_name.clone(),
            direction,
            entry_price: entry,
            stop_loss: round_price(plan.stop_loss),
            take_profit: round_price(plan.take_profit_1),
            take_profit_2: round_price(plan.take_profit_2),
            take_profit_3: round_price(plan.take_profit_3),
            position_size: plan.position_size,
            reward_ratio: plan.reward_ratio,
            confidence,
            risk_quality: confluence.risk_quality,
            timestamp: now,
            contributing: confluence.contributing.clone(),
        };

        info!(
            "{}: {} candidate at {:.5} (confidence {:.2}, {} patterns)",
            instrument.symbol, direction, entry, confidence, confluence.signal_count
        );

        Ok(Some(Candidate {
            signal,
            confluence,
            votes,
        }))
    }
}
