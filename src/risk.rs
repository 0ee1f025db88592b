//! Risk engine
//!
//! Derives stop-loss and take-profit levels from volatility and market
//! structure, validates the resulting risk/reward, and sizes the position
//! against the account risk budget. Stops prefer the more conservative of
//! the ATR fallback and the nearest opposing structural level; targets are
//! clipped so they never sit beyond the level that would likely reject
//! them.

use log::debug;

use crate::bars::BarSeries;
use crate::config::RiskConfig;
use crate::error::{AnalysisError, RiskViolation};
use crate::instruments::InstrumentSpec;
use crate::patterns::Direction;
use crate::structure::StructureAnalyzer;

/// ATR multiple for the volatility-fallback stop distance.
const STOP_ATR_MULTIPLE: f64 = 1.5;
/// Buffer placed beyond a structural level when it anchors the stop.
const STOP_LEVEL_BUFFER: f64 = 0.3;
/// Buffer placed in front of a structural level when it clips a target.
const TARGET_LEVEL_BUFFER: f64 = 0.2;
/// How many recent levels are kept per side.
const LEVELS_KEPT: usize = 10;
/// Dollars per pip per standard forex lot.
const PIP_VALUE_PER_LOT: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct RiskPlan {
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub take_profit_3: f64,
    /// Price distance from entry to stop; always > 0.
    pub risk_amount: f64,
    /// Realised reward/risk of the first target.
    pub reward_ratio: f64,
    pub position_size: f64,
}

/// Recent support levels (ascending) and resistance levels (descending).
#[derive(Debug, Clone, Default)]
pub struct StructuralLevels {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

impl StructuralLevels {
    pub fn nearest_support_below(&self, price: f64) -> Option<f64> {
        self.support
            .iter()
            .copied()
            .filter(|level| *level < price)
            .fold(None, |acc: Option<f64>, level| {
                Some(acc.map_or(level, |best| best.max(level)))
            })
    }

    pub fn nearest_resistance_above(&self, price: f64) -> Option<f64> {
        self.resistance
            .iter()
            .copied()
            .filter(|level| *level > price)
            .fold(None, |acc: Option<f64>, level| {
                Some(acc.map_or(level, |best| best.min(level)))
            })
    }
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Average true range over the configured period (simple mean of the
    /// last `period` true ranges).
    pub fn atr(&self, series: &BarSeries) -> Result<f64, AnalysisError> {
        let bars = series.bars();
        let period = self.config.atr_period;
        if bars.len() < period + 1 {
            return Err(AnalysisError::InsufficientData {
                required: period + 1,
                actual: bars.len(),
            });
        }

        let true_ranges: Vec<f64> = bars
            .windows(2)
            .map(|pair| {
                let prev_close = pair[0].close;
                let bar = &pair[1];
                (bar.high - bar.low)
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs())
            })
            .collect();

        let recent = &true_ranges[true_ranges.len() - period..];
        Ok(recent.iter().sum::<f64>() / period as f64)
    }

    /// Key support/resistance from a wide swing scan over the window.
    pub fn structural_levels(&self, series: &BarSeries) -> StructuralLevels {
        let swings =
            StructureAnalyzer::new(self.config.level_lookback).find_swing_points(series);

        let mut resistance: Vec<f64> = swings
            .highs
            .iter()
            .rev()
            .take(LEVELS_KEPT)
            .map(|p| p.price)
            .collect();
        resistance.sort_by(|a, b| b.partial_cmp(a).expect("prices are finite"));

        let mut support: Vec<f64> = swings
            .lows
            .iter()
            .rev()
            .take(LEVELS_KEPT)
            .map(|p| p.price)
            .collect();
        support.sort_by(|a, b| a.partial_cmp(b).expect("prices are finite"));

        StructuralLevels {
            support,
            resistance,
        }
    }

    /// Stop, three targets and position size for an entry in the given
    /// direction. `volatility` is the instrument-scaled ATR.
    pub fn build_plan(
        &self,
        instrument: &InstrumentSpec,
        direction: Direction,
        entry: f64,
        volatility: f64,
        levels: &StructuralLevels,
    ) -> Result<RiskPlan, AnalysisError> {
        let stop_loss = self.stop_loss(direction, entry, volatility, levels);
        let risk = (entry - stop_loss).abs();
        if risk <= 0.0 {
            return Err(AnalysisError::DegenerateInput(
                "stop equals entry".to_string(),
            ));
        }

        let (tp1, tp2, tp3) = self.take_profits(direction, entry, risk, volatility, levels);
        let reward_ratio = (tp1 - entry).abs() / risk;
        let position_size = self.position_size(instrument, risk);

        debug!(
            "{}: entry {:.5} SL {:.5} TP1 {:.5} (R:R {:.2}) size {}",
            instrument.symbol, entry, stop_loss, tp1, reward_ratio, position_size
        );

        Ok(RiskPlan {
            stop_loss,
            take_profit_1: tp1,
            take_profit_2: tp2,
            take_profit_3: tp3,
            risk_amount: risk,
            reward_ratio,
            position_size,
        })
    }

    fn stop_loss(
        &self,
        direction: Direction,
        entry: f64,
        volatility: f64,
        levels: &StructuralLevels,
    ) -> f64 {
        match direction {
            Direction::Buy => {
                let base = entry - volatility * STOP_ATR_MULTIPLE;
                match levels.nearest_support_below(entry) {
                    // The tighter (closer to entry) stop wins.
                    Some(support) => base.max(support - volatility * STOP_LEVEL_BUFFER),
                    None => base,
                }
            }
            Direction::Sell => {
                let base = entry + volatility * STOP_ATR_MULTIPLE;
                match levels.nearest_resistance_above(entry) {
                    Some(resistance) => base.min(resistance + volatility * STOP_LEVEL_BUFFER),
                    None => base,
                }
            }
        }
    }

    fn take_profits(
        &self,
        direction: Direction,
        entry: f64,
        risk: f64,
        volatility: f64,
        levels: &StructuralLevels,
    ) -> (f64, f64, f64) {
        let rr = self.config.target_rr;
        match direction {
            Direction::Buy => {
                let base_tp1 = entry + risk * rr;
                let tp1 = match levels.nearest_resistance_above(entry) {
                    Some(resistance) if base_tp1 > resistance => {
                        resistance - volatility * TARGET_LEVEL_BUFFER
                    }
                    _ => base_tp1,
                };
                (
                    tp1,
                    entry + risk * (rr + 1.0),
                    entry + risk * (rr + 2.0),
                )
            }
            Direction::Sell => {
                let base_tp1 = entry - risk * rr;
                let tp1 = match levels.nearest_support_below(entry) {
                    Some(support) if base_tp1 < support => {
                        support + volatility * TARGET_LEVEL_BUFFER
                    }
                    _ => base_tp1,
                };
                (
                    tp1,
                    entry - risk * (rr + 1.0),
                    entry - risk * (rr + 2.0),
                )
            }
        }
    }

    /// Reject plans whose risk geometry is untradable: poor reward for the
    /// risk, a stop so wide it blows the per-trade budget, or a stop so
    /// tight it sits inside the noise floor.
    pub fn validate(
        &self,
        instrument: &InstrumentSpec,
        entry: f64,
        plan: &RiskPlan,
    ) -> Result<(), RiskViolation> {
        if plan.reward_ratio < self.config.min_rr {
            return Err(RiskViolation::RewardTooLow(plan.reward_ratio));
        }

        if instrument.is_forex() {
            let risk_pips = instrument.price_to_pips(plan.risk_amount);
            if risk_pips > self.config.max_risk_pips {
                return Err(RiskViolation::RiskTooWide(format!(
                    "{:.1} pips",
                    risk_pips
                )));
            }
            if risk_pips < self.config.min_risk_pips {
                return Err(RiskViolation::StopTooTight(format!(
                    "{:.1} pips",
                    risk_pips
                )));
            }
        } else {
            let risk_percent = plan.risk_amount / entry * 100.0;
            if risk_percent > self.config.max_risk_percent {
                return Err(RiskViolation::RiskTooWide(format!("{:.1}%", risk_percent)));
            }
            if risk_percent < self.config.min_risk_percent {
                return Err(RiskViolation::StopTooTight(format!(
                    "{:.1}%",
                    risk_percent
                )));
            }
        }

        Ok(())
    }

    /// `(balance * risk% / 100) / risk_per_unit`, rounded to the asset's
    /// lot granularity and floored at the minimum tradable unit.
    pub fn position_size(&self, instrument: &InstrumentSpec, risk_per_unit: f64) -> f64 {
        let floor = self.config.min_position_size;
        if risk_per_unit <= 0.0 {
            return floor;
        }
        let risk_budget = self.config.account_balance * self.config.risk_percent / 100.0;

        let size = if instrument.is_forex() {
            let risk_pips = instrument.price_to_pips(risk_per_unit);
            let lots = risk_budget / (risk_pips * PIP_VALUE_PER_LOT);
            if lots >= 1.0 {
                round_to(lots, 1)
            } else if lots >= 0.1 {
                round_to(lots, 2)
            } else {
                floor
            }
        } else {
            round_to(risk_budget / risk_per_unit, 4)
        };

        size.max(floor)
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
