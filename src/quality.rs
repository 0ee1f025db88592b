//! Quality gate and dedup state
//!
//! Last filter before a signal leaves the pipeline. A candidate is
//! accepted only if every check holds: confluence confidence and count,
//! agreement with the traditional indicators, a trailing-volatility
//! ceiling and the asset-class policy. Accepted candidates then pass the
//! duplicate suppressor, which tracks the last *emitted* signal per
//! instrument; the state is overwritten only after delivery is confirmed,
//! so a failed delivery stays eligible next cycle.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use log::debug;
use statrs::statistics::Statistics;
use std::collections::HashMap;

use crate::bars::BarSeries;
use crate::confluence::ConfluenceResult;
use crate::config::GateConfig;
use crate::indicators::IndicatorVotes;
use crate::instruments::{AssetClass, InstrumentSpec};
use crate::patterns::Direction;

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Accepted,
    /// Same direction was emitted for this instrument inside the dedup
    /// window.
    Suppressed { last_emitted: DateTime<Utc> },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    ConfidenceTooLow(f64),
    InsufficientConfluence(usize),
    IndicatorMismatch,
    MarketTooVolatile { volatility: f64, ceiling: f64 },
    HighImpactHours(u32),
    WeekendConfidenceTooLow(f64),
    PriceOutsideBand(f64),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::ConfidenceTooLow(c) => write!(f, "confidence too low ({c:.2})"),
            RejectReason::InsufficientConfluence(n) => {
                write!(f, "insufficient confluence ({n} signals)")
            }
            RejectReason::IndicatorMismatch => write!(f, "traditional indicators disagree"),
            RejectReason::MarketTooVolatile { volatility, ceiling } => {
                write!(f, "volatility {volatility:.4} above ceiling {ceiling:.4}")
            }
            RejectReason::HighImpactHours(h) => write!(f, "high-impact hour {h}:00 UTC"),
            RejectReason::WeekendConfidenceTooLow(c) => {
                write!(f, "weekend confidence too low ({c:.2})")
            }
            RejectReason::PriceOutsideBand(p) => write!(f, "price {p:.2} outside sane band"),
        }
    }
}

#[derive(Debug, Clone)]
struct LastEmission {
    direction: Direction,
    timestamp: DateTime<Utc>,
}

pub struct QualityGate {
    config: GateConfig,
    /// Dedup state, keyed by instrument symbol. Written only through
    /// `record_emission`.
    last_emitted: HashMap<String, LastEmission>,
}

impl QualityGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            last_emitted: HashMap::new(),
        }
    }

    pub fn evaluate(
        &self,
        instrument: &InstrumentSpec,
        series: &BarSeries,
        confluence: &ConfluenceResult,
        votes: IndicatorVotes,
        direction: Direction,
        now: DateTime<Utc>,
    ) -> GateOutcome {
        if confluence.confidence < self.config.min_confidence {
            return GateOutcome::Rejected(RejectReason::ConfidenceTooLow(confluence.confidence));
        }
        if confluence.signal_count < self.config.min_signal_count {
            return GateOutcome::Rejected(RejectReason::InsufficientConfluence(
                confluence.signal_count,
            ));
        }
        if !votes.supports(direction) {
            return GateOutcome::Rejected(RejectReason::IndicatorMismatch);
        }

        let volatility = trailing_volatility(series, self.config.volatility_window);
        let ceiling = self.config.volatility_ceiling.for_class(instrument.asset_class);
        if volatility > ceiling {
            return GateOutcome::Rejected(RejectReason::MarketTooVolatile { volatility, ceiling });
        }

        if let Err(reason) = self.asset_policy(instrument, confluence, series.last_close(), now) {
            return GateOutcome::Rejected(reason);
        }

        if let Some(last) = self.last_emitted.get(&instrument.symbol) {
            let elapsed = (now - last.timestamp).num_seconds();
            if last.direction == direction && elapsed < self.config.dedup_window_seconds {
                debug!(
                    "{}: suppressing duplicate {} ({}s since last emission)",
                    instrument.symbol, direction, elapsed
                );
                return GateOutcome::Suppressed {
                    last_emitted: last.timestamp,
                };
            }
        }

        GateOutcome::Accepted
    }

    fn asset_policy(
        &self,
        instrument: &InstrumentSpec,
        confluence: &ConfluenceResult,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<(), RejectReason> {
        match instrument.asset_class {
            AssetClass::Forex => {
                let hour = now.hour();
                if self.config.high_impact_hours.contains(&hour) {
                    return Err(RejectReason::HighImpactHours(hour));
                }
            }
            AssetClass::Crypto => {
                let weekday = now.weekday();
                if (weekday == Weekday::Sat || weekday == Weekday::Sun)
                    && confluence.confidence < self.config.crypto_weekend_confidence
                {
                    return Err(RejectReason::WeekendConfidenceTooLow(confluence.confidence));
                }
            }
            AssetClass::Commodity => {
                // A quote outside the sane band is bad data, not structure.
                if !self.config.commodity_price_band.contains(price) {
                    return Err(RejectReason::PriceOutsideBand(price));
                }
            }
        }
        Ok(())
    }

    /// Overwrite the dedup entry after a confirmed delivery.
    pub fn record_emission(
        &mut self,
        symbol: &str,
        direction: Direction,
        timestamp: DateTime<Utc>,
    ) {
        self.last_emitted
            .insert(symbol.to_string(), LastEmission { direction, timestamp });
    }
}

/// Standard deviation of simple returns over the trailing `window` closes.
pub fn trailing_volatility(series: &BarSeries, window: usize) -> f64 {
    let closes = series.closes();
    let tail = &closes[closes.len().saturating_sub(window)..];
    let returns: Vec<f64> = tail
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    returns.std_dev()
}
