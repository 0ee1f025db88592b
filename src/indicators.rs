//! Technical indicator engine
//!
//! Computes EMAs, RSI and MACD over the close-price window and derives the
//! trend vote consumed by the quality gate. The RSI uses the seeded
//! simple-average / incremental Wilder recurrence rather than a rolling
//! mean; a zero loss denominator reads as fully bullish (100) by policy.

use crate::error::AnalysisError;
use crate::patterns::Direction;

pub const MA_FAST_PERIOD: usize = 50;
pub const MA_SLOW_PERIOD: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;

const RSI_OVERSOLD: f64 = 35.0;
const RSI_OVERBOUGHT: f64 = 65.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// Latest scalar values of every indicator.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
}

/// Full derived series plus the latest snapshot.
#[derive(Debug, Clone)]
pub struct Indicators {
    pub snapshot: IndicatorSnapshot,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_histogram: Vec<f64>,
}

/// Buy/sell tallies from the traditional indicator checks (EMA cross,
/// RSI extremes, MACD vs signal line).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorVotes {
    pub buy: usize,
    pub sell: usize,
}

impl IndicatorVotes {
    /// A direction is supported when its votes are not outnumbered by the
    /// opposing votes.
    pub fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Buy => self.buy >= self.sell,
            Direction::Sell => self.sell >= self.buy,
        }
    }

    /// At least one explicit vote in the given direction.
    pub fn confirms(&self, direction: Direction) -> bool {
        match direction {
            Direction::Buy => self.buy >= 1,
            Direction::Sell => self.sell >= 1,
        }
    }

    /// Fraction of the three checks agreeing on the dominant direction.
    pub fn strength(&self) -> f64 {
        self.buy.max(self.sell) as f64 / 3.0
    }
}

/// Exponential moving average seeded with the first value,
/// `ema[i] = alpha * price[i] + (1 - alpha) * ema[i-1]`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    out.push(values[0]);
    for i in 1..values.len() {
        let prev = out[i - 1];
        out.push(alpha * values[i] + (1.0 - alpha) * prev);
    }
    out
}

/// RSI with a simple-average seed over the first `period` deltas and the
/// Wilder update `avg = (avg * (period - 1) + x) / period` afterwards.
/// Zero average loss yields 100 rather than a division failure.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    if values.len() < period + 1 {
        return Vec::new();
    }
    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(deltas.len() - period);
    for i in period..deltas.len() {
        if avg_loss == 0.0 {
            out.push(100.0);
        } else {
            let rs = avg_gain / avg_loss;
            out.push(100.0 - (100.0 / (1.0 + rs)));
        }
        if i < deltas.len() - 1 {
            avg_gain = (avg_gain * (period as f64 - 1.0) + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period as f64 - 1.0) + losses[i]) / period as f64;
        }
    }
    out
}

/// MACD line (fast EMA minus slow EMA), its signal EMA and the histogram.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let ema_fast = ema(values, fast);
    let ema_slow = ema(values, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);
    let histogram: Vec<f64> = line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();
    (line, signal_line, histogram)
}

pub struct IndicatorEngine {
    min_bars: usize,
}

impl IndicatorEngine {
    pub fn new(min_bars: usize) -> Self {
        Self { min_bars }
    }

    /// Compute all indicators for a close-price window. A window shorter
    /// than the slow moving average is an insufficient-data result, never
    /// a partial computation.
    pub fn compute(&self, closes: &[f64]) -> Result<Indicators, AnalysisError> {
        if closes.len() < self.min_bars {
            return Err(AnalysisError::InsufficientData {
                required: self.min_bars,
                actual: closes.len(),
            });
        }

        let ema_fast = ema(closes, MA_FAST_PERIOD);
        let ema_slow = ema(closes, MA_SLOW_PERIOD);
        let rsi_series = rsi(closes, RSI_PERIOD);
        let (macd_line, macd_signal, macd_histogram) =
            macd(closes, MACD_FAST_PERIOD, MACD_SLOW_PERIOD, MACD_SIGNAL_PERIOD);

        let last_rsi = *rsi_series.last().ok_or_else(|| {
            AnalysisError::DegenerateInput("RSI series empty after warmup".to_string())
        })?;

        let snapshot = IndicatorSnapshot {
            price: *closes.last().expect("non-empty window"),
            ema_fast: *ema_fast.last().expect("EMA matches input length"),
            ema_slow: *ema_slow.last().expect("EMA matches input length"),
            rsi: last_rsi,
            macd: *macd_line.last().expect("MACD matches input length"),
            macd_signal: *macd_signal.last().expect("signal matches input length"),
            macd_histogram: *macd_histogram.last().expect("histogram matches input length"),
        };

        Ok(Indicators {
            snapshot,
            ema_fast,
            ema_slow,
            rsi: rsi_series,
            macd: macd_line,
            macd_signal,
            macd_histogram,
        })
    }
}

impl Indicators {
    /// Majority vote across {fast EMA above slow, RSI above midline, MACD
    /// above zero}.
    pub fn trend(&self) -> Trend {
        let s = &self.snapshot;
        let mut bullish = 0;
        let mut bearish = 0;

        if s.ema_fast > s.ema_slow {
            bullish += 1;
        } else {
            bearish += 1;
        }
        if s.rsi > 50.0 {
            bullish += 1;
        } else {
            bearish += 1;
        }
        if s.macd > 0.0 {
            bullish += 1;
        } else {
            bearish += 1;
        }

        if bullish > bearish {
            Trend::Bullish
        } else if bearish > bullish {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }

    /// Traditional directional votes: EMA crossover with price
    /// confirmation, conservative RSI extremes, MACD against its signal
    /// line on the right side of zero.
    pub fn votes(&self) -> IndicatorVotes {
        let s = &self.snapshot;
        let mut votes = IndicatorVotes::default();

        if s.ema_fast > s.ema_slow && s.price > s.ema_fast {
            votes.buy += 1;
        } else if s.ema_fast < s.ema_slow && s.price < s.ema_fast {
            votes.sell += 1;
        }

        if s.rsi < RSI_OVERSOLD {
            votes.buy += 1;
        } else if s.rsi > RSI_OVERBOUGHT {
            votes.sell += 1;
        }

        if s.macd > s.macd_signal && s.macd > 0.0 {
            votes.buy += 1;
        } else if s.macd < s.macd_signal && s.macd < 0.0 {
            votes.sell += 1;
        }

        votes
    }
}
