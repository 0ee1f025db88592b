// End-to-end pipeline scenarios: synthetic windows through the signal
// engine and quality gate, no I/O involved.

use chrono::{DateTime, Duration, TimeZone, Utc};

use smc_sniper::bars::{Bar, BarSeries};
use smc_sniper::config::{AnalysisConfig, GateConfig, RiskConfig};
use smc_sniper::engine::SignalEngine;
use smc_sniper::error::AnalysisError;
use smc_sniper::instruments::{AssetClass, InstrumentSpec};
use smc_sniper::patterns::{Direction, PatternKind};
use smc_sniper::quality::{GateOutcome, QualityGate, RejectReason};

fn series_from_closes(closes: &[f64], spread: f64) -> BarSeries {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, c)| Bar {
            timestamp: start + Duration::minutes(15 * i as i64),
            open: *c - spread / 4.0,
            high: *c + spread,
            low: *c - spread,
            close: *c,
            volume: 1000.0,
        })
        .collect();
    BarSeries::new(bars).unwrap()
}

/// 240-bar EUR/USD window in a steady uptrend: 200 bars of drift, two
/// crest/trough legs, then a rally closing above the latest crest while
/// the newest swing point is the trough. Produces both a bullish break
/// of structure and a bullish structure shift.
fn trending_forex_closes() -> Vec<f64> {
    let mut closes = Vec::new();
    for i in 0..200 {
        closes.push(1.0700 + i as f64 * 2.5e-5);
    }
    for i in 0..8 {
        closes.push(1.0750 + 4e-4 * i as f64);
    }
    for i in 0..7 {
        closes.push(1.0774 - 4e-4 * i as f64);
    }
    for i in 0..8 {
        closes.push(1.0754 + 4e-4 * i as f64);
    }
    for i in 0..7 {
        closes.push(1.0778 - 4e-4 * i as f64);
    }
    for i in 0..10 {
        closes.push(1.0758 + 4e-4 * i as f64);
    }
    closes
}

fn forex() -> InstrumentSpec {
    InstrumentSpec::new("EURUSD=X", "EUR/USD", AssetClass::Forex)
}

fn engine() -> SignalEngine {
    SignalEngine::new(AnalysisConfig::default(), RiskConfig::default())
}

/// Wednesday late morning UTC: outside the high-impact hours.
fn quiet_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 6, 11, 0, 0).unwrap()
}

#[test]
fn trending_forex_window_yields_an_accepted_buy_signal() {
    let series = series_from_closes(&trending_forex_closes(), 0.0006);
    let now = quiet_time();

    let candidate = engine()
        .analyze(&forex(), &series, now)
        .expect("analyzable window")
        .expect("candidate produced");

    // Structural side: at least a bullish BOS contributed.
    assert!(candidate
        .confluence
        .contributing
        .iter()
        .any(|s| matches!(s.kind, PatternKind::Bos { .. }) && s.direction == Direction::Buy));
    assert_eq!(candidate.signal.direction, Direction::Buy);
    assert!(candidate.confluence.confidence >= 0.7);
    assert!(candidate.confluence.signal_count >= 2);

    // Risk geometry brackets the entry.
    let signal = &candidate.signal;
    assert!(signal.stop_loss < signal.entry_price);
    assert!(signal.entry_price < signal.take_profit);
    assert!(signal.take_profit < signal.take_profit_2);
    assert!(signal.take_profit_2 < signal.take_profit_3);
    assert!(signal.position_size >= 0.01);
    assert!(signal.confidence <= 1.0);

    // Gate accepts it.
    let mut gate = QualityGate::new(GateConfig::default());
    let outcome = gate.evaluate(
        &forex(),
        &series,
        &candidate.confluence,
        candidate.votes,
        signal.direction,
        now,
    );
    assert_eq!(outcome, GateOutcome::Accepted);

    // And the dedup window then suppresses an identical follow-up.
    gate.record_emission(&signal.symbol, signal.direction, now);
    let outcome = gate.evaluate(
        &forex(),
        &series,
        &candidate.confluence,
        candidate.votes,
        signal.direction,
        now + Duration::seconds(900),
    );
    assert!(matches!(outcome, GateOutcome::Suppressed { .. }));
}

#[test]
fn excessive_volatility_rejects_regardless_of_confluence() {
    let series = series_from_closes(&trending_forex_closes(), 0.0006);
    let now = quiet_time();
    let candidate = engine()
        .analyze(&forex(), &series, now)
        .unwrap()
        .expect("clean window produces a candidate");

    // Same confluence, but the trailing window now swings +-2% per bar.
    let mut noisy = trending_forex_closes();
    let n = noisy.len();
    for (offset, close) in noisy[n - 40..].iter_mut().enumerate() {
        let swing = if offset % 2 == 0 { 1.02 } else { 0.98 };
        *close *= swing;
    }
    let noisy_series = series_from_closes(&noisy, 0.0006);

    let gate = QualityGate::new(GateConfig::default());
    let outcome = gate.evaluate(
        &forex(),
        &noisy_series,
        &candidate.confluence,
        candidate.votes,
        candidate.signal.direction,
        now,
    );
    assert!(matches!(
        outcome,
        GateOutcome::Rejected(RejectReason::MarketTooVolatile { .. })
    ));
}

#[test]
fn short_window_is_insufficient_data() {
    let closes: Vec<f64> = (0..120).map(|i| 1.07 + i as f64 * 1e-5).collect();
    let series = series_from_closes(&closes, 0.0006);
    let result = engine().analyze(&forex(), &series, quiet_time());
    assert!(matches!(
        result,
        Err(AnalysisError::InsufficientData { required: 200, .. })
    ));
}

#[test]
fn window_below_structural_minimum_is_insufficient_data() {
    let closes: Vec<f64> = (0..30).map(|i| 1.07 + i as f64 * 1e-5).collect();
    let series = series_from_closes(&closes, 0.0006);
    let result = engine().analyze(&forex(), &series, quiet_time());
    assert!(matches!(
        result,
        Err(AnalysisError::InsufficientData { required: 50, .. })
    ));
}

#[test]
fn structureless_window_holds() {
    // Strictly monotonic drift: no interior swing points, no patterns.
    let closes: Vec<f64> = (0..260).map(|i| 1.07 + i as f64 * 1e-5).collect();
    let series = series_from_closes(&closes, 0.0006);
    let candidate = engine().analyze(&forex(), &series, quiet_time()).unwrap();
    assert!(candidate.is_none());
}

#[test]
fn forex_candidate_in_high_impact_hour_is_rejected() {
    let series = series_from_closes(&trending_forex_closes(), 0.0006);
    let news_hour = Utc.with_ymd_and_hms(2024, 3, 6, 8, 15, 0).unwrap();
    let candidate = engine()
        .analyze(&forex(), &series, news_hour)
        .unwrap()
        .expect("analysis itself is time-independent");

    let gate = QualityGate::new(GateConfig::default());
    let outcome = gate.evaluate(
        &forex(),
        &series,
        &candidate.confluence,
        candidate.votes,
        candidate.signal.direction,
        news_hour,
    );
    assert_eq!(
        outcome,
        GateOutcome::Rejected(RejectReason::HighImpactHours(8))
    );
}
