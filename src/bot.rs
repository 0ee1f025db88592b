//! Trading bot control loop
//!
//! One cycle walks the configured instruments in order: fetch a window,
//! run the analysis pipeline, pass any candidate through the quality
//! gate, deliver what survives. Failures are isolated per instrument; an
//! unexpected cycle-level failure triggers a cooldown instead of killing
//! the process. Cancellation is cooperative: the running flag is checked
//! between instruments and once per second while sleeping.

use anyhow::Result;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::BotConfig;
use crate::engine::SignalEngine;
use crate::feed::MarketFeed;
use crate::health::HealthState;
use crate::instruments::InstrumentSpec;
use crate::notify::Notifier;
use crate::quality::{GateOutcome, QualityGate};

const STARTUP_MESSAGE: &str = "🚀 SMC Sniper Bot started!\n\n\
📊 <b>Strategy:</b> BOS / MSS / FVG / Order Blocks\n\
⚙️ <b>Filters:</b> confluence, indicator agreement, volatility ceiling\n\n\
<i>Only high-quality setups are posted.</i>";

pub struct TradingBot<F, N> {
    config: BotConfig,
    engine: SignalEngine,
    gate: QualityGate,
    feed: F,
    notifier: N,
    health: Arc<HealthState>,
    running: Arc<AtomicBool>,
}

impl<F: MarketFeed, N: Notifier> TradingBot<F, N> {
    pub fn new(config: BotConfig, feed: F, notifier: N, health: Arc<HealthState>) -> Self {
        let engine = SignalEngine::new(config.analysis.clone(), config.risk.clone());
        let gate = QualityGate::new(config.gate.clone());
        Self {
            config,
            engine,
            gate,
            feed,
            notifier,
            health,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared flag; store `false` to stop the loop cooperatively.
    pub fn running_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn run(&mut self) {
        info!("SMC Sniper bot started");
        if !self.notifier.send_message(STARTUP_MESSAGE).await {
            warn!("startup notification failed");
        }

        while self.is_running() {
            match self.run_cycle().await {
                Ok(()) => {
                    self.health.record_cycle();
                }
                Err(err) => {
                    // Cooldown, not termination; the next cycle retries.
                    error!("cycle failed: {err:#}");
                    self.sleep_while_running(Duration::from_secs(
                        self.config.error_cooldown_seconds,
                    ))
                    .await;
                    continue;
                }
            }
            self.sleep_while_running(Duration::from_secs(self.config.cycle_period_seconds))
                .await;
        }

        info!("SMC Sniper bot stopped");
    }

    /// One pass over all instruments. Per-instrument failures are logged
    /// and skipped; they never abort the rest of the cycle.
    pub async fn run_cycle(&mut self) -> Result<()> {
        info!("starting trading cycle");
        let instruments = self.config.instruments.clone();

        for instrument in &instruments {
            if !self.is_running() {
                break;
            }
            self.process_instrument(instrument).await;
            sleep(Duration::from_secs(1)).await;
        }

        info!("trading cycle completed");
        Ok(())
    }

    async fn process_instrument(&mut self, instrument: &InstrumentSpec) {
        let fetch_timeout = Duration::from_secs(self.config.feed.request_timeout_seconds);
        let series = match timeout(fetch_timeout, self.feed.fetch_bars(&instrument.symbol)).await
        {
            Ok(Ok(series)) => series,
            Ok(Err(err)) => {
                warn!("{}: no data this cycle: {err:#}", instrument.symbol);
                return;
            }
            Err(_) => {
                warn!("{}: data request timed out", instrument.symbol);
                return;
            }
        };

        let now = Utc::now();
        let candidate = match self.engine.analyze(instrument, &series, now) {
            Ok(Some(candidate)) => candidate,
            Ok(None) => return,
            Err(err) => {
                warn!("{}: analysis skipped: {err}", instrument.symbol);
                return;
            }
        };

        let outcome = self.gate.evaluate(
            instrument,
            &series,
            &candidate.confluence,
            candidate.votes,
            candidate.signal.direction,
            now,
        );

        match outcome {
            GateOutcome::Accepted => {
                let signal = &candidate.signal;
                if signal.confidence >= self.config.gate.high_quality_confidence {
                    info!("{}: sniper-grade setup ({:.2})", instrument.symbol, signal.confidence);
                }
                if self.notifier.deliver(signal).await {
                    self.gate
                        .record_emission(&instrument.symbol, signal.direction, signal.timestamp);
                    self.health.record_signal();
                    info!(
                        "{}: {} signal emitted at {:.5}",
                        instrument.symbol, signal.direction, signal.entry_price
                    );
                } else {
                    // No retry this cycle; dedup stays open so the signal
                    // is eligible again next cycle.
                    self.health.record_delivery_failure();
                    self.notifier
                        .send_error(&format!("delivery failed for {}", instrument.symbol))
                        .await;
                }
            }
            GateOutcome::Suppressed { last_emitted } => {
                info!(
                    "{}: duplicate suppressed (last emitted {})",
                    instrument.symbol, last_emitted
                );
            }
            GateOutcome::Rejected(reason) => {
                debug!("{}: candidate rejected: {reason}", instrument.symbol);
            }
        }
    }

    async fn sleep_while_running(&self, duration: Duration) {
        let mut remaining = duration.as_secs();
        while remaining > 0 && self.is_running() {
            sleep(Duration::from_secs(1)).await;
            remaining -= 1;
        }
    }
}
