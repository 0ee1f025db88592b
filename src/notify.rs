//! Notification collaborator
//!
//! Delivers accepted signals to a Telegram chat as HTML messages. Delivery
//! reports success or failure; the bot never retries inside a cycle and
//! only records the dedup entry on confirmed success.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::json;
use std::env;

use crate::config::TelegramConfig;
use crate::signal::Signal;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one formatted signal. True only on confirmed delivery.
    async fn deliver(&self, signal: &Signal) -> bool;
    /// Send a plain status or startup message.
    async fn send_message(&self, text: &str) -> bool;
    /// Send an error notification.
    async fn send_error(&self, message: &str) -> bool;
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        let token = non_empty(&config.token)
            .or_else(|| env::var("TELEGRAM_TOKEN").ok())
            .unwrap_or_default();
        let chat_id = non_empty(&config.chat_id)
            .or_else(|| env::var("TELEGRAM_CHAT_ID").ok())
            .unwrap_or_default();

        if token.is_empty() {
            warn!("no Telegram token configured; deliveries will fail");
        }
        if chat_id.is_empty() {
            warn!("no Telegram chat id configured; deliveries will fail");
        }

        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{token}"),
            chat_id,
        }
    }

    async fn post_message(&self, text: &str) -> bool {
        let url = format!("{}/sendMessage", self.base_url);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        match self.client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("message delivered");
                true
            }
            Ok(response) => {
                error!("delivery failed with status {}", response.status());
                false
            }
            Err(err) => {
                error!("delivery failed: {err}");
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, signal: &Signal) -> bool {
        let delivered = self.post_message(&format_signal_message(signal)).await;
        if delivered {
            info!("signal delivered for {}", signal.symbol);
        } else {
            error!("failed to deliver signal for {}", signal.symbol);
        }
        delivered
    }

    async fn send_message(&self, text: &str) -> bool {
        self.post_message(text).await
    }

    async fn send_error(&self, message: &str) -> bool {
        let text = format!(
            "🚨 <b>SMC Sniper Error</b>\n\n<b>Error:</b> {message}\n\n<i>Check the bot logs for details.</i>"
        );
        self.post_message(&text).await
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Concise HTML signal message: entry, stop, laddered targets with their
/// R:R multiples, sized lot and a coarse risk label.
pub fn format_signal_message(signal: &Signal) -> String {
    let direction_tag = match signal.direction {
        crate::patterns::Direction::Buy => "🟢 BUY",
        crate::patterns::Direction::Sell => "🔴 SELL",
    };

    let risk = (signal.entry_price - signal.stop_loss).abs();
    let rr = signal.reward_ratio;

    // Risk label in pips for forex-style quotes, price units otherwise.
    let risk_units = if signal.entry_price < 10.0 {
        risk * 10_000.0
    } else {
        risk
    };
    let risk_level = if risk_units < 20.0 {
        "LOW"
    } else if risk_units < 35.0 {
        "MEDIUM"
    } else {
        "HIGH"
    };

    let mut message = format!("🎯 <b>{}</b> {}\n\n", signal.display_name, direction_tag);
    message.push_str(&format!("<b>Entry:</b> {:.5}\n", signal.entry_price));
    message.push_str(&format!("<b>SL:</b> {:.5}\n", signal.stop_loss));
    message.push_str(&format!("<b>TP1:</b> {:.5} (1:{:.1})\n", signal.take_profit, rr));
    message.push_str(&format!(
        "<b>TP2:</b> {:.5} (1:{:.1})\n",
        signal.take_profit_2,
        rr + 1.0
    ));
    message.push_str(&format!(
        "<b>TP3:</b> {:.5} (1:{:.1})\n\n",
        signal.take_profit_3,
        rr + 2.0
    ));
    message.push_str(&format!(
        "📊 <b>Lot Size:</b> {} (optimal) | 0.01 (safe)\n",
        signal.position_size
    ));
    message.push_str(&format!(
        "⚠️ <b>Risk:</b> {} | {:.0}% confidence\n",
        risk_level,
        signal.confidence * 100.0
    ));
    message.push_str(&format!(
        "⏰ <b>Time:</b> {}",
        signal.timestamp.format("%H:%M UTC")
    ));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confluence::RiskQuality;
    use crate::patterns::Direction;
    use chrono::{TimeZone, Utc};

    fn sample_signal() -> Signal {
        Signal {
            symbol: "EURUSD=X".to_string(),
            display_name: "EUR/USD".to_string(),
            direction: Direction::Buy,
            entry_price: 1.085,
            stop_loss: 1.0835,
            take_profit: 1.08875,
            take_profit_2: 1.09025,
            take_profit_3: 1.09175,
            position_size: 0.5,
            reward_ratio: 2.5,
            confidence: 0.86,
            risk_quality: RiskQuality::High,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 6, 14, 30, 0).unwrap(),
            contributing: Vec::new(),
        }
    }

    #[test]
    fn message_contains_all_levels() {
        let message = format_signal_message(&sample_signal());
        assert!(message.contains("EUR/USD"));
        assert!(message.contains("🟢 BUY"));
        assert!(message.contains("<b>Entry:</b> 1.08500"));
        assert!(message.contains("<b>SL:</b> 1.08350"));
        assert!(message.contains("<b>TP1:</b> 1.08875 (1:2.5)"));
        assert!(message.contains("(1:3.5)"));
        assert!(message.contains("(1:4.5)"));
        assert!(message.contains("86% confidence"));
        assert!(message.contains("14:30 UTC"));
    }

    #[test]
    fn forex_risk_labelled_in_pips() {
        // 15 pips of risk: LOW.
        let message = format_signal_message(&sample_signal());
        assert!(message.contains("<b>Risk:</b> LOW"));

        let mut wide = sample_signal();
        wide.stop_loss = 1.0813; // 37 pips
        let message = format_signal_message(&wide);
        assert!(message.contains("<b>Risk:</b> HIGH"));
    }

    #[test]
    fn sell_signal_tagged_red() {
        let mut signal = sample_signal();
        signal.direction = Direction::Sell;
        assert!(format_signal_message(&signal).contains("🔴 SELL"));
    }
}
