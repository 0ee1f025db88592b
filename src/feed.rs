//! Market data collaborator
//!
//! Fetches one OHLCV window per instrument from a chart HTTP API and
//! converts it into a `BarSeries`. Rows with missing quote fields are
//! dropped before the minimum-bar check; a window that still comes up
//! short is reported as an error so the caller can skip the instrument
//! for the cycle.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::time::Duration;

use crate::bars::{Bar, BarSeries};
use crate::config::FeedConfig;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Bars for one instrument over the configured window, oldest first.
    async fn fetch_bars(&self, symbol: &str) -> Result<BarSeries>;
}

pub struct ChartApiFeed {
    client: reqwest::Client,
    config: FeedConfig,
}

impl ChartApiFeed {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MarketFeed for ChartApiFeed {
    async fn fetch_bars(&self, symbol: &str) -> Result<BarSeries> {
        let now = Utc::now();
        let period1 = (now - ChronoDuration::days(self.config.range_days)).timestamp();
        let period2 = now.timestamp();
        let url = format!("{}/{}", self.config.base_url, symbol);

        debug!("fetching {} ({} -> {})", symbol, period1, period2);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", self.config.interval.clone()),
                ("includePrePost", "true".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload: ChartResponse = response.json().await?;
        let series = bars_from_response(payload, self.config.min_bars)?;
        info!("fetched {} bars for {}", series.len(), symbol);
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize, Default)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Convert a chart response into a series, dropping rows with missing
/// OHLC fields (missing volume reads as zero).
pub fn bars_from_response(payload: ChartResponse, min_bars: usize) -> Result<BarSeries> {
    let result = payload
        .chart
        .result
        .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
        .ok_or_else(|| anyhow!("no chart result in response"))?;

    let timestamps = result
        .timestamp
        .ok_or_else(|| anyhow!("no timestamps in response"))?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no quote data in response"))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let (open, high, low, close) = match (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        ) {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => continue,
        };
        let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0)
            .ok_or_else(|| anyhow!("invalid timestamp {ts}"))?;
        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        });
    }

    if bars.len() < min_bars {
        return Err(anyhow!(
            "insufficient data points: {} valid bars, need {}",
            bars.len(),
            min_bars
        ));
    }

    Ok(BarSeries::new(bars)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_json(closes: &[Option<f64>]) -> ChartResponse {
        let timestamps: Vec<i64> = (0..closes.len() as i64).map(|i| 1_700_000_000 + i * 900).collect();
        let quote = |shift: f64| -> Vec<Option<f64>> {
            closes.iter().map(|c| c.map(|v| v + shift)).collect()
        };
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": timestamps,
                    "indicators": {
                        "quote": [{
                            "open": quote(0.0),
                            "high": quote(0.5),
                            "low": quote(-0.5),
                            "close": closes,
                            "volume": closes.iter().map(|c| c.map(|_| 100.0)).collect::<Vec<_>>(),
                        }]
                    }
                }]
            }
        });
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn null_rows_are_dropped() {
        let mut closes: Vec<Option<f64>> = (0..60).map(|i| Some(100.0 + i as f64)).collect();
        closes[10] = None;
        closes[20] = None;
        let series = bars_from_response(response_json(&closes), 50).unwrap();
        assert_eq!(series.len(), 58);
    }

    #[test]
    fn short_window_is_an_error() {
        let closes: Vec<Option<f64>> = (0..40).map(|i| Some(100.0 + i as f64)).collect();
        let err = bars_from_response(response_json(&closes), 50).unwrap_err();
        assert!(err.to_string().contains("insufficient data points"));
    }

    #[test]
    fn empty_result_is_an_error() {
        let payload: ChartResponse =
            serde_json::from_value(serde_json::json!({"chart": {"result": null}})).unwrap();
        assert!(bars_from_response(payload, 50).is_err());
    }

    #[test]
    fn missing_volume_reads_as_zero() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": (0..55i64).map(|i| 1_700_000_000 + i * 900).collect::<Vec<_>>(),
                    "indicators": {
                        "quote": [{
                            "open": vec![Some(1.0); 55],
                            "high": vec![Some(1.5); 55],
                            "low": vec![Some(0.5); 55],
                            "close": vec![Some(1.0); 55],
                            "volume": vec![None::<f64>; 55],
                        }]
                    }
                }]
            }
        });
        let payload: ChartResponse = serde_json::from_value(body).unwrap();
        let series = bars_from_response(payload, 50).unwrap();
        assert!(series.bars().iter().all(|b| b.volume == 0.0));
    }
}
