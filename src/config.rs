use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::instruments::{AssetClass, InstrumentSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub instruments: Vec<InstrumentSpec>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default = "default_cycle_period_seconds")]
    pub cycle_period_seconds: u64,
    #[serde(default = "default_error_cooldown_seconds")]
    pub error_cooldown_seconds: u64,
    #[serde(default = "default_health_port")]
    pub health_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Half-width of the symmetric swing-point window.
    #[serde(default = "default_swing_half_width")]
    pub swing_half_width: usize,
    /// Minimum valid bars for structural analysis.
    #[serde(default = "default_min_structure_bars")]
    pub min_structure_bars: usize,
    /// Minimum closes for the indicator engine (EMA200).
    #[serde(default = "default_min_indicator_bars")]
    pub min_indicator_bars: usize,
    /// How many of the most recent fair value gaps are retained.
    #[serde(default = "default_fvg_keep_last")]
    pub fvg_keep_last: usize,
    #[serde(default)]
    pub fvg_threshold: FvgThresholds,
}

/// Minimum 3-bar gap size per asset class; a gap must strictly exceed
/// the threshold to register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FvgThresholds {
    #[serde(default = "default_fvg_forex")]
    pub forex: f64,
    #[serde(default = "default_fvg_commodity")]
    pub commodity: f64,
    #[serde(default = "default_fvg_crypto")]
    pub crypto: f64,
}

impl FvgThresholds {
    pub fn for_class(&self, class: AssetClass) -> f64 {
        match class {
            AssetClass::Forex => self.forex,
            AssetClass::Commodity => self.commodity,
            AssetClass::Crypto => self.crypto,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Target reward-to-risk ratio for the first take profit.
    #[serde(default = "default_target_rr")]
    pub target_rr: f64,
    /// Plans below this realised R:R are rejected.
    #[serde(default = "default_min_rr")]
    pub min_rr: f64,
    #[serde(default = "default_account_balance")]
    pub account_balance: f64,
    /// Percent of the account risked per trade.
    #[serde(default = "default_risk_percent")]
    pub risk_percent: f64,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    /// Half-width of the support/resistance swing scan.
    #[serde(default = "default_level_lookback")]
    pub level_lookback: usize,
    #[serde(default = "default_max_risk_pips")]
    pub max_risk_pips: f64,
    #[serde(default = "default_min_risk_pips")]
    pub min_risk_pips: f64,
    #[serde(default = "default_max_risk_percent")]
    pub max_risk_percent: f64,
    #[serde(default = "default_min_risk_percent")]
    pub min_risk_percent: f64,
    /// Smallest tradable unit; position sizes never round below this.
    #[serde(default = "default_min_position_size")]
    pub min_position_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_high_quality_confidence")]
    pub high_quality_confidence: f64,
    #[serde(default = "default_min_signal_count")]
    pub min_signal_count: usize,
    /// Trailing window (bars) for the return-volatility ceiling check.
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,
    #[serde(default)]
    pub volatility_ceiling: VolatilityCeilings,
    #[serde(default = "default_dedup_window_seconds")]
    pub dedup_window_seconds: i64,
    /// UTC hours during which forex signals are withheld.
    #[serde(default = "default_high_impact_hours")]
    pub high_impact_hours: Vec<u32>,
    /// Weekend crypto signals need at least this confidence.
    #[serde(default = "default_high_quality_confidence")]
    pub crypto_weekend_confidence: f64,
    #[serde(default)]
    pub commodity_price_band: PriceBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityCeilings {
    #[serde(default = "default_vol_forex")]
    pub forex: f64,
    #[serde(default = "default_vol_commodity")]
    pub commodity: f64,
    #[serde(default = "default_vol_crypto")]
    pub crypto: f64,
}

impl VolatilityCeilings {
    pub fn for_class(&self, class: AssetClass) -> f64 {
        match class {
            AssetClass::Forex => self.forex,
            AssetClass::Commodity => self.commodity,
            AssetClass::Crypto => self.crypto,
        }
    }
}

/// Sanity band for commodity prices; closes outside it are treated as bad
/// quotes rather than tradable structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,
    #[serde(default = "default_range_days")]
    pub range_days: i64,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_min_structure_bars")]
    pub min_bars: usize,
}

/// Delivery credentials. Empty fields fall back to the TELEGRAM_TOKEN and
/// TELEGRAM_CHAT_ID environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub chat_id: String,
}

fn default_cycle_period_seconds() -> u64 {
    900
}
fn default_error_cooldown_seconds() -> u64 {
    60
}
fn default_health_port() -> u16 {
    5000
}
fn default_swing_half_width() -> usize {
    5
}
fn default_min_structure_bars() -> usize {
    50
}
fn default_min_indicator_bars() -> usize {
    200
}
fn default_fvg_keep_last() -> usize {
    5
}
fn default_fvg_forex() -> f64 {
    0.0001
}
fn default_fvg_commodity() -> f64 {
    0.5
}
fn default_fvg_crypto() -> f64 {
    5.0
}
fn default_target_rr() -> f64 {
    2.5
}
fn default_min_rr() -> f64 {
    1.8
}
fn default_account_balance() -> f64 {
    10_000.0
}
fn default_risk_percent() -> f64 {
    1.0
}
fn default_atr_period() -> usize {
    14
}
fn default_level_lookback() -> usize {
    20
}
fn default_max_risk_pips() -> f64 {
    40.0
}
fn default_min_risk_pips() -> f64 {
    8.0
}
fn default_max_risk_percent() -> f64 {
    2.5
}
fn default_min_risk_percent() -> f64 {
    0.3
}
fn default_min_position_size() -> f64 {
    0.01
}
fn default_min_confidence() -> f64 {
    0.75
}
fn default_high_quality_confidence() -> f64 {
    0.85
}
fn default_min_signal_count() -> usize {
    2
}
fn default_volatility_window() -> usize {
    20
}
fn default_vol_forex() -> f64 {
    0.015
}
fn default_vol_commodity() -> f64 {
    0.025
}
fn default_vol_crypto() -> f64 {
    0.05
}
fn default_dedup_window_seconds() -> i64 {
    3600
}
fn default_high_impact_hours() -> Vec<u32> {
    vec![8, 9, 13, 14]
}
fn default_feed_base_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}
fn default_range_days() -> i64 {
    5
}
fn default_interval() -> String {
    "15m".to_string()
}
fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            swing_half_width: default_swing_half_width(),
            min_structure_bars: default_min_structure_bars(),
            min_indicator_bars: default_min_indicator_bars(),
            fvg_keep_last: default_fvg_keep_last(),
            fvg_threshold: FvgThresholds::default(),
        }
    }
}

impl Default for FvgThresholds {
    fn default() -> Self {
        Self {
            forex: default_fvg_forex(),
            commodity: default_fvg_commodity(),
            crypto: default_fvg_crypto(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            target_rr: default_target_rr(),
            min_rr: default_min_rr(),
            account_balance: default_account_balance(),
            risk_percent: default_risk_percent(),
            atr_period: default_atr_period(),
            level_lookback: default_level_lookback(),
            max_risk_pips: default_max_risk_pips(),
            min_risk_pips: default_min_risk_pips(),
            max_risk_percent: default_max_risk_percent(),
            min_risk_percent: default_min_risk_percent(),
            min_position_size: default_min_position_size(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            high_quality_confidence: default_high_quality_confidence(),
            min_signal_count: default_min_signal_count(),
            volatility_window: default_volatility_window(),
            volatility_ceiling: VolatilityCeilings::default(),
            dedup_window_seconds: default_dedup_window_seconds(),
            high_impact_hours: default_high_impact_hours(),
            crypto_weekend_confidence: default_high_quality_confidence(),
            commodity_price_band: PriceBand::default(),
        }
    }
}

impl Default for VolatilityCeilings {
    fn default() -> Self {
        Self {
            forex: default_vol_forex(),
            commodity: default_vol_commodity(),
            crypto: default_vol_crypto(),
        }
    }
}

impl Default for PriceBand {
    fn default() -> Self {
        Self {
            min: 1800.0,
            max: 2200.0,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_base_url(),
            range_days: default_range_days(),
            interval: default_interval(),
            request_timeout_seconds: default_request_timeout_seconds(),
            min_bars: default_min_structure_bars(),
        }
    }
}

impl BotConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_file("config.json")
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = fs::read_to_string(path).unwrap_or_else(|_| Self::default_config_json());
        let config: BotConfig = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    fn default_config_json() -> String {
        serde_json::to_string_pretty(&Self::default()).unwrap()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            instruments: vec![
                InstrumentSpec::new("EURUSD=X", "EUR/USD", AssetClass::Forex),
                InstrumentSpec::new("GBPUSD=X", "GBP/USD", AssetClass::Forex),
                InstrumentSpec::new("XAUUSD=X", "Gold", AssetClass::Commodity),
                InstrumentSpec::new("BTC-USD", "Bitcoin", AssetClass::Crypto),
            ],
            analysis: AnalysisConfig::default(),
            risk: RiskConfig::default(),
            gate: GateConfig::default(),
            feed: FeedConfig::default(),
            telegram: TelegramConfig::default(),
            cycle_period_seconds: default_cycle_period_seconds(),
            error_cooldown_seconds: default_error_cooldown_seconds(),
            health_port: default_health_port(),
        }
    }
}
