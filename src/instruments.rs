use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Forex,
    Commodity,
    Crypto,
}

/// Static metadata for one tradable instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Provider symbol, e.g. "EURUSD=X" or "BTC-USD".
    pub symbol: String,
    /// Human-readable name used in delivered messages, e.g. "EUR/USD".
    pub display_name: String,
    pub asset_class: AssetClass,
    /// Scales the ATR fallback distances for instruments that quote in
    /// very different price magnitudes.
    #[serde(default = "default_volatility_multiplier")]
    pub volatility_multiplier: f64,
}

fn default_volatility_multiplier() -> f64 {
    1.0
}

impl InstrumentSpec {
    pub fn new(symbol: &str, display_name: &str, asset_class: AssetClass) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            asset_class,
            volatility_multiplier: default_volatility_multiplier(),
        }
    }

    /// Forex risk is expressed in pips (1e-4 of quote currency).
    pub fn is_forex(&self) -> bool {
        self.asset_class == AssetClass::Forex
    }

    pub fn price_to_pips(&self, distance: f64) -> f64 {
        distance * 10_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pip_conversion() {
        let spec = InstrumentSpec::new("EURUSD=X", "EUR/USD", AssetClass::Forex);
        assert!(spec.is_forex());
        assert!((spec.price_to_pips(0.0025) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn asset_class_serde_lowercase() {
        let json = serde_json::to_string(&AssetClass::Commodity).unwrap();
        assert_eq!(json, "\"commodity\"");
        let back: AssetClass = serde_json::from_str("\"crypto\"").unwrap();
        assert_eq!(back, AssetClass::Crypto);
    }
}
