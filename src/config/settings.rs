use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::UpgradeError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub merchant: MerchantConfig,
    pub checkout: CheckoutConfig,
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantConfig {
    pub key_id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub theme_color: String,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            key_id: "rzp_test_placeholder".to_string(),
            name: "EasyPSC".to_string(),
            description: "Premium Subscription".to_string(),
            image: "/logo.png".to_string(),
            theme_color: "#6366f1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub base_url: String,
    /// Amount in the smallest currency unit.
    pub amount_minor: u64,
    pub currency: String,
    pub load_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            base_url: "https://checkout.razorpay.com".to_string(),
            amount_minor: 999 * 100,
            currency: "INR".to_string(),
            load_timeout_ms: 10_000,
            poll_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { delay_ms: 2_000 }
    }
}

impl Settings {
    pub fn load() -> Result<Self, UpgradeError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, UpgradeError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| UpgradeError::Config(e.to_string()))
    }

    fn find_config_file() -> Option<String> {
        let possible_names = ["custom-config.toml", "config.toml"];

        for name in &possible_names {
            if Path::new(name).exists() {
                return Some(name.to_string());
            }
        }

        None
    }
}
