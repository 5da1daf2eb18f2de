//! Widget configuration
//!
//! Every field has a serde default so a host page can pass a partial JSON
//! object (or nothing at all) when mounting the widget.

use crate::error::{Result, WidgetError};
use crate::i18n::Language;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for a mounted widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Base URL of the booking backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Artificial "thinking" delay before scripted replies
    #[serde(
        default = "default_reply_delay",
        serialize_with = "serialize_millis",
        deserialize_with = "deserialize_millis"
    )]
    pub reply_delay: Duration,

    /// Timeout applied to each backend request
    #[serde(
        default = "default_request_timeout",
        serialize_with = "serialize_secs",
        deserialize_with = "deserialize_secs"
    )]
    pub request_timeout: Duration,

    /// Price of one ticket in minor currency units
    #[serde(default = "default_ticket_unit_price")]
    pub ticket_unit_price: u64,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Publishable key handed to the checkout overlay
    #[serde(default = "default_checkout_key")]
    pub checkout_key: String,

    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,

    /// Location printed on tickets
    #[serde(default = "default_museum_location")]
    pub museum_location: String,

    #[serde(default = "default_theme_color")]
    pub theme_color: String,

    #[serde(default)]
    pub default_language: Language,

    /// How many days ahead (starting tomorrow) can be booked
    #[serde(default = "default_bookable_days")]
    pub bookable_days: u32,

    #[serde(default = "default_max_tickets")]
    pub max_tickets: u32,
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_reply_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_ticket_unit_price() -> u64 {
    10_000
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_checkout_key() -> String {
    "rzp_test_key".to_string()
}

fn default_merchant_name() -> String {
    "Museum of Natural History".to_string()
}

fn default_museum_location() -> String {
    "Museum of Natural History, New York".to_string()
}

fn default_theme_color() -> String {
    "#8B5CF6".to_string()
}

fn default_bookable_days() -> u32 {
    7
}

fn default_max_tickets() -> u32 {
    10
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

fn serialize_secs<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            reply_delay: default_reply_delay(),
            request_timeout: default_request_timeout(),
            ticket_unit_price: default_ticket_unit_price(),
            currency: default_currency(),
            checkout_key: default_checkout_key(),
            merchant_name: default_merchant_name(),
            museum_location: default_museum_location(),
            theme_color: default_theme_color(),
            default_language: Language::default(),
            bookable_days: default_bookable_days(),
            max_tickets: default_max_tickets(),
        }
    }
}

impl WidgetConfig {
    /// Parse a (possibly partial) JSON configuration object
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from `MUSEUM_CHAT_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("MUSEUM_CHAT_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(key) = std::env::var("MUSEUM_CHAT_CHECKOUT_KEY") {
            config.checkout_key = key;
        }
        if let Ok(lang) = std::env::var("MUSEUM_CHAT_LANGUAGE") {
            config.default_language = Language::from_code(&lang);
        }
        if let Ok(delay) = std::env::var("MUSEUM_CHAT_REPLY_DELAY_MS") {
            let millis = delay.parse::<u64>().map_err(|e| {
                WidgetError::Configuration(format!("MUSEUM_CHAT_REPLY_DELAY_MS: {}", e))
            })?;
            config.reply_delay = Duration::from_millis(millis);
        }
        if let Ok(price) = std::env::var("MUSEUM_CHAT_TICKET_PRICE") {
            config.ticket_unit_price = price.parse::<u64>().map_err(|e| {
                WidgetError::Configuration(format!("MUSEUM_CHAT_TICKET_PRICE: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the flows rely on
    pub fn validate(&self) -> Result<()> {
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            return Err(WidgetError::Configuration(format!(
                "backend_url must start with http:// or https://, got {}",
                self.backend_url
            )));
        }
        if self.max_tickets == 0 {
            return Err(WidgetError::Configuration(
                "max_tickets must be at least 1".to_string(),
            ));
        }
        if self.bookable_days == 0 {
            return Err(WidgetError::Configuration(
                "bookable_days must be at least 1".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(WidgetError::Configuration(
                "currency must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// URL of a backend endpoint, e.g. `verify-otp`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.backend_url.trim_end_matches('/'), endpoint)
    }
}
