//! Application settings loaded from config.toml
//!
//! Every section is optional; missing values fall back to the usual French
//! building-trade defaults (20 % VAT, 30 days of validity and payment terms).
//! The file location can be overridden with the `CONFIG_PATH` environment
//! variable.

use crate::{
    core::{
        line_item::DEFAULT_TAX_RATE_PERCENT, numbering::NumberingFormat, quote::Quote,
        totals::MAX_DEPOSIT_PERCENT,
    },
    errors::{Error, Result},
};
use chrono::Days;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[numbering.quote]` and `[numbering.invoice]`
    pub numbering: NumberingConfig,
    /// `[defaults]`
    pub defaults: DefaultsConfig,
}

/// Number formats of each document type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    /// Quote numbers, `DEVIS-2026-001` by default
    pub quote: NumberingFormat,
    /// Invoice numbers, `FACT-2026-001` by default
    pub invoice: NumberingFormat,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            quote: NumberingFormat::quotes(),
            invoice: NumberingFormat::invoices(),
        }
    }
}

/// Values applied to new quotes and invoices
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Tax rate of new billable rows, in percent
    pub tax_rate_percent: Decimal,
    /// Deposit requested on new quotes, in percent
    pub deposit_percent: u8,
    /// Days a quote stays valid after its issue date
    pub validity_days: u32,
    /// Days between an invoice and its due date
    pub payment_terms_days: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
            deposit_percent: 30,
            validity_days: 30,
            payment_terms_days: 30,
        }
    }
}

const BILLABLE_TAGS: [&str; 3] = ["material", "labor", "work"];
const TAX_RATE_KEYS: [&str; 2] = ["taxRatePercent", "vatRate"];

impl DefaultsConfig {
    /// Fills a raw quote payload where it leaves out the deposit or the tax
    /// rate of a billable row. Explicit values, `0` included, are kept.
    pub fn fill_payload(&self, payload: &mut Value) {
        let Some(quote) = payload.as_object_mut() else {
            return;
        };
        if quote.get("depositPercent").is_none_or(Value::is_null) {
            quote.insert("depositPercent".into(), Value::from(self.deposit_percent));
        }

        let rows = quote.get_mut("lineItems").and_then(Value::as_array_mut);
        for row in rows.into_iter().flatten().filter_map(Value::as_object_mut) {
            let billable = row
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|tag| BILLABLE_TAGS.contains(&tag));
            let has_rate = TAX_RATE_KEYS
                .iter()
                .any(|key| row.get(*key).is_some_and(|v| !v.is_null()));
            if billable && !has_rate {
                for key in TAX_RATE_KEYS {
                    row.remove(key);
                }
                row.insert(
                    TAX_RATE_KEYS[0].into(),
                    Value::String(self.tax_rate_percent.to_string()),
                );
            }
        }
    }

    /// Sets `valid_until` from the issue date when the quote has none.
    pub fn fill_validity(&self, quote: &mut Quote) {
        if quote.valid_until.is_none() {
            quote.valid_until = quote
                .issue_date
                .checked_add_days(Days::new(u64::from(self.validity_days)));
        }
    }
}

impl AppConfig {
    /// Checks value ranges.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.numbering.quote.validate()?;
        self.numbering.invoice.validate()?;

        let defaults = &self.defaults;
        if defaults.tax_rate_percent < Decimal::ZERO
            || defaults.tax_rate_percent > Decimal::ONE_HUNDRED
        {
            return Err(Error::Config {
                message: format!(
                    "defaults.tax_rate_percent must be between 0 and 100, got {}",
                    defaults.tax_rate_percent
                ),
            });
        }
        if defaults.deposit_percent > MAX_DEPOSIT_PERCENT {
            return Err(Error::Config {
                message: format!(
                    "defaults.deposit_percent must be at most {MAX_DEPOSIT_PERCENT}, got {}",
                    defaults.deposit_percent
                ),
            });
        }
        Ok(())
    }
}

/// Parses and validates configuration text.
///
/// # Errors
/// Returns `Error::Config` for invalid TOML or out-of-range values.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    tracing::debug!("Loading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `CONFIG_PATH`, or ./config.toml.
///
/// A missing default file is not an error: the built-in defaults are used.
/// A missing file explicitly named by `CONFIG_PATH` is.
pub fn load_default_config() -> Result<AppConfig> {
    match std::env::var("CONFIG_PATH") {
        Ok(path) => load_config(path),
        Err(_) if !Path::new(DEFAULT_CONFIG_PATH).exists() => {
            tracing::info!("No {DEFAULT_CONFIG_PATH} found, using default settings");
            Ok(AppConfig::default())
        }
        Err(_) => load_config(DEFAULT_CONFIG_PATH),
    }
}
