//! # Client Configuration
//!
//! Configuration management for the cashier client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     KASIR_API_URL=https://pos.example.id/api                            │
//! │     KASIR_TIMEOUT_SECS=20                                               │
//! │     KASIR_CURRENCY=IDR   KASIR_CURRENCY_DECIMALS=0                      │
//! │     KASIR_SESSION_PATH=/var/lib/kasir/session.json                      │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/kasir-pos/kasir.toml (Linux)                              │
//! │     ~/Library/Application Support/id.kasir.kasir-pos/kasir.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     http://localhost:8080/api, 15s timeout, IDR                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kasir.toml
//! [api]
//! base_url = "http://localhost:8080/api"
//! timeout_secs = 15
//! per_page = 20
//!
//! [currency]
//! code = "IDR"
//! symbol = "Rp"
//! decimals = 0
//! thousands_separator = "."
//! decimal_separator = ","
//! space_after_symbol = true
//!
//! [session]
//! # path = "/var/lib/kasir/session.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use kasir_core::{Money, ValidationError};

use crate::error::{ConfigError, ConfigResult};

const QUALIFIER: &str = "id";
const ORGANIZATION: &str = "kasir";
const APPLICATION: &str = "kasir-pos";

// =============================================================================
// API Settings
// =============================================================================

/// Where the REST backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL including the `/api` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Page size for product and customer searches.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_per_page() -> u32 {
    20
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            per_page: default_per_page(),
        }
    }
}

// =============================================================================
// Currency Format
// =============================================================================

/// How amounts are displayed and how many minor units make one major unit.
///
/// ## Presets
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  code   symbol   decimals   thousands   decimal   example               │
/// │  ────   ──────   ────────   ─────────   ───────   ───────────────       │
/// │  IDR    Rp       0          .           ,         Rp 18.000             │
/// │  USD    $        2          ,           .         $1,234.50             │
/// │  other  <code>   2          ,           .         SGD 12.00             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    /// ISO 4217 code.
    pub code: String,
    pub symbol: String,
    /// Digits after the decimal separator; also the wire scale.
    pub decimals: u32,
    pub thousands_separator: String,
    pub decimal_separator: String,
    #[serde(default = "default_true")]
    pub space_after_symbol: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat::for_code("IDR")
    }
}

impl CurrencyFormat {
    /// Returns the preset for an ISO 4217 code (case-insensitive).
    pub fn for_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        match code.as_str() {
            "IDR" => CurrencyFormat {
                code,
                symbol: "Rp".to_string(),
                decimals: 0,
                thousands_separator: ".".to_string(),
                decimal_separator: ",".to_string(),
                space_after_symbol: true,
            },
            "USD" => CurrencyFormat {
                code,
                symbol: "$".to_string(),
                decimals: 2,
                thousands_separator: ",".to_string(),
                decimal_separator: ".".to_string(),
                space_after_symbol: false,
            },
            _ => CurrencyFormat {
                symbol: code.clone(),
                code,
                decimals: 2,
                thousands_separator: ",".to_string(),
                decimal_separator: ".".to_string(),
                space_after_symbol: true,
            },
        }
    }

    /// Minor units per major unit (10^decimals).
    pub fn minor_per_major(&self) -> i64 {
        10i64.pow(self.decimals)
    }

    /// Parses an amount typed by the cashier.
    ///
    /// Accepts an optional leading symbol and thousands separators.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_client::config::CurrencyFormat;
    ///
    /// let idr = CurrencyFormat::for_code("IDR");
    /// assert_eq!(idr.parse_amount("Rp 18.000").unwrap().minor(), 18_000);
    ///
    /// let usd = CurrencyFormat::for_code("USD");
    /// assert_eq!(usd.parse_amount("12.5").unwrap().minor(), 1_250);
    /// ```
    pub fn parse_amount(&self, input: &str) -> Result<Money, ValidationError> {
        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("expected a number with at most {} decimals", self.decimals),
        };

        let trimmed = input.trim();
        let without_symbol = trimmed.strip_prefix(self.symbol.as_str()).unwrap_or(trimmed);
        let mut cleaned: String = without_symbol.chars().filter(|c| !c.is_whitespace()).collect();
        if !self.thousands_separator.is_empty() {
            cleaned = cleaned.replace(self.thousands_separator.as_str(), "");
        }

        let (whole, frac) = match cleaned.split_once(self.decimal_separator.as_str()) {
            Some((whole, frac)) => (whole, frac),
            None => (cleaned.as_str(), ""),
        };

        if whole.is_empty()
            || frac.len() > self.decimals as usize
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = self.decimals as usize);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(self.minor_per_major())
            .and_then(|w| w.checked_add(frac))
            .map(Money::from_minor)
            .ok_or_else(invalid)
    }
}

/// Renders an amount for the cashier or a receipt.
///
/// ## Example
/// ```rust
/// use kasir_client::config::{format_money, CurrencyFormat};
/// use kasir_core::Money;
///
/// let idr = CurrencyFormat::for_code("IDR");
/// assert_eq!(format_money(Money::from_minor(18_000), &idr), "Rp 18.000");
///
/// let usd = CurrencyFormat::for_code("USD");
/// assert_eq!(format_money(Money::from_minor(123_450), &usd), "$1,234.50");
/// ```
pub fn format_money(amount: Money, format: &CurrencyFormat) -> String {
    let minor = amount.minor();
    let abs = minor.unsigned_abs();
    let scale = format.minor_per_major().unsigned_abs();

    let mut out = String::new();
    if minor < 0 {
        out.push('-');
    }
    out.push_str(&format.symbol);
    if format.space_after_symbol {
        out.push(' ');
    }
    out.push_str(&group_thousands(abs / scale, &format.thousands_separator));

    if format.decimals > 0 {
        out.push_str(&format.decimal_separator);
        out.push_str(&format!(
            "{:0width$}",
            abs % scale,
            width = format.decimals as usize
        ));
    }
    out
}

fn group_thousands(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Session Settings
// =============================================================================

/// Where the persisted auth session lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Explicit session file. Defaults to `session.json` in the data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub currency: CurrencyFormat,

    #[serde(default)]
    pub session: SessionSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (kasir.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if !(1..=100).contains(&self.api.per_page) {
            return Err(ConfigError::Invalid(
                "per_page must be between 1 and 100".into(),
            ));
        }

        if self.currency.decimals > 4 {
            return Err(ConfigError::Invalid(
                "currency decimals must be at most 4".into(),
            ));
        }

        if self.currency.decimal_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "currency decimal_separator must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("KASIR_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(timeout) = lookup("KASIR_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid KASIR_TIMEOUT_SECS"),
            }
        }

        if let Some(code) = lookup("KASIR_CURRENCY") {
            debug!(currency = %code, "Overriding currency from environment");
            self.currency = CurrencyFormat::for_code(&code);
        }

        if let Some(decimals) = lookup("KASIR_CURRENCY_DECIMALS") {
            match decimals.parse::<u32>() {
                Ok(d) => self.currency.decimals = d,
                Err(_) => warn!(value = %decimals, "Ignoring invalid KASIR_CURRENCY_DECIMALS"),
            }
        }

        if let Some(path) = lookup("KASIR_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.config_dir().join("kasir.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parsed base URL.
    pub fn base_url(&self) -> ConfigResult<Url> {
        Ok(Url::parse(&self.api.base_url)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Session file: the configured path, else `session.json` in the data dir.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session.path.clone().or_else(|| {
            directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
                .map(|dirs| dirs.data_dir().join("session.json"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.currency.code, "IDR");
        assert_eq!(config.currency.decimals, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://pos.example.id/api".to_string();
        assert!(config.validate().is_ok());

        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.api.timeout_secs = 5;

        config.currency.decimals = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("KASIR_API_URL", "https://pos.example.id/api"),
            ("KASIR_TIMEOUT_SECS", "30"),
            ("KASIR_CURRENCY", "usd"),
            ("KASIR_SESSION_PATH", "/tmp/kasir-session.json"),
        ]);
        let mut config = ClientConfig::default();
        config.apply_overrides_from(|key| vars.get(key).cloned());

        assert_eq!(config.api.base_url, "https://pos.example.id/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.currency.code, "USD");
        assert_eq!(config.currency.decimals, 2);
        assert_eq!(
            config.session_path(),
            Some(PathBuf::from("/tmp/kasir-session.json"))
        );
    }

    #[test]
    fn test_env_decimals_apply_after_currency() {
        let vars = env(&[("KASIR_CURRENCY", "IDR"), ("KASIR_CURRENCY_DECIMALS", "2")]);
        let mut config = ClientConfig::default();
        config.apply_overrides_from(|key| vars.get(key).cloned());

        assert_eq!(config.currency.symbol, "Rp");
        assert_eq!(config.currency.decimals, 2);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let vars = env(&[("KASIR_TIMEOUT_SECS", "soon")]);
        let mut config = ClientConfig::default();
        config.apply_overrides_from(|key| vars.get(key).cloned());
        assert_eq!(config.api.timeout_secs, 15);
    }

    #[test]
    fn test_toml_roundtrip_with_partial_file() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://10.0.0.5:8080/api"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.api.per_page, 20);
        assert_eq!(config.currency, CurrencyFormat::for_code("IDR"));

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[currency]"));
    }

    #[test]
    fn test_format_money_idr() {
        let idr = CurrencyFormat::for_code("IDR");
        assert_eq!(format_money(Money::from_minor(18_000), &idr), "Rp 18.000");
        assert_eq!(format_money(Money::from_minor(0), &idr), "Rp 0");
        assert_eq!(format_money(Money::from_minor(999), &idr), "Rp 999");
        assert_eq!(format_money(Money::from_minor(1_250_000), &idr), "Rp 1.250.000");
        assert_eq!(format_money(Money::from_minor(-4_000), &idr), "-Rp 4.000");
    }

    #[test]
    fn test_format_money_with_decimals() {
        let usd = CurrencyFormat::for_code("USD");
        assert_eq!(format_money(Money::from_minor(5), &usd), "$0.05");
        assert_eq!(format_money(Money::from_minor(123_450), &usd), "$1,234.50");

        let sgd = CurrencyFormat::for_code("sgd");
        assert_eq!(format_money(Money::from_minor(1_200), &sgd), "SGD 12.00");
    }

    #[test]
    fn test_parse_amount() {
        let idr = CurrencyFormat::for_code("IDR");
        assert_eq!(idr.parse_amount("20000").unwrap().minor(), 20_000);
        assert_eq!(idr.parse_amount("20.000").unwrap().minor(), 20_000);
        assert_eq!(idr.parse_amount(" Rp 1.500.000 ").unwrap().minor(), 1_500_000);
        assert!(idr.parse_amount("20000,50").is_err());
        assert!(idr.parse_amount("-5").is_err());
        assert!(idr.parse_amount("").is_err());
        assert!(idr.parse_amount("abc").is_err());

        let usd = CurrencyFormat::for_code("USD");
        assert_eq!(usd.parse_amount("$1,234.5").unwrap().minor(), 123_450);
        assert_eq!(usd.parse_amount("0.05").unwrap().minor(), 5);
        assert!(usd.parse_amount("1.005").is_err());
    }
}
