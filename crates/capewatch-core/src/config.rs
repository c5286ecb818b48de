//! Runtime configuration.
//!
//! Defaults point at the public upstreams. `from_env` overlays `CAPEWATCH_*`
//! variables; CLI flags are applied on top by the caller.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::adapters::{DEFAULT_BINANCE_URL, DEFAULT_CAPE_URL, DEFAULT_YAHOO_URL};
use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::ledger::DEFAULT_LEDGER_KEY;

const ENV_PREFIX: &str = "CAPEWATCH_";

/// Upstream endpoints and request parameters for [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub primary_symbol: String,
    pub primary_limit: usize,
    pub binance_url: String,
    pub secondary_symbol: String,
    pub secondary_range: String,
    pub yahoo_url: String,
    pub cape_url: String,
    pub timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_symbol: String::from("BTCUSDT"),
            primary_limit: 500,
            binance_url: String::from(DEFAULT_BINANCE_URL),
            secondary_symbol: String::from("NVDA"),
            secondary_range: String::from("5y"),
            yahoo_url: String::from(DEFAULT_YAHOO_URL),
            cape_url: String::from(DEFAULT_CAPE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Overlays values from `lookup` (keyed by full variable name) on the
    /// defaults. Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}{suffix}")).filter(|value| !value.trim().is_empty())
        };
        let defaults = Self::default();

        Self {
            primary_symbol: var("PRIMARY_SYMBOL").unwrap_or(defaults.primary_symbol),
            primary_limit: parse_or("PRIMARY_LIMIT", var("PRIMARY_LIMIT"), defaults.primary_limit),
            binance_url: var("BINANCE_URL").unwrap_or(defaults.binance_url),
            secondary_symbol: var("SECONDARY_SYMBOL").unwrap_or(defaults.secondary_symbol),
            secondary_range: var("SECONDARY_RANGE").unwrap_or(defaults.secondary_range),
            yahoo_url: var("YAHOO_URL").unwrap_or(defaults.yahoo_url),
            cape_url: var("CAPE_URL").unwrap_or(defaults.cape_url),
            timeout_ms: parse_or("TIMEOUT_MS", var("TIMEOUT_MS"), defaults.timeout_ms),
        }
    }
}

/// Where the purchase ledger lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub dir: PathBuf,
    pub key: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dir: default_ledger_dir(env::var_os("HOME").map(PathBuf::from)),
            key: String::from(DEFAULT_LEDGER_KEY),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}{suffix}")).filter(|value| !value.trim().is_empty())
        };

        Self {
            dir: var("LEDGER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_ledger_dir(lookup("HOME").map(PathBuf::from))),
            key: var("LEDGER_KEY").unwrap_or_else(|| String::from(DEFAULT_LEDGER_KEY)),
        }
    }
}

fn default_ledger_dir(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) if !home.as_os_str().is_empty() => home.join(".capewatch"),
        _ => PathBuf::from(".capewatch"),
    }
}

fn parse_or<T: FromStr + Copy>(suffix: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(
                variable = %format!("{ENV_PREFIX}{suffix}"),
                value = %raw,
                "ignoring unparseable configuration value"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_target_public_upstreams() {
        let config = PipelineConfig::from_lookup(|_| None);
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.primary_symbol, "BTCUSDT");
        assert_eq!(config.primary_limit, 500);
        assert_eq!(config.secondary_range, "5y");
        assert_eq!(config.timeout_ms, 10_000);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            ("CAPEWATCH_PRIMARY_SYMBOL", "ETHUSDT"),
            ("CAPEWATCH_PRIMARY_LIMIT", "52"),
            ("CAPEWATCH_CAPE_URL", "http://localhost:9000/cape"),
            ("CAPEWATCH_TIMEOUT_MS", "2500"),
        ]));

        assert_eq!(config.primary_symbol, "ETHUSDT");
        assert_eq!(config.primary_limit, 52);
        assert_eq!(config.cape_url, "http://localhost:9000/cape");
        assert_eq!(config.timeout_ms, 2_500);
        assert_eq!(config.secondary_symbol, "NVDA");
    }

    #[test]
    fn invalid_numbers_and_blank_values_fall_back_to_defaults() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            ("CAPEWATCH_PRIMARY_LIMIT", "lots"),
            ("CAPEWATCH_TIMEOUT_MS", "-1"),
            ("CAPEWATCH_SECONDARY_SYMBOL", "  "),
        ]));

        assert_eq!(config.primary_limit, 500);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.secondary_symbol, "NVDA");
    }

    #[test]
    fn ledger_dir_prefers_explicit_variable_then_home() {
        let explicit = LedgerConfig::from_lookup(lookup_from(&[
            ("CAPEWATCH_LEDGER_DIR", "/tmp/ledger"),
            ("HOME", "/home/someone"),
        ]));
        assert_eq!(explicit.dir, PathBuf::from("/tmp/ledger"));
        assert_eq!(explicit.key, "btc_dca_records");

        let home = LedgerConfig::from_lookup(lookup_from(&[("HOME", "/home/someone")]));
        assert_eq!(home.dir, PathBuf::from("/home/someone/.capewatch"));

        let bare = LedgerConfig::from_lookup(|_| None);
        assert_eq!(bare.dir, PathBuf::from(".capewatch"));
    }
}
