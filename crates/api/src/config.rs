//! Process configuration read from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;

use rust_decimal::Decimal;

use galley_infra::GalleyConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub galley: GalleyConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            galley: GalleyConfig::default(),
        }
    }
}

impl ApiConfig {
    /// `GALLEY_BIND_ADDR`, `GALLEY_TAX_RATE`, `GALLEY_DELIVERY_FEE`,
    /// `GALLEY_CHEFS`, `GALLEY_STATIONS`, `GALLEY_TABLES`.
    ///
    /// Unparsable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let galley = defaults.galley;

        Self {
            bind_addr: scalar(&lookup, "GALLEY_BIND_ADDR", defaults.bind_addr),
            galley: GalleyConfig {
                tax_rate: non_negative(&lookup, "GALLEY_TAX_RATE", galley.tax_rate),
                delivery_fee: non_negative(&lookup, "GALLEY_DELIVERY_FEE", galley.delivery_fee),
                chefs: list(&lookup, "GALLEY_CHEFS", galley.chefs),
                stations: list(&lookup, "GALLEY_STATIONS", galley.stations),
                tables: list(&lookup, "GALLEY_TABLES", galley.tables),
            },
        }
    }
}

fn scalar<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(key, value = %raw, default = %default, "invalid config value; using default");
            default
        }
    }
}

fn non_negative(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Decimal) -> Decimal {
    let v = scalar(lookup, key, default);
    if v < Decimal::ZERO {
        tracing::warn!(key, value = %v, default = %default, "negative config value; using default");
        return default;
    }
    v
}

/// Comma-separated list; blank entries are ignored. Any bad entry or an
/// empty result falls back to the whole default list.
fn list<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Vec<T>) -> Vec<T> {
    let Some(raw) = lookup(key) else {
        return default;
    };
    let parsed: Result<Vec<T>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect();
    match parsed {
        Ok(values) if !values.is_empty() => values,
        _ => {
            tracing::warn!(key, value = %raw, "invalid config list; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ApiConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn reads_values_from_the_environment() {
        let cfg = config(&[
            ("GALLEY_BIND_ADDR", "127.0.0.1:9000"),
            ("GALLEY_TAX_RATE", "8.5"),
            ("GALLEY_CHEFS", "Ana, Ben ,,Cy"),
            ("GALLEY_TABLES", "1,2,10"),
        ]);
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.galley.tax_rate, dec!(8.5));
        assert_eq!(cfg.galley.chefs, ["Ana", "Ben", "Cy"]);
        assert_eq!(cfg.galley.tables, [1, 2, 10]);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let cfg = config(&[
            ("GALLEY_BIND_ADDR", "nowhere"),
            ("GALLEY_DELIVERY_FEE", "-3"),
            ("GALLEY_TABLES", "1,two"),
            ("GALLEY_STATIONS", " , "),
        ]);
        let defaults = ApiConfig::default();
        assert_eq!(cfg.bind_addr, defaults.bind_addr);
        assert_eq!(cfg.galley.delivery_fee, Decimal::ZERO);
        assert_eq!(cfg.galley.tables, defaults.galley.tables);
        assert_eq!(cfg.galley.stations, defaults.galley.stations);
        assert_eq!(DEFAULT_BIND_ADDR.parse::<SocketAddr>().ok(), Some(defaults.bind_addr));
    }
}
