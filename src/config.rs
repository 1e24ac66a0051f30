//! Process configuration
//!
//! Everything the service needs from its environment is read once, at
//! startup, into a [`Config`] that is then handed to the components.

use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{debug, info};

pub const TOKEN_VAR: &str = "TP_API_TOKEN";

pub const DEFAULT_PRICES_URL: &str = "https://api.travelpayouts.com/aviasales/v3/prices_for_dates";
pub const DEFAULT_SPECIAL_OFFERS_URL: &str =
    "https://api.travelpayouts.com/aviasales/v3/get_special_offers";
pub const DEFAULT_AUTOCOMPLETE_URL: &str = "https://autocomplete.travelpayouts.com/places2";
pub const DEFAULT_BOOKING_BASE_URL: &str = "https://www.aviasales.com";

/// Destinations swept by the curated "Adventure Anywhere" strategy, with display names.
pub const CURATED_DESTINATIONS: &[(&str, &str)] = &[
    ("LHR", "London Heathrow"),
    ("CDG", "Paris Charles de Gaulle"),
    ("JFK", "New York John F. Kennedy"),
    ("LAX", "Los Angeles"),
    ("MIA", "Miami"),
    ("CUN", "Cancun"),
    ("BCN", "Barcelona"),
    ("FCO", "Rome Fiumicino"),
    ("AMS", "Amsterdam Schiphol"),
    ("IST", "Istanbul"),
    ("DXB", "Dubai"),
    ("NRT", "Tokyo Narita"),
    ("SIN", "Singapore Changi"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {0} env var")]
    MissingToken(String),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Upstream endpoint that backs a search without destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnywhereStrategy {
    /// One special-offers query per origin
    #[default]
    SpecialOffers,
    /// Direct-only price sweep over the curated destination list
    Curated,
}

impl FromStr for AnywhereStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "special-offers" | "special_offers" | "offers" => Ok(AnywhereStrategy::SpecialOffers),
            "curated" => Ok(AnywhereStrategy::Curated),
            _ => Err(ConfigError::Invalid {
                key: "SPONTARIA_ANYWHERE_MODE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: Option<String>,
    pub prices_url: String,
    pub special_offers_url: String,
    pub autocomplete_url: String,
    pub booking_base_url: String,
    pub currency: String,
    pub locale: String,
    pub anywhere_strategy: AnywhereStrategy,
    pub candidate_destinations: Vec<String>,
    pub concurrency: usize,
    pub bind: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: None,
            prices_url: DEFAULT_PRICES_URL.to_string(),
            special_offers_url: DEFAULT_SPECIAL_OFFERS_URL.to_string(),
            autocomplete_url: DEFAULT_AUTOCOMPLETE_URL.to_string(),
            booking_base_url: DEFAULT_BOOKING_BASE_URL.to_string(),
            currency: "usd".to_string(),
            locale: "en".to_string(),
            anywhere_strategy: AnywhereStrategy::default(),
            candidate_destinations: CURATED_DESTINATIONS
                .iter()
                .map(|(code, _)| code.to_string())
                .collect(),
            concurrency: 4,
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let candidate_destinations = match get("SPONTARIA_CANDIDATES") {
            Some(raw) => crate::parse_codes(&raw),
            None => defaults.candidate_destinations,
        };

        let concurrency: usize = parse_or(get("SPONTARIA_CONCURRENCY"), "SPONTARIA_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "SPONTARIA_CONCURRENCY".to_string(),
                value: "0".to_string(),
            });
        }

        let config = Self {
            api_token: get(TOKEN_VAR),
            prices_url: get("SPONTARIA_PRICES_URL").unwrap_or(defaults.prices_url),
            special_offers_url: get("SPONTARIA_SPECIAL_OFFERS_URL").unwrap_or(defaults.special_offers_url),
            autocomplete_url: get("SPONTARIA_AUTOCOMPLETE_URL").unwrap_or(defaults.autocomplete_url),
            booking_base_url: get("SPONTARIA_BOOKING_BASE_URL").unwrap_or(defaults.booking_base_url),
            currency: get("SPONTARIA_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or(defaults.currency),
            locale: get("SPONTARIA_LOCALE").unwrap_or(defaults.locale),
            anywhere_strategy: match get("SPONTARIA_ANYWHERE_MODE") {
                Some(mode) => mode.parse()?,
                None => defaults.anywhere_strategy,
            },
            candidate_destinations,
            concurrency,
            bind: get("SPONTARIA_BIND").unwrap_or(defaults.bind),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
        };

        info!(
            has_token = config.api_token.is_some(),
            anywhere_strategy = ?config.anywhere_strategy,
            candidates = config.candidate_destinations.len(),
            concurrency = config.concurrency,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// The upstream access token, required for every pricing call.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingToken(TOKEN_VAR.to_string()))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match raw {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// Display name of a curated airport, if it is one.
pub fn curated_name(code: &str) -> Option<&'static str> {
    CURATED_DESTINATIONS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(config.api_token.is_none());
        assert_eq!(config.currency, "usd");
        assert_eq!(config.anywhere_strategy, AnywhereStrategy::SpecialOffers);
        assert_eq!(config.candidate_destinations.len(), 13);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TP_API_TOKEN", " secret "),
            ("SPONTARIA_ANYWHERE_MODE", "curated"),
            ("SPONTARIA_CANDIDATES", "lis, opo"),
            ("SPONTARIA_CURRENCY", "EUR"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.require_token().unwrap(), "secret");
        assert_eq!(config.anywhere_strategy, AnywhereStrategy::Curated);
        assert_eq!(config.candidate_destinations, vec!["LIS", "OPO"]);
        assert_eq!(config.currency, "eur");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PORT", "eighty")])),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(Config::from_lookup(lookup_from(&[("SPONTARIA_CONCURRENCY", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SPONTARIA_ANYWHERE_MODE", "random")])).is_err());
    }

    #[test]
    fn test_blank_token_is_missing() {
        let config = Config::default().with_token("   ");
        assert!(matches!(config.require_token(), Err(ConfigError::MissingToken(_))));
    }

    #[test]
    fn test_curated_name_lookup() {
        assert_eq!(curated_name("lhr"), Some("London Heathrow"));
        assert_eq!(curated_name("XXX"), None);
    }
}
