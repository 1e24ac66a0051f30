//! # Spontaria
//!
//! Backend for the Spontaria flight search front end. It proxies airport
//! autocomplete lookups and aggregates flight offers from the Travelpayouts
//! pricing API across several origins, normalizing the upstream records into
//! one shape, collapsing duplicates and ordering the result.

pub mod aggregator;
pub mod autocomplete;
pub mod config;
pub mod dedup;
pub mod filter;
pub mod http;
pub mod logging;
pub mod normalize;
pub mod upstream;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

// Re-export main types for convenience
pub use aggregator::FlightAggregator;
pub use autocomplete::AirportAutocomplete;
pub use config::{AnywhereStrategy, Config, ConfigError};
pub use dedup::{dedup_cheapest, DedupKey};
pub use filter::ResultFilter;
pub use upstream::{FlightsUpstream, PriceQuery, SharedUpstream, TravelpayoutsClient, UpstreamError};

/// Error types for the spontaria library
#[derive(Error, Debug)]
pub enum SpontariaError {
    #[error("At least one origin required")]
    MissingOrigin,

    #[error("Invalid date format: {0}")]
    DateParseError(String),

    #[error("Invalid time format: {0}")]
    TimeParseError(String),

    #[error("Invalid parameter: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),
}

impl SpontariaError {
    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SpontariaError::MissingOrigin
                | SpontariaError::DateParseError(_)
                | SpontariaError::TimeParseError(_)
                | SpontariaError::ParseError(_)
        )
    }
}

/// Departure time-of-day window, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub earliest_minute: u32, // minutes after midnight, 0-1439
    pub latest_minute: u32,   // minutes after midnight, 0-1439
}

impl TimeWindow {
    pub const MINUTES_PER_DAY: u32 = 24 * 60;

    /// Create a new TimeWindow
    pub fn new(earliest_minute: u32, latest_minute: u32) -> Result<Self, SpontariaError> {
        if earliest_minute >= Self::MINUTES_PER_DAY {
            return Err(SpontariaError::TimeParseError(format!(
                "earliest minute must be 0-1439, got {}",
                earliest_minute
            )));
        }
        if latest_minute >= Self::MINUTES_PER_DAY {
            return Err(SpontariaError::TimeParseError(format!(
                "latest minute must be 0-1439, got {}",
                latest_minute
            )));
        }
        if earliest_minute > latest_minute {
            return Err(SpontariaError::TimeParseError(format!(
                "window start {} is after window end {}",
                earliest_minute, latest_minute
            )));
        }

        Ok(Self {
            earliest_minute,
            latest_minute,
        })
    }

    /// Parse from HH:MM-HH:MM format (e.g., "06:00-11:30")
    pub fn from_range_str(range: &str) -> Result<Self, SpontariaError> {
        let parts: Vec<&str> = range.split('-').collect();
        if parts.len() != 2 {
            return Err(SpontariaError::TimeParseError(format!(
                "Time range must be in format HH:MM-HH:MM, got {}",
                range
            )));
        }

        let earliest = Self::parse_clock(parts[0])?;
        let latest = Self::parse_clock(parts[1])?;

        Self::new(earliest, latest)
    }

    pub fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.earliest_minute && minute_of_day <= self.latest_minute
    }

    fn parse_clock(time_str: &str) -> Result<u32, SpontariaError> {
        let invalid = || SpontariaError::TimeParseError(format!("Invalid clock time: {}", time_str));

        let (hour, minute) = time_str.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        if hour > 23 || minute > 59 {
            return Err(invalid());
        }

        Ok(hour * 60 + minute)
    }
}

/// Sort order for flight results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Cheapest first
    Price,
    /// Shortest flight time first
    Shortest,
    /// Longest flight time first
    Longest,
}

impl FromStr for SortOrder {
    type Err = SpontariaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" | "cheapest" => Ok(SortOrder::Price),
            "shortest" => Ok(SortOrder::Shortest),
            "longest" => Ok(SortOrder::Longest),
            _ => Err(SpontariaError::ParseError(format!("Invalid sort order: {}", s))),
        }
    }
}

/// Flight search request as received from a caller
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub origins: Vec<String>,
    pub destination: Option<String>,
    pub departure_date: Option<String>,
    pub filter: ResultFilter,
}

impl SearchRequest {
    /// Build a request from the raw comma-separated origin list and optional fields.
    ///
    /// Blank entries are dropped and codes are upper-cased. An empty
    /// destination means "anywhere".
    pub fn new(origins: &str, destination: Option<&str>, departure_date: Option<&str>) -> Self {
        let origins = parse_codes(origins);
        let destination = destination
            .map(|d| d.trim().to_ascii_uppercase())
            .filter(|d| !d.is_empty());
        let departure_date = departure_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Self {
            origins,
            destination,
            departure_date,
            filter: ResultFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: ResultFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Whether this is an "Adventure Anywhere" search
    pub fn is_anywhere(&self) -> bool {
        self.destination.is_none()
    }

    /// Check the request before any upstream call is made.
    pub fn validate(&self) -> Result<(), SpontariaError> {
        if self.origins.is_empty() {
            return Err(SpontariaError::MissingOrigin);
        }
        if let Some(date) = &self.departure_date {
            validate_departure_date(date)?;
        }
        Ok(())
    }
}

/// Split a comma-separated list of airport codes.
pub fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Accepts a full date (YYYY-MM-DD) or a whole month (YYYY-MM).
fn validate_departure_date(date: &str) -> Result<(), SpontariaError> {
    let full = NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
    let month = date.len() == 7 && NaiveDate::parse_from_str(&format!("{}-01", date), "%Y-%m-%d").is_ok();

    if full || month {
        Ok(())
    } else {
        Err(SpontariaError::DateParseError(format!(
            "expected YYYY-MM-DD or YYYY-MM, got {}",
            date
        )))
    }
}

/// One flight offer in the shape served to the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOffer {
    pub origin: String,
    pub origin_name: String,
    pub destination: String,
    pub destination_name: String,
    /// Local time at the departure airport, with its UTC offset
    pub departure_at: Option<DateTime<FixedOffset>>,
    pub arrival_at: Option<DateTime<FixedOffset>>,
    pub price: f64,
    pub duration_minutes: u32,
    pub airline_code: String,
    pub airline_name: String,
    pub direct: bool,
    pub booking_link: Option<String>,
}

/// Aggregated search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub source: String,
    pub count: usize,
    pub data: Vec<NormalizedOffer>,
}

impl SearchResponse {
    pub fn new(source: impl Into<String>, data: Vec<NormalizedOffer>) -> Self {
        Self {
            source: source.into(),
            count: data.len(),
            data,
        }
    }
}

/// Autocomplete entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportSuggestion {
    pub name: String,
    pub code: String,
    pub city: String,
}

/// Main public API function: search with configuration taken from the environment
pub async fn search_flights(request: SearchRequest) -> Result<SearchResponse, SpontariaError> {
    let config = Config::from_env()?;
    let upstream: SharedUpstream = Arc::new(TravelpayoutsClient::new(&config)?);
    let aggregator = FlightAggregator::new(config, upstream)?;
    aggregator.search(&request).await
}

/// Autocomplete airports with configuration taken from the environment
pub async fn suggest_airports(query: &str) -> Result<Vec<AirportSuggestion>, SpontariaError> {
    let config = Config::from_env()?;
    let upstream: SharedUpstream = Arc::new(TravelpayoutsClient::new(&config)?);
    let autocomplete = AirportAutocomplete::new(&config, upstream);
    Ok(autocomplete.suggest(query).await)
}
