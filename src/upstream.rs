//! HTTP client for the Travelpayouts pricing and autocomplete APIs

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upstream returned malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Query parameters for the pricing endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    pub origin: String,
    pub destination: Option<String>,
    pub departure_at: Option<String>,
    pub currency: String,
    pub direct: bool,
}

impl PriceQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("origin", self.origin.clone())];
        if let Some(destination) = &self.destination {
            params.push(("destination", destination.clone()));
        }
        if let Some(departure_at) = &self.departure_at {
            params.push(("departure_at", departure_at.clone()));
        }
        if self.direct {
            params.push(("direct", "true".to_string()));
        }
        params.push(("currency", self.currency.clone()));
        params
    }
}

/// Place record returned by the autocomplete endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Place {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub city_name: Option<String>,
    pub country_name: Option<String>,
}

impl Place {
    /// Lenient mapping: numbers are stringified, other non-string values are dropped.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| match value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };

        Self {
            kind: field("type"),
            name: field("name"),
            code: field("code"),
            city_name: field("city_name"),
            country_name: field("country_name"),
        }
    }
}

/// Parse an autocomplete body. `null` means no matches; one odd item never
/// discards its siblings.
pub fn parse_places(text: &str) -> Result<Vec<Place>, UpstreamError> {
    let items: Option<Vec<Value>> = serde_json::from_str(text)?;
    Ok(items.unwrap_or_default().iter().map(Place::from_value).collect())
}

/// Pricing endpoints wrap their items in `{ success, data, currency }`
#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Option<Value>,
}

/// The third-party service behind the proxy
#[async_trait]
pub trait FlightsUpstream: Send + Sync {
    /// Cheapest tickets for a route (or from an origin) around a date
    async fn prices_for_dates(&self, query: &PriceQuery) -> Result<Vec<Value>, UpstreamError>;

    /// Special offers departing from an origin
    async fn special_offers(&self, query: &PriceQuery) -> Result<Vec<Value>, UpstreamError>;

    /// Free-text place lookup
    async fn places(&self, term: &str, locale: &str) -> Result<Vec<Place>, UpstreamError>;
}

pub type SharedUpstream = Arc<dyn FlightsUpstream>;

/// reqwest-backed implementation of [`FlightsUpstream`]
pub struct TravelpayoutsClient {
    http_client: Client,
    api_token: Option<String>,
    prices_url: String,
    special_offers_url: String,
    autocomplete_url: String,
}

impl TravelpayoutsClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        debug!("Creating Travelpayouts client");
        let http_client = Client::builder()
            .user_agent(concat!("spontaria/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            api_token: config.api_token.clone(),
            prices_url: config.prices_url.clone(),
            special_offers_url: config.special_offers_url.clone(),
            autocomplete_url: config.autocomplete_url.clone(),
        })
    }

    async fn fetch_data(&self, url: &str, params: &[(&'static str, String)]) -> Result<Vec<Value>, UpstreamError> {
        let mut request = self.http_client.get(url).query(params);
        if let Some(token) = &self.api_token {
            request = request.header(ACCESS_TOKEN_HEADER, token);
        }

        let start_time = std::time::Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            body_length = text.len(),
            "Upstream request completed"
        );

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate(&text, ERROR_BODY_LIMIT),
            });
        }

        let envelope: DataEnvelope = serde_json::from_str(&text).map_err(|e| {
            warn!(body = %truncate(&text, ERROR_BODY_LIMIT), "Non-JSON response");
            UpstreamError::Json(e)
        })?;

        Ok(match envelope.data {
            Some(Value::Array(items)) => items,
            Some(other) => {
                debug!(kind = json_kind(&other), "Upstream data is not an array, ignoring");
                Vec::new()
            }
            None => Vec::new(),
        })
    }
}

#[async_trait]
impl FlightsUpstream for TravelpayoutsClient {
    #[instrument(level = "info", skip(self), fields(origin = %query.origin, destination = ?query.destination))]
    async fn prices_for_dates(&self, query: &PriceQuery) -> Result<Vec<Value>, UpstreamError> {
        self.fetch_data(&self.prices_url, &query.to_params()).await
    }

    #[instrument(level = "info", skip(self), fields(origin = %query.origin))]
    async fn special_offers(&self, query: &PriceQuery) -> Result<Vec<Value>, UpstreamError> {
        self.fetch_data(&self.special_offers_url, &query.to_params()).await
    }

    #[instrument(level = "info", skip(self))]
    async fn places(&self, term: &str, locale: &str) -> Result<Vec<Place>, UpstreamError> {
        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .get(&self.autocomplete_url)
            .query(&[("term", term), ("locale", locale)])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Autocomplete request completed"
        );

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate(&text, ERROR_BODY_LIMIT),
            });
        }

        let places = parse_places(&text)?;
        debug!(places = places.len(), "Autocomplete body parsed");
        Ok(places)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
