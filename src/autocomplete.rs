//! Airport autocomplete proxy

use crate::config::Config;
use crate::upstream::{Place, SharedUpstream};
use crate::AirportSuggestion;
use tracing::{debug, error, instrument};

/// Shortest query forwarded upstream, in characters
pub const MIN_QUERY_CHARS: usize = 2;

pub struct AirportAutocomplete {
    upstream: SharedUpstream,
    locale: String,
}

impl AirportAutocomplete {
    pub fn new(config: &Config, upstream: SharedUpstream) -> Self {
        Self {
            upstream,
            locale: config.locale.clone(),
        }
    }

    /// Airports matching the query, or matching cities when no airport does.
    ///
    /// Best effort: upstream failures are logged and produce an empty list.
    #[instrument(level = "info", skip(self))]
    pub async fn suggest(&self, query: &str) -> Vec<AirportSuggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            debug!("Query too short, not calling upstream");
            return Vec::new();
        }

        match self.upstream.places(query, &self.locale).await {
            Ok(places) => {
                let suggestions = select_suggestions(&places);
                debug!(places = places.len(), suggestions = suggestions.len(), "Autocomplete resolved");
                suggestions
            }
            Err(e) => {
                error!(error = %e, "Autocomplete upstream failed");
                Vec::new()
            }
        }
    }
}

/// Prefer airport matches and fall back to city matches.
///
/// Blank strings count as missing, so they fall through to the next field.
pub fn select_suggestions(places: &[Place]) -> Vec<AirportSuggestion> {
    let airports: Vec<AirportSuggestion> = places
        .iter()
        .filter(|p| p.kind.as_deref() == Some("airport"))
        .map(|a| AirportSuggestion {
            name: non_blank(&a.name).unwrap_or_default(),
            code: non_blank(&a.code).unwrap_or_default(),
            city: non_blank(&a.city_name)
                .or_else(|| non_blank(&a.country_name))
                .unwrap_or_default(),
        })
        .collect();

    if !airports.is_empty() {
        return airports;
    }

    places
        .iter()
        .filter(|p| p.kind.as_deref() == Some("city"))
        .map(|c| {
            let name = non_blank(&c.name).unwrap_or_default();
            AirportSuggestion {
                code: non_blank(&c.code).unwrap_or_else(|| name.clone()),
                name,
                city: non_blank(&c.country_name).unwrap_or_default(),
            }
        })
        .collect()
}

fn non_blank(field: &Option<String>) -> Option<String> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
