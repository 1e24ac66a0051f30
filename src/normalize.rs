//! Mapping of heterogeneous upstream records onto [`NormalizedOffer`]
//!
//! Each logical attribute has an ordered list of upstream field names. The
//! first one that is present and usable wins, so supporting a new upstream
//! spelling is a one-line change to the tables below.

use crate::config::curated_name;
use crate::NormalizedOffer;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

/// Ordered upstream field names for one logical attribute
pub type Aliases = &'static [&'static str];

pub const ORIGIN: Aliases = &["origin", "from", "origin_airport"];
pub const DESTINATION: Aliases = &["destination", "to", "destination_airport"];
pub const ORIGIN_NAME: Aliases = &["origin_name", "origin_city_name", "from_name"];
pub const DESTINATION_NAME: Aliases = &["destination_name", "destination_city_name", "to_name"];
pub const PRICE: Aliases = &["price", "value", "amount"];
pub const DEPARTURE: Aliases = &["departure_at", "departure", "depart_date"];
pub const ARRIVAL: Aliases = &["arrival_at", "arrival"];
pub const DURATION: Aliases = &["duration", "duration_to", "duration_minutes"];
pub const AIRLINE: Aliases = &["airline", "airline_code", "carrier"];
pub const AIRLINE_NAME: Aliases = &["airline_name"];
pub const STOP_COUNT: Aliases = &["transfers", "number_of_changes"];
pub const DIRECT_FLAG: Aliases = &["direct"];
pub const BOOKING_LINK: Aliases = &["link", "deep_link", "booking_link"];

/// Display names for carriers commonly returned by the pricing API
const AIRLINES: &[(&str, &str)] = &[
    ("AA", "American Airlines"),
    ("AC", "Air Canada"),
    ("AF", "Air France"),
    ("AS", "Alaska Airlines"),
    ("B6", "JetBlue"),
    ("BA", "British Airways"),
    ("DL", "Delta Air Lines"),
    ("EK", "Emirates"),
    ("F9", "Frontier Airlines"),
    ("FR", "Ryanair"),
    ("IB", "Iberia"),
    ("KL", "KLM"),
    ("LH", "Lufthansa"),
    ("NK", "Spirit Airlines"),
    ("QR", "Qatar Airways"),
    ("TK", "Turkish Airlines"),
    ("U2", "easyJet"),
    ("UA", "United Airlines"),
    ("VS", "Virgin Atlantic"),
    ("WN", "Southwest Airlines"),
];

pub fn airline_display_name(code: &str) -> Option<&'static str> {
    AIRLINES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// What the aggregator knows about the query that produced a record
#[derive(Debug, Clone)]
pub struct QueryContext<'a> {
    pub origin: &'a str,
    pub destination: Option<&'a str>,
    /// The querying origin replaces whatever origin the record reports
    pub force_origin: bool,
    pub booking_base_url: &'a str,
}

/// Map one raw upstream item. Non-object items yield an offer built from the context alone.
pub fn normalize(raw: &Value, ctx: &QueryContext<'_>) -> NormalizedOffer {
    let empty = Map::new();
    let item = raw.as_object().unwrap_or(&empty);

    let origin = if ctx.force_origin {
        ctx.origin.to_string()
    } else {
        first_string(item, ORIGIN).unwrap_or_else(|| ctx.origin.to_string())
    };
    let destination = first_string(item, DESTINATION)
        .or_else(|| ctx.destination.map(str::to_string))
        .unwrap_or_default();

    let origin_name = place_name(item, ORIGIN_NAME, &origin);
    let destination_name = place_name(item, DESTINATION_NAME, &destination);

    let price = first_number(item, PRICE)
        .filter(|p| p.is_finite() && *p >= 0.0)
        .unwrap_or(0.0);
    let duration_minutes = first_number(item, DURATION)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d.round().min(u32::MAX as f64) as u32)
        .unwrap_or(0);

    let departure_at = first_timestamp(item, DEPARTURE);
    let arrival_at = first_timestamp(item, ARRIVAL).or_else(|| match departure_at {
        Some(departure) if duration_minutes > 0 => {
            Some(departure + Duration::minutes(i64::from(duration_minutes)))
        }
        _ => None,
    });

    let airline_code = first_string(item, AIRLINE).unwrap_or_default();
    let airline_name = airline_display_name(&airline_code)
        .map(str::to_string)
        .or_else(|| first_string(item, AIRLINE_NAME))
        .unwrap_or_else(|| airline_code.clone());

    let booking_link = first_string(item, BOOKING_LINK).map(|link| absolute_link(&link, ctx.booking_base_url));

    NormalizedOffer {
        origin,
        origin_name,
        destination,
        destination_name,
        departure_at,
        arrival_at,
        price,
        duration_minutes,
        airline_code,
        airline_name,
        direct: is_direct(item),
        booking_link,
    }
}

/// First alias holding a non-empty string (numbers are stringified).
pub fn first_string(item: &Map<String, Value>, aliases: Aliases) -> Option<String> {
    aliases.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First alias holding a number or a numeric string.
pub fn first_number(item: &Map<String, Value>, aliases: Aliases) -> Option<f64> {
    aliases.iter().find_map(|key| match item.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// First alias holding a parseable timestamp.
pub fn first_timestamp(item: &Map<String, Value>, aliases: Aliases) -> Option<DateTime<FixedOffset>> {
    aliases.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) => parse_timestamp(s),
        _ => None,
    })
}

/// RFC 3339 keeps its offset; a zone-less date-time or a bare date (midnight) is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    let utc = FixedOffset::east_opt(0)?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().with_timezone(&utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().with_timezone(&utc))
}

fn place_name(item: &Map<String, Value>, aliases: Aliases, code: &str) -> String {
    first_string(item, aliases)
        .or_else(|| curated_name(code).map(str::to_string))
        .unwrap_or_else(|| code.to_string())
}

fn is_direct(item: &Map<String, Value>) -> bool {
    let no_stops = STOP_COUNT
        .iter()
        .any(|key| item.get(*key).and_then(Value::as_f64) == Some(0.0));
    let flagged = DIRECT_FLAG
        .iter()
        .any(|key| item.get(*key).and_then(Value::as_bool) == Some(true));
    no_stops || flagged
}

fn absolute_link(link: &str, base: &str) -> String {
    if link.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), link)
    } else {
        link.to_string()
    }
}
