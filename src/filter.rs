//! Post-aggregation filtering and ordering requested by the caller

use crate::{NormalizedOffer, SortOrder, SpontariaError, TimeWindow};
use chrono::Timelike;
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFilter {
    pub direct_only: bool,
    pub departure_window: Option<TimeWindow>,
    pub sort: Option<SortOrder>,
}

impl ResultFilter {
    /// Build from the loosely-typed parameters accepted by the HTTP, MCP and CLI surfaces.
    pub fn from_params(
        direct_only: Option<bool>,
        departure_window: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self, SpontariaError> {
        let departure_window = departure_window
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(TimeWindow::from_range_str)
            .transpose()?;
        let sort = sort
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<SortOrder>)
            .transpose()?;

        Ok(Self {
            direct_only: direct_only.unwrap_or(false),
            departure_window,
            sort,
        })
    }

    pub fn apply(&self, offers: Vec<NormalizedOffer>) -> Vec<NormalizedOffer> {
        let mut offers: Vec<NormalizedOffer> = offers
            .into_iter()
            .filter(|offer| !self.direct_only || offer.direct)
            .filter(|offer| self.departs_in_window(offer))
            .collect();

        if let Some(order) = self.sort {
            sort_offers(&mut offers, order);
        }

        offers
    }

    // Compared against the departure's own local clock. Offers without a
    // departure time are never excluded by the window.
    fn departs_in_window(&self, offer: &NormalizedOffer) -> bool {
        match (&self.departure_window, offer.departure_at) {
            (Some(window), Some(departure)) => window.contains(departure.hour() * 60 + departure.minute()),
            _ => true,
        }
    }
}

/// Parse a boolean query flag: `true`/`false`/`1`/`0`, any case. Blank means unset.
pub fn parse_flag(raw: &str) -> Result<Option<bool>, SpontariaError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        other => Err(SpontariaError::ParseError(format!("Invalid boolean flag: {}", other))),
    }
}

/// Stable sort of offers by the given order.
pub fn sort_offers(offers: &mut [NormalizedOffer], order: SortOrder) {
    match order {
        SortOrder::Price => offers.sort_by(cmp_price),
        SortOrder::Shortest => offers.sort_by_key(|o| o.duration_minutes),
        SortOrder::Longest => offers.sort_by(|a, b| b.duration_minutes.cmp(&a.duration_minutes)),
    }
}

fn cmp_price(a: &NormalizedOffer, b: &NormalizedOffer) -> Ordering {
    a.price.total_cmp(&b.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_timestamp;

    fn offer(code: &str, departure: Option<&str>, price: f64, duration: u32, direct: bool) -> NormalizedOffer {
        NormalizedOffer {
            origin: "JFK".to_string(),
            origin_name: "JFK".to_string(),
            destination: code.to_string(),
            destination_name: code.to_string(),
            departure_at: departure.and_then(parse_timestamp),
            arrival_at: None,
            price,
            duration_minutes: duration,
            airline_code: String::new(),
            airline_name: String::new(),
            direct,
            booking_link: None,
        }
    }

    fn destinations(offers: &[NormalizedOffer]) -> Vec<&str> {
        offers.iter().map(|o| o.destination.as_str()).collect()
    }

    fn sample() -> Vec<NormalizedOffer> {
        vec![
            offer("LHR", Some("2025-08-15T07:30:00Z"), 420.0, 400, true),
            offer("CDG", Some("2025-08-15T22:10:00Z"), 380.0, 440, false),
            offer("MAD", None, 510.0, 480, true),
            offer("FCO", Some("2025-08-15T12:00:00Z"), 300.0, 560, true),
        ]
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let filter = ResultFilter::default();
        assert_eq!(destinations(&filter.apply(sample())), vec!["LHR", "CDG", "MAD", "FCO"]);
    }

    #[test]
    fn test_direct_only() {
        let filter = ResultFilter {
            direct_only: true,
            ..Default::default()
        };
        assert_eq!(destinations(&filter.apply(sample())), vec!["LHR", "MAD", "FCO"]);
    }

    #[test]
    fn test_departure_window_keeps_undated_offers() {
        let filter = ResultFilter::from_params(None, Some("06:00-12:00"), None).unwrap();
        assert_eq!(destinations(&filter.apply(sample())), vec!["LHR", "MAD", "FCO"]);
    }

    #[test]
    fn test_sort_orders() {
        let by_price = ResultFilter::from_params(None, None, Some("price")).unwrap();
        assert_eq!(destinations(&by_price.apply(sample())), vec!["FCO", "CDG", "LHR", "MAD"]);

        let shortest = ResultFilter::from_params(None, None, Some("shortest")).unwrap();
        assert_eq!(destinations(&shortest.apply(sample())), vec!["LHR", "CDG", "MAD", "FCO"]);

        let longest = ResultFilter::from_params(None, None, Some("longest")).unwrap();
        assert_eq!(destinations(&longest.apply(sample())), vec!["FCO", "MAD", "CDG", "LHR"]);
    }

    #[test]
    fn test_combined_filter() {
        let filter = ResultFilter::from_params(Some(true), Some("00:00-13:00"), Some("price")).unwrap();
        assert_eq!(destinations(&filter.apply(sample())), vec!["FCO", "LHR", "MAD"]);
    }

    #[test]
    fn test_from_params_rejects_bad_input() {
        assert!(matches!(
            ResultFilter::from_params(None, Some("late"), None),
            Err(SpontariaError::TimeParseError(_))
        ));
        assert!(matches!(
            ResultFilter::from_params(None, None, Some("random")),
            Err(SpontariaError::ParseError(_))
        ));
        assert_eq!(
            ResultFilter::from_params(None, Some(" "), Some("")).unwrap(),
            ResultFilter::default()
        );
    }

    #[test]
    fn test_departure_window_uses_local_clock() {
        // 09:00 in New York is 13:00 UTC
        let offers = vec![
            offer("LHR", Some("2025-08-15T09:00:00-04:00"), 420.0, 400, true),
            offer("CDG", Some("2025-08-15T13:00:00-04:00"), 380.0, 440, true),
        ];
        let filter = ResultFilter::from_params(None, Some("06:00-12:00"), None).unwrap();
        assert_eq!(destinations(&filter.apply(offers)), vec!["LHR"]);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true").unwrap(), Some(true));
        assert_eq!(parse_flag("TRUE").unwrap(), Some(true));
        assert_eq!(parse_flag("1").unwrap(), Some(true));
        assert_eq!(parse_flag("false").unwrap(), Some(false));
        assert_eq!(parse_flag("0").unwrap(), Some(false));
        assert_eq!(parse_flag(" ").unwrap(), None);
        assert!(matches!(parse_flag("maybe"), Err(SpontariaError::ParseError(_))));
    }
}
