//! Collapsing of offers returned by overlapping upstream queries

use crate::NormalizedOffer;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Identity of an offer across upstream queries; departures compare as UTC instants
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub origin: String,
    pub destination: String,
    pub departure_at: Option<DateTime<Utc>>,
}

impl DedupKey {
    pub fn of(offer: &NormalizedOffer) -> Self {
        Self {
            origin: offer.origin.clone(),
            destination: offer.destination.clone(),
            departure_at: offer.departure_at.map(|d| d.with_timezone(&Utc)),
        }
    }
}

/// Keep the cheapest offer per [`DedupKey`].
///
/// Ties keep the offer seen first, and survivors stay in the order their key
/// first appeared.
pub fn dedup_cheapest(offers: Vec<NormalizedOffer>) -> Vec<NormalizedOffer> {
    let mut slots: HashMap<DedupKey, usize> = HashMap::with_capacity(offers.len());
    let mut best: Vec<NormalizedOffer> = Vec::with_capacity(offers.len());

    for offer in offers {
        let key = DedupKey::of(&offer);
        match slots.get(&key) {
            Some(&slot) => {
                if offer.price < best[slot].price {
                    best[slot] = offer;
                }
            }
            None => {
                slots.insert(key, best.len());
                best.push(offer);
            }
        }
    }

    best
}
