//! Scripted in-memory upstream shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use spontaria::upstream::Place;
use spontaria::{Config, FlightsUpstream, PriceQuery, UpstreamError};
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded upstream call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Prices { origin: String, destination: Option<String>, direct: bool },
    SpecialOffers { origin: String },
    Places { term: String },
}

/// Canned answer for a call: items, or an HTTP status failure
#[derive(Debug, Clone)]
pub enum Reply {
    Items(Vec<Value>),
    Status(u16),
    BadJson,
}

#[derive(Default)]
pub struct FakeUpstream {
    prices: HashMap<(String, Option<String>), Reply>,
    offers: HashMap<String, Reply>,
    places: Option<Result<Vec<Place>, u16>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(mut self, origin: &str, destination: &str, reply: Reply) -> Self {
        self.prices
            .insert((origin.to_string(), Some(destination.to_string())), reply);
        self
    }

    pub fn with_special_offers(mut self, origin: &str, reply: Reply) -> Self {
        self.offers.insert(origin.to_string(), reply);
        self
    }

    pub fn with_places(mut self, places: Vec<Place>) -> Self {
        self.places = Some(Ok(places));
        self
    }

    pub fn with_failing_places(mut self, status: u16) -> Self {
        self.places = Some(Err(status));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn answer(reply: Option<&Reply>) -> Result<Vec<Value>, UpstreamError> {
    match reply {
        Some(Reply::Items(items)) => Ok(items.clone()),
        Some(Reply::Status(status)) => Err(UpstreamError::Status {
            status: *status,
            body: "scripted failure".to_string(),
        }),
        Some(Reply::BadJson) => Err(UpstreamError::Json(
            serde_json::from_str::<Value>("<html>").unwrap_err(),
        )),
        None => Ok(Vec::new()),
    }
}

#[async_trait]
impl FlightsUpstream for FakeUpstream {
    async fn prices_for_dates(&self, query: &PriceQuery) -> Result<Vec<Value>, UpstreamError> {
        self.record(Call::Prices {
            origin: query.origin.clone(),
            destination: query.destination.clone(),
            direct: query.direct,
        });
        answer(
            self.prices
                .get(&(query.origin.clone(), query.destination.clone())),
        )
    }

    async fn special_offers(&self, query: &PriceQuery) -> Result<Vec<Value>, UpstreamError> {
        self.record(Call::SpecialOffers {
            origin: query.origin.clone(),
        });
        answer(self.offers.get(&query.origin))
    }

    async fn places(&self, term: &str, _locale: &str) -> Result<Vec<Place>, UpstreamError> {
        self.record(Call::Places {
            term: term.to_string(),
        });
        match &self.places {
            Some(Ok(places)) => Ok(places.clone()),
            Some(Err(status)) => Err(UpstreamError::Status {
                status: *status,
                body: String::new(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

pub fn config() -> Config {
    Config::default().with_token("test-token")
}

pub fn place(kind: &str, name: &str, code: &str, city: Option<&str>, country: Option<&str>) -> Place {
    Place {
        kind: Some(kind.to_string()),
        name: Some(name.to_string()),
        code: Some(code.to_string()),
        city_name: city.map(str::to_string),
        country_name: country.map(str::to_string),
    }
}
