//! Fan-out of a flight search over the upstream pricing endpoints

use crate::config::{AnywhereStrategy, Config};
use crate::dedup::dedup_cheapest;
use crate::filter::sort_offers;
use crate::normalize::{normalize, QueryContext};
use crate::upstream::{PriceQuery, SharedUpstream};
use crate::{ConfigError, NormalizedOffer, SearchRequest, SearchResponse, SortOrder, SpontariaError};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

pub const SOURCE_PRICES_FOR_DATES: &str = "prices_for_dates";
pub const SOURCE_SPECIAL_OFFERS: &str = "special_offers";
pub const SOURCE_CURATED: &str = "curated_prices_for_dates";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    PricesForDates,
    SpecialOffers,
}

/// One planned upstream call
#[derive(Debug, Clone)]
struct UpstreamTask {
    endpoint: Endpoint,
    query: PriceQuery,
    force_origin: bool,
}

/// Searches every requested origin and merges the answers
pub struct FlightAggregator {
    upstream: SharedUpstream,
    config: Config,
}

impl FlightAggregator {
    /// Fails when no upstream access token is configured.
    pub fn new(config: Config, upstream: SharedUpstream) -> Result<Self, ConfigError> {
        config.require_token()?;
        debug!(
            concurrency = config.concurrency,
            anywhere_strategy = ?config.anywhere_strategy,
            "Flight aggregator created"
        );
        Ok(Self { upstream, config })
    }

    #[instrument(level = "info", skip(self, request), fields(origins = ?request.origins, destination = ?request.destination))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SpontariaError> {
        request.validate()?;

        let (source, tasks) = self.plan(request);
        info!(source, upstream_calls = tasks.len(), "Aggregating flight offers");

        let batches: Vec<Vec<NormalizedOffer>> = stream::iter(tasks)
            .map(|task| self.run_task(task))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let combined: Vec<NormalizedOffer> = batches.into_iter().flatten().collect();
        let received = combined.len();
        let mut offers = dedup_cheapest(combined);
        debug!(received, kept = offers.len(), "Deduplicated offers");

        if request.is_anywhere() {
            sort_offers(&mut offers, SortOrder::Price);
        }
        let offers = request.filter.apply(offers);

        info!(source, count = offers.len(), "Flight search completed");
        Ok(SearchResponse::new(source, offers))
    }

    fn plan(&self, request: &SearchRequest) -> (&'static str, Vec<UpstreamTask>) {
        let query = |origin: &str, destination: Option<&str>, direct: bool| PriceQuery {
            origin: origin.to_string(),
            destination: destination.map(str::to_string),
            departure_at: request.departure_date.clone(),
            currency: self.config.currency.clone(),
            direct,
        };

        if let Some(destination) = request.destination.as_deref() {
            let tasks = request
                .origins
                .iter()
                .map(|origin| UpstreamTask {
                    endpoint: Endpoint::PricesForDates,
                    query: query(origin, Some(destination), false),
                    force_origin: false,
                })
                .collect();
            return (SOURCE_PRICES_FOR_DATES, tasks);
        }

        match self.config.anywhere_strategy {
            AnywhereStrategy::SpecialOffers => {
                let tasks = request
                    .origins
                    .iter()
                    .map(|origin| UpstreamTask {
                        endpoint: Endpoint::SpecialOffers,
                        query: query(origin, None, false),
                        force_origin: true,
                    })
                    .collect();
                (SOURCE_SPECIAL_OFFERS, tasks)
            }
            AnywhereStrategy::Curated => {
                let mut tasks = Vec::new();
                for origin in &request.origins {
                    for candidate in &self.config.candidate_destinations {
                        if candidate.eq_ignore_ascii_case(origin) {
                            continue;
                        }
                        tasks.push(UpstreamTask {
                            endpoint: Endpoint::PricesForDates,
                            query: query(origin, Some(candidate), true),
                            force_origin: true,
                        });
                    }
                }
                (SOURCE_CURATED, tasks)
            }
        }
    }

    /// A failed call contributes no offers; the search carries on.
    async fn run_task(&self, task: UpstreamTask) -> Vec<NormalizedOffer> {
        let result = match task.endpoint {
            Endpoint::PricesForDates => self.upstream.prices_for_dates(&task.query).await,
            Endpoint::SpecialOffers => self.upstream.special_offers(&task.query).await,
        };

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    origin = %task.query.origin,
                    destination = ?task.query.destination,
                    endpoint = ?task.endpoint,
                    error = %e,
                    "Upstream call failed, skipping"
                );
                return Vec::new();
            }
        };

        let ctx = QueryContext {
            origin: &task.query.origin,
            destination: task.query.destination.as_deref(),
            force_origin: task.force_origin,
            booking_base_url: &self.config.booking_base_url,
        };
        debug!(origin = %task.query.origin, items = items.len(), "Normalizing upstream items");
        items.iter().map(|item| normalize(item, &ctx)).collect()
    }
}
