// src/mcp_server.rs

use anyhow::Result;
use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
    ServerHandler, ServiceExt,
};
use serde::Deserialize;
use spontaria::{
    logging, AirportAutocomplete, Config, FlightAggregator, ResultFilter, SearchRequest,
    SearchResponse, SharedUpstream, TravelpayoutsClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Flight search MCP server
#[derive(Clone)]
pub struct SpontariaServer {
    aggregator: Arc<FlightAggregator>,
    autocomplete: Arc<AirportAutocomplete>,
}

impl SpontariaServer {
    pub fn new(aggregator: FlightAggregator, autocomplete: AirportAutocomplete) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            autocomplete: Arc::new(autocomplete),
        }
    }
}

/// Flight search parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct FlightSearchParams {
    #[schemars(description = "Origin airport codes, comma-separated (e.g., 'JFK,EWR,LGA')")]
    pub origins: String,
    #[schemars(description = "Destination airport code (e.g., LHR). Omit to search anywhere")]
    pub destination: Option<String>,
    #[schemars(description = "Departure date in YYYY-MM-DD format, or YYYY-MM for a whole month")]
    pub departure_date: Option<String>,
    #[schemars(description = "Only return direct flights")]
    pub direct_only: Option<bool>,
    #[schemars(description = "Departure time window in HH:MM-HH:MM format")]
    pub departure_time: Option<String>,
    #[schemars(description = "Sort order: price, shortest, longest")]
    pub sort: Option<String>,
    #[schemars(description = "Maximum number of offers to return (default: 30)")]
    pub max_flights: Option<usize>,
}

/// Airport lookup parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct AirportSearchParams {
    #[schemars(description = "Free-text airport or city name, at least 2 characters")]
    pub query: String,
}

#[tool(tool_box)]
impl SpontariaServer {
    /// Search flight offers across one or more origins
    #[tool(description = "Search cheap flight offers from one or more origin airports. With a destination, prices for that route are compared across origins; without one, offers to anywhere are returned cheapest first.")]
    async fn search_flights(&self, #[tool(aggr)] params: FlightSearchParams) -> String {
        info!(
            origins = params.origins,
            destination = params.destination.as_deref(),
            departure_date = params.departure_date.as_deref(),
            direct_only = params.direct_only.unwrap_or(false),
            sort = params.sort.as_deref(),
            max_flights = params.max_flights.unwrap_or(30),
            "Flight search request received"
        );

        let request = match build_search_request(&params) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid flight search parameters: {}", e);
                return serde_json::json!({ "error": e }).to_string();
            }
        };

        match self.aggregator.search(&request).await {
            Ok(response) => {
                info!(
                    source = response.source,
                    count = response.count,
                    "Flight search completed successfully"
                );
                format_search_response(response, params.max_flights)
            }
            Err(e) => {
                error!("Flight search failed: {}", e);
                serde_json::json!({ "error": format!("Flight search failed: {}", e) }).to_string()
            }
        }
    }

    /// Look up airports by name
    #[tool(description = "Find airports (or cities, when no airport matches) by name. Returns name, IATA code and city for each match.")]
    async fn search_airports(&self, #[tool(aggr)] params: AirportSearchParams) -> String {
        debug!(query = params.query, "Airport search request received");
        let suggestions = self.autocomplete.suggest(&params.query).await;
        serde_json::to_string_pretty(&suggestions)
            .unwrap_or_else(|e| serde_json::json!({ "error": format!("Failed to serialize results: {}", e) }).to_string())
    }
}

fn build_search_request(params: &FlightSearchParams) -> Result<SearchRequest, String> {
    let filter = ResultFilter::from_params(
        params.direct_only,
        params.departure_time.as_deref(),
        params.sort.as_deref(),
    )
    .map_err(|e| e.to_string())?;

    let request = SearchRequest::new(
        &params.origins,
        params.destination.as_deref(),
        params.departure_date.as_deref(),
    )
    .with_filter(filter);
    request.validate().map_err(|e| e.to_string())?;
    Ok(request)
}

fn format_search_response(mut response: SearchResponse, max_flights: Option<usize>) -> String {
    if response.data.is_empty() {
        return serde_json::json!({
            "source": response.source,
            "count": 0,
            "data": [],
            "message": "No flights found matching your criteria."
        })
        .to_string();
    }

    response.data.truncate(max_flights.unwrap_or(30));
    response.count = response.data.len();

    serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
        serde_json::json!({ "error": format!("Failed to serialize results: {}", e) }).to_string()
    })
}

#[tool(tool_box)]
impl ServerHandler for SpontariaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("A flight offer search server. search_flights compares prices across several origin airports, to one destination or to anywhere; search_airports resolves airport names to IATA codes.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to a file
    if let Err(e) = logging::init_file(&PathBuf::from("logs"), "spontaria-mcp.log") {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting Spontaria MCP server");

    let config = Config::from_env()?;
    let upstream: SharedUpstream = Arc::new(TravelpayoutsClient::new(&config)?);
    let autocomplete = AirportAutocomplete::new(&config, upstream.clone());
    let aggregator = FlightAggregator::new(config, upstream)?;

    let server = SpontariaServer::new(aggregator, autocomplete);
    let transport = stdio();

    // SDK handles initialization, tool discovery, and message routing
    let service = server.serve(transport).await?;
    info!("MCP service started, waiting for requests");

    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}
