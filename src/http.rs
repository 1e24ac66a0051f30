//! HTTP surface: `/api/flights`, `/api/airports` and `/health`

use crate::filter::parse_flag;
use crate::{
    AirportAutocomplete, AirportSuggestion, FlightAggregator, ResultFilter, SearchRequest,
    SearchResponse, SpontariaError,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<FlightAggregator>,
    pub autocomplete: Arc<AirportAutocomplete>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Search(#[from] SpontariaError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Search(err) = self;
        let (status, message) = match &err {
            e if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            SpontariaError::Config(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            e => {
                error!(error = %e, "flights handler error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct FlightsParams {
    #[serde(default)]
    pub origin: String,
    pub destination: Option<String>,
    #[serde(alias = "departure_date")]
    pub depart_date: Option<String>,
    /// Kept as text so a malformed flag gets the JSON error body
    pub direct_only: Option<String>,
    pub depart_window: Option<String>,
    pub sort: Option<String>,
}

impl FlightsParams {
    pub fn into_request(self) -> Result<SearchRequest, SpontariaError> {
        let direct_only = self.direct_only.as_deref().map(parse_flag).transpose()?.flatten();
        let filter = ResultFilter::from_params(
            direct_only,
            self.depart_window.as_deref(),
            self.sort.as_deref(),
        )?;
        Ok(SearchRequest::new(&self.origin, self.destination.as_deref(), self.depart_date.as_deref())
            .with_filter(filter))
    }
}

#[derive(Debug, Deserialize)]
pub struct AirportsParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
}

pub async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<FlightsParams>,
) -> Result<Json<SearchResponse>, AppError> {
    info!(?params, "Flight search request received");

    let request = params.into_request().map_err(|e| {
        warn!(error = %e, "Rejected flight search request");
        e
    })?;
    let response = state.aggregator.search(&request).await?;
    Ok(Json(response))
}

pub async fn search_airports(
    State(state): State<AppState>,
    Query(params): Query<AirportsParams>,
) -> Json<Vec<AirportSuggestion>> {
    let query = params.q.unwrap_or_default();
    Json(state.autocomplete.suggest(&query).await)
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "spontaria".to_string(),
        status: "ok".to_string(),
    })
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "Server error".to_string(),
        }),
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/flights", get(search_flights))
        .route("/api/airports", get(search_airports))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
