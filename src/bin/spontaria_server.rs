//! HTTP server for the Spontaria front end

use anyhow::{Context, Result};
use spontaria::{
    http::{router, AppState},
    logging, AirportAutocomplete, Config, FlightAggregator, SharedUpstream, TravelpayoutsClient,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_stderr(logging::DEFAULT_DIRECTIVES)?;

    let config = Config::from_env()?;
    let upstream: SharedUpstream = Arc::new(TravelpayoutsClient::new(&config)?);
    let autocomplete = AirportAutocomplete::new(&config, upstream.clone());

    // A missing token is a deployment problem, not a per-request one
    let aggregator = match FlightAggregator::new(config.clone(), upstream) {
        Ok(aggregator) => aggregator,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return Err(e.into());
        }
    };

    let state = AppState {
        aggregator: Arc::new(aggregator),
        autocomplete: Arc::new(autocomplete),
    };
    let app = router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Spontaria server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
