use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ammo_core::domain::{Lookback, Recommendation, Timeframe, MAX_LOOKBACK_DAYS};
use ammo_core::engine::RecommendationEngine;
use ammo_core::error::{PipelineError, RecommendationError};
use ammo_core::risk::RiskParameters;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = ammo_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let engine = RecommendationEngine::from_settings(&settings)?;
    let state = AppState {
        engine: Arc::new(engine),
        defaults: settings.default_risk_parameters(),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/recommendations/:symbol", get(get_recommendation))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, mode = %settings.mode_summary(), "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    engine: Arc<RecommendationEngine>,
    defaults: RiskParameters,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendQuery {
    timeframe: Option<String>,
    days: Option<u32>,
    portfolio_value: Option<f64>,
    risk_fraction: Option<f64>,
    stop_distance: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

type ApiError = (StatusCode, Json<ErrorBody>);

impl RecommendQuery {
    fn lookback(&self) -> Result<Lookback, ApiError> {
        let timeframe = match self.timeframe.as_deref() {
            Some(s) => s.parse::<Timeframe>().map_err(|e| bad_request(e, "invalid_timeframe"))?,
            None => Timeframe::Daily,
        };
        let mut lookback = Lookback::default_for(timeframe);
        if let Some(days) = self.days {
            lookback.days = days;
            if !lookback.is_within_limit() {
                return Err(bad_request(
                    format!("days must be between 1 and {MAX_LOOKBACK_DAYS}"),
                    "invalid_lookback",
                ));
            }
        }
        Ok(lookback)
    }

    fn risk_parameters(&self, defaults: &RiskParameters) -> RiskParameters {
        RiskParameters {
            portfolio_value: self.portfolio_value.unwrap_or(defaults.portfolio_value),
            risk_fraction: self.risk_fraction.unwrap_or(defaults.risk_fraction),
            stop_distance: self.stop_distance.or(defaults.stop_distance),
        }
    }
}

async fn get_recommendation(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Recommendation>, ApiError> {
    let lookback = query.lookback()?;
    let params = query.risk_parameters(&state.defaults);

    let recommendation = state
        .engine
        .recommend_with(&symbol, lookback, &params)
        .await
        .map_err(into_api_error)?;

    Ok(Json(recommendation))
}

fn bad_request(error: String, kind: &'static str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error, kind }))
}

fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InvalidRiskParameters(_) => StatusCode::BAD_REQUEST,
        PipelineError::InsufficientHistory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn into_api_error(err: RecommendationError) -> ApiError {
    let status = status_for(&err.source);
    if status.is_server_error() {
        let report = anyhow::Error::new(err.clone());
        sentry_anyhow::capture_anyhow(&report);
    }
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            kind: err.source.kind(),
        }),
    )
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &ammo_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
