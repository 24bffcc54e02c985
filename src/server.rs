use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::cli::ServeArgs;
use crate::pipeline::MatchEngine;
use crate::provider::SearchCriteria;

#[derive(Clone)]
struct AppState {
    engine: Arc<MatchEngine>,
}

pub async fn run(opts: ServeArgs, engine: MatchEngine) -> anyhow::Result<()> {
    let state = AppState {
        engine: Arc::new(engine),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/stats", get(api_stats))
        .route("/api/match", post(api_match))
        .route("/api/analyze", get(api_analyze))
        .route("/api/geocode", get(api_geocode))
        .route("/api/specialties", get(api_specialties))
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    fallback_provider_count: usize,
    specialties: Vec<String>,
    max_rows: usize,
    min_columns: usize,
    top_n: usize,
}

async fn api_stats(State(st): State<AppState>) -> impl IntoResponse {
    let config = st.engine.config();
    Json(StatsResponse {
        fallback_provider_count: st.engine.fallback_provider_count(),
        specialties: st.engine.specialty_names(),
        max_rows: config.max_rows,
        min_columns: config.min_columns,
        top_n: config.top_n,
    })
}

async fn api_match(
    State(st): State<AppState>,
    Json(criteria): Json<SearchCriteria>,
) -> impl IntoResponse {
    match st.engine.find_matching_providers(&criteria).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    symptoms: String,
}

async fn api_analyze(
    State(st): State<AppState>,
    Query(p): Query<AnalyzeParams>,
) -> impl IntoResponse {
    let criteria = SearchCriteria {
        symptoms: p.symptoms,
        ..Default::default()
    };
    Json(st.engine.analyze(&criteria).await)
}

#[derive(Debug, Deserialize)]
struct GeocodeParams {
    q: String,
}

async fn api_geocode(
    State(st): State<AppState>,
    Query(p): Query<GeocodeParams>,
) -> impl IntoResponse {
    if p.q.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "q must not be empty").into_response();
    }
    Json(st.engine.geocode(&p.q).await).into_response()
}

async fn api_specialties(State(st): State<AppState>) -> impl IntoResponse {
    Json(st.engine.specialty_names())
}
