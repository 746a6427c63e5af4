//! HTTP Server for the dashboard API.
//!
//! The dataset is loaded once before the server starts and shared read-only
//! by every handler. Each request recomputes its report from the selection it
//! carries.
//!
//! # API Endpoints
//!
//! | Method | Path                                      | Description                   |
//! |--------|-------------------------------------------|-------------------------------|
//! | GET    | `/health`                                 | Health check                  |
//! | GET    | `/api/gdp/leaderboard?year=`              | Top countries by GDP          |
//! | GET    | `/api/sectors?year=`                      | GDP by sector                 |
//! | GET    | `/api/imports?year=`                      | Imports by category           |
//! | GET    | `/api/related-imports?sector=&threshold=` | Categories tied to a sector   |
//! | POST   | `/api/correlation`                        | Sector/import heatmap         |
//! | GET    | `/api/detail-imports?year=`               | Commodity imports of a year   |
//! | GET    | `/api/logs`                               | SSE stream for real-time logs |

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, ApiResponse, CorrelationRequest, RelatedQuery, YearQuery};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, ReshapeError, ServerError, ServerResult};
use crate::models::{DetailImport, Period, WideTable};
use crate::transform::pipeline::{
    category_breakdown, correlation_heatmap, detail_imports_for_year, gdp_leaderboard,
    related_imports, CategoryBreakdown, CorrelationHeatmap, Dataset, GdpLeaderboard,
    RelatedImports,
};

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        Self {
            dataset: Arc::new(dataset),
            config: Arc::new(config),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<Value>)>;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/gdp/leaderboard", get(leaderboard))
        .route("/api/sectors", get(sectors))
        .route("/api/imports", get(imports))
        .route("/api/related-imports", get(related))
        .route("/api/correlation", post(correlation))
        .route("/api/detail-imports", get(detail_imports))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: AppState, port: u16) -> ServerResult<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Indodash server running on http://localhost:{}", port);
    println!("   GET  /api/gdp/leaderboard   - Top countries by GDP");
    println!("   GET  /api/sectors           - GDP by sector");
    println!("   GET  /api/imports           - Imports by category");
    println!("   GET  /api/related-imports   - Imports correlated with a sector");
    println!("   POST /api/correlation       - Correlation heatmap");
    println!("   GET  /api/detail-imports    - Commodity imports");
    println!("   GET  /api/logs              - SSE log stream");
    println!("   GET  /health                - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    let ds = &state.dataset;
    Json(json!({
        "status": "ok",
        "service": "indodash",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": {
            "countries": ds.gdp.len(),
            "sectors": ds.sectors.len(),
            "importCategories": ds.imports.len(),
            "detailImports": ds.detail_imports.len()
        }
    }))
}

async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> ApiResult<GdpLeaderboard> {
    let table = &state.dataset.gdp;
    let year = year_or_latest(query.year, table)?;
    let board = gdp_leaderboard(table, year, &state.config.focus_entity, state.config.top_n)
        .map_err(reject_reshape)?;
    Ok(Json(ApiResponse::new(board)))
}

async fn sectors(State(state): State<AppState>, Query(query): Query<YearQuery>) -> ApiResult<CategoryBreakdown> {
    breakdown(&state.dataset.sectors, query, state.config.top_n)
}

async fn imports(State(state): State<AppState>, Query(query): Query<YearQuery>) -> ApiResult<CategoryBreakdown> {
    breakdown(&state.dataset.imports, query, state.config.top_n)
}

fn breakdown(table: &WideTable, query: YearQuery, top_n: usize) -> ApiResult<CategoryBreakdown> {
    let year = year_or_latest(query.year, table)?;
    let breakdown = category_breakdown(table, year, top_n).map_err(reject_reshape)?;
    Ok(Json(ApiResponse::new(breakdown)))
}

async fn related(
    State(state): State<AppState>,
    Query(query): Query<RelatedQuery>,
) -> ApiResult<RelatedImports> {
    let threshold = query.threshold.unwrap_or(state.config.correlation_threshold);
    if !(-1.0..=1.0).contains(&threshold) {
        return Err(reject(ServerError::BadRequest(format!(
            "threshold must be between -1 and 1, got {}",
            threshold
        ))));
    }
    let policy = query.policy.unwrap_or(state.config.correlation_policy);

    let related = related_imports(&state.dataset, &query.sector, threshold, policy).map_err(reject_reshape)?;
    Ok(Json(ApiResponse::new(related)))
}

async fn correlation(
    State(state): State<AppState>,
    Json(body): Json<CorrelationRequest>,
) -> ApiResult<CorrelationHeatmap> {
    let policy = body.policy.unwrap_or(state.config.correlation_policy);
    let heatmap = correlation_heatmap(&state.dataset, &body.sectors, &body.categories, policy)
        .map_err(reject_reshape)?;
    Ok(Json(ApiResponse::new(heatmap)))
}

async fn detail_imports(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Vec<DetailImport>> {
    let rows = &state.dataset.detail_imports;
    let year = match query.year {
        Some(year) => Period::new(year),
        None => match rows.iter().map(|r| r.year).max() {
            Some(latest) => latest,
            None => return Ok(Json(ApiResponse::new(Vec::new()))),
        },
    };
    Ok(Json(ApiResponse::new(detail_imports_for_year(rows, year))))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Helpers
// =============================================================================

/// Requested year, or the table's latest period.
fn year_or_latest(year: Option<i32>, table: &WideTable) -> Result<Period, (StatusCode, Json<Value>)> {
    match year {
        Some(year) => Ok(Period::new(year)),
        None => table
            .last_period()
            .ok_or_else(|| reject(ServerError::Internal("table has no period columns".to_string()))),
    }
}

fn reject_reshape(err: ReshapeError) -> (StatusCode, Json<Value>) {
    reject(ServerError::Dashboard(DashboardError::Reshape(err)))
}

fn reject(err: ServerError) -> (StatusCode, Json<Value>) {
    let status = status_of(&err);
    if status.is_server_error() {
        log_error(format!("Request failed: {}", err));
    }
    (status, Json(error_response(&err.to_string())))
}

fn status_of(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Dashboard(DashboardError::Reshape(e)) => match e {
            ReshapeError::NotFound { .. } => StatusCode::NOT_FOUND,
            ReshapeError::Range { .. }
            | ReshapeError::UnknownPeriod(_)
            | ReshapeError::Shape { .. }
            | ReshapeError::MissingPeriod { .. } => StatusCode::BAD_REQUEST,
            ReshapeError::InvalidTable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
