//! HTTP surface of the query service.
//!
//! Thin parameter parsing and status mapping only; all semantics live in
//! `geoatlas::QueryService`. Responses are GeoJSON FeatureCollections
//! except `/api/config` and `/api/health`.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use geoatlas::query::LAYER_POIS;
use geoatlas::{AtlasError, BoundingBox, QueryService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

const DEFAULT_ZOOM: u8 = 10;

pub fn router(service: Arc<QueryService>) -> axum::Router {
    axum::Router::new()
        .route("/api/config", get(config))
        .route("/api/health", get(health))
        .route("/api/boundaries", get(boundaries))
        .route("/api/cities", get(cities))
        .route("/api/cells", get(cells))
        .route("/api/cell/:id", get(cell_by_id))
        .route("/api/pois", get(pois))
        .route("/api/pois/aggregated", get(pois_aggregated))
        .route("/api/tiles/:layer/:z/:x/:y", get(tile))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// `AtlasError` mapped onto an HTTP status with a JSON error body.
struct ApiError(AtlasError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AtlasError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AtlasError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => {
                error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<AtlasError> for ApiError {
    fn from(e: AtlasError) -> Self {
        Self(e)
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Viewport query string: `bbox=west,south,east,north`, `zoom=<u8>`.
/// Parameters arrive as strings so malformed values map to 400 rather
/// than axum's default rejection.
#[derive(Debug, Default, Deserialize)]
struct ViewportParams {
    bbox: Option<String>,
    zoom: Option<String>,
}

impl ViewportParams {
    fn bbox(&self) -> Result<Option<BoundingBox>, ApiError> {
        self.bbox
            .as_deref()
            .map(|raw| {
                raw.parse::<BoundingBox>()
                    .map_err(|e| ApiError(AtlasError::BadRequest(e)))
            })
            .transpose()
    }

    fn zoom(&self) -> Result<u8, ApiError> {
        match self.zoom.as_deref() {
            None | Some("") => Ok(DEFAULT_ZOOM),
            Some(raw) => raw.parse::<u8>().map_err(|_| {
                ApiError(AtlasError::BadRequest(format!("invalid zoom '{raw}'")))
            }),
        }
    }
}

async fn config(State(service): State<Arc<QueryService>>) -> Json<geoatlas::AppConfig> {
    Json(service.config().clone())
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    pois_count: usize,
}

async fn health(State(service): State<Arc<QueryService>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        pois_count: service.layer_len(LAYER_POIS),
    })
}

async fn boundaries(
    State(service): State<Arc<QueryService>>,
) -> ApiResult<geoatlas::FeatureCollection> {
    Ok(Json(service.boundaries()?))
}

async fn cities(
    State(service): State<Arc<QueryService>>,
    Query(params): Query<ViewportParams>,
) -> ApiResult<geoatlas::FeatureCollection> {
    let bbox = params.bbox()?;
    Ok(Json(service.cities(bbox.as_ref())?))
}

async fn cells(
    State(service): State<Arc<QueryService>>,
    Query(params): Query<ViewportParams>,
) -> ApiResult<geoatlas::FeatureCollection> {
    let bbox = params.bbox()?;
    Ok(Json(service.cells(bbox.as_ref(), params.zoom()?)?))
}

async fn cell_by_id(
    State(service): State<Arc<QueryService>>,
    Path(id): Path<String>,
) -> ApiResult<geoatlas::FeatureCollection> {
    let id: u64 = id
        .parse()
        .map_err(|_| ApiError(AtlasError::BadRequest(format!("invalid cell id '{id}'"))))?;
    Ok(Json(service.cell_by_id(id)?))
}

async fn pois(
    State(service): State<Arc<QueryService>>,
    Query(params): Query<ViewportParams>,
) -> ApiResult<geoatlas::FeatureCollection> {
    let bbox = params.bbox()?;
    Ok(Json(service.pois(bbox.as_ref(), params.zoom()?)?))
}

#[derive(Debug, Deserialize)]
struct AggregatedParams {
    level: Option<String>,
}

async fn pois_aggregated(
    State(service): State<Arc<QueryService>>,
    Query(params): Query<AggregatedParams>,
) -> ApiResult<geoatlas::FeatureCollection> {
    let level = params.level.as_deref().unwrap_or("province");
    Ok(Json(service.pois_aggregated(level)?))
}

async fn tile(
    State(service): State<Arc<QueryService>>,
    Path((layer, z, x, y)): Path<(String, u8, u32, u32)>,
) -> ApiResult<geoatlas::FeatureCollection> {
    Ok(Json(service.tile(&layer, z, x, y)?))
}
