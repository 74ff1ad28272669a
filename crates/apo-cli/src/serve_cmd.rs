use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use axum::response::Html;
use apo_core::{CoreError, approval, draft, ledger, transition};
use apo_db::models::{ApoHeader, ApoItem, ApoStatus, EstimateStatus, Role};
use apo_db::queries::{headers as header_db, items as item_db, norms as norm_db};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::Validation(_) | CoreError::BudgetExceeded { .. } => StatusCode::BAD_REQUEST,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub plantation_id: Uuid,
    pub financial_year: String,
    /// Planned quantity per activity; omitted activities default to the
    /// plantation's total area.
    #[serde(default)]
    pub quantities: HashMap<Uuid, f64>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ReviseRequest {
    pub revised_qty: f64,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ItemStatusRequest {
    pub status: EstimateStatus,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct HeaderStatusRequest {
    pub status: ApoStatus,
    pub role: Role,
    pub actor: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EstimatesQuery {
    pub plantation_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct NormsQuery {
    pub financial_year: String,
}

#[derive(Debug, Serialize)]
pub struct ApoDetailResponse {
    #[serde(flatten)]
    pub header: ApoHeader,
    pub items: Vec<ApoItem>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/apo", get(list_apos))
        .route("/api/apo/draft", post(create_draft))
        .route("/api/apo/{id}", get(get_apo_detail))
        .route("/api/apo/{id}/status", patch(change_apo_status))
        .route("/api/items/{id}/estimate", patch(revise_item))
        .route("/api/items/{id}/status", patch(change_item_status))
        .route("/api/estimates", get(list_estimates_handler))
        .route("/api/norms", get(list_norms_handler))
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("apo serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("apo serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index(State(pool): State<PgPool>) -> Result<axum::response::Response, AppError> {
    let apos = header_db::list_headers(&pool)
        .await
        .map_err(AppError::internal)?;

    let rows = if apos.is_empty() {
        "<tr><td colspan=\"4\">No APOs found.</td></tr>".to_string()
    } else {
        apos.iter()
            .map(|h| {
                format!(
                    "<tr><td><a href=\"/api/apo/{id}\">{fy}</a></td><td>{status}</td><td>{total:.2}</td><td>{id}</td></tr>",
                    id = h.id,
                    fy = h.financial_year,
                    status = h.status,
                    total = h.total_sanctioned_amount,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>apo</title></head><body>\
<h1>apo</h1>\
<p><a href=\"/api/apo\">/api/apo</a> | <a href=\"/api/estimates\">/api/estimates</a></p>\
<table><tr><th>FY</th><th>Status</th><th>Sanctioned</th><th>ID</th></tr>{rows}</table>\
</body></html>"
    );

    Ok(Html(html).into_response())
}

async fn list_apos(State(pool): State<PgPool>) -> Result<axum::response::Response, AppError> {
    let apos = header_db::list_headers(&pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(apos).into_response())
}

async fn create_draft(
    State(pool): State<PgPool>,
    Json(req): Json<DraftRequest>,
) -> Result<axum::response::Response, AppError> {
    let apo_draft = draft::generate_draft(
        &pool,
        req.plantation_id,
        &req.financial_year,
        &req.quantities,
        req.created_by,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(apo_draft)).into_response())
}

async fn get_apo_detail(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let header = header_db::get_header(&pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("APO {id} not found")))?;

    let items = item_db::list_items_for_header(&pool, id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(ApoDetailResponse { header, items }).into_response())
}

async fn change_apo_status(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(req): Json<HeaderStatusRequest>,
) -> Result<axum::response::Response, AppError> {
    let header =
        approval::change_header_status(&pool, id, req.status, req.role, req.actor).await?;
    Ok(Json(header).into_response())
}

async fn revise_item(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviseRequest>,
) -> Result<axum::response::Response, AppError> {
    let item = ledger::revise_quantity(&pool, id, req.revised_qty, req.role).await?;
    Ok(Json(item).into_response())
}

async fn change_item_status(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(req): Json<ItemStatusRequest>,
) -> Result<axum::response::Response, AppError> {
    let item = transition::change_status(&pool, id, req.status, req.role).await?;
    Ok(Json(item).into_response())
}

async fn list_estimates_handler(
    State(pool): State<PgPool>,
    Query(query): Query<EstimatesQuery>,
) -> Result<axum::response::Response, AppError> {
    let items = ledger::list_estimates(&pool, query.plantation_id).await?;
    Ok(Json(items).into_response())
}

async fn list_norms_handler(
    State(pool): State<PgPool>,
    Query(query): Query<NormsQuery>,
) -> Result<axum::response::Response, AppError> {
    let norms = norm_db::list_norms(&pool, &query.financial_year)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(norms).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
