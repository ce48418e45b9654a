//! REST API server for the report orchestrator
//!
//! Exposes report creation, generation, and polling endpoints over HTTP.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Report, ReportRequest, ReportStatus};
use crate::orchestrator::Orchestrator;
use crate::render::{DocumentRenderer, RenderSection};
use crate::storage::{document_path, ObjectStore};
use crate::store::{resolve_completion_status, NewReport, ReportStore};

const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub title: String,
    pub user_id: Option<String>,
    pub startup_id: Option<String>,
    pub report_type: Option<String>,
    #[serde(default)]
    pub parameters: ReportRequest,
}

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize)]
pub struct ReportSectionDto {
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub title: String,
    pub status: ReportStatus,
    pub progress: i32,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub startup_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub report_type: Option<String>,
    pub parameters: serde_json::Value,
    pub sections: Vec<ReportSectionDto>,
    pub signed_document_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportStatusResponse {
    pub report_id: Uuid,
    pub status: ReportStatus,
    pub progress: i32,
}

#[derive(Debug, Serialize)]
pub struct ReportContentResponse {
    pub url: Option<String>,
    pub status: ReportStatus,
    pub sections: Vec<ReportSectionDto>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn ReportStore>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub objects: Arc<dyn ObjectStore>,
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

fn parse_or_stable_uuid(value: Option<&str>) -> Option<Uuid> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v)))
}

fn section_dtos(report: &Report) -> Vec<ReportSectionDto> {
    report
        .sections
        .iter()
        .map(|section| ReportSectionDto {
            id: format!("section_{}", section.position),
            title: section.title.clone(),
            content: section.content.clone(),
        })
        .collect()
}

fn report_response(report: &Report) -> ReportResponse {
    ReportResponse {
        id: report.id,
        title: report.title.clone(),
        status: report.status,
        progress: report.progress,
        created_at: report.created_at.to_rfc3339(),
        updated_at: report.completed_at.map(|t| t.to_rfc3339()),
        startup_id: report.startup_id.clone(),
        user_id: report.user_id,
        report_type: report.report_type.clone(),
        parameters: report.parameters.clone(),
        sections: section_dtos(report),
        signed_document_url: report.document_url.clone(),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Report Endpoints
/// =============================

async fn create_report(
    State(state): State<ApiState>,
    Json(req): Json<CreateReportRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!("Received report creation request: {}", req.title);

    let new_report = NewReport {
        title: req.title,
        user_id: parse_or_stable_uuid(req.user_id.as_deref()),
        startup_id: req.startup_id,
        report_type: req.report_type,
        parameters: serde_json::to_value(&req.parameters).unwrap_or_default(),
    };

    match state.store.create_report(new_report).await {
        Ok(report) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(report_response(&report))),
        ),
        Err(e) => {
            error!("Error creating report: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to create report".to_string())),
            )
        }
    }
}

/// Run the full pipeline for an existing report: generate the seven
/// sections, persist them, resolve the completion status per the review
/// policy, then render and upload the document. Render/upload failures are
/// logged but never fail the request.
async fn generate_report(
    State(state): State<ApiState>,
    Path(report_id): Path<Uuid>,
) -> (StatusCode, Json<ApiResponse>) {
    let report = match state.store.get_report(report_id).await {
        Ok(Some(report)) => report,
        Ok(None) => {
            warn!("Report with id {} not found", report_id);
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Report not found".to_string())),
            );
        }
        Err(e) => {
            error!("Error loading report {}: {}", report_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load report".to_string())),
            );
        }
    };

    let mut request: ReportRequest =
        serde_json::from_value(report.parameters.clone()).unwrap_or_default();
    if request.report_query.is_none() {
        request.report_query = Some(format!("Investment readiness analysis: {}", report.title));
    }

    if let Err(e) = state
        .store
        .update_status(report_id, ReportStatus::Generating, 10)
        .await
    {
        warn!("Could not mark report {} as generating: {}", report_id, e);
    }

    info!("Generating full report {}", report_id);
    let cancel = CancellationToken::new();
    let generated = match state.orchestrator.generate_report(&request, &cancel).await {
        Ok(generated) => generated,
        Err(e) => {
            error!("Report generation failed for {}: {}", report_id, e);
            let _ = state
                .store
                .update_status(report_id, ReportStatus::Failed, 0)
                .await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Report generation failed: {}", e))),
            );
        }
    };

    let section_map = generated.section_map();
    if let Err(e) = state.store.update_sections(report_id, &section_map).await {
        error!("Failed to persist sections for {}: {}", report_id, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to persist sections".to_string())),
        );
    }

    let final_status = resolve_completion_status(state.store.as_ref()).await;
    if let Err(e) = state.store.update_status(report_id, final_status, 100).await {
        error!("Failed to update status for {}: {}", report_id, e);
    }

    finalize_report_document(&state, report_id).await;

    match state.store.get_report(report_id).await {
        Ok(Some(updated)) => (
            StatusCode::OK,
            Json(ApiResponse::success(report_response(&updated))),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Failed to reload report".to_string())),
        ),
    }
}

/// Render the stored sections, upload the document, and record its signed
/// URL. Best effort: every failure is logged and swallowed.
async fn finalize_report_document(state: &ApiState, report_id: Uuid) {
    let report = match state.store.get_report(report_id).await {
        Ok(Some(report)) => report,
        _ => return,
    };

    let sections: Vec<RenderSection> = report.sections.iter().map(RenderSection::from).collect();

    let rendered = match state.renderer.render(&report.title, &company_of(&report), &sections) {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Error rendering document for report {}: {}", report_id, e);
            return;
        }
    };

    let path = document_path(&company_of(&report), report_id, rendered.file_extension);
    if let Err(e) = state
        .objects
        .upload(&path, rendered.bytes, rendered.content_type)
        .await
    {
        error!("Error uploading document for report {}: {}", report_id, e);
        return;
    }

    match state.objects.signed_url(&path, SIGNED_URL_TTL).await {
        Ok(url) => {
            if let Err(e) = state.store.set_document_url(report_id, &url).await {
                error!("Error storing document url for report {}: {}", report_id, e);
            }
        }
        Err(e) => error!("Error signing document url for report {}: {}", report_id, e),
    }
}

fn company_of(report: &Report) -> String {
    report
        .parameters
        .get("company")
        .and_then(|v| v.as_str())
        .unwrap_or("report")
        .to_string()
}

async fn get_report(
    State(state): State<ApiState>,
    Path(report_id): Path<Uuid>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.store.get_report(report_id).await {
        Ok(Some(report)) => (
            StatusCode::OK,
            Json(ApiResponse::success(report_response(&report))),
        ),
        Ok(None) => {
            warn!("Report with id {} not found", report_id);
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Report not found".to_string())),
            )
        }
        Err(e) => {
            error!("Error loading report {}: {}", report_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load report".to_string())),
            )
        }
    }
}

async fn get_report_content(
    State(state): State<ApiState>,
    Path(report_id): Path<Uuid>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.store.get_report(report_id).await {
        Ok(Some(report)) => (
            StatusCode::OK,
            Json(ApiResponse::success(ReportContentResponse {
                url: report.document_url.clone(),
                status: report.status,
                sections: section_dtos(&report),
            })),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Report content not found".to_string())),
        ),
        Err(e) => {
            error!("Error loading report content {}: {}", report_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load report content".to_string())),
            )
        }
    }
}

async fn report_status(
    State(state): State<ApiState>,
    Path(report_id): Path<Uuid>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.store.get_report(report_id).await {
        Ok(Some(report)) => (
            StatusCode::OK,
            Json(ApiResponse::success(ReportStatusResponse {
                report_id: report.id,
                status: report.status,
                progress: report.progress,
            })),
        ),
        Ok(None) => {
            warn!("Report with id {} not found", report_id);
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Report not found".to_string())),
            )
        }
        Err(e) => {
            error!("Error loading report status {}: {}", report_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load report status".to_string())),
            )
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/reports", post(create_report))
        .route("/api/reports/:report_id/generate", post(generate_report))
        .route("/api/reports/:report_id", get(get_report))
        .route("/api/reports/:report_id/content", get(get_report_content))
        .route("/api/reports/:report_id/status", get(report_status))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
