// HTTP request handlers for API endpoints

use crate::api::auth::presented_secret;
use crate::api::models::*;
use crate::sync::{RunMode, SyncRunner, SyncStatus};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use std::time::Instant;

/// Shared state for all handlers.
pub struct AppState {
    pub runner: SyncRunner,
    pub started: Instant,
}

impl AppState {
    pub fn new(runner: SyncRunner) -> Self {
        Self {
            runner,
            started: Instant::now(),
        }
    }
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Run the product sync (or a dry run) and return its log.
pub async fn run_sync(
    req: HttpRequest,
    payload: Option<web::Json<SyncRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let body = payload.map(web::Json::into_inner).unwrap_or_default();
    let secret = presented_secret(&req, Some(&body));
    let mode = if body.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Write
    };

    tracing::info!(dry_run = body.dry_run, "Sync requested");

    let report = state.runner.run_with(&secret, mode).await;
    let response = match report.status {
        SyncStatus::Success => HttpResponse::Ok().json(ApiResponse::success(report)),
        SyncStatus::Unauthorized => {
            tracing::warn!("Sync rejected: invalid password");
            HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Invalid or missing password"))
        }
        SyncStatus::Failed => {
            let message = report.error.clone().unwrap_or_else(|| report.message.clone());
            HttpResponse::InternalServerError().json(ApiResponse::failure(report, message))
        }
    };

    Ok(response)
}
