use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde_json::json;

use crate::core::component::ComponentError;
use crate::engine::charts::{render_level_chart, render_score_histogram};
use crate::instances::BatchAnalysis;
use crate::web::models::{error_response, parse_levels, BatchQuery, BatchRequest, ErrorResponse, GenericResponse};
use crate::web::server::AppState;

/// Generate a batch of accounts and score it
///
/// An empty body means the configured default size.
pub async fn create_batch(data: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    let size = match parse_batch_request(&body) {
        Ok(request) => request.size,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                success: false,
                error: format!("Invalid request body: {}", e),
                error_code: "INVALID_REQUEST".to_string(),
            })
        }
    };

    match generate_and_analyze(&data, size).await {
        Ok(batch) => HttpResponse::Created().json(GenericResponse::ok(
            format!("Analysed {} accounts", batch.rows.len()),
            json!({ "summary": batch.summary(), "histogram": batch.histogram }),
        )),
        Err(e) => {
            error!("Batch analysis failed: {}", e);
            error_response(&e)
        }
    }
}

/// Summaries of cached batches, most recent first
pub async fn list_batches(data: web::Data<AppState>) -> impl Responder {
    let batches = data.risk_engine.read().await.recent_batches();
    HttpResponse::Ok().json(GenericResponse::ok("Cached batches", json!(batches)))
}

/// Rows of a batch, optionally filtered by level
pub async fn get_batch(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<BatchQuery>,
) -> impl Responder {
    let levels = match parse_levels(query.levels.as_deref()) {
        Ok(levels) => levels,
        Err(e) => return error_response(&e),
    };

    match lookup(&data, &path).await {
        Ok(batch) => HttpResponse::Ok().json(GenericResponse::ok(
            "Batch analysis",
            json!({
                "summary": batch.summary(),
                "histogram": batch.histogram,
                "levels": levels,
                "rows": batch.filtered(&levels),
            }),
        )),
        Err(e) => error_response(&e),
    }
}

/// One account of a batch with its assessment
pub async fn get_batch_account(data: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (batch_id, account_id) = path.into_inner();

    let batch = match lookup(&data, &batch_id).await {
        Ok(batch) => batch,
        Err(e) => return error_response(&e),
    };

    match batch.find(&account_id) {
        Some(row) => HttpResponse::Ok().json(GenericResponse::ok("Account analysis", json!(row))),
        None => error_response(&ComponentError::NotFound(format!(
            "Account {} not in batch {}",
            account_id, batch_id
        ))),
    }
}

/// Accounts per risk level as an SVG bar chart
pub async fn level_chart(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let rendered = lookup(&data, &path)
        .await
        .and_then(|batch| render_level_chart(&batch.distribution));
    svg_response(rendered)
}

/// Score histogram as an SVG chart
pub async fn score_chart(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let rendered = lookup(&data, &path)
        .await
        .and_then(|batch| render_score_histogram(&batch.histogram));
    svg_response(rendered)
}

/// Generate with the data generator, then score with the risk engine
pub(crate) async fn generate_and_analyze(
    data: &AppState,
    size: Option<usize>,
) -> Result<std::sync::Arc<BatchAnalysis>, ComponentError> {
    // generator lock is released before the engine lock is taken
    let accounts = data.data_generator.write().await.generate(size)?;
    data.risk_engine.write().await.analyze_batch(accounts)
}

fn parse_batch_request(body: &[u8]) -> Result<BatchRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BatchRequest::default());
    }
    serde_json::from_slice(body)
}

pub(crate) async fn lookup(data: &AppState, batch_id: &str) -> Result<std::sync::Arc<BatchAnalysis>, ComponentError> {
    data.risk_engine.write().await.batch(batch_id)
}

fn svg_response(rendered: Result<String, ComponentError>) -> HttpResponse {
    match rendered {
        Ok(svg) => HttpResponse::Ok().content_type("image/svg+xml").body(svg),
        Err(e) => {
            error!("Chart rendering failed: {}", e);
            error_response(&e)
        }
    }
}
