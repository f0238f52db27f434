use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::component::ComponentError;
use crate::model::RiskLevel;

/// System status response
#[derive(Serialize)]
pub struct SystemStatusResponse {
    pub status: String,
    pub active_components: usize,
    pub uptime_seconds: i64,
    pub started_at: DateTime<Utc>,
    pub version: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Component info response
#[derive(Serialize)]
pub struct ComponentInfoResponse {
    pub id: String,
    pub component_type: String,
    pub status: String,
    pub info: serde_json::Value,
}

/// Task request routed to a component
#[derive(Deserialize)]
pub struct TaskRequest {
    pub operation: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
    pub description: Option<String>,
}

/// Batch creation request
#[derive(Debug, Default, Deserialize)]
pub struct BatchRequest {
    pub size: Option<usize>,
}

/// Level filter on batch queries, e.g. `?levels=low,high`
#[derive(Debug, Default, Deserialize)]
pub struct BatchQuery {
    pub levels: Option<String>,
    pub account: Option<String>,
}

/// History query
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub account_id: Option<String>,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

/// Largest page of history returned at once
pub const MAX_HISTORY_LIMIT: usize = 500;

fn default_history_limit() -> usize {
    50
}

/// Generic response
#[derive(Serialize)]
pub struct GenericResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl GenericResponse {
    pub fn ok(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl From<&ComponentError> for ErrorResponse {
    fn from(e: &ComponentError) -> Self {
        Self {
            success: false,
            error: e.to_string(),
            error_code: e.error_code().to_string(),
        }
    }
}

/// Map a component error onto an HTTP status with a JSON body
pub fn error_response(e: &ComponentError) -> HttpResponse {
    let mut builder = match e {
        ComponentError::ValidationError(_) | ComponentError::ConfigError(_) => HttpResponse::BadRequest(),
        ComponentError::NotFound(_) => HttpResponse::NotFound(),
        _ => HttpResponse::InternalServerError(),
    };
    builder.json(ErrorResponse::from(e))
}

/// Parse a comma separated level filter; absent means every level
pub fn parse_levels(raw: Option<&str>) -> Result<Vec<RiskLevel>, ComponentError> {
    let raw = match raw {
        Some(raw) => raw,
        None => return Ok(RiskLevel::ALL.to_vec()),
    };

    let mut levels = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let level: RiskLevel = part.parse().map_err(ComponentError::ValidationError)?;
        if !levels.contains(&level) {
            levels.push(level);
        }
    }
    levels.sort();
    Ok(levels)
}

/// Format a level filter back into its query form
pub fn format_levels(levels: &[RiskLevel]) -> String {
    levels
        .iter()
        .map(|level| level.metric_label())
        .collect::<Vec<_>>()
        .join(",")
}

/// Malformed JSON bodies become 400 responses in the API error format
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse {
        success: false,
        error: format!("Invalid request body: {}", err),
        error_code: "INVALID_REQUEST".to_string(),
    };
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Malformed query strings become 400 responses in the API error format
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse {
        success: false,
        error: format!("Invalid query string: {}", err),
        error_code: "INVALID_REQUEST".to_string(),
    };
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}
