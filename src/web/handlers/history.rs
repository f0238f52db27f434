use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::web::models::{error_response, GenericResponse, HistoryQuery, MAX_HISTORY_LIMIT};
use crate::web::server::AppState;

/// Past assessments, newest first, optionally for one account
pub async fn get_history(data: web::Data<AppState>, query: web::Query<HistoryQuery>) -> impl Responder {
    let limit = query.limit.clamp(1, MAX_HISTORY_LIMIT);

    let entries = match query.account_id.as_deref() {
        Some(account_id) => data.history.for_account(account_id, limit),
        None => data.history.recent(limit),
    };

    match entries {
        Ok(entries) => HttpResponse::Ok().json(GenericResponse::ok(
            format!("{} assessments", entries.len()),
            json!(entries),
        )),
        Err(e) => error_response(&e),
    }
}

/// Level counts over the whole history
pub async fn get_history_summary(data: web::Data<AppState>) -> impl Responder {
    match data.history.distribution() {
        Ok(distribution) => HttpResponse::Ok().json(GenericResponse::ok("History summary", json!(distribution))),
        Err(e) => error_response(&e),
    }
}
