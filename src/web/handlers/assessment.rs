use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde_json::json;

use crate::engine::generator::CustomAccountInput;
use crate::engine::scoring::risk_distribution;
use crate::model::AccountProfile;
use crate::web::models::{error_response, GenericResponse};
use crate::web::server::AppState;

/// Score the three demo accounts
pub async fn demo(data: web::Data<AppState>) -> impl Responder {
    let accounts = match data.data_generator.write().await.demo() {
        Ok(accounts) => accounts,
        Err(e) => return error_response(&e),
    };

    match data.risk_engine.write().await.analyze(accounts) {
        Ok(rows) => {
            let distribution = risk_distribution(rows.iter().map(|row| &row.assessment));
            HttpResponse::Ok().json(GenericResponse::ok(
                "Demo accounts analysed",
                json!({ "accounts": rows, "distribution": distribution }),
            ))
        }
        Err(e) => {
            error!("Demo analysis failed: {}", e);
            error_response(&e)
        }
    }
}

/// Score a full account profile
pub async fn assess(data: web::Data<AppState>, account: web::Json<AccountProfile>) -> impl Responder {
    let account = account.into_inner();

    match data.risk_engine.write().await.assess(&account) {
        Ok(assessment) => {
            info!(
                "Assessed {}: {} ({})",
                assessment.account_id, assessment.risk_score, assessment.risk_level
            );
            HttpResponse::Ok().json(GenericResponse::ok("Account assessed", json!(assessment)))
        }
        Err(e) => error_response(&e),
    }
}

/// Score an account built from manual input
pub async fn assess_custom(
    data: web::Data<AppState>,
    input: web::Json<CustomAccountInput>,
) -> impl Responder {
    let account = match data.data_generator.write().await.custom(&input) {
        Ok(account) => account,
        Err(e) => return error_response(&e),
    };

    match data.risk_engine.write().await.assess(&account) {
        Ok(assessment) => HttpResponse::Ok().json(GenericResponse::ok(
            "Account assessed",
            json!({ "account": account, "assessment": assessment }),
        )),
        Err(e) => error_response(&e),
    }
}

/// Most recent assessment of an account
pub async fn latest(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let account_id = path.into_inner();

    match data.latest.get(&account_id) {
        Some(assessment) => HttpResponse::Ok().json(GenericResponse::ok(
            "Latest assessment",
            json!(assessment.value()),
        )),
        None => error_response(&crate::core::component::ComponentError::NotFound(format!(
            "No assessment for account: {}",
            account_id
        ))),
    }
}
