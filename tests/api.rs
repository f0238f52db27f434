use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_files as fs;
use actix_web::{test, web, App};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use account_risk::app::build_state;
use account_risk::core::clock::FixedClock;
use account_risk::core::config::AppConfig;
use account_risk::web::handlers::pages::not_found;
use account_risk::web::{configure_routes, AppState};

async fn state() -> web::Data<AppState> {
    let mut config = AppConfig::default();
    config.generator.seed = Some(7);
    config.metrics.collection_interval_secs = 0;
    config.storage.batch_cache_capacity = 2;
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
    build_state(&config, Arc::new(clock)).await.unwrap()
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(configure_routes)
                .default_service(web::route().to(not_found)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_system_status_and_components() {
    let state = state().await;
    let app = app!(state);

    let status: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/system/status").to_request()).await;
    assert_eq!(status["status"], "Running");
    assert_eq!(status["active_components"], 2);

    let components: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/system/components").to_request()).await;
    let ids: Vec<&str> = components["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["data_generator", "risk_engine"]);
}

#[actix_web::test]
async fn test_demo_scores() {
    let state = state().await;
    let app = app!(state);

    let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/demo").to_request()).await;
    let accounts = body["data"]["accounts"].as_array().unwrap();
    let scores: Vec<u64> = accounts
        .iter()
        .map(|row| row["assessment"]["risk_score"].as_u64().unwrap())
        .collect();
    assert_eq!(scores, vec![11, 15, 100]);
    assert_eq!(accounts[2]["assessment"]["risk_level"], "HIGH RISK");
    assert_eq!(body["data"]["distribution"]["avg_score"], 42.0);
}

#[actix_web::test]
async fn test_batch_lifecycle() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/batches")
        .set_json(json!({ "size": 20 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let summary = &created["data"]["summary"];
    assert_eq!(summary["size"], 20);
    let batch_id = summary["batch_id"].as_str().unwrap().to_string();

    let all: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/batches/{}", batch_id)).to_request(),
    )
    .await;
    let rows = all["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 20);

    let high: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/batches/{}?levels=high", batch_id))
            .to_request(),
    )
    .await;
    let high_rows = high["data"]["rows"].as_array().unwrap();
    assert_eq!(high_rows.len() as u64, summary["distribution"]["high_risk"].as_u64().unwrap());
    assert!(high_rows.iter().all(|row| row["assessment"]["risk_level"] == "HIGH RISK"));

    let account_id = rows[0]["account"]["account_id"].as_str().unwrap();
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/batches/{}/accounts/{}", batch_id, account_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/batches/{}/accounts/nobody", batch_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/batches/{}/charts/levels.svg", batch_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/svg+xml");
    let svg = test::read_body(resp).await;
    assert!(std::str::from_utf8(&svg).unwrap().contains("<svg"));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/batches/{}/charts/scores.svg", batch_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/svg+xml");
    let svg = test::read_body(resp).await;
    assert!(std::str::from_utf8(&svg).unwrap().contains("<svg"));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/batches/missing/charts/scores.svg").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_batch_validation_and_unknown_batch() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/batches")
            .set_json(json!({ "size": 5 }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "VALIDATION_FAILED");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/batches/missing").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/batches/missing?levels=extreme").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_batch_body_rejected() {
    let state = state().await;
    let app = app!(state);

    for body in [json!({ "size": "lots" }), json!({ "size": -5 }), json!({ "size": 5.5 })] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/api/batches").set_json(&body).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", body);
        let error: Value = test::read_body_json(resp).await;
        assert_eq!(error["error_code"], "INVALID_REQUEST");
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/batches")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"size\": ")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // nothing was generated for the rejected bodies
    let listed: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/batches").to_request()).await;
    assert!(listed["data"].as_array().unwrap().is_empty());

    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/batches").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["data"]["summary"]["size"], 50);
}

#[actix_web::test]
async fn test_batch_cache_is_bounded() {
    let state = state().await;
    let app = app!(state);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/api/batches").set_json(json!({})).to_request(),
        )
        .await;
        assert_eq!(body["data"]["summary"]["size"], 50);
        ids.push(body["data"]["summary"]["batch_id"].as_str().unwrap().to_string());
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri(&format!("/api/batches/{}", ids[0])).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let listed: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/batches").to_request()).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);
    assert_eq!(listed["data"][0]["batch_id"], ids[2].as_str());
}

#[actix_web::test]
async fn test_assess_custom_and_history() {
    let state = state().await;
    let app = app!(state);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/assess/custom")
            .set_json(json!({}))
            .to_request(),
    )
    .await;
    let assessment = &body["data"]["assessment"];
    assert_eq!(assessment["account_id"], "custom_account_001");
    assert_eq!(body["data"]["account"]["account_type"], "Custom");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/assess/custom")
            .set_json(json!({ "account_age_days": 0 }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let latest: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/accounts/custom_account_001/latest").to_request(),
    )
    .await;
    assert_eq!(latest["data"]["risk_score"], assessment["risk_score"]);

    let history: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/history?account_id=custom_account_001")
            .to_request(),
    )
    .await;
    assert_eq!(history["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_assess_full_profile() {
    let state = state().await;
    let app = app!(state);

    let demo: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/demo").to_request()).await;
    let scammer = demo["data"]["accounts"][2]["account"].clone();

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post().uri("/api/assess").set_json(scammer).to_request(),
    )
    .await;
    assert_eq!(body["data"]["risk_score"], 100);
    assert_eq!(body["data"]["explanations"].as_array().unwrap().len(), 7);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/assess")
            .set_json(json!({ "account_id": "incomplete" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "INVALID_REQUEST");

    let mut inflated = demo["data"]["accounts"][2]["account"].clone();
    inflated["account_id"] = json!("inflated_scammer");
    inflated["repetitive_content"] = json!(250);
    inflated["suspicious_links"] = json!(200);
    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/api/assess").set_json(inflated).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "VALIDATION_FAILED");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/accounts/inflated_scammer/latest").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_system_metrics_summary() {
    let state = state().await;
    let app = app!(state);

    test::call_service(&app, test::TestRequest::get().uri("/api/demo").to_request()).await;
    {
        let orchestrator = state.orchestrator.read().await;
        orchestrator.metrics().collect_once(orchestrator.get_all_instances()).await;
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/system/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let engine = &body["data"]["component_highlights"]["risk_engine"];
    assert_eq!(engine["tasks_processed"], 1);
    assert_eq!(engine["custom_metrics"]["indexed_accounts"], 3);
    assert!(body["data"]["component_highlights"]["data_generator"].is_object());
}

#[actix_web::test]
async fn test_history_summary() {
    let state = state().await;
    let app = app!(state);

    let empty: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/history/summary").to_request()).await;
    assert_eq!(empty["data"]["total"], 0);

    test::call_service(&app, test::TestRequest::get().uri("/api/demo").to_request()).await;

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/history/summary").to_request()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["high_risk"], 1);
    assert_eq!(body["data"]["low_risk"], 2);
    assert_eq!(body["data"]["avg_score"], 42.0);
}

#[actix_web::test]
async fn test_component_task_route() {
    let state = state().await;
    let app = app!(state);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/components/data_generator/tasks")
            .set_json(json!({ "operation": "generate", "parameters": { "size": 10 } }))
            .to_request(),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 10);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/components/nope/tasks")
            .set_json(json!({ "operation": "generate" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_prometheus_metrics() {
    let state = state().await;
    let app = app!(state);

    test::call_service(&app, test::TestRequest::get().uri("/api/demo").to_request()).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.contains("risk_assessments_total{level=\"low\"} 2"));
    assert!(text.contains("risk_assessments_total{level=\"high\"} 1"));
}

#[actix_web::test]
async fn test_pages() {
    let state = state().await;
    let app = app!(state);

    for uri in ["/", "/demo", "/batch", "/single"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri("/no/such/page").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/batch/unknown").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_static_files_without_listing() {
    let config = AppConfig::default();
    let app = test::init_service(App::new().service(fs::Files::new("/static", &config.server.static_dir))).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/static/style.css").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/static/").to_request()).await;
    assert!(!resp.status().is_success());
}

#[actix_web::test]
async fn test_batch_form_redirects_to_results() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/batch")
            .set_form([("size", "15")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();
    assert!(location.starts_with("/batch/"));

    let resp = test::call_service(&app, test::TestRequest::get().uri(&format!("{}?levels=low", location)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/batch")
            .set_form([("size", "500")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_single_form_assesses() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/single")
            .set_form([
                ("account_id", "manual_entry"),
                ("followers", "10"),
                ("following", "3000"),
                ("posts", "500"),
                ("account_age_days", "5"),
                ("messages_sent_per_day", "80"),
                ("repetitive_content", "90"),
                ("suspicious_links", "60"),
                ("network_flags", "4"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("manual_entry"));
    assert!(html.contains("HIGH RISK"));
}
