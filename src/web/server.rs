use std::sync::Arc;

use actix_files as fs;
use actix_web::{middleware, web, App, HttpServer};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::info;
use tokio::sync::RwLock;

use crate::core::clock::Clock;
use crate::core::config::ServerConfig;
use crate::core::orchestrator::Orchestrator;
use crate::core::telemetry::RiskTelemetry;
use crate::instances::{DataGeneratorInstance, RiskEngineInstance};
use crate::model::RiskAssessment;
use crate::store::HistoryStore;
use crate::web::handlers;
use crate::web::models::{json_error_handler, query_error_handler};

/// Start the web server for the dashboard and API
pub async fn start_web_server(server: &ServerConfig, app_state: web::Data<AppState>) -> std::io::Result<()> {
    let bind_address = format!("{}:{}", server.host, server.port);
    info!("Starting web server on http://{}", bind_address);

    let static_dir = server.static_dir.clone();
    let mut http_server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            // Static files
            .service(fs::Files::new("/static", &static_dir))
            .configure(configure_routes)
            // Default route for 404
            .default_service(web::route().to(handlers::pages::not_found))
    });

    if let Some(workers) = server.workers {
        http_server = http_server.workers(workers);
    }

    http_server.bind(bind_address)?.run().await
}

/// Register API and page routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        // API routes
        .service(
            web::scope("/api")
                // System APIs
                .route("/system/status", web::get().to(handlers::system::get_system_status))
                .route("/system/metrics", web::get().to(handlers::system::get_system_metrics))
                .route("/system/components", web::get().to(handlers::system::get_components))
                .route("/components/{id}/tasks", web::post().to(handlers::system::submit_task))
                // Assessment APIs
                .route("/demo", web::get().to(handlers::assessment::demo))
                .route("/assess", web::post().to(handlers::assessment::assess))
                .route("/assess/custom", web::post().to(handlers::assessment::assess_custom))
                .route("/accounts/{account_id}/latest", web::get().to(handlers::assessment::latest))
                // Batch APIs
                .route("/batches", web::get().to(handlers::batch::list_batches))
                .route("/batches", web::post().to(handlers::batch::create_batch))
                .route("/batches/{id}", web::get().to(handlers::batch::get_batch))
                .route("/batches/{id}/accounts/{account_id}", web::get().to(handlers::batch::get_batch_account))
                .route("/batches/{id}/charts/levels.svg", web::get().to(handlers::batch::level_chart))
                .route("/batches/{id}/charts/scores.svg", web::get().to(handlers::batch::score_chart))
                // History APIs
                .route("/history", web::get().to(handlers::history::get_history))
                .route("/history/summary", web::get().to(handlers::history::get_history_summary)),
        )
        .route("/metrics", web::get().to(handlers::system::prometheus_metrics))
        // Page routes
        .route("/", web::get().to(handlers::pages::index))
        .route("/demo", web::get().to(handlers::pages::demo))
        .route("/batch", web::get().to(handlers::pages::batch_form))
        .route("/batch", web::post().to(handlers::pages::batch_create))
        .route("/batch/{id}", web::get().to(handlers::pages::batch_view))
        .route("/single", web::get().to(handlers::pages::single_form))
        .route("/single", web::post().to(handlers::pages::single_assess));
}

/// Shared application state for web handlers
pub struct AppState {
    pub orchestrator: Arc<RwLock<Orchestrator>>,
    pub risk_engine: Arc<RwLock<RiskEngineInstance>>,
    pub data_generator: Arc<RwLock<DataGeneratorInstance>>,
    pub history: Arc<HistoryStore>,
    pub telemetry: Arc<RiskTelemetry>,
    /// Latest assessment per account, read without the engine lock
    pub latest: Arc<DashMap<String, RiskAssessment>>,
    pub clock: Arc<dyn Clock>,
    pub started_at: DateTime<Utc>,
}
