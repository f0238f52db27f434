//! Wiring of stores, components and the orchestrator into shared web state.

use std::num::NonZeroUsize;
use std::sync::Arc;

use actix_web::web;
use chrono::Utc;
use log::info;
use serde_json::json;
use tokio::sync::RwLock;

use crate::core::clock::Clock;
use crate::core::component::{Component, ComponentConfig, ComponentError};
use crate::core::config::AppConfig;
use crate::core::orchestrator::Orchestrator;
use crate::core::telemetry::RiskTelemetry;
use crate::instances::{DataGeneratorInstance, RiskEngineInstance};
use crate::store::HistoryStore;
use crate::web::server::AppState;

/// Component id of the risk engine
pub const RISK_ENGINE_ID: &str = "risk_engine";
/// Component id of the data generator
pub const DATA_GENERATOR_ID: &str = "data_generator";

/// Build every component from `config`, register and start them
pub async fn build_state(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<web::Data<AppState>, ComponentError> {
    let history = Arc::new(match &config.storage.history_path {
        Some(path) => HistoryStore::open(path)?,
        None => HistoryStore::open_in_memory()?,
    });
    let telemetry = Arc::new(RiskTelemetry::new()?);

    let batch_capacity = NonZeroUsize::new(config.storage.batch_cache_capacity).ok_or_else(|| {
        ComponentError::ConfigError("batch_cache_capacity must be at least 1".to_string())
    })?;

    let mut risk_engine = RiskEngineInstance::new(
        clock.clone(),
        history.clone(),
        telemetry.clone(),
        batch_capacity,
        config.storage.histogram_bins,
    );
    risk_engine
        .initialize(ComponentConfig {
            id: RISK_ENGINE_ID.to_string(),
            name: "Risk Engine".to_string(),
            parameters: json!({
                "batch_cache_capacity": config.storage.batch_cache_capacity,
                "histogram_bins": config.storage.histogram_bins,
            }),
        })
        .await?;
    let latest = risk_engine.latest_index();

    let mut data_generator = DataGeneratorInstance::new(config.generator.clone(), clock.clone());
    data_generator
        .initialize(ComponentConfig {
            id: DATA_GENERATOR_ID.to_string(),
            name: "Data Generator".to_string(),
            parameters: json!({ "seed": config.generator.seed }),
        })
        .await?;

    let risk_engine = Arc::new(RwLock::new(risk_engine));
    let data_generator = Arc::new(RwLock::new(data_generator));

    let mut orchestrator = Orchestrator::new(config.metrics.clone());
    orchestrator.register_instance(RISK_ENGINE_ID, risk_engine.clone());
    orchestrator.register_instance(DATA_GENERATOR_ID, data_generator.clone());
    orchestrator.start_all().await?;
    info!("All components registered and running");

    Ok(web::Data::new(AppState {
        orchestrator: Arc::new(RwLock::new(orchestrator)),
        risk_engine,
        data_generator,
        history,
        telemetry,
        latest,
        clock,
        started_at: Utc::now(),
    }))
}
