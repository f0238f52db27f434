use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};
use serde_json::json;

use crate::core::component::ComponentTask;
use crate::web::models::{
    error_response, ComponentInfoResponse, GenericResponse, SystemStatusResponse, TaskRequest,
};
use crate::web::server::AppState;

/// Get the overall system status
pub async fn get_system_status(data: web::Data<AppState>) -> impl Responder {
    let orchestrator = data.orchestrator.read().await;
    let status = orchestrator.get_status();

    let response = SystemStatusResponse {
        status: format!("{:?}", status.state),
        active_components: status.active_components,
        uptime_seconds: (Utc::now() - data.started_at).num_seconds(),
        started_at: data.started_at,
        version: env!("CARGO_PKG_VERSION").to_string(),
        errors: status.errors.clone(),
        warnings: status.warnings.clone(),
    };

    HttpResponse::Ok().json(response)
}

/// Get the collected component metrics
pub async fn get_system_metrics(data: web::Data<AppState>) -> impl Responder {
    let metrics = data.orchestrator.read().await.metrics().clone();
    let summary = metrics.get_system_summary().await;

    HttpResponse::Ok().json(GenericResponse::ok("System metrics", json!(summary)))
}

/// Get information about all components
pub async fn get_components(data: web::Data<AppState>) -> impl Responder {
    let orchestrator = data.orchestrator.read().await;

    let mut components = Vec::new();
    for (id, instance) in orchestrator.get_all_instances() {
        let component = instance.read().await;
        components.push(ComponentInfoResponse {
            id: id.clone(),
            component_type: component.component_type().to_string(),
            status: component.status().to_string(),
            info: component.get_info(),
        });
    }
    components.sort_by(|a, b| a.id.cmp(&b.id));

    HttpResponse::Ok().json(json!({
        "success": true,
        "components": components
    }))
}

/// Route a raw task to a component by id
pub async fn submit_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<TaskRequest>,
) -> impl Responder {
    let component_id = path.into_inner();
    let request = request.into_inner();
    let description = request
        .description
        .unwrap_or_else(|| format!("{} via API", request.operation));
    let task = ComponentTask::new(&description, &request.operation, request.parameters);
    let task_id = task.id.clone();

    let orchestrator = data.orchestrator.read().await;
    match orchestrator.submit_task(&component_id, task).await {
        Ok(result) => {
            info!("Task {} completed on {}", task_id, component_id);
            HttpResponse::Ok().json(GenericResponse::ok(
                format!("Task {} completed", task_id),
                result,
            ))
        }
        Err(e) => {
            error!("Task {} failed on {}: {}", task_id, component_id, e);
            error_response(&e)
        }
    }
}

/// Prometheus text exposition
pub async fn prometheus_metrics(data: web::Data<AppState>) -> impl Responder {
    match data.telemetry.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            error_response(&e)
        }
    }
}
