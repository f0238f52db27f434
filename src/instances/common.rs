use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::component::{
    ComponentConfig, ComponentError, ComponentMetrics, ComponentStatus, ComponentTask,
};

/// Maximum number of events kept per component
const EVENT_LOG_CAPACITY: usize = 1000;

/// Base functionality shared by all component instances
#[derive(Debug)]
pub struct BaseComponent {
    /// Component identifier
    pub id: String,
    /// Component type name
    pub component_type: String,
    /// Current status
    pub status: ComponentStatus,
    /// Configuration
    pub config: Option<ComponentConfig>,
    /// Performance metrics
    pub metrics: PerformanceMetrics,
    /// Log of recent events
    pub event_log: Arc<Mutex<Vec<ComponentEvent>>>,
}

/// Performance metrics tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Number of tasks processed
    pub tasks_processed: u64,
    /// Number of tasks failed
    pub tasks_failed: u64,
    /// Average processing time in ms
    pub avg_processing_time: f64,
    /// Last processing time in ms
    pub last_processing_time: f64,
    /// Custom metrics
    pub custom_metrics: HashMap<String, f64>,
    /// Last updated timestamp
    pub last_updated: DateTime<Utc>,
}

/// Component event for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEvent {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: EventType,
    /// Event description
    pub description: String,
    /// Associated data
    pub data: Option<serde_json::Value>,
}

/// Types of component events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum EventType {
    Initialization,
    StateChange,
    TaskProcessing,
    Error,
    Warning,
    Info,
}

impl BaseComponent {
    /// Create a new base component
    pub fn new(id: &str, component_type: &str) -> Self {
        Self {
            id: id.to_string(),
            component_type: component_type.to_string(),
            status: ComponentStatus::Initialized,
            config: None,
            metrics: PerformanceMetrics {
                tasks_processed: 0,
                tasks_failed: 0,
                avg_processing_time: 0.0,
                last_processing_time: 0.0,
                custom_metrics: HashMap::new(),
                last_updated: Utc::now(),
            },
            event_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Log a component event
    pub async fn log_event(&self, event_type: EventType, description: &str, data: Option<serde_json::Value>) {
        let event = ComponentEvent {
            timestamp: Utc::now(),
            event_type,
            description: description.to_string(),
            data,
        };

        match event.event_type {
            EventType::Error => error!("{}: {}", self.id, description),
            EventType::Warning => warn!("{}: {}", self.id, description),
            _ => debug!("{}: {}", self.id, description),
        }

        let mut log = self.event_log.lock().await;
        log.push(event);

        if log.len() > EVENT_LOG_CAPACITY {
            log.drain(0..EVENT_LOG_CAPACITY / 2);
        }
    }

    /// Transition to a new status, recording the change
    pub async fn transition(&mut self, status: ComponentStatus) {
        let description = format!("{} -> {}", self.status, status);
        self.status = status;
        self.log_event(EventType::StateChange, &description, None).await;
    }

    /// Fail unless the component is running
    pub fn ensure_running(&self) -> Result<(), ComponentError> {
        match self.status {
            ComponentStatus::Running => Ok(()),
            ref other => Err(ComponentError::InvalidStateError(format!(
                "{} is {}, not running",
                self.id, other
            ))),
        }
    }

    /// Record task processing time
    pub fn record_task_processing(&mut self, success: bool, processing_time_ms: f64) {
        if success {
            self.metrics.tasks_processed += 1;
        } else {
            self.metrics.tasks_failed += 1;
        }

        // running mean over every task, failed ones included
        let total_tasks = self.metrics.tasks_processed + self.metrics.tasks_failed;
        if total_tasks > 1 {
            self.metrics.avg_processing_time = (self.metrics.avg_processing_time * (total_tasks - 1) as f64
                + processing_time_ms)
                / total_tasks as f64;
        } else {
            self.metrics.avg_processing_time = processing_time_ms;
        }

        self.metrics.last_processing_time = processing_time_ms;
        self.metrics.last_updated = Utc::now();
    }

    /// Set a custom metric value
    pub fn set_custom_metric(&mut self, name: &str, value: f64) {
        self.metrics.custom_metrics.insert(name.to_string(), value);
        self.metrics.last_updated = Utc::now();
    }

    /// Get recent events, oldest first
    pub async fn get_recent_events(&self, limit: usize) -> Vec<ComponentEvent> {
        let log = self.event_log.lock().await;
        let start = log.len().saturating_sub(limit);
        log[start..].to_vec()
    }

    /// Snapshot component metrics
    pub fn get_metrics(&self) -> ComponentMetrics {
        ComponentMetrics {
            timestamp: Utc::now(),
            tasks_processed: self.metrics.tasks_processed,
            tasks_failed: self.metrics.tasks_failed,
            avg_processing_time: self.metrics.avg_processing_time,
            custom_metrics: serde_json::to_value(&self.metrics.custom_metrics).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Name of the operation a task asks for
pub fn task_operation(task: &ComponentTask) -> Result<String, ComponentError> {
    extract_task_param(task, "operation")
}

/// Helper function to extract task parameters
pub fn extract_task_param<T: for<'de> Deserialize<'de>>(
    task: &ComponentTask,
    param_name: &str,
) -> Result<T, ComponentError> {
    match task.parameters.get(param_name) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            ComponentError::ValidationError(format!("Failed to parse parameter '{}': {}", param_name, e))
        }),
        None => Err(ComponentError::ValidationError(format!(
            "Required parameter not found: '{}'",
            param_name
        ))),
    }
}

/// Like [`extract_task_param`] but absent parameters yield `None`
pub fn optional_task_param<T: for<'de> Deserialize<'de>>(
    task: &ComponentTask,
    param_name: &str,
) -> Result<Option<T>, ComponentError> {
    match task.parameters.get(param_name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(_) => extract_task_param(task, param_name).map(Some),
    }
}

/// Helper function to measure execution time
pub async fn measure_execution_time<F, T, E>(f: F) -> (Result<T, E>, f64)
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let result = f.await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    (result, duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_average() {
        let mut base = BaseComponent::new("test", "Test");
        base.record_task_processing(true, 10.0);
        base.record_task_processing(false, 20.0);
        base.record_task_processing(true, 30.0);

        assert_eq!(base.metrics.tasks_processed, 2);
        assert_eq!(base.metrics.tasks_failed, 1);
        assert!((base.metrics.avg_processing_time - 20.0).abs() < 1e-9);
        assert_eq!(base.metrics.last_processing_time, 30.0);
    }

    #[tokio::test]
    async fn test_event_log_is_bounded() {
        let base = BaseComponent::new("test", "Test");
        for i in 0..(EVENT_LOG_CAPACITY + 1) {
            base.log_event(EventType::Info, &format!("event {}", i), None).await;
        }
        let events = base.get_recent_events(usize::MAX).await;
        assert_eq!(events.len(), EVENT_LOG_CAPACITY / 2 + 1);
        assert_eq!(events.last().unwrap().description, format!("event {}", EVENT_LOG_CAPACITY));
    }

    #[tokio::test]
    async fn test_transition_and_ensure_running() {
        let mut base = BaseComponent::new("test", "Test");
        assert!(matches!(base.ensure_running(), Err(ComponentError::InvalidStateError(_))));

        base.transition(ComponentStatus::Running).await;
        assert!(base.ensure_running().is_ok());
        let events = base.get_recent_events(1).await;
        assert_eq!(events[0].description, "Initialized -> Running");
    }

    #[test]
    fn test_task_params() {
        let task = ComponentTask::new("t", "generate", serde_json::json!({"size": 12, "name": null}));
        assert_eq!(task_operation(&task).unwrap(), "generate");
        assert_eq!(extract_task_param::<usize>(&task, "size").unwrap(), 12);
        assert_eq!(optional_task_param::<String>(&task, "name").unwrap(), None);
        assert!(extract_task_param::<usize>(&task, "missing").is_err());
        assert!(extract_task_param::<String>(&task, "size").is_err());
    }
}
