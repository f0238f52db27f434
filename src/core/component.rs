use std::error::Error;
use std::fmt::{Debug, Display};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the current status of a component
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ComponentStatus {
    /// Component is initialized but not yet started
    Initialized,
    /// Component is running and accepting work
    Running,
    /// Component is paused but can be resumed
    Paused,
    /// Component is in the process of shutting down
    ShuttingDown,
    /// Component has encountered an error
    Error(String),
}

impl Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentStatus::Initialized => write!(f, "Initialized"),
            ComponentStatus::Running => write!(f, "Running"),
            ComponentStatus::Paused => write!(f, "Paused"),
            ComponentStatus::ShuttingDown => write!(f, "Shutting Down"),
            ComponentStatus::Error(err) => write!(f, "Error: {}", err),
        }
    }
}

/// Metric data collected from components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentMetrics {
    /// Timestamp when metrics were collected
    pub timestamp: DateTime<Utc>,
    /// Number of tasks processed successfully
    pub tasks_processed: u64,
    /// Number of tasks that failed
    pub tasks_failed: u64,
    /// Average task processing time in milliseconds
    pub avg_processing_time: f64,
    /// Component-specific metrics as key-value pairs
    pub custom_metrics: serde_json::Value,
}

/// Error type for component operations
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// Error during initialization
    InitializationError(String),
    /// Error during task processing
    ProcessingError(String),
    /// Error reading or writing assessment history
    PersistenceError(String),
    /// Rejected input
    ValidationError(String),
    /// Requested batch, account or component does not exist
    NotFound(String),
    /// Invalid configuration
    ConfigError(String),
    /// Component not in the expected state
    InvalidStateError(String),
}

impl ComponentError {
    /// Stable machine-readable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ComponentError::InitializationError(_) => "INITIALIZATION_FAILED",
            ComponentError::ProcessingError(_) => "PROCESSING_FAILED",
            ComponentError::PersistenceError(_) => "PERSISTENCE_FAILED",
            ComponentError::ValidationError(_) => "VALIDATION_FAILED",
            ComponentError::NotFound(_) => "NOT_FOUND",
            ComponentError::ConfigError(_) => "INVALID_CONFIG",
            ComponentError::InvalidStateError(_) => "INVALID_STATE",
        }
    }
}

impl Display for ComponentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentError::InitializationError(msg) => write!(f, "Initialization error: {}", msg),
            ComponentError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            ComponentError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            ComponentError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ComponentError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ComponentError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ComponentError::InvalidStateError(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl Error for ComponentError {}

/// Task assignment for components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentTask {
    /// Unique identifier for the task
    pub id: String,
    /// Description of the task
    pub description: String,
    /// Task parameters as JSON, including the `operation` name
    pub parameters: serde_json::Value,
    /// Priority level (higher is more urgent)
    pub priority: u8,
    /// Task creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ComponentTask {
    /// Build a task for the given operation with extra parameters merged in
    pub fn new(description: &str, operation: &str, mut parameters: serde_json::Value) -> Self {
        match parameters.as_object_mut() {
            Some(map) => {
                map.insert("operation".to_string(), serde_json::Value::String(operation.to_string()));
            }
            None => {
                parameters = serde_json::json!({ "operation": operation });
            }
        }

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.to_string(),
            parameters,
            priority: 5,
            created_at: Utc::now(),
        }
    }
}

/// Component configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Component identifier
    pub id: String,
    /// Component display name
    pub name: String,
    /// Configuration parameters as JSON
    pub parameters: serde_json::Value,
}

/// Core trait for all runtime components of the assessment service
#[async_trait]
pub trait Component: Send + Sync + Debug {
    /// Returns the component identifier
    fn id(&self) -> &str;

    /// Returns the component type name
    fn component_type(&self) -> &str;

    /// Returns the current status of the component
    fn status(&self) -> ComponentStatus;

    /// Initialize the component with the given configuration
    async fn initialize(&mut self, config: ComponentConfig) -> Result<(), ComponentError>;

    /// Start the component
    async fn start(&mut self) -> Result<(), ComponentError>;

    /// Pause the component
    async fn pause(&mut self) -> Result<(), ComponentError>;

    /// Resume the component after being paused
    async fn resume(&mut self) -> Result<(), ComponentError>;

    /// Shut down the component
    async fn shutdown(&mut self) -> Result<(), ComponentError>;

    /// Process a task
    async fn process_task(&mut self, task: ComponentTask) -> Result<serde_json::Value, ComponentError>;

    /// Collect metrics from the component
    async fn collect_metrics(&self) -> Result<ComponentMetrics, ComponentError>;

    /// Get component-specific information
    fn get_info(&self) -> serde_json::Value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_carries_operation() {
        let task = ComponentTask::new("stats", "get_stats", serde_json::json!({"limit": 3}));
        assert_eq!(task.parameters["operation"], "get_stats");
        assert_eq!(task.parameters["limit"], 3);

        let task = ComponentTask::new("stats", "get_stats", serde_json::Value::Null);
        assert_eq!(task.parameters["operation"], "get_stats");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ComponentError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(
            ComponentError::ValidationError("bad".into()).to_string(),
            "Validation error: bad"
        );
    }
}
