use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::component::{Component, ComponentError, ComponentTask};
use crate::core::metrics::{MetricsConfig, MetricsManager};

/// The orchestrator owns the registered components, drives their lifecycle
/// and routes tasks to them by component id.
#[derive(Debug)]
pub struct Orchestrator {
    /// Map of component instances by their ID
    instances: HashMap<String, Arc<RwLock<dyn Component>>>,
    /// Current service status
    status: SystemStatus,
    /// Component metrics collection
    metrics: Arc<MetricsManager>,
}

/// Overall service status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Current orchestrator state
    pub state: OrchestratorState,
    /// Last state update time
    pub last_updated: DateTime<Utc>,
    /// Registered component count
    pub active_components: usize,
    /// Error messages if any
    pub errors: Vec<String>,
    /// Warning messages
    pub warnings: Vec<String>,
}

/// Orchestrator operational states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum OrchestratorState {
    /// Components registered, not yet started
    Initializing,
    /// All components running
    Running,
    /// Shutdown in progress or complete
    ShuttingDown,
    /// A component failed to start or stop
    Error,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(metrics_config: MetricsConfig) -> Self {
        Self {
            instances: HashMap::new(),
            status: SystemStatus {
                state: OrchestratorState::Initializing,
                last_updated: Utc::now(),
                active_components: 0,
                errors: Vec::new(),
                warnings: Vec::new(),
            },
            metrics: Arc::new(MetricsManager::new(metrics_config)),
        }
    }

    /// Register a component instance with the orchestrator
    pub fn register_instance(&mut self, id: &str, instance: Arc<RwLock<dyn Component>>) {
        if self.instances.contains_key(id) {
            warn!("Replacing existing instance with ID: {}", id);
            self.status.warnings.push(format!("Component {} was replaced", id));
        }
        self.instances.insert(id.to_string(), instance);
        self.status.active_components = self.instances.len();
        info!("Registered component: {}", id);
    }

    /// Get all registered component instances
    pub fn get_all_instances(&self) -> &HashMap<String, Arc<RwLock<dyn Component>>> {
        &self.instances
    }

    /// Start all component instances and the metrics loop
    pub async fn start_all(&mut self) -> Result<(), ComponentError> {
        info!("Starting all component instances...");

        for (id, instance) in &self.instances {
            match instance.write().await.start().await {
                Ok(_) => info!("Started component: {}", id),
                Err(e) => {
                    error!("Failed to start component {}: {}", id, e);
                    self.status.errors.push(format!("Failed to start {}: {}", id, e));
                    self.status.state = OrchestratorState::Error;
                    self.status.last_updated = Utc::now();
                    return Err(e);
                }
            }
        }

        self.metrics.start_collection(self.instances.clone());
        self.set_state(OrchestratorState::Running);
        Ok(())
    }

    /// Stop all component instances
    pub async fn stop_all(&mut self) -> Result<(), ComponentError> {
        info!("Stopping all component instances...");
        self.set_state(OrchestratorState::ShuttingDown);
        self.metrics.stop_collection();

        let mut first_error = None;
        for (id, instance) in &self.instances {
            match instance.write().await.shutdown().await {
                Ok(_) => info!("Stopped component: {}", id),
                Err(e) => {
                    error!("Failed to stop component {}: {}", id, e);
                    self.status.errors.push(format!("Failed to stop {}: {}", id, e));
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                self.set_state(OrchestratorState::Error);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Submit a task to be processed by a specific component
    pub async fn submit_task(
        &self,
        component_id: &str,
        task: ComponentTask,
    ) -> Result<serde_json::Value, ComponentError> {
        match self.instances.get(component_id) {
            Some(instance) => instance.write().await.process_task(task).await,
            None => Err(ComponentError::NotFound(format!(
                "Component not found: {}",
                component_id
            ))),
        }
    }

    /// Get the current service status
    pub fn get_status(&self) -> &SystemStatus {
        &self.status
    }

    /// Component metrics manager
    pub fn metrics(&self) -> &Arc<MetricsManager> {
        &self.metrics
    }

    fn set_state(&mut self, state: OrchestratorState) {
        self.status.state = state;
        self.status.last_updated = Utc::now();
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}
