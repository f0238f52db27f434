use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::core::component::{Component, ComponentMetrics};

/// Manager for collecting and storing metrics from all components
#[derive(Debug)]
pub struct MetricsManager {
    /// Historical metrics data
    metrics_history: Arc<Mutex<HashMap<String, Vec<ComponentMetrics>>>>,
    /// Most recent metrics for each component
    latest_metrics: Arc<RwLock<HashMap<String, ComponentMetrics>>>,
    /// Configuration for metrics collection
    config: MetricsConfig,
    /// Background collection loop, if running
    collection_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Configuration for metrics collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Collection interval in seconds; zero disables the background loop
    pub collection_interval_secs: u64,
    /// Maximum history to keep per component
    pub max_history_per_component: usize,
}

/// Summary metrics for the entire service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetricsSummary {
    /// Timestamp of the summary
    pub timestamp: DateTime<Utc>,
    /// Average task processing time (ms)
    pub avg_processing_time: f64,
    /// Total tasks processed
    pub total_tasks_processed: u64,
    /// Total tasks failed
    pub total_tasks_failed: u64,
    /// Per-component highlights
    pub component_highlights: HashMap<String, ComponentMetricHighlight>,
}

/// Highlight metrics for a specific component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentMetricHighlight {
    /// Component identifier
    pub component_id: String,
    /// Tasks processed
    pub tasks_processed: u64,
    /// Average processing time (ms)
    pub avg_processing_time: f64,
    /// Component-specific metrics
    pub custom_metrics: serde_json::Value,
}

type ComponentMap = HashMap<String, Arc<RwLock<dyn Component>>>;

impl MetricsManager {
    /// Create a new metrics manager with the specified configuration
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            metrics_history: Arc::new(Mutex::new(HashMap::new())),
            latest_metrics: Arc::new(RwLock::new(HashMap::new())),
            config,
            collection_task: std::sync::Mutex::new(None),
        }
    }

    /// Start the periodic collection loop
    pub fn start_collection(self: &Arc<Self>, components: ComponentMap) {
        if self.config.collection_interval_secs == 0 {
            info!("Metrics collection disabled");
            return;
        }

        info!(
            "Starting metrics collection every {}s",
            self.config.collection_interval_secs
        );

        let manager = self.clone();
        let period = Duration::from_secs(self.config.collection_interval_secs);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                manager.collect_once(&components).await;
            }
        });

        match self.collection_task.lock() {
            Ok(mut task) => {
                if let Some(previous) = task.replace(handle) {
                    previous.abort();
                }
            }
            Err(e) => {
                error!("Metrics task slot poisoned, aborting new loop: {}", e);
                handle.abort();
            }
        }
    }

    /// Abort the collection loop; collected metrics are kept
    pub fn stop_collection(&self) {
        let handle = match self.collection_task.lock() {
            Ok(mut task) => task.take(),
            Err(e) => e.into_inner().take(),
        };

        if let Some(handle) = handle {
            handle.abort();
            info!("Stopped metrics collection");
        }
    }

    /// Whether the background loop is alive
    pub fn is_collecting(&self) -> bool {
        match self.collection_task.lock() {
            Ok(task) => task.as_ref().map_or(false, |handle| !handle.is_finished()),
            Err(_) => false,
        }
    }

    /// Collect metrics from every component concurrently
    pub async fn collect_once(&self, components: &ComponentMap) {
        debug!("Collecting metrics from {} components", components.len());

        let collected = join_all(components.iter().map(|(id, component)| async move {
            let result = component.read().await.collect_metrics().await;
            (id.clone(), result)
        }))
        .await;

        let mut latest = self.latest_metrics.write().await;
        let mut history = self.metrics_history.lock().await;
        let max_history = self.config.max_history_per_component;

        for (component_id, result) in collected {
            match result {
                Ok(metrics) => {
                    latest.insert(component_id.clone(), metrics.clone());

                    let component_history = history.entry(component_id).or_insert_with(Vec::new);
                    component_history.push(metrics);

                    if component_history.len() > max_history {
                        let excess = component_history.len() - max_history;
                        component_history.drain(0..excess);
                    }
                }
                Err(e) => {
                    error!("Failed to collect metrics from {}: {}", component_id, e);
                }
            }
        }
    }

    /// Get historical metrics for a specific component, newest last
    pub async fn get_component_history(
        &self,
        component_id: &str,
        limit: Option<usize>,
    ) -> Vec<ComponentMetrics> {
        let history = self.metrics_history.lock().await;

        match history.get(component_id) {
            Some(component_history) => {
                let limit = limit.unwrap_or(component_history.len());
                let skip = component_history.len().saturating_sub(limit);
                component_history[skip..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// Get a service-wide metrics summary
    pub async fn get_system_summary(&self) -> SystemMetricsSummary {
        let latest = self.latest_metrics.read().await;

        let mut total_processing_time = 0.0;
        let mut total_tasks = 0;
        let mut total_failed = 0;
        let mut component_highlights = HashMap::new();

        for (id, metrics) in latest.iter() {
            total_processing_time += metrics.avg_processing_time;
            total_tasks += metrics.tasks_processed;
            total_failed += metrics.tasks_failed;

            component_highlights.insert(
                id.clone(),
                ComponentMetricHighlight {
                    component_id: id.clone(),
                    tasks_processed: metrics.tasks_processed,
                    avg_processing_time: metrics.avg_processing_time,
                    custom_metrics: metrics.custom_metrics.clone(),
                },
            );
        }

        SystemMetricsSummary {
            timestamp: Utc::now(),
            avg_processing_time: if latest.is_empty() {
                0.0
            } else {
                total_processing_time / latest.len() as f64
            },
            total_tasks_processed: total_tasks,
            total_tasks_failed: total_failed,
            component_highlights,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            collection_interval_secs: 10,
            max_history_per_component: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::{
        ComponentConfig, ComponentError, ComponentStatus, ComponentTask,
    };
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Counter {
        tasks: u64,
    }

    #[async_trait]
    impl Component for Counter {
        fn id(&self) -> &str {
            "counter"
        }
        fn component_type(&self) -> &str {
            "Counter"
        }
        fn status(&self) -> ComponentStatus {
            ComponentStatus::Running
        }
        async fn initialize(&mut self, _config: ComponentConfig) -> Result<(), ComponentError> {
            Ok(())
        }
        async fn start(&mut self) -> Result<(), ComponentError> {
            Ok(())
        }
        async fn pause(&mut self) -> Result<(), ComponentError> {
            Ok(())
        }
        async fn resume(&mut self) -> Result<(), ComponentError> {
            Ok(())
        }
        async fn shutdown(&mut self) -> Result<(), ComponentError> {
            Ok(())
        }
        async fn process_task(&mut self, _task: ComponentTask) -> Result<serde_json::Value, ComponentError> {
            self.tasks += 1;
            Ok(serde_json::Value::Null)
        }
        async fn collect_metrics(&self) -> Result<ComponentMetrics, ComponentError> {
            Ok(ComponentMetrics {
                timestamp: Utc::now(),
                tasks_processed: self.tasks,
                tasks_failed: 0,
                avg_processing_time: 2.0,
                custom_metrics: serde_json::json!({}),
            })
        }
        fn get_info(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    #[test]
    fn test_new_metrics_manager() {
        let manager = MetricsManager::new(MetricsConfig::default());
        assert_eq!(manager.config.collection_interval_secs, 10);
    }

    #[tokio::test]
    async fn test_history_is_trimmed() {
        let manager = MetricsManager::new(MetricsConfig {
            collection_interval_secs: 0,
            max_history_per_component: 2,
        });
        let mut components: ComponentMap = HashMap::new();
        components.insert("counter".to_string(), Arc::new(RwLock::new(Counter { tasks: 4 })));

        for _ in 0..3 {
            manager.collect_once(&components).await;
        }

        assert_eq!(manager.get_component_history("counter", None).await.len(), 2);
        assert_eq!(manager.get_component_history("counter", Some(1)).await.len(), 1);
        assert!(manager.get_component_history("missing", None).await.is_empty());

        let summary = manager.get_system_summary().await;
        assert_eq!(summary.total_tasks_processed, 4);
        assert_eq!(summary.avg_processing_time, 2.0);
    }

    #[tokio::test]
    async fn test_collection_loop_can_be_stopped() {
        let mut components: ComponentMap = HashMap::new();
        components.insert("counter".to_string(), Arc::new(RwLock::new(Counter { tasks: 1 })));

        let disabled = Arc::new(MetricsManager::new(MetricsConfig {
            collection_interval_secs: 0,
            max_history_per_component: 10,
        }));
        disabled.start_collection(components.clone());
        assert!(!disabled.is_collecting());

        let manager = Arc::new(MetricsManager::new(MetricsConfig {
            collection_interval_secs: 1,
            max_history_per_component: 10,
        }));
        manager.start_collection(components);
        assert!(manager.is_collecting());

        manager.stop_collection();
        assert!(!manager.is_collecting());
        // stopping twice is harmless
        manager.stop_collection();
    }
}
