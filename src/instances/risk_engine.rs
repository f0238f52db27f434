use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{info, warn};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::clock::Clock;
use crate::core::component::{
    Component, ComponentConfig, ComponentError, ComponentMetrics, ComponentStatus, ComponentTask,
};
use crate::core::telemetry::RiskTelemetry;
use crate::engine::scoring::{analyze_batch, risk_distribution, score_histogram};
use crate::instances::common::{
    extract_task_param, measure_execution_time, optional_task_param, task_operation, BaseComponent,
    EventType,
};
use crate::model::{AccountProfile, AssessedAccount, RiskAssessment, RiskDistribution, RiskLevel, ScoreBin};
use crate::store::HistoryStore;

/// Risk Engine Instance
///
/// Scores accounts, keeps the most recent batches for browsing and records
/// every assessment to the history store and the Prometheus registry.
pub struct RiskEngineInstance {
    /// Base component functionality
    base: BaseComponent,
    /// Time source for account age
    clock: Arc<dyn Clock>,
    /// Latest assessment per account id, readable without the engine lock
    latest: Arc<DashMap<String, RiskAssessment>>,
    /// Recently analysed batches by id
    batches: LruCache<String, Arc<BatchAnalysis>>,
    /// Persistent assessment log
    history: Arc<HistoryStore>,
    /// Prometheus instruments
    telemetry: Arc<RiskTelemetry>,
    /// Bins used for score histograms
    histogram_bins: usize,
}

/// A scored batch of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAnalysis {
    pub batch_id: String,
    pub created_at: DateTime<Utc>,
    pub rows: Vec<AssessedAccount>,
    pub distribution: RiskDistribution,
    pub histogram: Vec<ScoreBin>,
}

/// Batch metadata without the rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub created_at: DateTime<Utc>,
    pub size: usize,
    pub distribution: RiskDistribution,
}

impl BatchAnalysis {
    /// Rows whose level is in `levels`, in batch order
    pub fn filtered(&self, levels: &[RiskLevel]) -> Vec<&AssessedAccount> {
        self.rows
            .iter()
            .filter(|row| levels.contains(&row.assessment.risk_level))
            .collect()
    }

    pub fn find(&self, account_id: &str) -> Option<&AssessedAccount> {
        self.rows.iter().find(|row| row.account.account_id == account_id)
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            batch_id: self.batch_id.clone(),
            created_at: self.created_at,
            size: self.rows.len(),
            distribution: self.distribution.clone(),
        }
    }
}

impl RiskEngineInstance {
    /// Create a new risk engine instance
    pub fn new(
        clock: Arc<dyn Clock>,
        history: Arc<HistoryStore>,
        telemetry: Arc<RiskTelemetry>,
        batch_capacity: NonZeroUsize,
        histogram_bins: usize,
    ) -> Self {
        Self {
            base: BaseComponent::new("risk_engine", "RiskEngineInstance"),
            clock,
            latest: Arc::new(DashMap::new()),
            batches: LruCache::new(batch_capacity),
            history,
            telemetry,
            histogram_bins: histogram_bins.max(1),
        }
    }

    /// Shared index of the latest assessment per account
    pub fn latest_index(&self) -> Arc<DashMap<String, RiskAssessment>> {
        self.latest.clone()
    }

    /// Score a single account
    pub fn assess(&mut self, account: &AccountProfile) -> Result<RiskAssessment, ComponentError> {
        self.base.ensure_running()?;
        account.validate()?;
        let started = Instant::now();

        let mut rows = analyze_batch(vec![account.clone()], self.clock.now());
        let row = rows.pop().ok_or_else(|| {
            ComponentError::ProcessingError("Scoring produced no result".to_string())
        })?;
        self.record(&row, None);

        self.finish(started);
        Ok(row.assessment)
    }

    /// Score several accounts without keeping them as a batch
    pub fn analyze(&mut self, accounts: Vec<AccountProfile>) -> Result<Vec<AssessedAccount>, ComponentError> {
        self.base.ensure_running()?;
        validate_all(&accounts)?;
        let started = Instant::now();

        let rows = analyze_batch(accounts, self.clock.now());
        for row in &rows {
            self.record(row, None);
        }

        self.finish(started);
        Ok(rows)
    }

    /// Score a generated batch and keep it for later browsing
    pub fn analyze_batch(&mut self, accounts: Vec<AccountProfile>) -> Result<Arc<BatchAnalysis>, ComponentError> {
        self.base.ensure_running()?;
        if accounts.is_empty() {
            return Err(ComponentError::ValidationError("Batch contains no accounts".to_string()));
        }
        validate_all(&accounts)?;
        let started = Instant::now();

        let now = self.clock.now();
        let batch_id = uuid::Uuid::new_v4().to_string();
        let rows = analyze_batch(accounts, now);
        for row in &rows {
            self.record(row, Some(&batch_id));
        }

        let assessments = rows.iter().map(|row| &row.assessment);
        let batch = Arc::new(BatchAnalysis {
            batch_id: batch_id.clone(),
            created_at: now,
            distribution: risk_distribution(assessments.clone()),
            histogram: score_histogram(assessments, self.histogram_bins),
            rows,
        });

        if let Some((evicted, _)) = self.batches.push(batch_id.clone(), batch.clone()) {
            if evicted != batch_id {
                info!("Evicted batch {} from cache", evicted);
            }
        }
        self.telemetry.observe_batch(batch.rows.len());
        info!(
            "Analysed batch {} with {} accounts (avg score {:.1})",
            batch_id,
            batch.rows.len(),
            batch.distribution.avg_score
        );

        self.finish(started);
        Ok(batch)
    }

    /// Look up a cached batch, marking it recently used
    pub fn batch(&mut self, batch_id: &str) -> Result<Arc<BatchAnalysis>, ComponentError> {
        self.batches
            .get(batch_id)
            .cloned()
            .ok_or_else(|| ComponentError::NotFound(format!("Batch not found: {}", batch_id)))
    }

    /// Summaries of cached batches, most recent first
    pub fn recent_batches(&self) -> Vec<BatchSummary> {
        self.batches.iter().map(|(_, batch)| batch.summary()).collect()
    }

    /// Engine statistics
    pub fn stats(&self) -> Result<serde_json::Value, ComponentError> {
        let history = self.history.distribution()?;
        Ok(json!({
            "cached_batches": self.batches.len(),
            "indexed_accounts": self.latest.len(),
            "history": history,
            "tasks_processed": self.base.metrics.tasks_processed,
            "avg_processing_time_ms": self.base.metrics.avg_processing_time,
        }))
    }

    fn record(&mut self, row: &AssessedAccount, batch_id: Option<&str>) {
        let assessment = &row.assessment;
        self.latest.insert(assessment.account_id.clone(), assessment.clone());
        self.telemetry.observe_assessment(assessment.risk_level, assessment.risk_score);

        // a failed history write never drops the assessment itself
        if let Err(e) = self.history.record(&row.account, assessment, batch_id) {
            warn!("Failed to record assessment of {}: {}", assessment.account_id, e);
            let failures = self.base.metrics.custom_metrics.get("history_write_failures").copied().unwrap_or(0.0);
            self.base.set_custom_metric("history_write_failures", failures + 1.0);
        }
    }

    fn finish(&mut self, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.base.record_task_processing(true, elapsed_ms);
    }

    async fn dispatch(&mut self, task: &ComponentTask) -> Result<serde_json::Value, ComponentError> {
        let operation = task_operation(task)?;
        match operation.as_str() {
            "assess" => {
                let account: AccountProfile = extract_task_param(task, "account")?;
                let assessment = self.assess(&account)?;
                Ok(json!(assessment))
            }
            "analyze_batch" => {
                let accounts: Vec<AccountProfile> = extract_task_param(task, "accounts")?;
                let batch = self.analyze_batch(accounts)?;
                Ok(json!(batch.summary()))
            }
            "get_batch" => {
                let batch_id: String = extract_task_param(task, "batch_id")?;
                let levels: Option<Vec<RiskLevel>> = optional_task_param(task, "levels")?;
                let batch = self.batch(&batch_id)?;
                let levels = levels.unwrap_or_else(|| RiskLevel::ALL.to_vec());
                Ok(json!({
                    "summary": batch.summary(),
                    "rows": batch.filtered(&levels),
                }))
            }
            "list_batches" => Ok(json!(self.recent_batches())),
            "get_stats" => self.stats(),
            other => Err(ComponentError::ValidationError(format!("Unknown operation: {}", other))),
        }
    }
}

#[async_trait]
impl Component for RiskEngineInstance {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn component_type(&self) -> &str {
        &self.base.component_type
    }

    fn status(&self) -> ComponentStatus {
        self.base.status.clone()
    }

    async fn initialize(&mut self, config: ComponentConfig) -> Result<(), ComponentError> {
        info!("Initializing RiskEngineInstance with config: {}", config.id);

        if let Some(capacity) = config.parameters.get("batch_cache_capacity").and_then(|v| v.as_u64()) {
            let capacity = NonZeroUsize::new(capacity as usize).ok_or_else(|| {
                ComponentError::InitializationError("batch_cache_capacity must be positive".to_string())
            })?;
            self.batches.resize(capacity);
        }

        if let Some(bins) = config.parameters.get("histogram_bins").and_then(|v| v.as_u64()) {
            if bins == 0 {
                return Err(ComponentError::InitializationError(
                    "histogram_bins must be positive".to_string(),
                ));
            }
            self.histogram_bins = bins as usize;
        }

        self.base.config = Some(config);
        self.base.status = ComponentStatus::Initialized;
        self.base
            .log_event(
                EventType::Initialization,
                "RiskEngineInstance initialized",
                Some(json!({
                    "batch_cache_capacity": self.batches.cap().get(),
                    "histogram_bins": self.histogram_bins,
                })),
            )
            .await;

        Ok(())
    }

    async fn start(&mut self) -> Result<(), ComponentError> {
        info!("Starting RiskEngineInstance");
        self.base.transition(ComponentStatus::Running).await;
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), ComponentError> {
        info!("Pausing RiskEngineInstance");
        self.base.transition(ComponentStatus::Paused).await;
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), ComponentError> {
        info!("Resuming RiskEngineInstance");
        self.base.transition(ComponentStatus::Running).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ComponentError> {
        info!("Shutting down RiskEngineInstance");
        self.base.transition(ComponentStatus::ShuttingDown).await;
        self.batches.clear();
        Ok(())
    }

    async fn process_task(&mut self, task: ComponentTask) -> Result<serde_json::Value, ComponentError> {
        let (result, elapsed_ms) = measure_execution_time(self.dispatch(&task)).await;

        if let Err(e) = &result {
            self.base.record_task_processing(false, elapsed_ms);
            self.base
                .log_event(
                    EventType::Error,
                    &format!("Task {} failed: {}", task.id, e),
                    Some(task.parameters.clone()),
                )
                .await;
        } else {
            self.base
                .log_event(EventType::TaskProcessing, &format!("Task {} done", task.id), None)
                .await;
        }

        result
    }

    async fn collect_metrics(&self) -> Result<ComponentMetrics, ComponentError> {
        let mut metrics = self.base.get_metrics();
        if let Some(custom) = metrics.custom_metrics.as_object_mut() {
            custom.insert("cached_batches".to_string(), json!(self.batches.len()));
            custom.insert("indexed_accounts".to_string(), json!(self.latest.len()));
        }
        Ok(metrics)
    }

    fn get_info(&self) -> serde_json::Value {
        json!({
            "id": self.base.id,
            "type": self.base.component_type,
            "status": self.base.status.to_string(),
            "cached_batches": self.batches.len(),
            "batch_cache_capacity": self.batches.cap().get(),
            "indexed_accounts": self.latest.len(),
            "histogram_bins": self.histogram_bins,
            "tasks_processed": self.base.metrics.tasks_processed,
        })
    }
}

fn validate_all(accounts: &[AccountProfile]) -> Result<(), ComponentError> {
    accounts.iter().try_for_each(AccountProfile::validate)
}

impl fmt::Debug for RiskEngineInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskEngineInstance")
            .field("base", &self.base)
            .field("cached_batches", &self.batches.len())
            .field("indexed_accounts", &self.latest.len())
            .field("histogram_bins", &self.histogram_bins)
            .finish_non_exhaustive()
    }
}
