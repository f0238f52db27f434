use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use crate::core::clock::Clock;
use crate::core::component::{
    Component, ComponentConfig, ComponentError, ComponentMetrics, ComponentStatus, ComponentTask,
};
use crate::core::config::GeneratorConfig;
use crate::engine::generator::{custom_account, demo_accounts, generate_mock_accounts, CustomAccountInput};
use crate::instances::common::{
    extract_task_param, measure_execution_time, optional_task_param, task_operation, BaseComponent,
    EventType,
};
use crate::model::AccountProfile;

/// Data Generator Instance
///
/// Produces the accounts that get scored: random batches, the fixed demo
/// trio and accounts built from manual input.
pub struct DataGeneratorInstance {
    /// Base component functionality
    base: BaseComponent,
    /// Time source for creation dates
    clock: Arc<dyn Clock>,
    /// Random source, seeded when reproducible batches are wanted
    rng: StdRng,
    /// Batch bounds and archetype mix
    config: GeneratorConfig,
    /// Accounts produced since start
    generated_total: u64,
}

impl DataGeneratorInstance {
    /// Create a new data generator instance
    pub fn new(config: GeneratorConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            base: BaseComponent::new("data_generator", "DataGeneratorInstance"),
            clock,
            rng,
            config,
            generated_total: 0,
        }
    }

    /// Accepted batch sizes and the default, as `(min, default, max)`
    pub fn batch_bounds(&self) -> (usize, usize, usize) {
        (
            self.config.min_batch_size,
            self.config.default_batch_size,
            self.config.max_batch_size,
        )
    }

    /// Generate a random batch; `None` uses the default size
    pub fn generate(&mut self, size: Option<usize>) -> Result<Vec<AccountProfile>, ComponentError> {
        self.base.ensure_running()?;
        let size = size.unwrap_or(self.config.default_batch_size);
        let (min, _, max) = self.batch_bounds();
        if size < min || size > max {
            return Err(ComponentError::ValidationError(format!(
                "Batch size must be between {} and {}, got {}",
                min, max, size
            )));
        }

        let started = Instant::now();
        let accounts = generate_mock_accounts(size, &self.config.mix, &mut self.rng, self.clock.now())?;
        self.finish(started, accounts.len());
        debug!("Generated {} accounts", accounts.len());

        Ok(accounts)
    }

    /// The fixed demo accounts
    pub fn demo(&mut self) -> Result<Vec<AccountProfile>, ComponentError> {
        self.base.ensure_running()?;
        let started = Instant::now();
        let accounts = demo_accounts(self.clock.now());
        self.finish(started, accounts.len());
        Ok(accounts)
    }

    /// Build one account from manual input
    pub fn custom(&mut self, input: &CustomAccountInput) -> Result<AccountProfile, ComponentError> {
        self.base.ensure_running()?;
        let started = Instant::now();
        let account = custom_account(input, self.clock.now())?;
        self.finish(started, 1);
        Ok(account)
    }

    fn finish(&mut self, started: Instant, produced: usize) {
        self.generated_total += produced as u64;
        self.base
            .set_custom_metric("generated_total", self.generated_total as f64);
        self.base
            .record_task_processing(true, started.elapsed().as_secs_f64() * 1000.0);
    }

    async fn dispatch(&mut self, task: &ComponentTask) -> Result<serde_json::Value, ComponentError> {
        let operation = task_operation(task)?;
        match operation.as_str() {
            "generate" => {
                let size: Option<usize> = optional_task_param(task, "size")?;
                Ok(json!(self.generate(size)?))
            }
            "demo" => Ok(json!(self.demo()?)),
            "custom" => {
                let input: CustomAccountInput = extract_task_param(task, "input")?;
                Ok(json!(self.custom(&input)?))
            }
            other => Err(ComponentError::ValidationError(format!("Unknown operation: {}", other))),
        }
    }
}

#[async_trait]
impl Component for DataGeneratorInstance {
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
        info!("Initializing DataGeneratorInstance with config: {}", config.id);

        if let Some(seed) = config.parameters.get("seed").and_then(|v| v.as_u64()) {
            self.config.seed = Some(seed);
            self.rng = StdRng::seed_from_u64(seed);
        }

        self.base.config = Some(config);
        self.base.status = ComponentStatus::Initialized;
        self.base
            .log_event(
                EventType::Initialization,
                "DataGeneratorInstance initialized",
                Some(json!({
                    "seeded": self.config.seed.is_some(),
                    "default_batch_size": self.config.default_batch_size,
                })),
            )
            .await;

        Ok(())
    }

    async fn start(&mut self) -> Result<(), ComponentError> {
        info!("Starting DataGeneratorInstance");
        self.base.transition(ComponentStatus::Running).await;
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), ComponentError> {
        info!("Pausing DataGeneratorInstance");
        self.base.transition(ComponentStatus::Paused).await;
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), ComponentError> {
        info!("Resuming DataGeneratorInstance");
        self.base.transition(ComponentStatus::Running).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ComponentError> {
        info!("Shutting down DataGeneratorInstance");
        self.base.transition(ComponentStatus::ShuttingDown).await;
        Ok(())
    }

    async fn process_task(&mut self, task: ComponentTask) -> Result<serde_json::Value, ComponentError> {
        let (result, elapsed_ms) = measure_execution_time(self.dispatch(&task)).await;

        if let Err(e) = &result {
            self.base.record_task_processing(false, elapsed_ms);
            self.base
                .log_event(EventType::Error, &format!("Task {} failed: {}", task.id, e), None)
                .await;
        }

        result
    }

    async fn collect_metrics(&self) -> Result<ComponentMetrics, ComponentError> {
        Ok(self.base.get_metrics())
    }

    fn get_info(&self) -> serde_json::Value {
        json!({
            "id": self.base.id,
            "type": self.base.component_type,
            "status": self.base.status.to_string(),
            "generated_total": self.generated_total,
            "min_batch_size": self.config.min_batch_size,
            "default_batch_size": self.config.default_batch_size,
            "max_batch_size": self.config.max_batch_size,
            "seeded": self.config.seed.is_some(),
        })
    }
}

impl fmt::Debug for DataGeneratorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGeneratorInstance")
            .field("base", &self.base)
            .field("config", &self.config)
            .field("generated_total", &self.generated_total)
            .finish_non_exhaustive()
    }
}
