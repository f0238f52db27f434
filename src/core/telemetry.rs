use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::core::component::ComponentError;
use crate::model::RiskLevel;

/// Prometheus instruments for assessment activity
#[derive(Debug, Clone)]
pub struct RiskTelemetry {
    registry: Registry,
    assessments: IntCounterVec,
    batches: IntCounter,
    batch_accounts: IntCounter,
    scores: Histogram,
}

impl RiskTelemetry {
    /// Create instruments on a private registry
    pub fn new() -> Result<Self, ComponentError> {
        let registry = Registry::new();

        let assessments = IntCounterVec::new(
            Opts::new("risk_assessments_total", "Accounts assessed, by risk level"),
            &["level"],
        )
        .map_err(metric_error)?;
        let batches = IntCounter::new("risk_batches_total", "Batches analysed").map_err(metric_error)?;
        let batch_accounts = IntCounter::new(
            "risk_batch_accounts_total",
            "Accounts analysed as part of a batch",
        )
        .map_err(metric_error)?;
        let scores = Histogram::with_opts(
            HistogramOpts::new("risk_score", "Distribution of risk scores")
                .buckets(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]),
        )
        .map_err(metric_error)?;

        registry.register(Box::new(assessments.clone())).map_err(metric_error)?;
        registry.register(Box::new(batches.clone())).map_err(metric_error)?;
        registry.register(Box::new(batch_accounts.clone())).map_err(metric_error)?;
        registry.register(Box::new(scores.clone())).map_err(metric_error)?;

        Ok(Self {
            registry,
            assessments,
            batches,
            batch_accounts,
            scores,
        })
    }

    /// Record one scored account
    pub fn observe_assessment(&self, level: RiskLevel, score: u8) {
        self.assessments.with_label_values(&[level.metric_label()]).inc();
        self.scores.observe(f64::from(score));
    }

    /// Record one analysed batch
    pub fn observe_batch(&self, size: usize) {
        self.batches.inc();
        self.batch_accounts.inc_by(size as u64);
    }

    /// Count of assessments recorded at the given level
    pub fn assessments_at(&self, level: RiskLevel) -> u64 {
        self.assessments.with_label_values(&[level.metric_label()]).get()
    }

    /// Render all instruments in the Prometheus text format
    pub fn render(&self) -> Result<String, ComponentError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metric_error)?;
        String::from_utf8(buffer).map_err(metric_error)
    }
}

fn metric_error(e: impl std::fmt::Display) -> ComponentError {
    ComponentError::ProcessingError(format!("metrics: {}", e))
}
