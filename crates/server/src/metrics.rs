//! Prometheus wiring for pipeline and HTTP metrics.

use generate::GenerateError;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use quickmcq::PipelineMetrics;
use std::sync::Arc;
use std::time::Duration;

/// Forwards pipeline observations to the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl PipelineMetrics for PrometheusMetrics {
    fn record_retrieval(&self, latency: Duration, hits: usize) {
        histogram!("quickmcq_retrieval_latency_seconds").record(latency.as_secs_f64());
        histogram!("quickmcq_retrieval_hits").record(hits as f64);
    }

    fn record_generation(&self, latency: Duration, result: Result<(), &GenerateError>) {
        histogram!("quickmcq_generation_latency_seconds").record(latency.as_secs_f64());
        if let Err(err) = result {
            counter!("quickmcq_generation_failures_total", "kind" => failure_kind(err))
                .increment(1);
        }
    }
}

fn failure_kind(err: &GenerateError) -> &'static str {
    match err {
        GenerateError::InvalidConfig(_) => "config",
        GenerateError::Transport(_) => "transport",
        GenerateError::Timeout(_) => "timeout",
        GenerateError::Upstream { .. } => "upstream",
        GenerateError::MalformedResponse(_) => "malformed",
    }
}

/// Installs the process-wide Prometheus recorder and hooks the pipeline into it.
///
/// Fails if a recorder is already installed.
pub fn install() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    quickmcq::set_pipeline_metrics(Some(Arc::new(PrometheusMetrics)));
    Ok(handle)
}

/// Counts one answered question per endpoint and outcome.
pub fn record_question(endpoint: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("quickmcq_questions_total", "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

pub(crate) fn record_http(method: &str, status: u16, latency: Duration) {
    counter!(
        "quickmcq_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("quickmcq_http_request_duration_seconds").record(latency.as_secs_f64());
}
