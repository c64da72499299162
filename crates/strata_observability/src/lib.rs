//! Observability setup: structured logging, metrics (Prometheus), tracing.

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber with structured logging.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,strata=debug"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Initialize Prometheus metrics exporter.
pub fn init_metrics(listen_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let addr: std::net::SocketAddr = listen_addr.parse()?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("Prometheus metrics endpoint on http://{}/metrics", addr);
    Ok(())
}

/// Record the outcome counters of one tuning round.
#[allow(clippy::too_many_arguments)]
pub fn record_tuning_round(
    choices_considered: usize,
    choices_accepted: usize,
    choices_evicted: usize,
    bytes_delta: i64,
    duration_ms: u64,
    operations_failed: u64,
    status: &str,
) {
    metrics::counter!("strata_tuning_rounds_total", "status" => status.to_string()).increment(1);
    metrics::gauge!("strata_tuning_choices_considered").set(choices_considered as f64);
    metrics::gauge!("strata_tuning_choices_accepted").set(choices_accepted as f64);
    metrics::gauge!("strata_tuning_choices_evicted").set(choices_evicted as f64);
    metrics::gauge!("strata_tuning_index_bytes_delta").set(bytes_delta as f64);
    metrics::histogram!("strata_tuning_round_duration_ms").record(duration_ms as f64);
    if operations_failed > 0 {
        metrics::counter!("strata_tuning_operations_failed_total").increment(operations_failed);
    }
}

/// Record one applied tuning operation.
/// `kind` is "create" or "drop"; `outcome` is "applied", "skipped" or
/// "failed".
pub fn record_tuning_operation(kind: &str, outcome: &str) {
    metrics::counter!(
        "strata_tuning_operations_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
