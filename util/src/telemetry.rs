//! Defines helpers for logging and metrics

use std::{error::Error, fmt::Display};

use metrics_exporter_statsd::StatsdBuilder;
use metrics_tracing_context::{MetricsLayer, TracingContextLayer};
use metrics_util::layers::Layer as _;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::LevelFilter, fmt, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::err_str;

/// The prefix used for metrics emitted by the sync node
pub const SYNC_NODE_METRICS_PREFIX: &str = "event_sync";
/// The service tag attached to every metric
pub const SERVICE_TAG: &str = "service";
/// The name of the service reported in metrics
pub const SERVICE_NAME: &str = "event-sync-node";

/// The size (in bytes) of the buffer which metrics data must fill before being
/// flushed out over UDP
pub const METRICS_BUFFER_SIZE: usize = 1024;
/// The size (in # of elements) of the queue which the metrics exporter
/// maintains
///
/// Metrics are dropped when the queue is full
pub const METRICS_QUEUE_SIZE: usize = 1024 * 64;

/// Possible errors that occur when setting up telemetry
#[derive(Debug)]
pub enum TelemetrySetupError {
    /// Error emitted when setting up the statsd metrics recorder
    Metrics(String),
    /// Error emitted when installing the global subscriber
    Subscriber(String),
}

impl Error for TelemetrySetupError {}
impl Display for TelemetrySetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A builder for configuring telemetry for the sync node
#[derive(Default)]
pub struct TelemetryBuilder {
    /// The subscriber layers to add to the telemetry stack
    layers: Vec<Box<dyn Layer<Registry> + Send + Sync + 'static>>,
}

impl TelemetryBuilder {
    /// Add a subscriber layer to the telemetry builder
    fn with_layer<L: Layer<Registry> + Send + Sync>(mut self, layer: L) -> Self {
        self.layers.push(layer.boxed());
        self
    }

    /// Configure logging, either as JSON lines or in a human readable format
    pub fn with_logging(self, json_logs: bool) -> Self {
        if json_logs {
            self.with_layer(fmt::layer().json().with_current_span(true))
        } else {
            self.with_layer(fmt::layer().pretty())
        }
    }

    /// Install a global statsd metrics recorder
    ///
    /// Span fields are attached to metrics emitted within the span as labels
    pub fn with_metrics(
        self,
        statsd_host: &str,
        statsd_port: u16,
    ) -> Result<Self, TelemetrySetupError> {
        let statsd = StatsdBuilder::from(statsd_host, statsd_port)
            .with_buffer_size(METRICS_BUFFER_SIZE)
            .with_queue_size(METRICS_QUEUE_SIZE)
            .with_default_tag(SERVICE_TAG, SERVICE_NAME)
            .build(Some(SYNC_NODE_METRICS_PREFIX))
            .map_err(err_str!(TelemetrySetupError::Metrics))?;

        let recorder = TracingContextLayer::all().layer(statsd);
        metrics::set_global_recorder(recorder).map_err(err_str!(TelemetrySetupError::Metrics))?;

        Ok(self.with_layer(MetricsLayer::new()))
    }

    /// Initialize the global subscriber with the configured telemetry layers
    ///
    /// The log level defaults to `info` and may be overridden by `RUST_LOG`
    pub fn build(self) -> Result<(), TelemetrySetupError> {
        let filter =
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();
        tracing_subscriber::registry()
            .with(self.layers.with_filter(filter))
            .try_init()
            .map_err(err_str!(TelemetrySetupError::Subscriber))
    }
}

/// Configures logging and metrics for the sync node
pub fn configure_telemetry(
    json_logs: bool,
    metrics_enabled: bool,
    statsd_host: &str,
    statsd_port: u16,
) -> Result<(), TelemetrySetupError> {
    let mut telemetry = TelemetryBuilder::default().with_logging(json_logs);
    if metrics_enabled {
        telemetry = telemetry.with_metrics(statsd_host, statsd_port)?;
    }

    telemetry.build()
}

#[cfg(test)]
mod test {
    use super::{TelemetryBuilder, TelemetrySetupError};

    /// Tests that the global subscriber may only be installed once
    #[test]
    fn test_subscriber_installed_once() {
        TelemetryBuilder::default().with_logging(true /* json_logs */).build().unwrap();

        let res = TelemetryBuilder::default().with_logging(false /* json_logs */).build();
        assert!(matches!(res, Err(TelemetrySetupError::Subscriber(_))));
    }
}
