//! OpenTelemetry observability configuration and initialization
//!
//! The codec emits `tracing` events and, when a [`CodecMetrics`] is attached,
//! OpenTelemetry metrics. Neither goes anywhere until an application installs
//! a subscriber and providers. This module does that in one call, exporting
//! to an OTLP collector over gRPC.
//!
//! # Usage Pattern
//!
//! Initialize observability at application startup, before decoding traffic:
//!
//! ```rust,no_run
//! use jrpc_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("rpc-gateway")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("jrpc_core=debug");
//!
//!     jrpc_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... decode and encode envelopes ...
//!
//!     jrpc_core::shutdown_observability().expect("Failed to flush telemetry");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `RUST_LOG`: Log filter; takes precedence over the configured level
//!
//! [`CodecMetrics`]: crate::CodecMetrics

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Boxed error returned by the setup functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Default collector endpoint
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Metric export interval
const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Providers installed by the last successful [`init_observability`]
static PROVIDERS: Mutex<Option<Providers>> = Mutex::new(None);

#[derive(Default)]
struct Providers {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

impl Providers {
    /// Flush and stop every provider, reporting the first failure
    fn shutdown(self) -> Result<(), BoxError> {
        let traces = self.tracer.map_or(Ok(()), |provider| provider.shutdown());
        let metrics = self.meter.map_or(Ok(()), |provider| provider.shutdown());
        traces?;
        metrics?;
        Ok(())
    }
}

/// Observability configuration for OpenTelemetry
///
/// # Defaults
///
/// - Service name: "jrpc"
/// - Service version: Current crate version
/// - OTLP endpoint: From `OTEL_EXPORTER_OTLP_ENDPOINT`, or "http://localhost:4317"
/// - Traces, metrics and logs enabled
/// - Log level: From `RUST_LOG`, or "info"
///
/// # Examples
///
/// ```rust
/// use jrpc_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("rpc-gateway")
///     .with_version("1.4.0")
///     .with_traces(false);
///
/// assert_eq!(config.service_name, "rpc-gateway");
/// assert!(!config.enable_traces);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name reported on every span and metric
    pub service_name: String,

    /// Service version reported on every span and metric
    pub service_version: String,

    /// OTLP collector endpoint
    pub otlp_endpoint: String,

    /// Export spans
    pub enable_traces: bool,

    /// Export metrics
    pub enable_metrics: bool,

    /// Write JSON log lines to stdout
    pub enable_logs: bool,

    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "jrpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_OTLP_ENDPOINT.to_string()),
            enable_traces: true,
            enable_metrics: true,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration for `service_name` with default settings
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the filter directive, e.g. "info" or "jrpc_core=trace"
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the reported service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Enable or disable local JSON log output
    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the tracing subscriber and the OpenTelemetry providers
///
/// Must be called from within a Tokio runtime when traces or metrics are
/// enabled, since the exporters run on it.
///
/// The global providers are only replaced once the subscriber is installed,
/// so a failed call leaves the previous telemetry setup in place.
///
/// # Errors
///
/// Fails when an exporter cannot be built, when the log filter does not
/// parse, or when a global subscriber is already installed.
pub fn init_observability(config: ObservabilityConfig) -> Result<(), BoxError> {
    use opentelemetry::trace::TracerProvider as _;

    let providers = Providers {
        tracer: config.enable_traces.then(|| build_tracer_provider(&config)).transpose()?,
        meter: config.enable_metrics.then(|| build_meter_provider(&config)).transpose()?,
    };

    let tracer = providers
        .tracer
        .as_ref()
        .map(|provider| provider.tracer(config.service_name.clone()));

    if let Err(err) = init_tracing_subscriber(&config, tracer) {
        // Never installed; stop their exporters before reporting
        let _ = providers.shutdown();
        return Err(err);
    }

    if let Some(provider) = &providers.tracer {
        global::set_tracer_provider(provider.clone());
    }
    if let Some(provider) = &providers.meter {
        global::set_meter_provider(provider.clone());
    }
    *PROVIDERS.lock().unwrap_or_else(PoisonError::into_inner) = Some(providers);

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        logs = config.enable_logs,
        "OpenTelemetry initialized"
    );

    Ok(())
}

fn build_tracer_provider(config: &ObservabilityConfig) -> Result<SdkTracerProvider, BoxError> {
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build())
}

fn build_meter_provider(config: &ObservabilityConfig) -> Result<SdkMeterProvider, BoxError> {
    use opentelemetry_sdk::metrics::PeriodicReader;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(METRICS_EXPORT_INTERVAL)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build())
}

/// Layers: OpenTelemetry spans (if traces are on), the env filter, and JSON
/// lines on stdout (if logs are on)
fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), BoxError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let fmt_layer = config.enable_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Flush pending spans and metrics and stop the exporters
///
/// Call once before the process exits; anything still buffered in the batch
/// span processor or the periodic metric reader is exported first. Calling
/// it again, or without a prior [`init_observability`], is a no-op.
///
/// # Errors
///
/// Returns the first provider shutdown failure. Both providers are shut
/// down regardless.
pub fn shutdown_observability() -> Result<(), BoxError> {
    let providers = PROVIDERS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    let Some(providers) = providers else {
        return Ok(());
    };

    tracing::info!("Shutting down OpenTelemetry");
    providers.shutdown().inspect_err(|err| {
        tracing::warn!(error = %err, "OpenTelemetry shutdown failed");
    })
}
