//! # obs-bootstrap
//!
//! Process-startup bootstrap for OpenTelemetry on top of the [`tracing`] crate.
//!
//! One call builds the process resource, acquires a span, metric, and log
//! exporter, installs the providers and a global subscriber, and returns a
//! single [`Shutdown`] that tears everything down again. Existing
//! `#[instrument]`, `tracing::info!()`, and span macros work unchanged.
//!
//! Spans and log records are exported synchronously when the resource says
//! `deployment.environment.name=local`, and batched otherwise.
//!
//! ## Quick Start
//!
//! ```no_run
//! use obs_bootstrap::CallContext;
//!
//! let ctx = CallContext::background();
//! let mut shutdown = obs_bootstrap::start(&ctx, "my-service", None)?;
//!
//! tracing::info!("This goes to stdout AND the OTel backend");
//!
//! shutdown.shutdown(&ctx)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configured Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use obs_bootstrap::{CallContext, OtelOptions, Protocol};
//!
//! let ctx = CallContext::background().with_timeout(Duration::from_secs(5));
//! let shutdown = obs_bootstrap::start(&ctx, "my-service", Some(
//!     OtelOptions::builder()
//!         .endpoint("http://collector:4318")
//!         .protocol(Protocol::HttpProtobuf)
//!         .resource_attributes([("deployment.environment.name", "production")])
//!         .export_timeout(Duration::from_secs(30))
//!         .build()
//! ))?;
//! # drop(shutdown);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod context;
mod env;
mod error;
mod exporters;
mod options;
mod propagation;
mod providers;
mod resource;
mod shutdown;
mod signal;
mod strategy;
mod subscriber;

pub mod re_exports;

pub use context::CallContext;
pub use env::ExporterKind;
pub use error::{
    BoxError, ContextError, DetectorError, ExporterError, ReleaseError, ReleaseFailure,
    ResourceError, ShutdownError, StartError, StartFailure,
};
pub use exporters::{
    AutoExport, ExporterFactory, LogExporterHandle, MetricExporterHandle, SpanExporterHandle,
};
pub use options::{OtelOptions, OtelOptionsBuilder, Protocol};
pub use resource::{
    ContainerDetector, Detector, EcsDetector, HostDetector, ProcessDetector, SdkDetector,
};
pub use shutdown::Shutdown;
pub use signal::Signal;
pub use strategy::{deployment_environment, ProcessingStrategy, LOCAL_ENVIRONMENT};

use crate::resource::BuiltResource;

/// Initialize OpenTelemetry for this process with exporters chosen from the
/// environment.
///
/// Equivalent to [`start_with_exporters`] with [`AutoExport::from_env`].
///
/// # Configuration Priority
///
/// 1. **Programmatic**: values set in [`OtelOptions`]
/// 2. **Environment variables**: `OTEL_TRACES_EXPORTER`, `OTEL_EXPORTER_OTLP_ENDPOINT`, etc.
/// 3. **Defaults**: OTLP over HTTP+protobuf for every signal, `info` log level
///
/// # Errors
///
/// See [`start_with_exporters`].
pub fn start(
    ctx: &CallContext,
    service_name: &str,
    options: Option<OtelOptions>,
) -> Result<Shutdown, StartFailure> {
    let opts = options.unwrap_or_default();
    let exporters = AutoExport::from_env(&opts);
    bootstrap(ctx, service_name, &opts, &exporters)
}

/// Initialize OpenTelemetry for this process with exporters from `exporters`.
///
/// Installs the global propagator, builds the resource, acquires the span,
/// metric, and log exporters in that order, registers the tracer and meter
/// providers globally, and installs a global `tracing` subscriber bridging
/// spans and events into them.
///
/// Call this once per process. If a global subscriber is already installed a
/// warning is logged and startup carries on without replacing it.
///
/// # Errors
///
/// Every error comes with a [`Shutdown`] for whatever had been acquired:
/// - [`StartError::Context`] if `ctx` is done before or while the resource
///   is built; nothing is acquired.
/// - [`StartError::SpanExporter`], [`StartError::MetricExporter`], or
///   [`StartError::LogExporter`] if acquisition fails; earlier signals are
///   released by the returned shutdown. Nothing is registered globally.
/// - [`StartError::Resource`] if some detectors failed. Startup otherwise
///   completed, with their attributes missing.
pub fn start_with_exporters(
    ctx: &CallContext,
    service_name: &str,
    options: Option<OtelOptions>,
    exporters: &impl ExporterFactory,
) -> Result<Shutdown, StartFailure> {
    let opts = options.unwrap_or_default();
    bootstrap(ctx, service_name, &opts, exporters)
}

fn bootstrap(
    ctx: &CallContext,
    service_name: &str,
    opts: &OtelOptions,
    exporters: &impl ExporterFactory,
) -> Result<Shutdown, StartFailure> {
    propagation::install_propagator();

    let mut shutdown = Shutdown::new();

    let BuiltResource {
        resource,
        service_name,
        error: resource_error,
    } = match resource::build_resource(ctx, service_name, opts) {
        Ok(built) => built,
        Err(err) => return Err(StartFailure::new(err, shutdown)),
    };

    let environment = deployment_environment(&resource);
    let strategy = ProcessingStrategy::for_environment(environment.as_deref());
    tracing::debug!(
        target: "obs_lifecycle",
        {
            service.name = %service_name,
            environment = environment.as_deref().unwrap_or("<unset>"),
            ?strategy
        },
        "selected processing strategy"
    );

    let span_exporter = match exporters.span_exporter(ctx) {
        Ok(exporter) => exporter,
        Err(err) => return Err(acquire_failure(Signal::Traces, err, shutdown)),
    };
    let acquired = span_exporter.is_some();
    let tracer_provider =
        providers::tracer::build_tracer_provider(span_exporter, strategy, resource.clone());
    if acquired {
        let provider = tracer_provider.clone();
        shutdown.register(Signal::Traces, move || provider.shutdown());
    }

    let metric_exporter = match exporters.metric_exporter(ctx) {
        Ok(exporter) => exporter,
        Err(err) => return Err(acquire_failure(Signal::Metrics, err, shutdown)),
    };
    let acquired = metric_exporter.is_some();
    let meter_provider = providers::meter::build_meter_provider(metric_exporter, resource.clone());
    if acquired {
        let provider = meter_provider.clone();
        shutdown.register(Signal::Metrics, move || provider.shutdown());
    }

    let log_exporter = match exporters.log_exporter(ctx) {
        Ok(exporter) => exporter,
        Err(err) => return Err(acquire_failure(Signal::Logs, err, shutdown)),
    };
    let acquired = log_exporter.is_some();
    let logger_provider =
        providers::logger::build_logger_provider(log_exporter, strategy, resource);
    if acquired {
        let provider = logger_provider.clone();
        shutdown.register(Signal::Logs, move || provider.shutdown());
    }

    opentelemetry::global::set_tracer_provider(tracer_provider.clone());
    opentelemetry::global::set_meter_provider(meter_provider);

    if let Err(err) =
        subscriber::install_subscriber(&service_name, &tracer_provider, &logger_provider)
    {
        tracing::warn!(
            target: "obs_lifecycle",
            error = %err,
            "global subscriber already installed, keeping it"
        );
    }

    match resource_error {
        Some(err) => Err(StartFailure::new(err, shutdown)),
        None => Ok(shutdown),
    }
}

fn acquire_failure(signal: Signal, err: ExporterError, shutdown: Shutdown) -> StartFailure {
    tracing::warn!(
        target: "obs_lifecycle",
        %signal,
        error = %err,
        pending_releases = shutdown.pending(),
        "exporter acquisition failed"
    );
    StartFailure::new(StartError::exporter(signal, err), shutdown)
}
