use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

/// Targets whose events must not reach the log bridge; exporting them would
/// produce more of them.
const EXPORT_PIPELINE_TARGETS: [&str; 5] = ["opentelemetry", "hyper", "h2", "tonic", "reqwest"];

/// Compose and globally register a tracing subscriber with OTel layers.
///
/// Layers added:
/// - [`EnvFilter`]: respects `RUST_LOG` (defaults to `info`)
/// - `fmt`: formatted output to stdout
/// - `OpenTelemetryLayer`: tracing spans become spans of `tracer_provider`,
///   under a tracer named after the service
/// - `OpenTelemetryTracingBridge`: tracing events become log records of
///   `logger_provider`
///
/// `log` records are forwarded into the subscriber as well.
///
/// The bridge always uses its own fixed instrumentation scope, so log records
/// are tied to the service only through `service.name` on the logger
/// provider's resource.
///
/// # Errors
///
/// Returns an error if a global subscriber or `log` logger is already set.
pub(crate) fn install_subscriber(
    service_name: &str,
    tracer_provider: &SdkTracerProvider,
    logger_provider: &SdkLoggerProvider,
) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let otel_trace_layer =
        tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer(service_name.to_owned()));

    let otel_log_layer = OpenTelemetryTracingBridge::new(logger_provider).with_filter(filter_fn(
        |metadata| !is_export_pipeline_target(metadata.target()),
    ));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_trace_layer)
        .with(otel_log_layer)
        .try_init()
}

fn is_export_pipeline_target(target: &str) -> bool {
    EXPORT_PIPELINE_TARGETS.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with(['_', ':']))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_pipeline_targets_are_excluded_from_the_bridge() {
        assert!(is_export_pipeline_target("opentelemetry_sdk"));
        assert!(is_export_pipeline_target("hyper::client"));
        assert!(is_export_pipeline_target("reqwest"));
        assert!(!is_export_pipeline_target("hyperion"));
        assert!(!is_export_pipeline_target("obs_lifecycle"));
        assert!(!is_export_pipeline_target("my_app::orders"));
    }
}
