#[cfg(any(feature = "grpc", feature = "http"))]
use opentelemetry_otlp::WithExportConfig;

use crate::env::ResolvedConfig;
use crate::error::ExporterError;
use crate::options::Protocol;
use crate::signal::Signal;

/// Build one OTLP exporter, picking the transport from `protocol`.
///
/// HTTP endpoints get the per-signal path appended (`/v1/traces` etc.);
/// gRPC endpoints are used as given.
macro_rules! otlp_exporter {
    ($exporter:ty, $signal:expr, $config:expr, $protocol:expr) => {{
        let signal: Signal = $signal;
        let config: &ResolvedConfig = $config;
        let protocol: Protocol = $protocol;

        match protocol {
            Protocol::Grpc => {
                #[cfg(feature = "grpc")]
                {
                    let builder = configure(
                        <$exporter>::builder().with_tonic(),
                        opentelemetry_otlp::Protocol::Grpc,
                        config.endpoint.clone(),
                        config,
                    );
                    builder
                        .build()
                        .map_err(|source| ExporterError::Build { signal, source })
                }
                #[cfg(not(feature = "grpc"))]
                {
                    let _ = config;
                    Err(transport_disabled(signal, protocol, "grpc"))
                }
            }
            Protocol::HttpProtobuf | Protocol::HttpJson => {
                #[cfg(feature = "http")]
                {
                    let wire = match protocol {
                        Protocol::HttpJson => opentelemetry_otlp::Protocol::HttpJson,
                        _ => opentelemetry_otlp::Protocol::HttpBinary,
                    };
                    let endpoint = config
                        .endpoint
                        .as_deref()
                        .map(|base| http_signal_endpoint(base, signal));
                    let builder =
                        configure(<$exporter>::builder().with_http(), wire, endpoint, config);
                    builder
                        .build()
                        .map_err(|source| ExporterError::Build { signal, source })
                }
                #[cfg(not(feature = "http"))]
                {
                    let _ = config;
                    Err(transport_disabled(signal, protocol, "http"))
                }
            }
        }
    }};
}

pub(super) fn span_exporter(
    config: &ResolvedConfig,
    protocol: Protocol,
) -> Result<opentelemetry_otlp::SpanExporter, ExporterError> {
    otlp_exporter!(opentelemetry_otlp::SpanExporter, Signal::Traces, config, protocol)
}

pub(super) fn metric_exporter(
    config: &ResolvedConfig,
    protocol: Protocol,
) -> Result<opentelemetry_otlp::MetricExporter, ExporterError> {
    otlp_exporter!(opentelemetry_otlp::MetricExporter, Signal::Metrics, config, protocol)
}

pub(super) fn log_exporter(
    config: &ResolvedConfig,
    protocol: Protocol,
) -> Result<opentelemetry_otlp::LogExporter, ExporterError> {
    otlp_exporter!(opentelemetry_otlp::LogExporter, Signal::Logs, config, protocol)
}

#[cfg(any(feature = "grpc", feature = "http"))]
fn configure<B: WithExportConfig>(
    builder: B,
    wire: opentelemetry_otlp::Protocol,
    endpoint: Option<String>,
    config: &ResolvedConfig,
) -> B {
    let mut builder = builder.with_protocol(wire);
    if let Some(endpoint) = endpoint {
        builder = builder.with_endpoint(endpoint);
    }
    if let Some(timeout) = config.export_timeout {
        builder = builder.with_timeout(timeout);
    }
    builder
}

#[cfg_attr(not(feature = "http"), allow(dead_code))]
fn http_signal_endpoint(base: &str, signal: Signal) -> String {
    format!("{}/v1/{}", base.trim_end_matches('/'), signal.as_str())
}

#[cfg(not(all(feature = "grpc", feature = "http")))]
fn transport_disabled(signal: Signal, protocol: Protocol, feature: &'static str) -> ExporterError {
    ExporterError::TransportDisabled {
        signal,
        protocol,
        feature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_endpoint_gets_signal_path() {
        assert_eq!(
            http_signal_endpoint("http://collector:4318", Signal::Traces),
            "http://collector:4318/v1/traces"
        );
        assert_eq!(
            http_signal_endpoint("http://collector:4318/", Signal::Logs),
            "http://collector:4318/v1/logs"
        );
    }

    #[cfg(feature = "http")]
    #[test]
    fn builds_http_exporters_for_every_signal() {
        let config = temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("http://localhost:4318")),
                ("OTEL_EXPORTER_OTLP_TIMEOUT", None::<&str>),
            ],
            || crate::env::resolve_config(&crate::options::OtelOptions::default()),
        );

        assert!(span_exporter(&config, Protocol::HttpProtobuf).is_ok());
        assert!(metric_exporter(&config, Protocol::HttpJson).is_ok());
        assert!(log_exporter(&config, Protocol::HttpProtobuf).is_ok());
    }
}
