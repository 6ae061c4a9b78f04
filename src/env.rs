use std::time::Duration;

use crate::error::ExporterError;
use crate::options::{OtelOptions, Protocol};
use crate::signal::Signal;

const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
const OTEL_EXPORTER_OTLP_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";
const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const OTEL_EXPORTER_OTLP_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_TIMEOUT";

const DEFAULT_PROTOCOL: Protocol = Protocol::HttpProtobuf;

/// Which exporter a signal should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterKind {
    Otlp(Protocol),
    Console,
    None,
}

/// Fully resolved configuration after merging programmatic options, env vars, and defaults.
///
/// Priority (highest to lowest):
/// 1. Programmatic — values set in [`OtelOptions`]
/// 2. Environment variables — `OTEL_*`
/// 3. Defaults — OTLP over HTTP+protobuf for every signal
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub endpoint: Option<String>,
    pub export_timeout: Option<Duration>,
    protocol: Option<Protocol>,
    traces: SignalEnv,
    metrics: SignalEnv,
    logs: SignalEnv,
}

/// Raw per-signal selection read from the environment.
#[derive(Debug, Clone, Default)]
struct SignalEnv {
    exporter: Option<String>,
    protocol: Option<(&'static str, String)>,
}

impl SignalEnv {
    fn read(signal: Signal) -> Self {
        let protocol = [signal_protocol_var(signal), OTEL_EXPORTER_OTLP_PROTOCOL]
            .into_iter()
            .find_map(|variable| env_var_non_empty(variable).map(|value| (variable, value)));

        Self {
            exporter: env_var_non_empty(exporter_var(signal)),
            protocol,
        }
    }
}

/// `OTEL_SERVICE_NAME`, when set.
pub(crate) fn service_name_from_env() -> Option<String> {
    env_var_non_empty(OTEL_SERVICE_NAME)
}

/// Resolve exporter configuration by merging programmatic options, env vars, and defaults.
pub(crate) fn resolve_config(opts: &OtelOptions) -> ResolvedConfig {
    let endpoint = opts
        .endpoint
        .clone()
        .or_else(|| env_var_non_empty(OTEL_EXPORTER_OTLP_ENDPOINT));

    let export_timeout = opts.export_timeout.or_else(parse_timeout_env);

    ResolvedConfig {
        endpoint,
        export_timeout,
        protocol: opts.protocol,
        traces: SignalEnv::read(Signal::Traces),
        metrics: SignalEnv::read(Signal::Metrics),
        logs: SignalEnv::read(Signal::Logs),
    }
}

impl ResolvedConfig {
    /// The exporter selected for `signal`.
    ///
    /// A comma-separated list selects its first entry.
    pub fn exporter_kind(&self, signal: Signal) -> Result<ExporterKind, ExporterError> {
        let env = self.signal_env(signal);

        let value = env
            .exporter
            .as_deref()
            .and_then(|v| v.split(',').map(str::trim).find(|s| !s.is_empty()))
            .unwrap_or("otlp");

        match value {
            "otlp" => Ok(ExporterKind::Otlp(self.protocol_for(env)?)),
            "console" => Ok(ExporterKind::Console),
            "none" => Ok(ExporterKind::None),
            other => Err(ExporterError::Unsupported {
                variable: exporter_var(signal),
                value: other.to_owned(),
            }),
        }
    }

    fn signal_env(&self, signal: Signal) -> &SignalEnv {
        match signal {
            Signal::Traces => &self.traces,
            Signal::Metrics => &self.metrics,
            Signal::Logs => &self.logs,
        }
    }

    /// OTLP protocol: programmatic, then the per-signal variable, then the
    /// general one.
    fn protocol_for(&self, env: &SignalEnv) -> Result<Protocol, ExporterError> {
        if let Some(protocol) = self.protocol {
            return Ok(protocol);
        }

        match &env.protocol {
            Some((variable, value)) => {
                Protocol::from_env_value(value).ok_or_else(|| ExporterError::Unsupported {
                    variable: *variable,
                    value: value.clone(),
                })
            }
            None => Ok(DEFAULT_PROTOCOL),
        }
    }
}

fn exporter_var(signal: Signal) -> &'static str {
    match signal {
        Signal::Traces => "OTEL_TRACES_EXPORTER",
        Signal::Metrics => "OTEL_METRICS_EXPORTER",
        Signal::Logs => "OTEL_LOGS_EXPORTER",
    }
}

fn signal_protocol_var(signal: Signal) -> &'static str {
    match signal {
        Signal::Traces => "OTEL_EXPORTER_OTLP_TRACES_PROTOCOL",
        Signal::Metrics => "OTEL_EXPORTER_OTLP_METRICS_PROTOCOL",
        Signal::Logs => "OTEL_EXPORTER_OTLP_LOGS_PROTOCOL",
    }
}

pub(crate) fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_timeout_env() -> Option<Duration> {
    env_var_non_empty(OTEL_EXPORTER_OTLP_TIMEOUT)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}
