//! Exporter acquisition.
//!
//! An [`ExporterFactory`] hands out one type-erased exporter per signal. Any
//! SDK exporter is already a handle through the blanket impls below, so a
//! factory only has to box it.

mod otlp;

use opentelemetry_sdk::logs::{LogExporter, LoggerProviderBuilder};
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::metrics::MeterProviderBuilder;
use opentelemetry_sdk::trace::{SpanExporter, TracerProviderBuilder};

use crate::context::CallContext;
use crate::env::{self, ExporterKind, ResolvedConfig};
use crate::error::ExporterError;
use crate::options::OtelOptions;
use crate::signal::Signal;
use crate::strategy::ProcessingStrategy;

/// An owned span exporter waiting to be attached to its provider.
pub trait SpanExporterHandle: Send {
    /// Install the exporter behind a simple or batch processor.
    fn attach(
        self: Box<Self>,
        builder: TracerProviderBuilder,
        strategy: ProcessingStrategy,
    ) -> TracerProviderBuilder;
}

impl<E> SpanExporterHandle for E
where
    E: SpanExporter + 'static,
{
    fn attach(
        self: Box<Self>,
        builder: TracerProviderBuilder,
        strategy: ProcessingStrategy,
    ) -> TracerProviderBuilder {
        match strategy {
            ProcessingStrategy::Synchronous => builder.with_simple_exporter(*self),
            ProcessingStrategy::Batched => builder.with_batch_exporter(*self),
        }
    }
}

/// An owned metric exporter waiting to be attached to its provider.
///
/// Metrics are always read periodically; there is no strategy to choose.
pub trait MetricExporterHandle: Send {
    fn attach(self: Box<Self>, builder: MeterProviderBuilder) -> MeterProviderBuilder;
}

impl<E> MetricExporterHandle for E
where
    E: PushMetricExporter,
{
    fn attach(self: Box<Self>, builder: MeterProviderBuilder) -> MeterProviderBuilder {
        builder.with_periodic_exporter(*self)
    }
}

/// An owned log exporter waiting to be attached to its provider.
pub trait LogExporterHandle: Send {
    fn attach(
        self: Box<Self>,
        builder: LoggerProviderBuilder,
        strategy: ProcessingStrategy,
    ) -> LoggerProviderBuilder;
}

impl<E> LogExporterHandle for E
where
    E: LogExporter + 'static,
{
    fn attach(
        self: Box<Self>,
        builder: LoggerProviderBuilder,
        strategy: ProcessingStrategy,
    ) -> LoggerProviderBuilder {
        match strategy {
            ProcessingStrategy::Synchronous => builder.with_simple_exporter(*self),
            ProcessingStrategy::Batched => builder.with_batch_exporter(*self),
        }
    }
}

/// Source of the three exporters used by [`start_with_exporters`](crate::start_with_exporters).
///
/// `Ok(None)` means no exporter is configured for the signal. The provider is
/// still installed, it just exports nowhere.
pub trait ExporterFactory {
    fn span_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn SpanExporterHandle>>, ExporterError>;

    fn metric_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn MetricExporterHandle>>, ExporterError>;

    fn log_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn LogExporterHandle>>, ExporterError>;
}

/// Picks each exporter from `OTEL_{TRACES,METRICS,LOGS}_EXPORTER` and the
/// OTLP settings, with [`OtelOptions`] taking precedence over the environment.
#[derive(Debug, Clone)]
pub struct AutoExport {
    config: ResolvedConfig,
}

impl AutoExport {
    /// Read the environment once. Later changes to it are not observed.
    pub fn from_env(options: &OtelOptions) -> Self {
        Self {
            config: env::resolve_config(options),
        }
    }

    fn kind(&self, ctx: &CallContext, signal: Signal) -> Result<ExporterKind, ExporterError> {
        ctx.check()?;
        let kind = self.config.exporter_kind(signal)?;
        tracing::debug!(target: "obs_lifecycle", %signal, ?kind, "selected exporter");
        Ok(kind)
    }
}

impl ExporterFactory for AutoExport {
    fn span_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn SpanExporterHandle>>, ExporterError> {
        let exporter: Box<dyn SpanExporterHandle> = match self.kind(ctx, Signal::Traces)? {
            ExporterKind::Otlp(protocol) => Box::new(otlp::span_exporter(&self.config, protocol)?),
            ExporterKind::Console => Box::new(opentelemetry_stdout::SpanExporter::default()),
            ExporterKind::None => return Ok(None),
        };
        Ok(Some(exporter))
    }

    fn metric_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn MetricExporterHandle>>, ExporterError> {
        let exporter: Box<dyn MetricExporterHandle> = match self.kind(ctx, Signal::Metrics)? {
            ExporterKind::Otlp(protocol) => {
                Box::new(otlp::metric_exporter(&self.config, protocol)?)
            }
            ExporterKind::Console => Box::new(opentelemetry_stdout::MetricExporter::default()),
            ExporterKind::None => return Ok(None),
        };
        Ok(Some(exporter))
    }

    fn log_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn LogExporterHandle>>, ExporterError> {
        let exporter: Box<dyn LogExporterHandle> = match self.kind(ctx, Signal::Logs)? {
            ExporterKind::Otlp(protocol) => Box::new(otlp::log_exporter(&self.config, protocol)?),
            ExporterKind::Console => Box::new(opentelemetry_stdout::LogExporter::default()),
            ExporterKind::None => return Ok(None),
        };
        Ok(Some(exporter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;

    fn auto_export(vars: &[(&str, Option<&str>)]) -> AutoExport {
        temp_env::with_vars(vars, || AutoExport::from_env(&OtelOptions::default()))
    }

    #[test]
    fn none_selects_no_exporter() {
        let auto = auto_export(&[
            ("OTEL_TRACES_EXPORTER", Some("none")),
            ("OTEL_METRICS_EXPORTER", Some("none")),
            ("OTEL_LOGS_EXPORTER", Some("none")),
        ]);
        let ctx = CallContext::background();

        assert!(auto.span_exporter(&ctx).unwrap().is_none());
        assert!(auto.metric_exporter(&ctx).unwrap().is_none());
        assert!(auto.log_exporter(&ctx).unwrap().is_none());
    }

    #[test]
    fn console_selects_stdout_exporters() {
        let auto = auto_export(&[
            ("OTEL_TRACES_EXPORTER", Some("console")),
            ("OTEL_METRICS_EXPORTER", Some("console")),
            ("OTEL_LOGS_EXPORTER", Some("console")),
        ]);
        let ctx = CallContext::background();

        assert!(auto.span_exporter(&ctx).unwrap().is_some());
        assert!(auto.metric_exporter(&ctx).unwrap().is_some());
        assert!(auto.log_exporter(&ctx).unwrap().is_some());
    }

    #[test]
    fn unknown_exporter_fails_acquisition() {
        let auto = auto_export(&[("OTEL_LOGS_EXPORTER", Some("zipkin"))]);

        let err = auto
            .log_exporter(&CallContext::background())
            .err()
            .expect("unsupported exporter");
        assert!(matches!(err, ExporterError::Unsupported { .. }));
    }

    #[test]
    fn done_context_fails_acquisition() {
        let auto = auto_export(&[("OTEL_TRACES_EXPORTER", Some("console"))]);
        let (ctx, token) = CallContext::background().with_cancel();
        token.cancel();

        let err = auto.span_exporter(&ctx).err().expect("canceled");
        assert!(matches!(err, ExporterError::Context(ContextError::Canceled)));
    }

    #[cfg(not(feature = "grpc"))]
    #[test]
    fn grpc_without_feature_is_transport_disabled() {
        let auto = auto_export(&[
            ("OTEL_TRACES_EXPORTER", Some("otlp")),
            ("OTEL_EXPORTER_OTLP_TRACES_PROTOCOL", Some("grpc")),
        ]);

        let err = auto
            .span_exporter(&CallContext::background())
            .err()
            .expect("grpc is not compiled in");
        assert!(matches!(
            err,
            ExporterError::TransportDisabled {
                feature: "grpc",
                ..
            }
        ));
    }
}
