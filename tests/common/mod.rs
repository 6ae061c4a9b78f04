#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use obs_bootstrap::re_exports::opentelemetry::Key;
use obs_bootstrap::re_exports::opentelemetry_sdk::error::OTelSdkResult;
use obs_bootstrap::re_exports::opentelemetry_sdk::logs::InMemoryLogExporter;
use obs_bootstrap::re_exports::opentelemetry_sdk::metrics::InMemoryMetricExporter;
use obs_bootstrap::re_exports::opentelemetry_sdk::trace::{SpanData, SpanExporter};
use obs_bootstrap::re_exports::opentelemetry_sdk::Resource;
use obs_bootstrap::{
    CallContext, ExporterError, ExporterFactory, LogExporterHandle, MetricExporterHandle,
    SpanExporterHandle,
};

/// Span exporter that keeps every exported span and the resource it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
    resource: Arc<Mutex<Option<Resource>>>,
}

impl RecordingSpanExporter {
    pub fn span_names(&self) -> Vec<String> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .map(|span| span.name.to_string())
            .collect()
    }

    pub fn resource_value(&self, key: &'static str) -> Option<String> {
        self.resource
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|resource| resource.get(&Key::from_static_str(key)))
            .map(|value| value.as_str().into_owned())
    }
}

impl SpanExporter for RecordingSpanExporter {
    fn export(
        &self,
        batch: Vec<SpanData>,
    ) -> impl std::future::Future<Output = OTelSdkResult> + Send {
        self.spans.lock().unwrap().extend(batch);
        std::future::ready(Ok(()))
    }

    fn set_resource(&mut self, resource: &Resource) {
        *self.resource.lock().unwrap() = Some(resource.clone());
    }
}

/// Factory handing out clones of in-memory exporters. A `None` signal gets no
/// exporter and `failing_logs` fails log acquisition.
#[derive(Debug, Clone, Default)]
pub struct TestExporters {
    pub spans: Option<RecordingSpanExporter>,
    pub metrics: Option<InMemoryMetricExporter>,
    pub logs: Option<InMemoryLogExporter>,
    pub failing_logs: bool,
}

impl ExporterFactory for TestExporters {
    fn span_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn SpanExporterHandle>>, ExporterError> {
        ctx.check()?;
        Ok(self
            .spans
            .clone()
            .map(|exporter| Box::new(exporter) as Box<dyn SpanExporterHandle>))
    }

    fn metric_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn MetricExporterHandle>>, ExporterError> {
        ctx.check()?;
        Ok(self
            .metrics
            .clone()
            .map(|exporter| Box::new(exporter) as Box<dyn MetricExporterHandle>))
    }

    fn log_exporter(
        &self,
        ctx: &CallContext,
    ) -> Result<Option<Box<dyn LogExporterHandle>>, ExporterError> {
        ctx.check()?;
        if self.failing_logs {
            return Err(ExporterError::Other("log collector rejected credentials".into()));
        }
        Ok(self
            .logs
            .clone()
            .map(|exporter| Box::new(exporter) as Box<dyn LogExporterHandle>))
    }
}
