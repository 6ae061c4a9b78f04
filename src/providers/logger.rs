use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::Resource;

use crate::exporters::LogExporterHandle;
use crate::strategy::ProcessingStrategy;

/// Build a [`SdkLoggerProvider`] exporting through `exporter`, if any.
pub(crate) fn build_logger_provider(
    exporter: Option<Box<dyn LogExporterHandle>>,
    strategy: ProcessingStrategy,
    resource: Resource,
) -> SdkLoggerProvider {
    let builder = SdkLoggerProvider::builder().with_resource(resource);

    match exporter {
        Some(exporter) => exporter.attach(builder, strategy).build(),
        None => builder.build(),
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::logs::{LogRecord as _, Logger as _, LoggerProvider as _};
    use opentelemetry::{Key, KeyValue};
    use opentelemetry_sdk::logs::InMemoryLogExporter;

    use super::*;

    fn emit(provider: &SdkLoggerProvider, body: &'static str) {
        let logger = provider.logger("test");
        let mut record = logger.create_log_record();
        record.set_body(body.into());
        logger.emit(record);
    }

    #[test]
    fn synchronous_exports_on_emit_with_resource() {
        let exporter = InMemoryLogExporter::default();
        let resource = Resource::builder_empty()
            .with_attribute(KeyValue::new("testkey", "foobar123"))
            .build();
        let provider = build_logger_provider(
            Some(Box::new(exporter.clone())),
            ProcessingStrategy::Synchronous,
            resource,
        );

        emit(&provider, "hello");

        let logs = exporter.get_emitted_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(
            logs[0].resource.get(&Key::from_static_str("testkey")),
            Some("foobar123".into())
        );
    }

    #[test]
    fn batched_defers_export_until_flush() {
        let exporter = InMemoryLogExporter::default();
        let provider = build_logger_provider(
            Some(Box::new(exporter.clone())),
            ProcessingStrategy::Batched,
            Resource::builder_empty().build(),
        );

        emit(&provider, "hello");
        assert!(exporter.get_emitted_logs().unwrap().is_empty());

        provider.force_flush().unwrap();
        assert_eq!(exporter.get_emitted_logs().unwrap().len(), 1);
    }
}
