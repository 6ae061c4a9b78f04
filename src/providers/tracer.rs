use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;

use crate::exporters::SpanExporterHandle;
use crate::strategy::ProcessingStrategy;

/// Build a [`SdkTracerProvider`] exporting through `exporter`, if any.
///
/// `Synchronous` exports every span as it ends; `Batched` defers export to
/// the batch processor's worker.
pub(crate) fn build_tracer_provider(
    exporter: Option<Box<dyn SpanExporterHandle>>,
    strategy: ProcessingStrategy,
    resource: Resource,
) -> SdkTracerProvider {
    let builder = SdkTracerProvider::builder().with_resource(resource);

    match exporter {
        Some(exporter) => exporter.attach(builder, strategy).build(),
        None => builder.build(),
    }
}
