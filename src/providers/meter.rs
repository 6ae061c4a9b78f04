use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::Resource;

use crate::exporters::MetricExporterHandle;

/// Build a [`SdkMeterProvider`] with a periodic reader over `exporter`, if any.
pub(crate) fn build_meter_provider(
    exporter: Option<Box<dyn MetricExporterHandle>>,
    resource: Resource,
) -> SdkMeterProvider {
    let builder = SdkMeterProvider::builder().with_resource(resource);

    match exporter {
        Some(exporter) => exporter.attach(builder).build(),
        None => builder.build(),
    }
}
