mod common;

use obs_bootstrap::re_exports::opentelemetry::global;
use obs_bootstrap::re_exports::opentelemetry::trace::Tracer as _;
use obs_bootstrap::re_exports::opentelemetry::KeyValue;
use obs_bootstrap::{start_with_exporters, BoxError, CallContext, Detector, OtelOptions, StartError};

use common::{RecordingSpanExporter, TestExporters};

#[derive(Debug)]
struct CloudMetadata;

impl Detector for CloudMetadata {
    fn name(&self) -> &str {
        "cloud-metadata"
    }

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError> {
        Err("metadata service timed out".into())
    }
}

#[test]
fn failing_detector_degrades_the_resource_but_startup_completes() {
    let exporters = TestExporters {
        spans: Some(RecordingSpanExporter::default()),
        ..Default::default()
    };
    let options = OtelOptions::builder()
        .detector(CloudMetadata)
        .resource_attributes([("deployment.environment.name", "local")])
        .build();
    let ctx = CallContext::background();

    let failure = start_with_exporters(&ctx, "degraded-service", Some(options), &exporters)
        .expect_err("detector failure is reported");

    let (error, mut shutdown) = failure.into_parts();
    match &error {
        StartError::Resource(err) => {
            assert_eq!(err.failures().len(), 1);
            assert_eq!(err.failures()[0].detector(), "cloud-metadata");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(shutdown.pending(), 1);

    // Providers were still installed.
    let spans = exporters.spans.clone().unwrap();
    global::tracer("integration").in_span("still-works", |_| {});
    assert_eq!(spans.span_names(), ["still-works"]);

    assert!(shutdown.shutdown(&ctx).is_ok());
}
