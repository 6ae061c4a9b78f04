mod common;

use obs_bootstrap::re_exports::opentelemetry::global;
use obs_bootstrap::re_exports::opentelemetry::trace::Tracer as _;
use obs_bootstrap::{start_with_exporters, CallContext};

use common::{RecordingSpanExporter, TestExporters};

#[test]
fn local_environment_from_resource_attributes_exports_synchronously() {
    let exporters = TestExporters {
        spans: Some(RecordingSpanExporter::default()),
        ..Default::default()
    };
    let ctx = CallContext::background();

    // A batch processor would hold spans for a minute.
    let mut shutdown = temp_env::with_vars(
        [
            ("OTEL_SERVICE_NAME", None),
            (
                "OTEL_RESOURCE_ATTRIBUTES",
                Some("deployment.environment.name=local"),
            ),
            ("OTEL_BSP_SCHEDULE_DELAY", Some("60000")),
        ],
        || start_with_exporters(&ctx, "env-local-service", None, &exporters),
    )
    .expect("bootstrap succeeds");

    let spans = exporters.spans.clone().unwrap();
    global::tracer("integration").in_span("checkout", |_| {});

    assert_eq!(spans.span_names(), ["checkout"]);
    assert_eq!(
        spans.resource_value("deployment.environment.name").as_deref(),
        Some("local")
    );

    shutdown.shutdown(&ctx).expect("clean shutdown");
}
