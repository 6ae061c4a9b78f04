mod common;

use obs_bootstrap::re_exports::opentelemetry::global;
use obs_bootstrap::re_exports::opentelemetry::trace::Tracer as _;
use obs_bootstrap::{start_with_exporters, CallContext, OtelOptions};

use common::{RecordingSpanExporter, TestExporters};

#[test]
fn non_local_environment_defers_export_until_shutdown() {
    let exporters = TestExporters {
        spans: Some(RecordingSpanExporter::default()),
        ..Default::default()
    };
    let options = OtelOptions::builder()
        .resource_attributes([("deployment.environment.name", "production")])
        .build();
    let ctx = CallContext::background();

    let mut shutdown = temp_env::with_vars(
        [("OTEL_BSP_SCHEDULE_DELAY", Some("60000")), ("OTEL_SERVICE_NAME", None)],
        || start_with_exporters(&ctx, "batched-service", Some(options), &exporters),
    )
    .expect("bootstrap succeeds");
    assert_eq!(shutdown.pending(), 1);

    let spans = exporters.spans.clone().unwrap();

    global::tracer("integration").in_span("queued", |_| {});
    assert!(spans.span_names().is_empty());

    shutdown.shutdown(&ctx).expect("clean shutdown");
    assert_eq!(spans.span_names(), ["queued"]);
}
