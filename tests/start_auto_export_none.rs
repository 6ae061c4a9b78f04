use obs_bootstrap::re_exports::opentelemetry::global;
use obs_bootstrap::re_exports::opentelemetry::trace::Tracer as _;
use obs_bootstrap::{start, CallContext};

#[test]
fn every_signal_disabled_through_the_environment_starts_cleanly() {
    let ctx = CallContext::background();

    let mut shutdown = temp_env::with_vars(
        [
            ("OTEL_TRACES_EXPORTER", Some("none")),
            ("OTEL_METRICS_EXPORTER", Some("none")),
            ("OTEL_LOGS_EXPORTER", Some("none")),
            ("OTEL_SERVICE_NAME", None),
            ("OTEL_RESOURCE_ATTRIBUTES", None),
        ],
        || start(&ctx, "auto-service", None),
    )
    .expect("bootstrap succeeds");

    // Nothing was acquired, so nothing needs releasing.
    assert_eq!(shutdown.pending(), 0);

    // The globals are still usable.
    global::tracer("integration").in_span("unexported", |_| {});
    global::meter("integration")
        .u64_counter("requests")
        .build()
        .add(1, &[]);
    tracing::info!("event with no log exporter");

    assert!(shutdown.shutdown(&ctx).is_ok());
}
