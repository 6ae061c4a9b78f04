//! Re-exports of the crates whose types appear in this crate's API.
//!
//! Custom [`Detector`](crate::Detector)s and [`ExporterFactory`](crate::ExporterFactory)
//! implementations need `opentelemetry` and `opentelemetry_sdk` types; these
//! re-exports keep them on the same versions the bootstrap was built with.

pub use tracing;

pub use opentelemetry;

pub use opentelemetry_sdk;

/// Attribute keys such as `deployment.environment.name`.
pub use opentelemetry_semantic_conventions as semconv;

/// Span context extensions (`OpenTelemetrySpanExt`).
pub use tracing_opentelemetry;

/// [`CancellationToken`](tokio_util::sync::CancellationToken) returned by
/// [`CallContext::with_cancel`](crate::CallContext::with_cancel).
pub use tokio_util;
